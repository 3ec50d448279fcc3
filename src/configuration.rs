// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use serde::Deserialize;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{api::ingress::IngressVisibility, Result};

/// A shared gateway and the name of its plain HTTP listener.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder, Deserialize)]
pub struct GatewayConfiguration {
    pub namespace: String,
    pub name: String,
    pub http_listener_name: String,
}

impl GatewayConfiguration {
    fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if self.name.is_empty() || self.namespace.is_empty() {
            return Err(ConfigurationError::GatewayName);
        }
        if self.http_listener_name.is_empty() {
            return Err(ConfigurationError::HttpListenerName(format!("{}/{}", self.namespace, self.name)));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, TypedBuilder, Deserialize)]
pub struct GatewaysConfiguration {
    pub external: GatewayConfiguration,
    pub cluster_local: GatewayConfiguration,
}

impl GatewaysConfiguration {
    pub fn for_visibility(&self, visibility: IngressVisibility) -> &GatewayConfiguration {
        match visibility {
            IngressVisibility::ExternalIP => &self.external,
            IngressVisibility::ClusterLocal => &self.cluster_local,
        }
    }
}

#[derive(Clone, Debug, TypedBuilder, Deserialize)]
pub struct Configuration {
    pub controller_name: String,
    #[builder(default)]
    pub enable_open_telemetry: Option<bool>,
    pub gateways: GatewaysConfiguration,
    #[builder(default)]
    pub watch_namespace: Option<String>,
}

#[derive(Error, Debug)]
enum ConfigurationError {
    #[error("controller name must be not empty")]
    ControllerName,
    #[error("gateway name and namespace must be not empty")]
    GatewayName,
    #[error("gateway {0} must name its HTTP listener")]
    HttpListenerName(String),
}

impl Configuration {
    pub fn validate(&self) -> Result<()> {
        if self.controller_name.is_empty() {
            return Err(ConfigurationError::ControllerName.into());
        }
        self.gateways.external.validate()?;
        self.gateways.cluster_local.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIGURATION: &str = r"
controller_name: ingressgate.knative.dev/ingress-controller
gateways:
  external:
    namespace: istio-system
    name: knative-gateway
    http_listener_name: http
  cluster_local:
    namespace: istio-system
    name: knative-local-gateway
    http_listener_name: http
";

    #[test]
    fn test_configuration() {
        let configuration: Configuration = serde_yaml::from_str(CONFIGURATION).unwrap();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.enable_open_telemetry, None);
        assert_eq!(configuration.watch_namespace, None);
        assert_eq!(configuration.gateways.for_visibility(IngressVisibility::ExternalIP).name, "knative-gateway");
        assert_eq!(configuration.gateways.for_visibility(IngressVisibility::ClusterLocal).name, "knative-local-gateway");
    }

    #[test]
    fn test_configuration_validation() {
        let gateway = GatewayConfiguration::builder().namespace("istio-system".to_owned()).name("knative-gateway".to_owned()).http_listener_name("http".to_owned()).build();
        let gateways = GatewaysConfiguration::builder().external(gateway.clone()).cluster_local(gateway.clone()).build();

        let configuration = Configuration::builder().controller_name(String::new()).gateways(gateways.clone()).build();
        assert!(configuration.validate().is_err());

        let no_listener = GatewayConfiguration { http_listener_name: String::new(), ..gateway.clone() };
        let configuration = Configuration::builder()
            .controller_name("ingressgate".to_owned())
            .gateways(GatewaysConfiguration::builder().external(no_listener).cluster_local(gateway).build())
            .build();
        assert!(configuration.validate().is_err());

        let configuration = Configuration::builder().controller_name("ingressgate".to_owned()).gateways(gateways).build();
        assert!(configuration.validate().is_ok());
    }
}
