// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::ResourceExt;

use super::{LISTENER_PREFIX, NAMESPACE_NAME_LABEL};
use crate::api::{
    gateways::{AllowedRoutes, FromNamespaces, GatewayTLSConfig, Listener, RouteNamespaces, SecretObjectReference, TLSModeType},
    ingress::IngressTLS,
    Ingress,
};

const HTTPS_PORT: i32 = 443;
const HTTPS_PROTOCOL: &str = "HTTPS";
const SECRET_KIND: &str = "Secret";

/// Name of every listener owned by `ingress`. Bound to the intent's UID, not to a hostname.
pub fn listener_name(ingress: &Ingress) -> String {
    LISTENER_PREFIX.to_owned() + &ingress.uid().unwrap_or_default()
}

/// One HTTPS listener per TLS host. All of them share [`listener_name`].
pub fn make_listeners(ingress: &Ingress, tls: &IngressTLS) -> Vec<Listener> {
    let name = listener_name(ingress);
    tls.hosts
        .iter()
        .map(|host| Listener {
            name: name.clone(),
            hostname: Some(host.clone()),
            port: HTTPS_PORT,
            protocol: HTTPS_PROTOCOL.to_owned(),
            tls: Some(GatewayTLSConfig {
                mode: Some(TLSModeType::Terminate),
                certificate_refs: Some(vec![SecretObjectReference {
                    group: Some(String::new()),
                    kind: Some(SECRET_KIND.to_owned()),
                    name: tls.secret_name.clone(),
                    namespace: Some(tls.secret_namespace.clone()),
                }]),
                extra: BTreeMap::new(),
            }),
            allowed_routes: Some(AllowedRoutes {
                namespaces: Some(RouteNamespaces {
                    from: Some(FromNamespaces::Selector),
                    selector: Some(LabelSelector {
                        match_labels: Some(BTreeMap::from([(NAMESPACE_NAME_LABEL.to_owned(), ingress.namespace().unwrap_or_default())])),
                        match_expressions: None,
                    }),
                }),
                kinds: Some(vec![]),
            }),
            extra: BTreeMap::new(),
        })
        .collect()
}
