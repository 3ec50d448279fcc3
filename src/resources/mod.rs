// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

//! Pure derivation of the desired Gateway API objects from an [`Ingress`]. Nothing in here performs I/O; building the
//! same intent twice yields identical objects.
mod http_route;
mod listener;
mod reference_grant;

use std::collections::BTreeMap;

pub use http_route::{gateway_parent_ref, make_http_route, make_redirect_http_route};
use kube::{Resource, ResourceExt};
use kube_core::ObjectMeta;
pub use listener::{listener_name, make_listeners};
pub use reference_grant::make_reference_grant;

use crate::api::{gateways::Gateway, ingress::IngressVisibility, Ingress};

pub const VISIBILITY_LABEL: &str = "networking.knative.dev/visibility";
pub const CLUSTER_LOCAL_VISIBILITY: &str = "cluster-local";
pub const LAST_APPLIED_CONFIGURATION_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";
pub const LISTENER_PREFIX: &str = "kni-";
pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";
pub const REDIRECT_ROUTE_SUFFIX: &str = "-redirect";
pub const NAMESPACE_NAME_LABEL: &str = "kubernetes.io/metadata.name";

/// Longest hostname of a rule; the first one wins a tie. Empty when the rule has no hosts.
pub fn longest_host(hosts: &[String]) -> &str {
    hosts.iter().fold("", |longest, host| if host.len() > longest.len() { host } else { longest })
}

pub fn visibility_label_value(visibility: IngressVisibility) -> &'static str {
    match visibility {
        IngressVisibility::ExternalIP => "",
        IngressVisibility::ClusterLocal => CLUSTER_LOCAL_VISIBILITY,
    }
}

fn gateway_kind() -> String {
    Gateway::kind(&()).into_owned()
}

/// Metadata shared by every object derived from `ingress`: intent labels plus the visibility label, intent annotations
/// minus the client side apply bookkeeping, and a controller reference back to the intent.
fn derived_metadata(ingress: &Ingress, name: String, namespace: Option<String>, visibility: Option<IngressVisibility>) -> ObjectMeta {
    let mut labels = ingress.labels().clone();
    if let Some(visibility) = visibility {
        labels.insert(VISIBILITY_LABEL.to_owned(), visibility_label_value(visibility).to_owned());
    }

    let annotations: BTreeMap<String, String> =
        ingress.annotations().iter().filter(|(key, _)| *key != LAST_APPLIED_CONFIGURATION_ANNOTATION).map(|(k, v)| (k.clone(), v.clone())).collect();

    ObjectMeta {
        name: Some(name),
        namespace,
        labels: (!labels.is_empty()).then_some(labels),
        annotations: (!annotations.is_empty()).then_some(annotations),
        owner_references: ingress.controller_owner_ref(&()).map(|owner| vec![owner]),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_host() {
        let hosts = vec!["a.example.com".to_owned(), "a.ns.svc.cluster.local".to_owned(), "b.ns.svc.cluster.loca1".to_owned()];
        assert_eq!(longest_host(&hosts), "a.ns.svc.cluster.local");
        assert_eq!(longest_host(&["a.example.com".to_owned()]), "a.example.com");
        assert_eq!(longest_host(&[]), "");
    }

    #[test]
    fn test_derived_metadata_filters_annotations() {
        let mut ingress = Ingress::new("hello", Default::default());
        ingress.metadata.namespace = Some("default".to_owned());
        ingress.metadata.uid = Some("8a7e9a9d-1c7f-4bd6-9a4f-7f5a1c2e0d11".to_owned());
        ingress.metadata.labels = Some(BTreeMap::from([("app".to_owned(), "hello".to_owned())]));
        ingress.metadata.annotations = Some(BTreeMap::from([
            (LAST_APPLIED_CONFIGURATION_ANNOTATION.to_owned(), "{}".to_owned()),
            ("networking.knative.dev/ingress.class".to_owned(), "gateway-api.ingress.networking.knative.dev".to_owned()),
        ]));

        let metadata = derived_metadata(&ingress, "a.example.com".to_owned(), Some("default".to_owned()), Some(IngressVisibility::ClusterLocal));
        let labels = metadata.labels.unwrap();
        assert_eq!(labels.get("app").map(String::as_str), Some("hello"));
        assert_eq!(labels.get(VISIBILITY_LABEL).map(String::as_str), Some(CLUSTER_LOCAL_VISIBILITY));
        let annotations = metadata.annotations.unwrap();
        assert_eq!(annotations.len(), 1);
        assert!(!annotations.contains_key(LAST_APPLIED_CONFIGURATION_ANNOTATION));

        let owner = &metadata.owner_references.unwrap()[0];
        assert_eq!(owner.kind, "Ingress");
        assert_eq!(owner.api_version, "networking.internal.knative.dev/v1alpha1");
        assert_eq!(owner.controller, Some(true));
        assert_eq!(owner.uid, "8a7e9a9d-1c7f-4bd6-9a4f-7f5a1c2e0d11");
    }
}
