// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use kube::ResourceExt;

use super::{derived_metadata, gateway_kind, longest_host, GATEWAY_API_GROUP, REDIRECT_ROUTE_SUFFIX};
use crate::{
    api::{
        httproutes::{
            HTTPBackendRef, HTTPHeader, HTTPHeaderFilter, HTTPHeaderMatch, HTTPPathMatch, HTTPRequestRedirectFilter, HTTPRoute, HTTPRouteFilter, HTTPRouteFilterType,
            HTTPRouteMatch, HTTPRouteRule, HTTPRouteSpec, HeaderMatchType, ParentReference, PathMatchType,
        },
        ingress::{HTTPIngressPath, IngressRule},
        Ingress,
    },
    configuration::GatewayConfiguration,
    controllers::ControllerError,
};

const DEFAULT_PATH_PREFIX: &str = "/";
const REDIRECT_SCHEME: &str = "https";
const REDIRECT_PORT: i32 = 443;
const REDIRECT_STATUS_CODE: i32 = 301;
const SERVICE_KIND: &str = "Service";

pub fn gateway_parent_ref(gateway: &GatewayConfiguration, section_name: Option<String>) -> ParentReference {
    ParentReference {
        group: Some(GATEWAY_API_GROUP.to_owned()),
        kind: Some(gateway_kind()),
        namespace: Some(gateway.namespace.clone()),
        name: gateway.name.clone(),
        section_name,
        port: None,
    }
}

/// Route carrying the workload traffic of one rule, named after the rule's longest host.
pub fn make_http_route(ingress: &Ingress, rule: &IngressRule, parent_ref: ParentReference) -> HTTPRoute {
    let rules = rule_paths(rule).map(workload_rule).collect();
    HTTPRoute {
        metadata: derived_metadata(ingress, longest_host(&rule.hosts).to_owned(), ingress.namespace(), Some(rule.visibility)),
        spec: route_spec(rule, parent_ref, rules),
        status: None,
    }
}

/// Route answering plain HTTP requests of one rule with a permanent redirect to HTTPS.
pub fn make_redirect_http_route(ingress: &Ingress, rule: &IngressRule, parent_ref: ParentReference) -> Result<HTTPRoute, ControllerError> {
    if ingress.spec.tls.is_empty() {
        return Err(ControllerError::Precondition(format!(
            "{}: no TLS configuration provided in spec.tls, unable to build the HTTPS redirect route",
            ingress.name_any()
        )));
    }

    let rules = rule_paths(rule).map(redirect_rule).collect();
    Ok(HTTPRoute {
        metadata: derived_metadata(ingress, longest_host(&rule.hosts).to_owned() + REDIRECT_ROUTE_SUFFIX, ingress.namespace(), Some(rule.visibility)),
        spec: route_spec(rule, parent_ref, rules),
        status: None,
    })
}

fn rule_paths(rule: &IngressRule) -> impl Iterator<Item = &HTTPIngressPath> {
    rule.http.iter().flat_map(|http| http.paths.iter())
}

fn route_spec(rule: &IngressRule, parent_ref: ParentReference, rules: Vec<HTTPRouteRule>) -> HTTPRouteSpec {
    HTTPRouteSpec { parent_refs: Some(vec![parent_ref]), hostnames: Some(rule.hosts.clone()), rules: Some(rules) }
}

fn workload_rule(path: &HTTPIngressPath) -> HTTPRouteRule {
    let filters = path.append_headers.as_ref().map(|headers| vec![header_modifier(headers)]);

    let backend_refs = path
        .splits
        .iter()
        .map(|split| HTTPBackendRef {
            group: Some(String::new()),
            kind: Some(SERVICE_KIND.to_owned()),
            name: split.service_name.clone(),
            namespace: None,
            port: Some(split.port_number()),
            weight: Some(split.percent),
            filters: Some(vec![header_modifier(&split.append_headers)]),
        })
        .collect();

    HTTPRouteRule { matches: Some(path_matches(path)), filters, backend_refs: Some(backend_refs) }
}

fn redirect_rule(path: &HTTPIngressPath) -> HTTPRouteRule {
    let redirect = HTTPRouteFilter {
        type_: HTTPRouteFilterType::RequestRedirect,
        request_header_modifier: None,
        request_redirect: Some(HTTPRequestRedirectFilter {
            scheme: Some(REDIRECT_SCHEME.to_owned()),
            hostname: None,
            port: Some(REDIRECT_PORT),
            status_code: Some(REDIRECT_STATUS_CODE),
        }),
    };
    HTTPRouteRule { matches: Some(path_matches(path)), filters: Some(vec![redirect]), backend_refs: None }
}

fn path_matches(path: &HTTPIngressPath) -> Vec<HTTPRouteMatch> {
    let prefix = if path.path.is_empty() { DEFAULT_PATH_PREFIX } else { path.path.as_str() };

    let headers = path
        .headers
        .iter()
        .rev()
        .map(|(name, header)| HTTPHeaderMatch { type_: Some(HeaderMatchType::Exact), name: name.clone(), value: header.exact.clone() })
        .collect();

    vec![HTTPRouteMatch {
        path: Some(HTTPPathMatch { type_: Some(PathMatchType::PathPrefix), value: Some(prefix.to_owned()) }),
        headers: Some(headers),
    }]
}

/// Header lists are emitted sorted by name, descending.
fn header_modifier(headers: &BTreeMap<String, String>) -> HTTPRouteFilter {
    let set = headers.iter().rev().map(|(name, value)| HTTPHeader { name: name.clone(), value: value.clone() }).collect();
    HTTPRouteFilter {
        type_: HTTPRouteFilterType::RequestHeaderModifier,
        request_header_modifier: Some(HTTPHeaderFilter { set: Some(set), add: None, remove: None }),
        request_redirect: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ingress::IngressTLS;

    const INGRESS: &str = r#"
apiVersion: networking.internal.knative.dev/v1alpha1
kind: Ingress
metadata:
  name: hello
  namespace: default
  uid: 8a7e9a9d-1c7f-4bd6-9a4f-7f5a1c2e0d11
  labels:
    serving.knative.dev/route: hello
spec:
  httpOption: Enabled
  rules:
  - hosts:
    - a.example.com
    visibility: ExternalIP
    http:
      paths:
      - splits:
        - serviceNamespace: default
          serviceName: svc1
          servicePort: 80
          percent: 100
"#;

    fn external_gateway() -> GatewayConfiguration {
        GatewayConfiguration { namespace: "istio-system".to_owned(), name: "knative-gateway".to_owned(), http_listener_name: "http".to_owned() }
    }

    fn ingress(yaml: &str) -> Ingress {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_single_split_route() {
        let ingress = ingress(INGRESS);
        let rule = &ingress.spec.rules[0];
        let route = make_http_route(&ingress, rule, gateway_parent_ref(&external_gateway(), None));

        assert_eq!(route.metadata.name.as_deref(), Some("a.example.com"));
        assert_eq!(route.metadata.namespace.as_deref(), Some("default"));
        assert_eq!(route.spec.hostnames, Some(vec!["a.example.com".to_owned()]));

        let parent = &route.spec.parent_refs.as_ref().unwrap()[0];
        assert_eq!(parent.group.as_deref(), Some(GATEWAY_API_GROUP));
        assert_eq!(parent.kind.as_deref(), Some("Gateway"));
        assert_eq!(parent.namespace.as_deref(), Some("istio-system"));
        assert_eq!(parent.name, "knative-gateway");
        assert_eq!(parent.section_name, None);

        let rules = route.spec.rules.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].filters, None);

        let matches = rules[0].matches.as_ref().unwrap();
        assert_eq!(matches.len(), 1);
        let path = matches[0].path.as_ref().unwrap();
        assert_eq!(path.type_, Some(PathMatchType::PathPrefix));
        assert_eq!(path.value.as_deref(), Some("/"));

        let backends = rules[0].backend_refs.as_ref().unwrap();
        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].name, "svc1");
        assert_eq!(backends[0].group.as_deref(), Some(""));
        assert_eq!(backends[0].kind.as_deref(), Some("Service"));
        assert_eq!(backends[0].port, Some(80));
        assert_eq!(backends[0].weight, Some(100));
        let filters = backends[0].filters.as_ref().unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].type_, HTTPRouteFilterType::RequestHeaderModifier);
    }

    #[test]
    fn test_headers_sorted_descending_and_deterministic() {
        let yaml = r#"
apiVersion: networking.internal.knative.dev/v1alpha1
kind: Ingress
metadata:
  name: hello
  namespace: default
  uid: 8a7e9a9d-1c7f-4bd6-9a4f-7f5a1c2e0d11
spec:
  rules:
  - hosts:
    - hello.default.svc.cluster.local
    - hello.default.svc
    visibility: ClusterLocal
    http:
      paths:
      - path: /api
        headers:
          k-network-hash:
            exact: override
          accept:
            exact: text/html
          x-version:
            exact: "2"
        appendHeaders:
          K-Network-Hash: abcd
          A-Header: a
        splits:
        - serviceNamespace: default
          serviceName: svc1
          servicePort: "8080"
          percent: 70
          appendHeaders:
            Knative-Serving-Revision: svc1
            Knative-Serving-Namespace: default
        - serviceNamespace: default
          serviceName: svc2
          servicePort: http
          percent: 30
"#;
        let ingress = ingress(yaml);
        let rule = &ingress.spec.rules[0];
        let first = make_http_route(&ingress, rule, gateway_parent_ref(&external_gateway(), None));
        let second = make_http_route(&ingress, rule, gateway_parent_ref(&external_gateway(), None));
        assert_eq!(serde_json::to_vec(&first.spec).unwrap(), serde_json::to_vec(&second.spec).unwrap());

        assert_eq!(first.metadata.name.as_deref(), Some("hello.default.svc.cluster.local"));
        let labels = first.metadata.labels.as_ref().unwrap();
        assert_eq!(labels.get(crate::resources::VISIBILITY_LABEL).map(String::as_str), Some("cluster-local"));

        let rules = first.spec.rules.unwrap();
        let matches = rules[0].matches.as_ref().unwrap();
        assert_eq!(matches[0].path.as_ref().unwrap().value.as_deref(), Some("/api"));
        let header_names: Vec<_> = matches[0].headers.as_ref().unwrap().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(header_names, vec!["x-version", "k-network-hash", "accept"]);
        assert!(matches[0].headers.as_ref().unwrap().iter().all(|h| h.type_ == Some(HeaderMatchType::Exact)));

        let path_filter = &rules[0].filters.as_ref().unwrap()[0];
        let set: Vec<_> = path_filter.request_header_modifier.as_ref().unwrap().set.as_ref().unwrap().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(set, vec!["K-Network-Hash", "A-Header"]);

        let backends = rules[0].backend_refs.as_ref().unwrap();
        assert_eq!(backends[0].port, Some(8080));
        assert_eq!(backends[1].port, Some(0));
        let split_headers: Vec<_> =
            backends[0].filters.as_ref().unwrap()[0].request_header_modifier.as_ref().unwrap().set.as_ref().unwrap().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(split_headers, vec!["Knative-Serving-Revision", "Knative-Serving-Namespace"]);
        assert_eq!(backends[1].filters.as_ref().unwrap()[0].request_header_modifier.as_ref().unwrap().set, Some(vec![]));
    }

    #[test]
    fn test_redirect_route() {
        let mut ingress = ingress(INGRESS);
        ingress.spec.tls = vec![IngressTLS { hosts: vec!["a.example.com".to_owned()], secret_name: "tls-secret".to_owned(), secret_namespace: "default".to_owned() }];
        let gateway = external_gateway();
        let route = make_redirect_http_route(&ingress, &ingress.spec.rules[0], gateway_parent_ref(&gateway, Some(gateway.http_listener_name.clone()))).unwrap();

        assert_eq!(route.metadata.name.as_deref(), Some("a.example.com-redirect"));
        assert_eq!(route.spec.parent_refs.as_ref().unwrap()[0].section_name.as_deref(), Some("http"));
        let rules = route.spec.rules.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].backend_refs, None);
        let filters = rules[0].filters.as_ref().unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].type_, HTTPRouteFilterType::RequestRedirect);
        assert_eq!(
            filters[0].request_redirect,
            Some(HTTPRequestRedirectFilter { scheme: Some("https".to_owned()), hostname: None, port: Some(443), status_code: Some(301) })
        );
    }

    #[test]
    fn test_redirect_without_tls_is_precondition_failure() {
        let ingress = ingress(INGRESS);
        let result = make_redirect_http_route(&ingress, &ingress.spec.rules[0], gateway_parent_ref(&external_gateway(), None));
        assert!(matches!(result, Err(ControllerError::Precondition(_))));
    }
}
