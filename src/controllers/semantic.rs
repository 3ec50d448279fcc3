// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use kube::Resource;
use serde::Serialize;
use serde_json::Value;

/// Drops everything that means "unset": nulls, empty arrays and empty objects. Array elements keep their positions.
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(Value::Array(items.into_iter().map(|item| normalize(item).unwrap_or(Value::Null)).collect())),
        Value::Object(fields) => {
            let fields: serde_json::Map<String, Value> = fields.into_iter().filter_map(|(key, value)| normalize(value).map(|value| (key, value))).collect();
            (!fields.is_empty()).then_some(Value::Object(fields))
        },
        scalar => Some(scalar),
    }
}

fn normalized<T: Serialize + ?Sized>(value: &T) -> Option<Option<Value>> {
    serde_json::to_value(value).ok().map(normalize)
}

/// Deep equality where maps ignore key order, sequences keep theirs and unset equals empty.
/// Anything that fails to serialize is never equivalent.
pub fn values_equivalent<T: Serialize + ?Sized>(left: &T, right: &T) -> bool {
    match (normalized(left), normalized(right)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Compares the parts of two objects this controller owns: `spec` plus the labels and annotations.
/// Server managed metadata and the status never take part.
pub fn semantically_equal<K>(left: &K, right: &K) -> bool
where
    K: Resource + Serialize,
{
    let spec = |resource: &K| serde_json::to_value(resource).ok().map(|mut value| value.get_mut("spec").map(Value::take).and_then(normalize));
    match (spec(left), spec(right)) {
        (Some(left_spec), Some(right_spec)) if left_spec == right_spec => {},
        _ => return false,
    }
    values_equivalent(&left.meta().labels, &right.meta().labels) && values_equivalent(&left.meta().annotations, &right.meta().annotations)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use kube_core::ObjectMeta;

    use super::*;
    use crate::api::{
        gateways::{AllowedRoutes, Listener},
        httproutes::{HTTPRouteSpec, ParentReference},
        HTTPRoute,
    };

    fn route(hostnames: Vec<&str>, labels: Option<BTreeMap<String, String>>) -> HTTPRoute {
        HTTPRoute {
            metadata: ObjectMeta { name: Some("a.example.com".to_owned()), namespace: Some("default".to_owned()), labels, ..Default::default() },
            spec: HTTPRouteSpec {
                parent_refs: Some(vec![ParentReference { name: "knative-gateway".to_owned(), ..Default::default() }]),
                hostnames: Some(hostnames.into_iter().map(str::to_owned).collect()),
                rules: Some(vec![]),
            },
            status: None,
        }
    }

    #[test]
    fn test_server_metadata_is_ignored() {
        let desired = route(vec!["a.example.com"], None);
        let mut observed = desired.clone();
        observed.metadata.uid = Some("1234".to_owned());
        observed.metadata.resource_version = Some("42".to_owned());
        observed.metadata.generation = Some(3);
        observed.status = Some(Default::default());
        assert!(semantically_equal(&desired, &observed));
    }

    #[test]
    fn test_sequences_are_order_sensitive() {
        let left = route(vec!["a.example.com", "b.example.com"], None);
        let right = route(vec!["b.example.com", "a.example.com"], None);
        assert!(!semantically_equal(&left, &right));
    }

    #[test]
    fn test_labels_compare_by_content() {
        let left = route(vec!["a.example.com"], Some(BTreeMap::from([("a".to_owned(), "1".to_owned()), ("b".to_owned(), "2".to_owned())])));
        let mut right = left.clone();
        assert!(semantically_equal(&left, &right));
        right.metadata.labels = Some(BTreeMap::from([("a".to_owned(), "1".to_owned())]));
        assert!(!semantically_equal(&left, &right));
        right.metadata.labels = Some(BTreeMap::new());
        let unlabelled = route(vec!["a.example.com"], None);
        assert!(semantically_equal(&unlabelled, &right));
    }

    #[test]
    fn test_unset_equals_empty() {
        let desired = route(vec!["a.example.com"], None);
        let mut observed = desired.clone();
        observed.spec.rules = None;
        assert!(semantically_equal(&desired, &observed));

        let with_kinds = Listener { name: "kni-1".to_owned(), allowed_routes: Some(AllowedRoutes { namespaces: None, kinds: Some(vec![]) }), ..Default::default() };
        let without_kinds = Listener { name: "kni-1".to_owned(), allowed_routes: None, ..Default::default() };
        assert!(values_equivalent(&with_kinds, &without_kinds));
    }

    #[test]
    fn test_maps_ignore_key_order() {
        let left: Value = serde_json::from_str(r#"{"b": 1, "a": {"y": [1, 2], "x": null}}"#).unwrap();
        let right: Value = serde_json::from_str(r#"{"a": {"y": [1, 2]}, "b": 1}"#).unwrap();
        assert!(values_equivalent(&left, &right));
        let reordered: Value = serde_json::from_str(r#"{"a": {"y": [2, 1]}, "b": 1}"#).unwrap();
        assert!(!values_equivalent(&left, &reordered));
    }
}
