// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::fmt::Debug;

use async_trait::async_trait;
use futures::{future, StreamExt};
use kube::{
    api::PostParams,
    core::NamespaceResourceScope,
    runtime::{
        reflector::{self, ObjectRef, Store},
        watcher, WatchStreamExt,
    },
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use super::{ResourceStore, StoreError};
use crate::common::format_resource;

#[derive(TypedBuilder)]
pub struct KubeResourceStore<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    client: Client,
    cache: Store<K>,
}

impl<K> KubeResourceStore<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug + Send + Sync + 'static,
{
    /// Starts a reflector for `K` and returns a store reading from its cache.
    /// The reflector keeps running on the runtime until the process exits.
    pub fn spawn(client: Client, watcher_config: watcher::Config) -> Self {
        let (cache, writer) = reflector::store();
        let api = Api::<K>::all(client.clone());
        let stream = reflector::reflector(writer, watcher(api, watcher_config)).default_backoff().touched_objects().for_each(|event| {
            if let Err(e) = event {
                warn!("{} reflector error {e:?}", format_resource::<K>());
            }
            future::ready(())
        });
        tokio::spawn(stream);
        Self { client, cache }
    }

    pub async fn wait_until_ready(&self) -> crate::Result<()> {
        self.cache.wait_until_ready().await?;
        debug!("{} cache is ready", format_resource::<K>());
        Ok(())
    }

    fn api(&self, resource: &K) -> Api<K> {
        match resource.namespace() {
            Some(namespace) => Api::namespaced(self.client.clone(), &namespace),
            None => Api::default_namespaced(self.client.clone()),
        }
    }
}

#[async_trait]
impl<K> ResourceStore<K> for KubeResourceStore<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        Ok(self.cache.get(&ObjectRef::new(name).within(namespace)).map(|cached| K::clone(&cached)))
    }

    async fn create(&self, resource: &K) -> Result<K, StoreError> {
        Ok(self.api(resource).create(&PostParams::default(), resource).await?)
    }

    async fn update(&self, resource: &K) -> Result<K, StoreError> {
        Ok(self.api(resource).replace(&resource.name_any(), &PostParams::default(), resource).await?)
    }
}

#[cfg(test)]
mod tests {
    use http::{Request, Response};
    use kube::client::Body;
    use kube_core::ObjectMeta;
    use tower_test::mock;

    use super::*;
    use crate::api::{gateways::GatewaySpec, referencegrants::ReferenceGrantSpec, Gateway, ReferenceGrant};

    fn grant(name: &str) -> ReferenceGrant {
        ReferenceGrant {
            metadata: ObjectMeta { name: Some(name.to_owned()), namespace: Some("secrets".to_owned()), ..Default::default() },
            spec: ReferenceGrantSpec::default(),
        }
    }

    #[tokio::test]
    async fn test_get_reads_from_cache() {
        let (mock_service, _handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");
        let (cache, mut writer) = reflector::store();
        writer.apply_watcher_event(&watcher::Event::Apply(grant("tls-secret-istio-system")));
        let store = KubeResourceStore::<ReferenceGrant>::builder().client(client).cache(cache).build();

        let found = store.get("secrets", "tls-secret-istio-system").await.unwrap();
        assert_eq!(found, Some(grant("tls-secret-istio-system")));
        assert_eq!(store.get("other", "tls-secret-istio-system").await.unwrap(), None);
        assert_eq!(store.get("secrets", "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_conflict_is_classified() {
        let (mock_service, mut handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");
        let (cache, _writer) = reflector::store();
        let store = KubeResourceStore::<ReferenceGrant>::builder().client(client).cache(cache).build();

        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(request.method(), http::Method::POST);
            assert_eq!(request.uri().path(), "/apis/gateway.networking.k8s.io/v1beta1/namespaces/secrets/referencegrants");
            let status = serde_json::json!({
                "kind": "Status",
                "apiVersion": "v1",
                "status": "Failure",
                "message": "referencegrants \"tls-secret-istio-system\" already exists",
                "reason": "AlreadyExists",
                "code": 409
            });
            send.send_response(Response::builder().status(409).body(Body::from(serde_json::to_vec(&status).unwrap())).unwrap());
        });

        let result = store.create(&grant("tls-secret-istio-system")).await;
        server.await.unwrap();
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_by_name() {
        let (mock_service, mut handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");
        let (cache, _writer) = reflector::store();
        let store = KubeResourceStore::<ReferenceGrant>::builder().client(client).cache(cache).build();

        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(request.method(), http::Method::PUT);
            assert_eq!(request.uri().path(), "/apis/gateway.networking.k8s.io/v1beta1/namespaces/secrets/referencegrants/tls-secret-istio-system");
            let mut updated = grant("tls-secret-istio-system");
            updated.metadata.resource_version = Some("2".to_owned());
            send.send_response(Response::builder().body(Body::from(serde_json::to_vec(&updated).unwrap())).unwrap());
        });

        let updated = store.update(&grant("tls-secret-istio-system")).await.unwrap();
        server.await.unwrap();
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_gateway_without_namespace_is_written_to_default_namespace() {
        let (mock_service, mut handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");
        let (cache, _writer) = reflector::store();
        let store = KubeResourceStore::<Gateway>::builder().client(client).cache(cache).build();
        let gateway = Gateway::new("knative-gateway", GatewaySpec { gateway_class_name: "istio".to_owned(), ..Default::default() });

        let response = gateway.clone();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(request.method(), http::Method::PUT);
            assert_eq!(request.uri().path(), "/apis/gateway.networking.k8s.io/v1/namespaces/default/gateways/knative-gateway");
            send.send_response(Response::builder().body(Body::from(serde_json::to_vec(&response).unwrap())).unwrap());
        });

        let updated = store.update(&gateway).await.unwrap();
        server.await.unwrap();
        assert_eq!(updated.name_any(), "knative-gateway");
    }
}
