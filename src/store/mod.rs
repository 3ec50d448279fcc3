// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

mod events;
mod kube_store;

use async_trait::async_trait;
pub use events::{EventSink, KubeEventSink, Severity};
use kube::Resource;
pub use kube_store::KubeResourceStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store request failed: {0}")]
    Request(#[source] crate::Error),
}

impl From<kube::Error> for StoreError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) if response.code == 404 => StoreError::NotFound(response.message),
            kube::Error::Api(response) if response.code == 409 => StoreError::Conflict(response.message),
            e => StoreError::Request(e.into()),
        }
    }
}

/// Read through a watch cache, write to the API server.
#[async_trait]
pub trait ResourceStore<K>: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError>;
    async fn create(&self, resource: &K) -> Result<K, StoreError>;
    async fn update(&self, resource: &K) -> Result<K, StoreError>;
}

/// True when `resource` has a controller owner reference pointing at `owner`'s UID.
pub fn is_controlled_by<R, O>(resource: &R, owner: &O) -> bool
where
    R: Resource,
    O: Resource,
{
    let Some(owner_uid) = owner.meta().uid.as_deref() else {
        return false;
    };
    resource
        .meta()
        .owner_references
        .as_ref()
        .and_then(|references| references.iter().find(|reference| reference.controller == Some(true)))
        .is_some_and(|controller| controller.uid == owner_uid)
}
