// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{fmt::Debug, sync::Arc};

use kube::{Resource, ResourceExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use super::{semantically_equal, ControllerError};
use crate::{
    api::{HTTPRoute, Ingress, ReferenceGrant},
    common::{format_resource, LogContext, ResourceKey},
    store::{is_controlled_by, EventSink, ResourceStore, Severity},
};

type Result<T, E = ControllerError> = std::result::Result<T, E>;

/// A kind whose spec, labels and annotations are fully owned by this controller.
pub trait ManagedResource: Resource<DynamicType = ()> + Clone + Serialize + Debug + Send + Sync + 'static {
    fn copy_spec(&mut self, desired: &Self);

    /// Desired content laid over an observed copy. Everything else on the observed object is kept.
    fn overlay(&mut self, desired: &Self) {
        self.copy_spec(desired);
        self.meta_mut().labels.clone_from(&desired.meta().labels);
        self.meta_mut().annotations.clone_from(&desired.meta().annotations);
    }
}

impl ManagedResource for HTTPRoute {
    fn copy_spec(&mut self, desired: &Self) {
        self.spec = desired.spec.clone();
    }
}

impl ManagedResource for ReferenceGrant {
    fn copy_spec(&mut self, desired: &Self) {
        self.spec = desired.spec.clone();
    }
}

#[derive(TypedBuilder)]
pub struct Converger<K: ManagedResource> {
    controller_name: String,
    store: Arc<dyn ResourceStore<K>>,
    events: Arc<dyn EventSink>,
}

impl<K: ManagedResource> Converger<K> {
    /// Drives the stored object named like `desired` towards `desired` with at most one write.
    pub async fn converge(&self, owner: &Ingress, desired: K) -> Result<K> {
        self.converge_checked(owner, desired, false).await
    }

    /// Like [`Converger::converge`] but refuses to touch an existing object that `owner` does not control.
    pub async fn converge_owned(&self, owner: &Ingress, desired: K) -> Result<K> {
        self.converge_checked(owner, desired, true).await
    }

    async fn converge_checked(&self, owner: &Ingress, desired: K, ownership_required: bool) -> Result<K> {
        let kind = format_resource::<K>();
        let namespace = desired.namespace().unwrap_or_default();
        let name = desired.name_any();
        let resource_key = ResourceKey::from(&desired);
        let log_context = LogContext::<K>::new(&self.controller_name, &resource_key, None);
        let owner_ref = owner.object_ref(&());

        let observed = match self.store.get(&namespace, &name).await {
            Ok(observed) => observed,
            Err(e) => {
                warn!("{log_context} lookup failed {e:?}");
                self.events.record(&owner_ref, Severity::Warning, "LookupFailed", format!("Failed to read {kind} {name}: {e}")).await;
                return Err(e.into());
            },
        };

        let Some(observed) = observed else {
            return match self.store.create(&desired).await {
                Ok(created) => {
                    info!("{log_context} created");
                    self.events.record(&owner_ref, Severity::Normal, "Created", format!("Created {kind} \"{name}\"")).await;
                    Ok(created)
                },
                Err(e) => {
                    warn!("{log_context} create failed {e:?}");
                    self.events.record(&owner_ref, Severity::Warning, "CreationFailed", format!("Failed to create {kind}: {e}")).await;
                    Err(ControllerError::CreationFailed(format!("{kind} {namespace}/{name}"), e))
                },
            };
        };

        let log_context = LogContext::<K>::new(&self.controller_name, &resource_key, observed.resource_version());

        if ownership_required && !is_controlled_by(&observed, owner) {
            warn!("{log_context} not owned by {}/{}", owner.namespace().unwrap_or_default(), owner.name_any());
            self.events.record(&owner_ref, Severity::Warning, "NotOwned", format!("{kind} {name} not owned by this object")).await;
            return Err(ControllerError::NotOwned(format!("{kind} {namespace}/{name} not owned by {}", owner.name_any())));
        }

        if semantically_equal(&observed, &desired) {
            debug!("{log_context} up to date");
            return Ok(observed);
        }

        let mut update = observed;
        update.overlay(&desired);
        match self.store.update(&update).await {
            Ok(updated) => {
                info!("{log_context} updated");
                Ok(updated)
            },
            Err(e) => {
                warn!("{log_context} update failed {e:?}");
                self.events.record(&owner_ref, Severity::Warning, "UpdateFailed", format!("Failed to update {kind}: {e}")).await;
                Err(ControllerError::UpdateFailed(format!("{kind} {namespace}/{name}"), e))
            },
        }
    }
}
