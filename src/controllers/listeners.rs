// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{collections::BTreeMap, sync::Arc};

use kube::{Resource, ResourceExt};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use super::{values_equivalent, ControllerError};
use crate::{
    api::{Gateway, Ingress, Listener},
    common::{LogContext, ResourceKey},
    configuration::GatewayConfiguration,
    resources::listener_name,
    store::{EventSink, ResourceStore, Severity},
};

type Result<T, E = ControllerError> = std::result::Result<T, E>;

/// Merges `desired` into the shared listener list by name. Listeners with other names are never touched, matching ones
/// are replaced where they stand and the rest are appended. Returns whether the list changed.
///
/// Listeners that share a name collapse onto the last one of them. Owned listeners that are no longer desired are left
/// in place; only [`clear_listeners`] removes entries.
pub fn upsert_listeners(listeners: &mut Vec<Listener>, desired: Vec<Listener>) -> bool {
    let mut pending: BTreeMap<String, Listener> = desired.into_iter().map(|listener| (listener.name.clone(), listener)).collect();
    let mut dirty = false;

    for existing in listeners.iter_mut() {
        let Some(wanted) = pending.remove(&existing.name) else {
            continue;
        };
        if !values_equivalent(existing, &wanted) {
            *existing = wanted;
            dirty = true;
        }
    }

    if !pending.is_empty() {
        listeners.extend(pending.into_values());
        dirty = true;
    }
    dirty
}

/// Removes every listener `owns` accepts, swapping the last entry into each freed slot. The order of the remaining
/// entries is not preserved. Returns whether the list changed.
pub fn clear_listeners(listeners: &mut Vec<Listener>, owns: impl Fn(&Listener) -> bool) -> bool {
    let before = listeners.len();
    for index in (0..listeners.len()).rev() {
        if owns(&listeners[index]) {
            listeners.swap_remove(index);
        }
    }
    listeners.len() != before
}

/// Applies the listener merge to a shared gateway and writes the whole object back when it changed.
#[derive(TypedBuilder)]
pub struct GatewayListenerSync {
    controller_name: String,
    store: Arc<dyn ResourceStore<Gateway>>,
    events: Arc<dyn EventSink>,
}

impl GatewayListenerSync {
    pub async fn upsert(&self, owner: &Ingress, gateway_config: &GatewayConfiguration, listeners: Vec<Listener>) -> Result<()> {
        let gateway_id = format!("{}/{}", gateway_config.namespace, gateway_config.name);
        let Some(gateway) = self.fetch(owner, gateway_config).await? else {
            warn!("Gateway {gateway_id} does not exist");
            self.events.record(&owner.object_ref(&()), Severity::Warning, "GatewayMissing", format!("Unable to update Gateway {gateway_id}")).await;
            return Err(ControllerError::GatewayMissing(gateway_id));
        };

        let mut update = gateway;
        if !upsert_listeners(&mut update.spec.listeners, listeners) {
            debug!("Gateway {gateway_id} listeners up to date for {}", owner.name_any());
            return Ok(());
        }
        self.write(owner, &update, "Failed to update Gateway").await
    }

    pub async fn clear(&self, owner: &Ingress, gateway_config: &GatewayConfiguration) -> Result<()> {
        let Some(gateway) = self.fetch(owner, gateway_config).await? else {
            debug!("Gateway {}/{} is gone, nothing to clear", gateway_config.namespace, gateway_config.name);
            return Ok(());
        };

        let owned_name = listener_name(owner);
        let mut update = gateway;
        if !clear_listeners(&mut update.spec.listeners, |listener| listener.name == owned_name) {
            return Ok(());
        }
        self.write(owner, &update, "Failed to remove Listener from Gateway").await
    }

    async fn fetch(&self, owner: &Ingress, gateway_config: &GatewayConfiguration) -> Result<Option<Gateway>> {
        match self.store.get(&gateway_config.namespace, &gateway_config.name).await {
            Ok(gateway) => Ok(gateway),
            Err(e) => {
                warn!("Gateway {}/{} lookup failed {e:?}", gateway_config.namespace, gateway_config.name);
                self.events
                    .record(&owner.object_ref(&()), Severity::Warning, "LookupFailed", format!("Failed to read Gateway {}/{}: {e}", gateway_config.namespace, gateway_config.name))
                    .await;
                Err(e.into())
            },
        }
    }

    async fn write(&self, owner: &Ingress, update: &Gateway, failure: &str) -> Result<()> {
        let resource_key = ResourceKey::from(update);
        let log_context = LogContext::<Gateway>::new(&self.controller_name, &resource_key, update.resource_version());
        match self.store.update(update).await {
            Ok(_) => {
                info!("{log_context} listeners written for {} ({} listeners)", owner.name_any(), update.spec.listeners.len());
                Ok(())
            },
            Err(e) => {
                warn!("{log_context} listener update failed {e:?}");
                self.events.record(&owner.object_ref(&()), Severity::Warning, "GatewayUpdateFailed", format!("{failure} {resource_key}: {e}")).await;
                Err(ControllerError::GatewayUpdateFailed(resource_key.to_string(), e))
            },
        }
    }
}
