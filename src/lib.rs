// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use kube::{runtime::watcher, Client};
use tracing::info;

pub mod api;
mod common;
pub mod configuration;
mod controllers;
mod resources;
mod store;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;

use api::{Gateway, HTTPRoute, ReferenceGrant};
use configuration::Configuration;
use controllers::{
    ingress::{IngressController, IngressControllerContext, IngressReconciler},
    Converger, GatewayListenerSync,
};
use store::{EventSink, KubeEventSink, KubeResourceStore, ResourceStore};

pub async fn start(configuration: Configuration) -> Result<()> {
    info!("Ingressgate started");
    let client = Client::try_default().await?;
    let controller_name = configuration.controller_name.clone();

    let route_store = Arc::new(KubeResourceStore::<HTTPRoute>::spawn(client.clone(), watcher::Config::default()));
    let grant_store = Arc::new(KubeResourceStore::<ReferenceGrant>::spawn(client.clone(), watcher::Config::default()));
    let gateway_store = Arc::new(KubeResourceStore::<Gateway>::spawn(client.clone(), watcher::Config::default()));
    tokio::try_join!(route_store.wait_until_ready(), grant_store.wait_until_ready(), gateway_store.wait_until_ready())?;
    info!("Caches ready");

    let events: Arc<dyn EventSink> = Arc::new(KubeEventSink::new(client.clone(), &controller_name));

    let reconciler = IngressReconciler::builder()
        .gateways(configuration.gateways.clone())
        .routes(Converger::builder().controller_name(controller_name.clone()).store(route_store as Arc<dyn ResourceStore<HTTPRoute>>).events(Arc::clone(&events)).build())
        .grants(Converger::builder().controller_name(controller_name.clone()).store(grant_store as Arc<dyn ResourceStore<ReferenceGrant>>).events(Arc::clone(&events)).build())
        .listeners(
            GatewayListenerSync::builder().controller_name(controller_name.clone()).store(gateway_store as Arc<dyn ResourceStore<Gateway>>).events(Arc::clone(&events)).build(),
        )
        .events(events)
        .build();

    let ingress_controller = IngressController::builder()
        .ctx(Arc::new(IngressControllerContext::builder().client(client).controller_name(controller_name).reconciler(reconciler).build()))
        .watch_namespace(configuration.watch_namespace.clone())
        .build();

    info!("Ingress controller...started");
    ingress_controller.get_controller().await;
    info!("Ingress controller...stopped");
    Ok(())
}
