// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt, StreamExt};
use k8s_openapi::{
    apimachinery::pkg::apis::meta::v1::{Condition, Time},
    chrono::Utc,
};
use kube::{
    api::{Api, Patch, PatchParams},
    runtime::{controller::Action, finalizer, watcher::Config, Controller},
    Resource, ResourceExt,
};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::{ControllerError, Converger, GatewayListenerSync, RECONCILE_LONG_WAIT};
use crate::{
    api::{
        ingress::{HTTPOption, IngressStatus, IngressVisibility},
        HTTPRoute, Ingress, ReferenceGrant,
    },
    common::{LogContext, ResourceKey},
    configuration::GatewaysConfiguration,
    resources::{gateway_parent_ref, listener_name, make_http_route, make_listeners, make_redirect_http_route, make_reference_grant},
    store::{EventSink, Severity},
};

type Result<T, E = ControllerError> = std::result::Result<T, E>;

const LOAD_BALANCER_READY_CONDITION: &str = "LoadBalancerReady";
const NETWORK_CONFIGURED_CONDITION: &str = "NetworkConfigured";
const READY_CONDITION: &str = "Ready";
const CONFIGURED_REASON: &str = "Reconciled";

/// Translates one [`Ingress`] into grants, gateway listeners and routes.
#[derive(TypedBuilder)]
pub struct IngressReconciler {
    gateways: GatewaysConfiguration,
    routes: Converger<HTTPRoute>,
    grants: Converger<ReferenceGrant>,
    listeners: GatewayListenerSync,
    events: Arc<dyn EventSink>,
}

impl IngressReconciler {
    pub async fn reconcile(&self, ingress: &Ingress) -> Result<IngressStatus> {
        let external = &self.gateways.external;

        let mut listeners = vec![];
        for tls in &ingress.spec.tls {
            self.grants.converge_owned(ingress, make_reference_grant(ingress, tls, external)).await?;
            listeners.extend(make_listeners(ingress, tls));
        }
        if listeners.is_empty() {
            self.listeners.clear(ingress, external).await?;
        } else {
            self.listeners.upsert(ingress, external, listeners).await?;
        }

        for rule in &ingress.spec.rules {
            let gateway = self.gateways.for_visibility(rule.visibility);
            // only the external gateway carries TLS listeners
            let https_only = ingress.spec.http_option == HTTPOption::Redirected && rule.visibility == IngressVisibility::ExternalIP;

            let section_name = https_only.then(|| listener_name(ingress));
            self.routes.converge(ingress, make_http_route(ingress, rule, gateway_parent_ref(gateway, section_name))).await?;

            if https_only {
                let redirect = match make_redirect_http_route(ingress, rule, gateway_parent_ref(gateway, Some(gateway.http_listener_name.clone()))) {
                    Ok(redirect) => redirect,
                    Err(e) => {
                        self.events.record(&ingress.object_ref(&()), Severity::Warning, "InvalidSpec", e.to_string()).await;
                        return Err(e);
                    },
                };
                self.routes.converge(ingress, redirect).await?;
            }
        }

        Ok(configured_status(ingress))
    }

    /// Routes and grants go away with their owner; only the listeners on the shared gateway need explicit removal.
    pub async fn finalize(&self, ingress: &Ingress) -> Result<()> {
        self.listeners.clear(ingress, &self.gateways.external).await
    }
}

/// Status after a successful pass: every condition Knative waits on is True. A transition time only moves when its
/// condition changes.
fn configured_status(ingress: &Ingress) -> IngressStatus {
    let previous = ingress.status.as_ref().map(|status| status.conditions.as_slice()).unwrap_or_default();
    let now = Time(Utc::now());
    let conditions = [LOAD_BALANCER_READY_CONDITION, NETWORK_CONFIGURED_CONDITION, READY_CONDITION]
        .into_iter()
        .map(|type_| {
            let last_transition_time = previous
                .iter()
                .find(|condition| condition.type_ == type_ && condition.status == "True")
                .map_or_else(|| now.clone(), |condition| condition.last_transition_time.clone());
            Condition {
                last_transition_time,
                message: "Gateway API resources are configured".to_owned(),
                observed_generation: ingress.metadata.generation,
                reason: CONFIGURED_REASON.to_owned(),
                status: "True".to_owned(),
                type_: type_.to_owned(),
            }
        })
        .collect();
    IngressStatus { observed_generation: ingress.metadata.generation, conditions }
}

#[derive(TypedBuilder)]
pub struct IngressControllerContext {
    client: kube::Client,
    controller_name: String,
    reconciler: IngressReconciler,
}

#[derive(TypedBuilder)]
pub struct IngressController {
    ctx: Arc<IngressControllerContext>,
    #[builder(default)]
    watch_namespace: Option<String>,
}

impl IngressController {
    pub fn get_controller(&self) -> BoxFuture<()> {
        let client = self.ctx.client.clone();
        let api = match &self.watch_namespace {
            Some(namespace) => Api::<Ingress>::namespaced(client.clone(), namespace),
            None => Api::<Ingress>::all(client.clone()),
        };

        Controller::new(api, Config::default())
            .owns(Api::<HTTPRoute>::all(client.clone()), Config::default())
            .owns(Api::<ReferenceGrant>::all(client), Config::default())
            .shutdown_on_signal()
            .run(Self::reconcile_ingress, Self::error_policy, Arc::clone(&self.ctx))
            .for_each(|result| {
                match result {
                    Ok((object, action)) => debug!("Reconciled {object} {action:?}"),
                    Err(e) => debug!("Reconcile loop error {e:?}"),
                }
                futures::future::ready(())
            })
            .boxed()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn error_policy(ingress: Arc<Ingress>, err: &ControllerError, _ctx: Arc<IngressControllerContext>) -> Action {
        let requeue_after = err.requeue_after();
        warn!("Ingress {}/{} failed {err} ({:?}), retrying in {requeue_after:?}", ingress.namespace().unwrap_or_default(), ingress.name_any(), err.kind());
        Action::requeue(requeue_after)
    }

    async fn reconcile_ingress(ingress: Arc<Ingress>, ctx: Arc<IngressControllerContext>) -> Result<Action> {
        let uid = ingress.metadata.uid.clone().ok_or(ControllerError::InvalidPayload("Uid must be present".to_owned()))?;
        Uuid::parse_str(&uid).map_err(|e| ControllerError::InvalidPayload(format!("Uid in wrong format {e}")))?;
        let namespace = ingress.namespace().ok_or(ControllerError::InvalidPayload("Namespace must be present".to_owned()))?;

        let resource_key = ResourceKey::from(&*ingress);
        let log_context = LogContext::<Ingress>::new(&ctx.controller_name, &resource_key, ingress.resource_version());
        info!("{log_context} reconcile");

        let api = Api::<Ingress>::namespaced(ctx.client.clone(), &namespace);
        let reconcile_ctx = Arc::clone(&ctx);
        let result = finalizer::finalizer(&api, &ctx.controller_name, ingress, |event| async move {
            match event {
                finalizer::Event::Apply(ingress) => {
                    let status = reconcile_ctx.reconciler.reconcile(&ingress).await?;
                    Self::patch_status(&reconcile_ctx, &ingress, status).await?;
                    Result::<Action>::Ok(Action::requeue(RECONCILE_LONG_WAIT))
                },
                finalizer::Event::Cleanup(ingress) => {
                    reconcile_ctx.reconciler.finalize(&ingress).await?;
                    Result::<Action>::Ok(Action::await_change())
                },
            }
        })
        .await;
        debug!("{log_context} reconcile finished {}", result.is_ok());

        result.map_err(|e| match e {
            finalizer::Error::ApplyFailed(e) | finalizer::Error::CleanupFailed(e) => e,
            e => ControllerError::FinalizerPatchFailed(e.to_string()),
        })
    }

    async fn patch_status(ctx: &IngressControllerContext, ingress: &Ingress, status: IngressStatus) -> Result<()> {
        if ingress.status.as_ref() == Some(&status) {
            return Ok(());
        }
        let namespace = ingress.namespace().unwrap_or_default();
        let api = Api::<Ingress>::namespaced(ctx.client.clone(), &namespace);
        let patch = serde_json::json!({
            "apiVersion": Ingress::api_version(&()),
            "kind": Ingress::kind(&()),
            "status": status,
        });
        api.patch_status(&ingress.name_any(), &PatchParams::apply(&ctx.controller_name).force(), &Patch::Apply(&patch)).await.map_err(|e| {
            warn!("Ingress {namespace}/{} status patch failed {e:?}", ingress.name_any());
            ControllerError::Store(e.into())
        })?;
        Ok(())
    }
}
