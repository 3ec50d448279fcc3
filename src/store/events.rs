// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::{
    runtime::events::{Event, EventType, Recorder, Reporter},
    Client,
};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
}

/// Operator facing diagnostics. Recording never fails the caller.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, owner: &ObjectReference, severity: Severity, reason: &str, message: String);
}

#[derive(Clone)]
pub struct KubeEventSink {
    recorder: Recorder,
}

impl KubeEventSink {
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter { controller: controller_name.to_owned(), instance: std::env::var("CONTROLLER_POD_NAME").ok() };
        Self { recorder: Recorder::new(client, reporter) }
    }
}

#[async_trait]
impl EventSink for KubeEventSink {
    async fn record(&self, owner: &ObjectReference, severity: Severity, reason: &str, message: String) {
        let event = Event {
            type_: match severity {
                Severity::Normal => EventType::Normal,
                Severity::Warning => EventType::Warning,
            },
            reason: reason.to_owned(),
            note: Some(message),
            action: "Reconcile".to_owned(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, owner).await {
            warn!("Unable to publish {reason} event for {:?}/{:?} {e:?}", owner.namespace, owner.name);
        }
    }
}
