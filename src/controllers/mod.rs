// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::time::Duration;

mod converge;
pub mod ingress;
mod listeners;
mod semantic;

pub use converge::Converger;
pub use listeners::GatewayListenerSync;
use semantic::{semantically_equal, values_equivalent};

use crate::store::StoreError;

#[allow(dead_code)]
#[derive(thiserror::Error, Debug)]
pub enum ControllerError {
    Precondition(String),
    GatewayMissing(String),
    NotOwned(String),
    CreationFailed(String, #[source] StoreError),
    UpdateFailed(String, #[source] StoreError),
    GatewayUpdateFailed(String, #[source] StoreError),
    Store(#[from] StoreError),
    InvalidPayload(String),
    FinalizerPatchFailed(String),
}

/// Coarse classification deciding how the outer loop retries a failed pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    NotFound,
    Conflict,
    Store,
}

impl From<&StoreError> for ErrorKind {
    fn from(error: &StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::Request(_) => ErrorKind::Store,
        }
    }
}

impl ControllerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControllerError::Precondition(_) | ControllerError::InvalidPayload(_) => ErrorKind::Precondition,
            ControllerError::GatewayMissing(_) => ErrorKind::NotFound,
            ControllerError::NotOwned(_) => ErrorKind::Conflict,
            ControllerError::CreationFailed(_, e) | ControllerError::UpdateFailed(_, e) | ControllerError::GatewayUpdateFailed(_, e) | ControllerError::Store(e) => {
                e.into()
            },
            ControllerError::FinalizerPatchFailed(_) => ErrorKind::Store,
        }
    }

    pub fn requeue_after(&self) -> Duration {
        match self.kind() {
            ErrorKind::Precondition => RECONCILE_LONG_WAIT,
            ErrorKind::Conflict => RECONCILE_CONFLICT_WAIT,
            ErrorKind::NotFound | ErrorKind::Store => RECONCILE_ERROR_WAIT,
        }
    }
}

const RECONCILE_LONG_WAIT: Duration = Duration::from_secs(3600);
const RECONCILE_ERROR_WAIT: Duration = Duration::from_secs(100);
const RECONCILE_CONFLICT_WAIT: Duration = Duration::from_secs(5);

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ControllerError::Precondition("no tls".to_owned()).kind(), ErrorKind::Precondition);
        assert_eq!(ControllerError::GatewayMissing("istio-system/knative-gateway".to_owned()).kind(), ErrorKind::NotFound);
        assert_eq!(ControllerError::NotOwned("tls-secret-istio-system".to_owned()).kind(), ErrorKind::Conflict);
        assert_eq!(ControllerError::UpdateFailed("a.example.com".to_owned(), StoreError::Conflict("stale".to_owned())).kind(), ErrorKind::Conflict);
        assert_eq!(ControllerError::CreationFailed("a.example.com".to_owned(), StoreError::Request("boom".into())).kind(), ErrorKind::Store);

        assert_eq!(ControllerError::Precondition("no tls".to_owned()).requeue_after(), RECONCILE_LONG_WAIT);
        assert_eq!(ControllerError::NotOwned("grant".to_owned()).requeue_after(), RECONCILE_CONFLICT_WAIT);
        assert_eq!(ControllerError::GatewayMissing("gateway".to_owned()).requeue_after(), RECONCILE_ERROR_WAIT);
    }
}
