// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use super::{derived_metadata, gateway_kind, GATEWAY_API_GROUP};
use crate::{
    api::{
        ingress::IngressTLS,
        referencegrants::{ReferenceGrant, ReferenceGrantFrom, ReferenceGrantSpec, ReferenceGrantTo},
        Ingress,
    },
    configuration::GatewayConfiguration,
};

const MAX_NAME_LENGTH: usize = 63;
const SECRET_KIND: &str = "Secret";

/// Grant letting `gateway` read the TLS secret of `tls`. Lives next to the secret.
pub fn make_reference_grant(ingress: &Ingress, tls: &IngressTLS, gateway: &GatewayConfiguration) -> ReferenceGrant {
    ReferenceGrant {
        metadata: derived_metadata(ingress, grant_name(&tls.secret_name, &gateway.namespace), Some(tls.secret_namespace.clone()), None),
        spec: ReferenceGrantSpec {
            from: vec![ReferenceGrantFrom { group: GATEWAY_API_GROUP.to_owned(), kind: gateway_kind(), namespace: gateway.namespace.clone() }],
            to: vec![ReferenceGrantTo { group: String::new(), kind: SECRET_KIND.to_owned(), name: Some(tls.secret_name.clone()) }],
        },
    }
}

/// `<secret>-<gateway namespace>`, with the secret part cut so the result stays a valid object name.
fn grant_name(secret_name: &str, gateway_namespace: &str) -> String {
    let budget = MAX_NAME_LENGTH.saturating_sub(gateway_namespace.len() + 1);
    let secret: String = secret_name.chars().take(budget).collect();
    format!("{secret}-{gateway_namespace}")
}
