// SPDX-FileCopyrightText: © 2026 Ingressgate authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Ingressgate authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

mod resource_key;

use std::marker::PhantomData;

pub use resource_key::ResourceKey;

pub fn format_resource<R>() -> &'static str {
    std::any::type_name::<R>().split("::").last().unwrap_or_default()
}

pub struct LogContext<'a, T> {
    pub controller_name: &'a str,
    pub resource_key: &'a ResourceKey,
    pub version: Option<String>,
    pub resource_type: PhantomData<T>,
}

impl<T> std::fmt::Display for LogContext<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: resource_id: {},  version: {:?}", self.controller_name, format_resource::<T>(), self.resource_key, self.version)
    }
}

impl<'a, T> LogContext<'a, T> {
    pub fn new(controller_name: &'a str, resource_key: &'a ResourceKey, version: Option<String>) -> Self {
        Self { controller_name, resource_key, version, resource_type: PhantomData }
    }
}
