// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::AuthGateway;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AuthGateway>,
}

impl AppState {
    pub fn new(gateway: AuthGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by an in-memory upstream and the default cache TTL.
    pub(crate) fn for_tests<I, S>(trusted: I, upstream: crate::auth::testing::FakeUpstream) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        use crate::auth::{cache::DEFAULT_CACHE_TTL, IdentityCache, IdentityValidator, TrustedNetworks};

        let cache = Arc::new(IdentityCache::new(DEFAULT_CACHE_TTL));
        let validator = IdentityValidator::new(Arc::new(upstream), cache);
        Self::new(AuthGateway::new(
            TrustedNetworks::from_entries(trusted),
            validator,
        ))
    }
}
