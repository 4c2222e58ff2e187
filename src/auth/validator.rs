// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token validation with caching.
//!
//! ## Flow
//!
//! 1. Look the raw token up in the identity cache; a hit makes no network call
//! 2. On a miss, ask the identity provider who owns the token
//! 3. Fetch the owner's directory profile
//! 4. Merge both into one identity and store it in the cache
//!
//! Failures in steps 2 and 3 end the request; nothing is cached for them and
//! nothing is retried. Two concurrent misses for the same token both go
//! upstream and both write the cache; the last write wins.

use std::sync::Arc;

use tracing::debug;

use super::cache::IdentityCache;
use super::identity::ResolvedIdentity;
use super::upstream::IdentityUpstream;
use super::AuthError;

/// Resolves bearer tokens to identities.
#[derive(Clone)]
pub struct IdentityValidator {
    upstream: Arc<dyn IdentityUpstream>,
    cache: Arc<IdentityCache>,
}

impl IdentityValidator {
    pub fn new(upstream: Arc<dyn IdentityUpstream>, cache: Arc<IdentityCache>) -> Self {
        Self { upstream, cache }
    }

    /// The cache backing this validator.
    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    /// Resolve a raw bearer token to an identity.
    pub async fn resolve(&self, token: &str) -> Result<ResolvedIdentity, AuthError> {
        if let Some(identity) = self.cache.get(token).await {
            debug!(subject = %identity.subject, "Identity cache hit");
            return Ok(identity);
        }

        debug!(token_len = token.len(), "Identity cache miss, validating upstream");

        let provider = self.upstream.fetch_userinfo(token).await?;
        provider.ensure_subject()?;

        let profile = self.upstream.lookup_profile(token, &provider.sub).await?;
        let identity = ResolvedIdentity::merge(provider, profile);

        self.cache.set(token, identity.clone()).await;
        debug!(
            subject = %identity.subject,
            login = %identity.login,
            roles = identity.roles.len(),
            "Identity validated and cached"
        );

        Ok(identity)
    }
}
