// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The full identity resolution pipeline for one request.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use tracing::debug;

use super::bearer::extract_bearer;
use super::client_ip::resolve_client_ip;
use super::identity::ResolvedIdentity;
use super::trusted::TrustedNetworks;
use super::validator::IdentityValidator;
use super::AuthError;

/// Decides who a request is, or why it is rejected.
pub struct AuthGateway {
    trusted: TrustedNetworks,
    validator: IdentityValidator,
}

impl AuthGateway {
    pub fn new(trusted: TrustedNetworks, validator: IdentityValidator) -> Self {
        Self { trusted, validator }
    }

    pub fn trusted_networks(&self) -> &TrustedNetworks {
        &self.trusted
    }

    pub fn validator(&self) -> &IdentityValidator {
        &self.validator
    }

    /// Resolve the caller of a request.
    ///
    /// Callers inside a trusted network get a synthetic identity without any
    /// token check. Everyone else must present a valid bearer token.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        remote: Option<SocketAddr>,
    ) -> Result<ResolvedIdentity, AuthError> {
        let client_ip = resolve_client_ip(headers, remote);

        if let Some(ip) = client_ip
            .as_deref()
            .and_then(|addr| self.trusted.match_address(addr))
        {
            debug!(client_ip = %ip, "Trusted network bypass");
            return Ok(ResolvedIdentity::trusted_network(ip));
        }

        let token = extract_bearer(headers).inspect_err(|e| {
            debug!(
                client_ip = client_ip.as_deref().unwrap_or("unknown"),
                error_code = e.error_code(),
                "Bearer token extraction failed"
            );
        })?;

        self.validator.resolve(token).await
    }
}
