// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the resolved identity.
//!
//! Use the `Auth` extractor in handlers to get the caller:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is ResolvedIdentity
//! }
//! ```

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use tracing::debug;

use super::roles::ADMIN_ROLE;
use super::{AuthError, ResolvedIdentity};
use crate::state::AppState;

/// Extractor for the caller's identity.
///
/// Reads the identity bound by the `require_identity` middleware. On routes
/// mounted without the middleware it runs the gateway itself, so a handler
/// taking `Auth` never sees an unauthenticated request.
pub struct Auth(pub ResolvedIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the identity
        if let Some(identity) = parts.extensions.get::<ResolvedIdentity>().cloned() {
            return Ok(Auth(identity));
        }

        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let identity = state.gateway.authenticate(&parts.headers, remote).await?;
        parts.extensions.insert(identity.clone());

        Ok(Auth(identity))
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub ResolvedIdentity);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(identity) = Auth::from_request_parts(parts, state).await?;

        if !identity.has_role(ADMIN_ROLE) {
            debug!(subject = %identity.subject, "Admin role check failed");
            return Err(AuthError::InsufficientRole(format!(
                "{ADMIN_ROLE} (subject {})",
                identity.subject
            )));
        }

        Ok(AdminOnly(identity))
    }
}
