// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints for gateway operations.
//!
//! These endpoints require the admin role.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{auth::AdminOnly, state::AppState};

/// Identity cache statistics.
#[derive(Debug, Serialize, ToSchema)]
pub struct IdentityCacheStats {
    /// Entries currently stored, expired ones included until swept.
    pub entries: usize,
    /// Lifetime of a cached identity in seconds.
    pub ttl_secs: u64,
    /// Current timestamp.
    pub timestamp: String,
}

/// Get identity cache statistics.
#[utoipa::path(
    get,
    path = "/api/v1/admin/identity-cache",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Identity cache statistics", body = IdentityCacheStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin role required"),
    )
)]
pub async fn identity_cache_stats(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
) -> Json<IdentityCacheStats> {
    let cache = state.gateway.validator().cache();
    info!(subject = %admin.subject, "Admin requested identity cache stats");

    Json(IdentityCacheStats {
        entries: cache.len().await,
        ttl_secs: cache.ttl().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
