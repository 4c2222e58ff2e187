// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, IdentitySource, ResolvedIdentity, RoleRef};

/// Response for GET /api/v1/me
#[derive(Debug, Serialize, ToSchema)]
pub struct IdentityResponse {
    /// Subject id proven by the caller's token
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    pub login: String,
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_path: Option<String>,
    pub roles: Vec<RoleRef>,
    pub source: IdentitySource,
}

impl From<ResolvedIdentity> for IdentityResponse {
    fn from(identity: ResolvedIdentity) -> Self {
        Self {
            subject: identity.subject,
            email: identity.email,
            display_name: identity.display_name,
            preferred_username: identity.preferred_username,
            login: identity.login,
            uuid: identity.uuid,
            group_path: identity.group_path,
            roles: identity.roles,
            source: identity.source,
        }
    }
}

/// Get the identity the gateway resolved for this request.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Identity",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Resolved identity", body = IdentityResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_identity(Auth(identity): Auth) -> Json<IdentityResponse> {
    Json(identity.into())
}
