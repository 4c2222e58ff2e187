// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity types: what the identity provider says about a token, what the
//! directory says about its subject, and the merged identity bound to the
//! request.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::{dedup_roles, RoleRef};
use super::AuthError;

/// Claims returned by the identity provider userinfo endpoint.
///
/// `sub` is mandatory; a response without it fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderIdentity {
    /// Subject (user ID) the token was issued to
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

impl ProviderIdentity {
    /// Reject claims with a blank subject.
    pub fn ensure_subject(&self) -> Result<(), AuthError> {
        if self.sub.trim().is_empty() {
            return Err(AuthError::TokenInvalid(
                "userinfo response has an empty sub".to_string(),
            ));
        }
        Ok(())
    }
}

/// Role entry as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryRole {
    #[serde(rename = "Uuid")]
    pub uuid: String,
    #[serde(rename = "Label", default)]
    pub label: String,
}

/// User profile as returned by the directory, keyed by subject id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryProfile {
    #[serde(rename = "Login")]
    pub login: String,
    #[serde(rename = "Uuid")]
    pub uuid: String,
    #[serde(rename = "GroupPath", default)]
    pub group_path: Option<String>,
    #[serde(rename = "Roles", default)]
    pub roles: Vec<DirectoryRole>,
}

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// Validated bearer token
    Token,
    /// Trusted network bypass, no token involved
    TrustedNetwork,
}

/// Identity bound to a request once the gateway lets it through.
///
/// The subject always comes from the identity provider; login, uuid, group
/// and roles come from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResolvedIdentity {
    /// Subject id proven by the token (never empty)
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    /// Directory login
    pub login: String,
    /// Directory user UUID
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_path: Option<String>,
    /// Ordered, de-duplicated roles
    pub roles: Vec<RoleRef>,
    pub source: IdentitySource,
}

impl ResolvedIdentity {
    /// Merge provider claims with the directory profile.
    ///
    /// Directory fields come first, then provider claims are overlaid so the
    /// subject is always the one the caller proved ownership of.
    pub fn merge(provider: ProviderIdentity, profile: DirectoryProfile) -> Self {
        let roles = dedup_roles(
            profile
                .roles
                .into_iter()
                .map(|role| RoleRef::new(role.uuid, role.label)),
        );

        Self {
            subject: provider.sub,
            email: provider.email,
            display_name: provider.name,
            preferred_username: provider.preferred_username,
            login: profile.login,
            uuid: profile.uuid,
            group_path: profile.group_path,
            roles,
            source: IdentitySource::Token,
        }
    }

    /// Synthetic identity for a caller inside a trusted network.
    pub fn trusted_network(address: IpAddr) -> Self {
        let subject = format!("trusted-ip:{address}");
        Self {
            subject: subject.clone(),
            email: None,
            display_name: None,
            preferred_username: None,
            login: subject,
            uuid: String::new(),
            group_path: None,
            roles: vec![RoleRef::trusted_network()],
            source: IdentitySource::TrustedNetwork,
        }
    }

    /// Check if any role carries the required label.
    pub fn has_role(&self, label: &str) -> bool {
        self.roles.iter().any(|role| role.matches(label))
    }

    pub fn is_trusted_network(&self) -> bool {
        self.source == IdentitySource::TrustedNetwork
    }
}
