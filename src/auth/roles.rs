// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Directory roles for authorization.

use serde::Serialize;
use utoipa::ToSchema;

/// Label of the role required by admin-only routes.
pub const ADMIN_ROLE: &str = "admin";

/// Id of the fixed role given to trusted network callers.
pub const TRUSTED_NETWORK_ROLE_ID: &str = "trusted-network";

/// A role assigned in the directory.
///
/// Roles are identified by `id`; `label` is what route checks compare
/// against (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct RoleRef {
    /// Directory role id
    pub id: String,
    /// Human-readable role label
    pub label: String,
}

impl RoleRef {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// The single role carried by trusted network identities.
    pub fn trusted_network() -> Self {
        Self::new(TRUSTED_NETWORK_ROLE_ID, ADMIN_ROLE)
    }

    /// Check if this role satisfies a required label.
    pub fn matches(&self, required: &str) -> bool {
        self.label.eq_ignore_ascii_case(required)
    }
}

/// Remove duplicate role ids, keeping first-seen order.
pub fn dedup_roles(roles: impl IntoIterator<Item = RoleRef>) -> Vec<RoleRef> {
    let mut seen = std::collections::HashSet::new();
    roles
        .into_iter()
        .filter(|role| seen.insert(role.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_is_case_insensitive() {
        let role = RoleRef::new("r-1", "Admin");
        assert!(role.matches("admin"));
        assert!(role.matches("ADMIN"));
        assert!(!role.matches("client"));
    }

    #[test]
    fn trusted_network_role_is_admin() {
        let role = RoleRef::trusted_network();
        assert!(role.matches(ADMIN_ROLE));
        assert_eq!(role.id, TRUSTED_NETWORK_ROLE_ID);
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let roles = dedup_roles([
            RoleRef::new("b", "Beta"),
            RoleRef::new("a", "Alpha"),
            RoleRef::new("b", "Beta again"),
        ]);
        let ids: Vec<_> = roles.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(roles[0].label, "Beta");
    }
}
