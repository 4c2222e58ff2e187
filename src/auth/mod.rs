// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Every protected request passes through the gateway before any handler
//! runs.
//!
//! ## Auth Flow
//!
//! 1. Resolve the client address (`X-Forwarded-For` → `X-Real-IP` → peer)
//! 2. Callers inside a trusted network get a synthetic identity
//!    (`trusted-ip:<address>`) and skip the remaining steps
//! 3. Everyone else sends `Authorization: Bearer <token>`
//! 4. The identity cache is consulted with the raw token
//! 5. On a miss:
//!    - the identity provider userinfo endpoint says who owns the token
//!    - the directory returns that subject's login, group and roles
//!    - both are merged and cached for the TTL
//! 6. The identity is bound to the request extensions
//!
//! ## Security
//!
//! - Failures answer 401 (403 for role checks) with a generic body; the
//!   reason is only logged
//! - Trusted network identities are never cached
//! - Proxy headers are trusted as-is, see `client_ip`

pub mod bearer;
pub mod cache;
pub mod client_ip;
pub mod clock;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod identity;
pub mod middleware;
pub mod roles;
pub mod trusted;
pub mod upstream;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheSweeper, IdentityCache};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use gateway::AuthGateway;
pub use identity::{IdentitySource, ResolvedIdentity};
pub use roles::RoleRef;
pub use trusted::TrustedNetworks;
pub use upstream::{HttpIdentityUpstream, IdentityUpstream};
pub use validator::IdentityValidator;
