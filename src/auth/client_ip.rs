// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client IP resolution.
//!
//! Precedence: first hop of `X-Forwarded-For`, then `X-Real-IP`, then the
//! transport-level peer address.
//!
//! ## Security
//!
//! Both headers are taken at face value. The trusted network bypass is only
//! sound when the gateway sits behind a proxy that overwrites these headers;
//! exposed directly, a client can claim any address.

use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Resolve the caller's address as text.
///
/// The result is not validated here; the trusted network matcher rejects
/// anything that does not parse. Returns `None` when no source is available.
pub fn resolve_client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<String> {
    if let Some(first_hop) = header_str(headers, X_FORWARDED_FOR)
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
    {
        return Some(first_hop.to_string());
    }

    if let Some(real_ip) = header_str(headers, X_REAL_IP)
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(real_ip.to_string());
    }

    remote.map(|addr| addr.ip().to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
