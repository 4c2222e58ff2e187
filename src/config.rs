// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! `GatewayConfig` loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SITE_DOMAIN` | Base URL of the identity provider and directory | Required |
//! | `TRUSTED_IPS` | Comma-separated IPs/CIDRs that bypass authentication | empty |
//! | `ALLOW_INSECURE_TLS` | Skip TLS verification on upstream calls (non-production only) | `false` |
//! | `IDENTITY_CACHE_TTL_SECS` | Lifetime of a cached identity | `300` |
//! | `IDENTITY_CACHE_SWEEP_SECS` | Interval between expired-entry sweeps | `60` |
//! | `UPSTREAM_TIMEOUT_SECS` | Timeout of each upstream call | `5` |
//! | `REQUEST_TIMEOUT_SECS` | Timeout of a whole request | `15` |
//! | `CORS_ORIGINS` | Comma-separated allowed origins | `https://localhost:8080,http://localhost:8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use url::Url;

use crate::auth::cache::{DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL};
use crate::auth::upstream::DEFAULT_UPSTREAM_TIMEOUT;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the identity provider / directory base URL.
///
/// Userinfo is fetched from `{SITE_DOMAIN}/oidc/userinfo` and profiles from
/// `{SITE_DOMAIN}/a/user`.
pub const SITE_DOMAIN_ENV: &str = "SITE_DOMAIN";

/// Environment variable name for the trusted network list.
///
/// The client address is taken from `X-Forwarded-For`/`X-Real-IP` when
/// present, so only set this when a proxy in front of the gateway overwrites
/// those headers.
pub const TRUSTED_IPS_ENV: &str = "TRUSTED_IPS";

/// Environment variable name for the insecure TLS escape hatch.
///
/// # Default
/// `false`. Never enable in production.
pub const ALLOW_INSECURE_TLS_ENV: &str = "ALLOW_INSECURE_TLS";

pub const IDENTITY_CACHE_TTL_ENV: &str = "IDENTITY_CACHE_TTL_SECS";
pub const IDENTITY_CACHE_SWEEP_ENV: &str = "IDENTITY_CACHE_SWEEP_SECS";
pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT_SECS";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const CORS_ORIGINS_ENV: &str = "CORS_ORIGINS";

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["https://localhost:8080", "http://localhost:8080"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Gateway configuration loaded at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub site_domain: Url,
    pub trusted_ips: Vec<String>,
    pub allow_insecure_tls: bool,
    pub cache_ttl: Duration,
    pub sweep_interval: Duration,
    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl GatewayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let site_domain = get(SITE_DOMAIN_ENV).ok_or(ConfigError::Missing(SITE_DOMAIN_ENV))?;
        let site_domain = Url::parse(&site_domain).map_err(|e| ConfigError::Invalid {
            name: SITE_DOMAIN_ENV,
            reason: e.to_string(),
        })?;
        if !matches!(site_domain.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: SITE_DOMAIN_ENV,
                reason: format!("unsupported scheme '{}'", site_domain.scheme()),
            });
        }

        let trusted_ips = get(TRUSTED_IPS_ENV)
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let allow_insecure_tls = match get(ALLOW_INSECURE_TLS_ENV) {
            Some(raw) => parse_bool(ALLOW_INSECURE_TLS_ENV, &raw)?,
            None => false,
        };

        let cache_ttl = duration_secs(get(IDENTITY_CACHE_TTL_ENV), IDENTITY_CACHE_TTL_ENV, DEFAULT_CACHE_TTL)?;
        let sweep_interval = duration_secs(
            get(IDENTITY_CACHE_SWEEP_ENV),
            IDENTITY_CACHE_SWEEP_ENV,
            DEFAULT_SWEEP_INTERVAL,
        )?;
        let upstream_timeout = duration_secs(
            get(UPSTREAM_TIMEOUT_ENV),
            UPSTREAM_TIMEOUT_ENV,
            DEFAULT_UPSTREAM_TIMEOUT,
        )?;
        let request_timeout = duration_secs(
            get(REQUEST_TIMEOUT_ENV),
            REQUEST_TIMEOUT_ENV,
            DEFAULT_REQUEST_TIMEOUT,
        )?;

        let cors_origins = get(CORS_ORIGINS_ENV)
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect());

        Ok(Self {
            host,
            port,
            site_domain,
            trusted_ips,
            allow_insecure_tls,
            cache_ttl,
            sweep_interval,
            upstream_timeout,
            request_timeout,
            cors_origins,
        })
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn duration_secs(
    raw: Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
