// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity cache keyed by raw bearer token.
//!
//! ## Behaviour
//!
//! - Entries expire a fixed TTL after they were stored
//! - Reads check expiry explicitly; an expired entry is a miss but is not
//!   removed on read
//! - Writes always overwrite (last write wins)
//! - A background sweeper deletes expired entries on a fixed interval
//!
//! There is no size bound; growth is limited only by the TTL sweep.
//!
//! ## Shutdown
//!
//! The sweeper runs until its `CancellationToken` is cancelled, the same way
//! the other background tasks of the server do.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use super::identity::ResolvedIdentity;

/// Default identity cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default interval between sweeps (1 minute).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Identity cache entry.
struct CacheEntry {
    identity: ResolvedIdentity,
    expires_at: DateTime<Utc>,
}

/// Thread-safe TTL cache of resolved identities.
pub struct IdentityCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl IdentityCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create with an explicit time source.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock,
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or(Duration::MAX)
    }

    /// Look up a token. Absent and expired entries are both misses.
    pub async fn get(&self, token: &str) -> Option<ResolvedIdentity> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(token)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.identity.clone())
    }

    /// Store an identity for a token, replacing any previous entry.
    pub async fn set(&self, token: &str, identity: ResolvedIdentity) {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries.write().await;
        entries.insert(
            token.to_string(),
            CacheEntry {
                identity,
                expires_at,
            },
        );
    }

    /// Delete every expired entry. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Background task deleting expired cache entries.
pub struct CacheSweeper {
    cache: Arc<IdentityCache>,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(cache: Arc<IdentityCache>) -> Self {
        Self {
            cache,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Create with custom sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawn the sweeper on the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Run the sweep loop until the cancellation token is triggered.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Identity cache sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Identity cache sweeper shutting down");
                    return;
                }
            }

            let removed = self.cache.sweep_expired().await;
            if removed > 0 {
                debug!(removed, "Identity cache sweep removed expired entries");
            }
        }
    }
}
