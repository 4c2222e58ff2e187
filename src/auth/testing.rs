// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory upstream double and manual clock shared by the auth and api
//! tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::clock::Clock;
use super::identity::{DirectoryProfile, DirectoryRole, ProviderIdentity};
use super::upstream::IdentityUpstream;
use super::AuthError;

/// What the fake answers for a known token.
#[derive(Clone)]
pub enum Answer {
    User {
        provider: ProviderIdentity,
        profile: Option<DirectoryProfile>,
    },
    ProviderError(fn() -> AuthError),
}

/// Upstream double that counts every call it receives.
#[derive(Default)]
pub struct FakeUpstream {
    answers: HashMap<String, Answer>,
    latency: Option<Duration>,
    userinfo_calls: AtomicUsize,
    directory_calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token owned by `subject`, optionally holding `role_label`.
    pub fn with_user(mut self, token: &str, subject: &str, role_label: Option<&str>) -> Self {
        let roles = role_label
            .map(|label| {
                vec![DirectoryRole {
                    uuid: format!("role-{}", label.to_lowercase()),
                    label: label.to_string(),
                }]
            })
            .unwrap_or_default();

        self.answers.insert(
            token.to_string(),
            Answer::User {
                provider: ProviderIdentity {
                    sub: subject.to_string(),
                    email: Some(format!("{subject}@example.com")),
                    name: Some(format!("User {subject}")),
                    preferred_username: Some(subject.to_string()),
                },
                profile: Some(DirectoryProfile {
                    login: format!("login-{subject}"),
                    uuid: subject.to_string(),
                    group_path: Some("/".to_string()),
                    roles,
                }),
            },
        );
        self
    }

    /// Register a token the provider accepts but the directory does not know.
    pub fn with_unknown_directory_user(mut self, token: &str, subject: &str) -> Self {
        self.answers.insert(
            token.to_string(),
            Answer::User {
                provider: ProviderIdentity {
                    sub: subject.to_string(),
                    email: None,
                    name: None,
                    preferred_username: None,
                },
                profile: None,
            },
        );
        self
    }

    /// Register a token whose provider call fails.
    pub fn with_provider_error(mut self, token: &str, error: fn() -> AuthError) -> Self {
        self.answers
            .insert(token.to_string(), Answer::ProviderError(error));
        self
    }

    /// Delay every call, so concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn userinfo_calls(&self) -> usize {
        self.userinfo_calls.load(Ordering::SeqCst)
    }

    pub fn directory_calls(&self) -> usize {
        self.directory_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.userinfo_calls() + self.directory_calls()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl IdentityUpstream for FakeUpstream {
    async fn fetch_userinfo(&self, token: &str) -> Result<ProviderIdentity, AuthError> {
        self.userinfo_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match self.answers.get(token) {
            Some(Answer::User { provider, .. }) => Ok(provider.clone()),
            Some(Answer::ProviderError(error)) => Err(error()),
            None => Err(AuthError::TokenInvalid("HTTP 401 from userinfo endpoint".to_string())),
        }
    }

    async fn lookup_profile(
        &self,
        token: &str,
        subject: &str,
    ) -> Result<DirectoryProfile, AuthError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match self.answers.get(token) {
            Some(Answer::User {
                profile: Some(profile),
                ..
            }) => Ok(profile.clone()),
            _ => Err(AuthError::UserNotFound(subject.to_string())),
        }
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[test]
fn manual_clock_advances_only_on_demand() {
    let clock = ManualClock::default();
    let start = clock.now();
    assert_eq!(clock.now(), start);

    clock.advance(chrono::Duration::seconds(301));
    assert_eq!(clock.now() - start, chrono::Duration::seconds(301));
}
