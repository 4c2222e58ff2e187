// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Calls to the identity provider and the directory service.
//!
//! ## Wire shapes
//!
//! - `GET {site}/oidc/userinfo` with `Authorization: Bearer <token>`,
//!   expecting `{"sub", "email", "name", "preferred_username"}`
//! - `POST {site}/a/user` with `Authorization: Bearer <token>` and
//!   `{"Queries":[{"Uuid":"<sub>"}]}`, expecting `{"Users":[...]}`
//!
//! ## Error mapping
//!
//! - Connect failures, timeouts and truncated bodies → `UpstreamUnavailable`
//! - Non-200 status or a complete body that does not decode → `TokenInvalid`
//! - Empty `Users` → `UserNotFound`
//!
//! TLS verification is on unless `allow_insecure_tls` is set, which is meant
//! for non-production deployments only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::identity::{DirectoryProfile, ProviderIdentity};
use super::AuthError;

/// Default timeout for each upstream call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

const USERINFO_PATH: &str = "/oidc/userinfo";
const DIRECTORY_USER_PATH: &str = "/a/user";

/// The two external services a token is validated against.
#[async_trait]
pub trait IdentityUpstream: Send + Sync {
    /// Ask the identity provider who owns the token.
    async fn fetch_userinfo(&self, token: &str) -> Result<ProviderIdentity, AuthError>;

    /// Fetch the directory profile of a subject, authenticated with the token.
    async fn lookup_profile(&self, token: &str, subject: &str)
        -> Result<DirectoryProfile, AuthError>;
}

#[derive(Serialize)]
struct DirectoryQuery<'a> {
    #[serde(rename = "Queries")]
    queries: [SubjectQuery<'a>; 1],
}

#[derive(Serialize)]
struct SubjectQuery<'a> {
    #[serde(rename = "Uuid")]
    uuid: &'a str,
}

#[derive(Deserialize)]
struct DirectoryResponse {
    #[serde(rename = "Users", default)]
    users: Vec<DirectoryProfile>,
}

/// reqwest implementation talking to one site domain.
#[derive(Debug, Clone)]
pub struct HttpIdentityUpstream {
    site_domain: String,
    client: Client,
}

impl HttpIdentityUpstream {
    /// Create a client for the given site domain (e.g. `https://cells.example.com`).
    pub fn new(
        site_domain: impl Into<String>,
        timeout: Duration,
        allow_insecure_tls: bool,
    ) -> Result<Self, reqwest::Error> {
        let site_domain = site_domain.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(allow_insecure_tls)
            .build()?;

        Ok(Self {
            site_domain,
            client,
        })
    }

    /// Get the site domain.
    pub fn site_domain(&self) -> &str {
        &self.site_domain
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.site_domain, path)
    }
}

#[async_trait]
impl IdentityUpstream for HttpIdentityUpstream {
    async fn fetch_userinfo(&self, token: &str) -> Result<ProviderIdentity, AuthError> {
        let response = self
            .client
            .get(self.url(USERINFO_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error("userinfo", e))?;

        decode_success("userinfo", response).await
    }

    async fn lookup_profile(
        &self,
        token: &str,
        subject: &str,
    ) -> Result<DirectoryProfile, AuthError> {
        let query = DirectoryQuery {
            queries: [SubjectQuery { uuid: subject }],
        };

        let response = self
            .client
            .post(self.url(DIRECTORY_USER_PATH))
            .bearer_auth(token)
            .json(&query)
            .send()
            .await
            .map_err(|e| transport_error("directory", e))?;

        let body: DirectoryResponse = decode_success("directory", response).await?;
        debug!(subject = %subject, users = body.users.len(), "Directory lookup answered");

        body.users
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::UserNotFound(subject.to_string()))
    }
}

async fn decode_success<T: DeserializeOwned>(
    call: &str,
    response: Response,
) -> Result<T, AuthError> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(AuthError::TokenInvalid(format!(
            "HTTP {status} from {call} endpoint"
        )));
    }

    // A body cut short by the connection is an upstream failure, not a bad token.
    let body = response
        .bytes()
        .await
        .map_err(|e| AuthError::UpstreamUnavailable(format!("{call} body read failed: {e}")))?;

    serde_json::from_slice(&body)
        .map_err(|e| AuthError::TokenInvalid(format!("undecodable {call} response: {e}")))
}

fn transport_error(call: &str, err: reqwest::Error) -> AuthError {
    let reason = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    AuthError::UpstreamUnavailable(format!("{call} {reason}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn upstream_for(server: &MockServer) -> HttpIdentityUpstream {
        HttpIdentityUpstream::new(server.base_url(), DEFAULT_UPSTREAM_TIMEOUT, false).unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let upstream =
            HttpIdentityUpstream::new("https://cells.example.com/", DEFAULT_UPSTREAM_TIMEOUT, false)
                .unwrap();
        assert_eq!(upstream.site_domain(), "https://cells.example.com");
        assert_eq!(
            upstream.url(USERINFO_PATH),
            "https://cells.example.com/oidc/userinfo"
        );
    }

    #[test]
    fn insecure_tls_client_builds() {
        let upstream =
            HttpIdentityUpstream::new("https://cells.local", DEFAULT_UPSTREAM_TIMEOUT, true);
        assert!(upstream.is_ok());
    }

    #[tokio::test]
    async fn userinfo_sends_bearer_and_decodes_claims() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/oidc/userinfo")
                    .header("authorization", "Bearer tok-1");
                then.status(200).json_body(json!({
                    "sub": "sub-123",
                    "email": "ada@example.com",
                    "name": "Ada Lovelace",
                    "preferred_username": "ada"
                }));
            })
            .await;

        let identity = upstream_for(&server).fetch_userinfo("tok-1").await.unwrap();
        mock.assert_async().await;
        assert_eq!(identity.sub, "sub-123");
        assert_eq!(identity.preferred_username.as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn userinfo_non_200_is_token_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/oidc/userinfo");
                then.status(500).body("boom");
            })
            .await;

        let result = upstream_for(&server).fetch_userinfo("tok-1").await;
        assert!(matches!(result, Err(AuthError::TokenInvalid(_))));
    }

    #[tokio::test]
    async fn userinfo_without_sub_is_token_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/oidc/userinfo");
                then.status(200).json_body(json!({ "email": "ada@example.com" }));
            })
            .await;

        let result = upstream_for(&server).fetch_userinfo("tok-1").await;
        assert!(matches!(result, Err(AuthError::TokenInvalid(_))));
    }

    #[tokio::test]
    async fn directory_posts_subject_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/a/user")
                    .header("authorization", "Bearer tok-1")
                    .json_body(json!({ "Queries": [{ "Uuid": "sub-123" }] }));
                then.status(200).json_body(json!({
                    "Users": [{
                        "Login": "ada.l",
                        "Uuid": "sub-123",
                        "GroupPath": "/engineering",
                        "Roles": [{ "Uuid": "ADMINS", "Label": "Admin" }]
                    }]
                }));
            })
            .await;

        let profile = upstream_for(&server)
            .lookup_profile("tok-1", "sub-123")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(profile.login, "ada.l");
        assert_eq!(profile.group_path.as_deref(), Some("/engineering"));
        assert_eq!(profile.roles[0].uuid, "ADMINS");
    }

    #[tokio::test]
    async fn directory_without_users_is_user_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/a/user");
                then.status(200).json_body(json!({ "Users": [] }));
            })
            .await;

        let result = upstream_for(&server).lookup_profile("tok-1", "sub-123").await;
        assert!(matches!(result, Err(AuthError::UserNotFound(ref s)) if s == "sub-123"));
    }

    #[tokio::test]
    async fn directory_empty_object_is_user_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/a/user");
                then.status(200).json_body(json!({}));
            })
            .await;

        let result = upstream_for(&server).lookup_profile("tok-1", "sub-123").await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn directory_malformed_user_is_token_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/a/user");
                then.status(200).json_body(json!({ "Users": [{ "Uuid": "sub-123" }] }));
            })
            .await;

        let result = upstream_for(&server).lookup_profile("tok-1", "sub-123").await;
        assert!(matches!(result, Err(AuthError::TokenInvalid(_))));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_unavailable() {
        let upstream =
            HttpIdentityUpstream::new("http://127.0.0.1:1", Duration::from_secs(2), false).unwrap();
        let result = upstream.fetch_userinfo("tok-1").await;
        assert!(matches!(result, Err(AuthError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn truncated_body_is_unavailable() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n{\"sub\":\"u",
                )
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let upstream =
            HttpIdentityUpstream::new(format!("http://{addr}"), DEFAULT_UPSTREAM_TIMEOUT, false)
                .unwrap();
        let result = upstream.fetch_userinfo("tok-1").await;
        server.await.unwrap();

        assert!(
            matches!(result, Err(AuthError::UpstreamUnavailable(_))),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn non_json_body_is_token_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/oidc/userinfo");
                then.status(200).body("<html>login</html>");
            })
            .await;

        let result = upstream_for(&server).fetch_userinfo("tok-1").await;
        assert!(matches!(result, Err(AuthError::TokenInvalid(_))));
    }

    #[tokio::test]
    async fn slow_upstream_times_out_as_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/oidc/userinfo");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({ "sub": "sub-123" }));
            })
            .await;

        let upstream =
            HttpIdentityUpstream::new(server.base_url(), Duration::from_millis(50), false).unwrap();
        let result = upstream.fetch_userinfo("tok-1").await;
        assert!(matches!(result, Err(AuthError::UpstreamUnavailable(_))));
    }
}
