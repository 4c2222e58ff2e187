// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every rejection produced by the gateway is one of these kinds. The detail
//! carried by a variant is for operators: it is logged when the response is
//! built and never sent to the caller, who only sees a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingHeader,
    /// Header present but not of the form `Bearer <token>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidFormat,
    /// The identity provider or directory rejected the token, or answered
    /// with something that could not be decoded
    #[error("Token rejected: {0}")]
    TokenInvalid(String),
    /// The directory has no profile for the token's subject
    #[error("No directory profile for subject {0}")]
    UserNotFound(String),
    /// An upstream call timed out or could not connect
    #[error("Identity upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The identity lacks a role required by the route
    #[error("Missing required role: {0}")]
    InsufficientRole(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

impl AuthError {
    /// Get the error code for this error (logs only).
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_header",
            AuthError::InvalidFormat => "invalid_format",
            AuthError::TokenInvalid(_) => "token_invalid",
            AuthError::UserNotFound(_) => "user_not_found",
            AuthError::UpstreamUnavailable(_) => "upstream_unavailable",
            AuthError::InsufficientRole(_) => "insufficient_role",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientRole(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn public_message(&self) -> &'static str {
        match self.status_code() {
            StatusCode::FORBIDDEN => "Forbidden",
            _ => "Unauthorized",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        warn!(
            error_code = self.error_code(),
            detail = %self,
            "Request rejected by auth gateway"
        );

        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.public_message(),
        });
        (status, body).into_response()
    }
}
