// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity Gateway - Authentication front for the resource API
//!
//! This crate accepts or rejects every inbound request before it reaches
//! business logic, and binds the caller's identity to the requests it lets
//! through.
//!
//! ## Modules
//!
//! - `api` - HTTP routes (Axum) and OpenAPI document
//! - `auth` - Identity resolution pipeline, cache and extractors
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod state;
