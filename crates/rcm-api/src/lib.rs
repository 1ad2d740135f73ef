// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rcm-api
//!
//! REST API server for the RCM multi-tenant backend.
//!
//! This crate provides the HTTP surface together with the token service,
//! the role-rights resolver and the authentication pipeline.
//!
//! ## Request Pipeline
//!
//! A protected request passes two layers before reaching its handler:
//!
//! 1. [`middleware::AuthLayer`] verifies the bearer JWT, loads the user,
//!    checks the stored token record and attaches an [`auth::AuthContext`].
//! 2. [`middleware::RightsLayer`] compares the caller's merged role rights
//!    with the route's requirement and enforces own-record access for
//!    `user-o` routes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rcm_api::{ApiConfig, ApiServerBuilder, JwtConfig};
//!
//! # async fn run() -> rcm_api::ApiResult<()> {
//! let config = ApiConfig::default().with_jwt(JwtConfig::new("a-secret-of-at-least-32-bytes!!!"));
//! let server = ApiServerBuilder::new().config(config).build()?;
//! server.run().await
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod services;
pub mod state;

pub use auth::{AuthContext, Claims, JwtConfig, JwtManager, RightsMap, RoleRights};
pub use config::{ApiConfig, CorsConfig};
pub use error::{ApiError, ApiResult};
pub use server::{ApiServer, ApiServerBuilder};
pub use services::{AuthService, ClientService, TokenService, UserService};
pub use state::{AppState, AppStateBuilder};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
