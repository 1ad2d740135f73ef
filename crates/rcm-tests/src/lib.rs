// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # RCM Integration Tests
//!
//! Shared harness and fixtures for the end-to-end suites under `tests/`.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rcm-tests
//! cargo test -p rcm-tests --test integration_auth
//! cargo test -p rcm-tests --test integration_users
//! cargo test -p rcm-tests --test integration_clients
//! cargo test -p rcm-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! - `integration_auth.rs`: signup, login, logout, refresh and password reset
//! - `integration_users.rs`: user management and role rights
//! - `integration_clients.rs`: client management
//! - `integration_config.rs`: configuration loading and validation
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use rcm_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::new();
//!     let (_admin, token) = app.signed_in(UserRole::Admin).await;
//!     let response = app.get("/v1/users", Some(&token)).await;
//!     assert_status(&response, StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use axum::http::{Method, StatusCode};
    pub use rcm_core::{UserRole, UserStatus};
    pub use serde_json::{Value, json};
}
