// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Business logic shared by handlers and middleware.
//!
//! - [`TokenService`]: issuing, verifying and revoking persisted JWTs
//! - [`AuthService`]: login, logout, token refresh and password reset
//! - [`UserService`]: user accounts
//! - [`ClientService`]: client records

mod auth;
mod clients;
mod token;
mod users;

pub use auth::{AuthService, LoginResult};
pub use clients::ClientService;
pub use token::{AuthTokens, IssuedToken, TokenService};
pub use users::{CreateUser, UpdateUser, UserService};

use rcm_core::{PasswordHasher, store::Page};

use crate::error::{ApiError, ApiResult};

/// Hashes a password on the blocking pool.
pub(crate) async fn hash_password(hasher: PasswordHasher, password: String) -> ApiResult<String> {
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;
    Ok(hash)
}

/// Checks a password on the blocking pool.
pub(crate) async fn verify_password(
    hasher: PasswordHasher,
    password: String,
    hash: String,
) -> ApiResult<bool> {
    Ok(tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await?)
}

/// A page of records with the total count.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Total number of records.
    pub total: u64,
    /// Page that was requested.
    pub page: Page,
}

pub(crate) fn require_id(id: &str, message: &'static str) -> ApiResult<()> {
    if id.trim().is_empty() {
        return Err(ApiError::bad_request(message));
    }
    Ok(())
}
