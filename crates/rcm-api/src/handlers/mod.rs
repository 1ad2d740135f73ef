// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: Health check endpoints
//! - [`auth`]: Signup, login, logout and token flows
//! - [`users`]: User management endpoints
//! - [`clients`]: Client management endpoints

mod auth;
mod clients;
mod health;
mod users;

pub use auth::*;
pub use clients::*;
pub use health::*;
pub use users::*;
