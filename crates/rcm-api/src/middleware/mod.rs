// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! Protected routes run two layers, outermost first:
//!
//! - [`AuthLayer`]: bearer token, token record and user lookup
//! - [`RightsLayer`]: role rights and the own-record check

mod auth;
mod rights;

pub use auth::{AuthLayer, AuthMiddleware};
pub use rights::{RightsLayer, RightsMiddleware};
