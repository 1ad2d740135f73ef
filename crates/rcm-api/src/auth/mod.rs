// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - JWT claims and signing
//! - Permission strings and merged rights maps
//! - The static role table
//! - Authentication context

mod claims;
mod context;
mod jwt;
pub mod rights;
mod roles;

pub use claims::Claims;
pub use context::AuthContext;
pub use jwt::{JwtConfig, JwtManager};
pub use rights::{Grant, InvalidPermission, Mode, Permission, RightsMap};
pub use roles::RoleRights;
