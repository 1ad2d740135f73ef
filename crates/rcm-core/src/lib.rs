// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rcm-core
//!
//! Domain models and persistence abstractions for the RCM backend.
//!
//! - **Models**: `User`, `Client` and `TokenRecord` documents
//! - **Store**: async storage traits with in-memory and MongoDB backends
//! - **Password**: bcrypt hashing for user credentials
//! - **Error**: the `CoreError` hierarchy shared by every backend
//!
//! ## Feature Flags
//!
//! - `mongodb`: Enables the MongoDB-backed store
//!
//! ## Example
//!
//! ```rust,ignore
//! use rcm_core::models::{NewUser, UserRole};
//! use rcm_core::store::Stores;
//!
//! let stores = Stores::in_memory();
//! let user = NewUser::new("Jane", "jane@example.com", hash).into_user();
//! stores.users.insert_user(user).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod models;
pub mod password;
pub mod store;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{CoreError, CoreResult};
pub use models::{
    Client, ClientAddress, ClientChanges, ClientName, ClientStatus, DummyAccount, NewClient,
    NewUser, PublicUser, TokenRecord, TokenType, User, UserChanges, UserRole, UserStatus,
};
pub use password::PasswordHasher;
pub use store::{ClientStore, MemoryStore, Page, Stores, TokenQuery, TokenStore, UserStore};

#[cfg(feature = "mongodb")]
pub use store::{MongoSettings, MongoStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
