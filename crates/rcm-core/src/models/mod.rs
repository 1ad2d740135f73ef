// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persistent document models.
//!
//! Documents serialize with camelCase field names so the same shape is used
//! for storage and for API responses. Identifiers are UUIDv7 strings, which
//! sort by creation time.

mod client;
mod token;
mod user;

pub use client::{
    Client, ClientAddress, ClientChanges, ClientName, ClientStatus, DummyAccount, NewClient,
};
pub use token::{TokenRecord, TokenType};
pub use user::{NewUser, PublicUser, User, UserChanges, UserRole, UserStatus};

/// Generates a new time-ordered document id.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Normalizes an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_ordered() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }
}
