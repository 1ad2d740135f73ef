// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Request bodies and constants shared by the suites.

use serde_json::{Value, json};

/// Signing secret used by every test application.
pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-of-sufficient-length";

/// Password given to seeded accounts.
pub const TEST_PASSWORD: &str = "password1";

/// User request bodies.
pub struct UserFixtures;

impl UserFixtures {
    /// Signup body.
    pub fn signup(email: &str) -> Value {
        json!({
            "name": "Jane Doe",
            "email": email,
            "password": TEST_PASSWORD,
        })
    }

    /// Body for `POST /users` with explicit roles.
    pub fn create(email: &str, roles: &[&str]) -> Value {
        json!({
            "name": "Created User",
            "email": email,
            "password": TEST_PASSWORD,
            "role": roles,
        })
    }
}

/// Client request bodies.
pub struct ClientFixtures;

impl ClientFixtures {
    /// A complete client record.
    pub fn create(email: &str) -> Value {
        json!({
            "fullName": "Ada Lovelace",
            "name": { "firstName": "Ada", "lastName": "Lovelace" },
            "email": email,
            "altEmails": ["ada@backup.example.com"],
            "address": {
                "number": "12",
                "street": "St James's Square",
                "city": "London",
                "state": "LDN",
                "zip": "SW1Y"
            },
            "phone": "555-0100",
            "profession": "Mathematician",
            "dateBirth": "1815-12-10"
        })
    }

    /// Body for `POST /clients` missing the structured name.
    pub fn missing_name(email: &str) -> Value {
        let mut body = Self::create(email);
        if let Some(obj) = body.as_object_mut() {
            obj.remove("name");
        }
        body
    }
}
