// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims structure.

use chrono::{DateTime, Utc};
use rcm_core::TokenType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject, the user id.
    pub sub: String,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// JWT ID. Keeps tokens issued in the same second distinct.
    pub jti: String,

    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// Token purpose.
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims for a user, issued now and expiring at `expires`.
    pub fn new(user_id: impl Into<String>, token_type: TokenType, expires: DateTime<Utc>) -> Self {
        Self::issued_at(user_id, token_type, Utc::now(), expires)
    }

    /// Creates claims with an explicit issue time.
    pub fn issued_at(
        user_id: impl Into<String>,
        token_type: TokenType,
        issued: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id.into(),
            iat: issued.timestamp(),
            exp: expires.timestamp(),
            jti: Uuid::now_v7().to_string(),
            iss: None,
            token_type,
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

// =============================================================================
// Tests
// =============================================================================
