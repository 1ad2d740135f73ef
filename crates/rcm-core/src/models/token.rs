// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persisted token records.
//!
//! Every issued JWT is stored so it can be revoked before it expires. A
//! token is only honoured while its record exists, is not blacklisted and
//! has not expired.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

// =============================================================================
// TokenType
// =============================================================================

/// Purpose of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    /// Short-lived API access token.
    Access,
    /// Long-lived token exchanged for a new pair.
    Refresh,
    /// One-time password reset token.
    ResetPassword,
}

impl TokenType {
    /// Returns the wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::ResetPassword => "resetPassword",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TokenRecord
// =============================================================================

/// A stored token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Document id.
    pub id: String,
    /// Encoded JWT.
    pub token: String,
    /// Owning user id.
    pub user: String,
    /// Token purpose.
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Expiry time.
    pub expires: DateTime<Utc>,
    /// Revocation flag.
    #[serde(default)]
    pub blacklisted: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Creates a non-blacklisted record.
    pub fn new(
        token: impl Into<String>,
        user: impl Into<String>,
        token_type: TokenType,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            token: token.into(),
            user: user.into(),
            token_type,
            expires,
            blacklisted: false,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if the record expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// Returns `true` if the token can still be honoured at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.blacklisted && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_type_serde() {
        assert_eq!(
            serde_json::to_string(&TokenType::ResetPassword).unwrap(),
            "\"resetPassword\""
        );
        let parsed: TokenType = serde_json::from_str("\"refresh\"").unwrap();
        assert_eq!(parsed, TokenType::Refresh);
    }

    #[test]
    fn test_record_type_field() {
        let record = TokenRecord::new("t", "u", TokenType::Access, Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "access");
        assert_eq!(json["blacklisted"], false);
    }

    #[test]
    fn test_usable() {
        let now = Utc::now();
        let mut record = TokenRecord::new("t", "u", TokenType::Refresh, now + Duration::minutes(5));
        assert!(record.is_usable_at(now));
        assert!(!record.is_usable_at(now + Duration::minutes(6)));

        record.blacklisted = true;
        assert!(!record.is_usable_at(now));
    }
}
