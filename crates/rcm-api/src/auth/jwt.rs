// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT token management.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use rcm_core::TokenType;

use super::Claims;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// JwtConfig
// =============================================================================

/// Longest accepted access token lifetime in minutes.
pub const MAX_ACCESS_EXPIRATION_MINS: i64 = 525_600;

/// Longest accepted refresh token lifetime in days.
pub const MAX_REFRESH_EXPIRATION_DAYS: i64 = 3_650;

/// Longest accepted reset-password token lifetime in minutes.
pub const MAX_RESET_PASSWORD_EXPIRATION_MINS: i64 = 1_440;

/// Largest accepted clock skew tolerance in seconds.
pub const MAX_LEEWAY_SECS: u64 = 300;

/// JWT configuration.
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token issuer, validated when set.
    pub issuer: Option<String>,
    /// HMAC algorithm used for signing.
    pub algorithm: Algorithm,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
    /// Access token lifetime in minutes.
    pub access_expiration_mins: i64,
    /// Refresh token lifetime in days.
    pub refresh_expiration_days: i64,
    /// Reset-password token lifetime in minutes.
    pub reset_password_expiration_mins: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            issuer: None,
            algorithm: Algorithm::HS256,
            leeway_secs: 0,
            access_expiration_mins: 10080,
            refresh_expiration_days: 30,
            reset_password_expiration_mins: 10,
        }
    }
}

impl JwtConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the clock skew tolerance.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Sets the token lifetimes.
    pub fn with_expirations(
        mut self,
        access_mins: i64,
        refresh_days: i64,
        reset_password_mins: i64,
    ) -> Self {
        self.access_expiration_mins = access_mins;
        self.refresh_expiration_days = refresh_days;
        self.reset_password_expiration_mins = reset_password_mins;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("JWT secret is not configured"));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ApiError::internal(format!(
                "Unsupported JWT algorithm {:?}, expected an HMAC algorithm",
                self.algorithm
            )));
        }
        for (name, value, max) in [
            (
                "access",
                self.access_expiration_mins,
                MAX_ACCESS_EXPIRATION_MINS,
            ),
            (
                "refresh",
                self.refresh_expiration_days,
                MAX_REFRESH_EXPIRATION_DAYS,
            ),
            (
                "reset-password",
                self.reset_password_expiration_mins,
                MAX_RESET_PASSWORD_EXPIRATION_MINS,
            ),
        ] {
            if !(1..=max).contains(&value) {
                return Err(ApiError::internal(format!(
                    "JWT {} expiration {} is out of range 1..={}",
                    name, value, max
                )));
            }
        }
        if self.leeway_secs > MAX_LEEWAY_SECS {
            return Err(ApiError::internal(format!(
                "JWT leeway {}s exceeds {}s",
                self.leeway_secs, MAX_LEEWAY_SECS
            )));
        }
        if self.secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .field("access_expiration_mins", &self.access_expiration_mins)
            .field("refresh_expiration_days", &self.refresh_expiration_days)
            .field(
                "reset_password_expiration_mins",
                &self.reset_password_expiration_mins,
            )
            .finish()
    }
}

// =============================================================================
// JwtManager
// =============================================================================

/// Signs and verifies tokens with the configured secret.
#[derive(Clone)]
pub struct JwtManager {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtManager {
    /// Creates a new JWT manager with the given configuration.
    pub fn new(config: JwtConfig) -> ApiResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;
        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Signs the given claims.
    pub fn encode(&self, claims: &Claims) -> ApiResult<String> {
        let header = Header::new(self.config.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
    }

    /// Builds claims for a user and signs them.
    pub fn issue(
        &self,
        user_id: &str,
        token_type: TokenType,
        expires: DateTime<Utc>,
    ) -> ApiResult<String> {
        let mut claims = Claims::new(user_id, token_type, expires);
        if let Some(ref issuer) = self.config.issuer {
            claims = claims.with_issuer(issuer);
        }
        self.encode(&claims)
    }

    /// Verifies the signature and expiry of a token and returns its claims.
    ///
    /// The error message is the bare failure reason; callers prefix it.
    pub fn decode(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "jwt expired".to_string(),
                    ErrorKind::InvalidSignature => "invalid signature".to_string(),
                    ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                        "jwt malformed".to_string()
                    }
                    ErrorKind::Json(_) => "invalid payload".to_string(),
                    ErrorKind::InvalidIssuer => "invalid issuer".to_string(),
                    ErrorKind::InvalidAlgorithm => "invalid algorithm".to_string(),
                    ErrorKind::ImmatureSignature => "jwt not active".to_string(),
                    _ => e.to_string(),
                };
                ApiError::unauthorized(reason)
            })
    }

    /// Returns the expiry instant of a token of the given type issued at `now`.
    pub fn expiration_for(
        &self,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> ApiResult<DateTime<Utc>> {
        let lifetime = match token_type {
            TokenType::Access => TimeDelta::try_minutes(self.config.access_expiration_mins),
            TokenType::Refresh => TimeDelta::try_days(self.config.refresh_expiration_days),
            TokenType::ResetPassword => {
                TimeDelta::try_minutes(self.config.reset_password_expiration_mins)
            }
        };
        lifetime
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                ApiError::internal(format!("{} token expiry overflows", token_type.as_str()))
            })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("algorithm", &self.config.algorithm)
            .field("access_expiration_mins", &self.config.access_expiration_mins)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
