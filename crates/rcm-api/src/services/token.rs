// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token issuance, verification and revocation.
//!
//! Every issued token is persisted as a [`TokenRecord`]. A token is honoured
//! only while its signature and expiry are valid *and* a matching,
//! non-blacklisted record exists, so deleting or blacklisting the record
//! revokes the token.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rcm_core::{TokenQuery, TokenRecord, TokenStore, TokenType, User, UserStore};
use serde::{Deserialize, Serialize};

use crate::auth::{Claims, JwtManager};
use crate::error::{ApiError, ApiResult};

/// Message for a token whose record is missing, blacklisted or expired.
pub const EXPIRED_OR_INVALID: &str = "AUTH: expired or invalid token";

// =============================================================================
// Response types
// =============================================================================

/// A signed token and its expiry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssuedToken {
    /// Signed JWT.
    pub token: String,
    /// Expiry instant.
    pub expires: DateTime<Utc>,
}

/// Access and refresh token pair returned on login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthTokens {
    /// Access token.
    pub access: IssuedToken,
    /// Refresh token.
    pub refresh: IssuedToken,
}

// =============================================================================
// TokenService
// =============================================================================

/// Issues, verifies and revokes persisted JWTs.
#[derive(Debug, Clone)]
pub struct TokenService {
    jwt: Arc<JwtManager>,
    tokens: Arc<dyn TokenStore>,
    users: Arc<dyn UserStore>,
}

impl TokenService {
    /// Creates a new token service.
    pub fn new(jwt: Arc<JwtManager>, tokens: Arc<dyn TokenStore>, users: Arc<dyn UserStore>) -> Self {
        Self { jwt, tokens, users }
    }

    /// Returns the JWT manager.
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Signs a token for a user without persisting it.
    pub fn generate_token(
        &self,
        user_id: &str,
        expires: DateTime<Utc>,
        token_type: TokenType,
    ) -> ApiResult<String> {
        self.jwt.issue(user_id, token_type, expires)
    }

    /// Persists a token record.
    pub async fn save_token(
        &self,
        token: &str,
        user_id: &str,
        expires: DateTime<Utc>,
        token_type: TokenType,
    ) -> ApiResult<TokenRecord> {
        let record = TokenRecord::new(token, user_id, token_type, expires);
        self.tokens.insert_token(record.clone()).await?;
        Ok(record)
    }

    /// Decodes a token and checks that it has the expected type.
    ///
    /// Fails with 401 `AUTH: authentication failed; <reason>`.
    pub fn decode(&self, token: &str, token_type: TokenType) -> ApiResult<Claims> {
        let claims = self.jwt.decode(token).map_err(|e| {
            ApiError::unauthorized(format!("AUTH: authentication failed; {}", e.user_message()))
        })?;

        if claims.token_type != token_type {
            return Err(ApiError::unauthorized(
                "AUTH: authentication failed; invalid token type",
            ));
        }
        Ok(claims)
    }

    /// Looks up a usable record for an already decoded token.
    ///
    /// Fails with 403 if the record is missing, blacklisted or expired.
    pub async fn find_valid_record(
        &self,
        token: &str,
        token_type: TokenType,
        user_id: &str,
    ) -> ApiResult<TokenRecord> {
        let query = TokenQuery::new(token, token_type)
            .with_user(user_id)
            .with_blacklisted(false);

        match self.tokens.find_token(&query).await? {
            Some(record) if record.is_usable_at(Utc::now()) => Ok(record),
            _ => Err(ApiError::forbidden(EXPIRED_OR_INVALID)),
        }
    }

    /// Verifies signature, expiry and type, then requires a usable record.
    pub async fn verify_token(&self, token: &str, token_type: TokenType) -> ApiResult<TokenRecord> {
        let claims = self.decode(token, token_type)?;
        self.find_valid_record(token, token_type, &claims.sub).await
    }

    /// Issues and persists an access/refresh pair for a user.
    pub async fn generate_auth_tokens(&self, user: &User) -> ApiResult<AuthTokens> {
        let now = Utc::now();
        let access = self.issue_and_save(&user.id, TokenType::Access, now).await?;
        let refresh = self.issue_and_save(&user.id, TokenType::Refresh, now).await?;

        tracing::debug!(user_id = %user.id, "Issued auth tokens");
        Ok(AuthTokens { access, refresh })
    }

    /// Issues and persists a reset-password token for the account with the
    /// given email.
    pub async fn generate_reset_password_token(&self, email: &str) -> ApiResult<String> {
        if email.trim().is_empty() {
            return Err(ApiError::bad_request("TOKEN: invalid email"));
        }

        let email = rcm_core::models::normalize_email(email);
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::bad_request("TOKEN: user does not exists"))?;

        let issued = self
            .issue_and_save(&user.id, TokenType::ResetPassword, Utc::now())
            .await?;

        tracing::info!(user_id = %user.id, "Issued reset-password token");
        Ok(issued.token)
    }

    /// Finds a record by token string and type.
    pub async fn find_token(
        &self,
        token: &str,
        token_type: TokenType,
        blacklisted: bool,
    ) -> ApiResult<TokenRecord> {
        let query = TokenQuery::new(token, token_type).with_blacklisted(blacklisted);
        self.tokens
            .find_token(&query)
            .await?
            .ok_or_else(|| ApiError::bad_request("TOKEN: not found"))
    }

    /// Deletes the record of a token.
    pub async fn delete_token(&self, token: &str, token_type: TokenType) -> ApiResult<TokenRecord> {
        let record = self
            .tokens
            .find_token(&TokenQuery::new(token, token_type))
            .await?
            .ok_or_else(|| ApiError::bad_request("TOKEN: not found"))?;

        self.tokens.delete_token(&record.id).await?;
        Ok(record)
    }

    /// Deletes every record of a user, optionally only of one type.
    pub async fn delete_tokens_by_user(
        &self,
        user_id: &str,
        token_type: Option<TokenType>,
    ) -> ApiResult<u64> {
        Ok(self.tokens.delete_tokens_by_user(user_id, token_type).await?)
    }

    /// Blacklists the record of a token so it can no longer be used.
    pub async fn revoke_token(&self, token: &str, token_type: TokenType) -> ApiResult<()> {
        let record = self.find_token(token, token_type, false).await?;
        self.tokens.set_blacklisted(&record.id, true).await?;
        tracing::debug!(user_id = %record.user, token_type = %token_type, "Token revoked");
        Ok(())
    }

    /// Removes every expired record.
    pub async fn purge_expired(&self) -> ApiResult<u64> {
        let removed = self.tokens.purge_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Purged expired tokens");
        }
        Ok(removed)
    }

    async fn issue_and_save(
        &self,
        user_id: &str,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> ApiResult<IssuedToken> {
        let expires = self.jwt.expiration_for(token_type, now)?;
        let token = self.generate_token(user_id, expires, token_type)?;
        self.save_token(&token, user_id, expires, token_type).await?;
        Ok(IssuedToken { token, expires })
    }
}

// =============================================================================
// Tests
// =============================================================================
