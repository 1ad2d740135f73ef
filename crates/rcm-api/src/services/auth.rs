// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Login, logout, token refresh and password reset.

use rcm_core::{PublicUser, TokenType, User, UserRole, UserStatus};
use serde::Serialize;

use super::{CreateUser, TokenService, UpdateUser, UserService, verify_password};
use super::token::AuthTokens;
use crate::error::{ApiError, ApiResult};

/// A user together with a freshly issued token pair.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    /// The authenticated user.
    pub user: PublicUser,
    /// Issued tokens.
    pub tokens: AuthTokens,
}

/// Authentication flows built on the user and token services.
#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserService,
    tokens: TokenService,
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(users: UserService, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    /// Registers a plain `user` account and logs it in.
    pub async fn signup(&self, name: String, email: String, password: String) -> ApiResult<LoginResult> {
        let user = self
            .users
            .create_user(CreateUser {
                name,
                email,
                password,
                role: Some(vec![UserRole::User]),
                status: Some(UserStatus::Active),
            })
            .await?;

        self.issue(user).await
    }

    /// Checks credentials and issues a token pair.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResult> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| ApiError::not_found("AUTH: user not found"))?;

        let matched = verify_password(
            self.users.hasher(),
            password.to_string(),
            user.password.clone(),
        )
        .await?;
        if !matched {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(ApiError::bad_request("AUTH: password did not match"));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue(user).await
    }

    /// Deletes the records of an access/refresh pair.
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> ApiResult<()> {
        let access = self
            .tokens
            .find_token(access_token, TokenType::Access, false)
            .await?;
        self.tokens
            .find_token(refresh_token, TokenType::Refresh, false)
            .await?;

        self.tokens.delete_token(access_token, TokenType::Access).await?;
        self.tokens.delete_token(refresh_token, TokenType::Refresh).await?;

        tracing::info!(user_id = %access.user, "User logged out");
        Ok(())
    }

    /// Exchanges a refresh token for a new pair. The old refresh token is
    /// blacklisted.
    pub async fn refresh_auth(&self, refresh_token: &str) -> ApiResult<AuthTokens> {
        let record = self
            .tokens
            .verify_token(refresh_token, TokenType::Refresh)
            .await?;
        let user = self.users.find_by_id(&record.user).await.map_err(|_| {
            ApiError::unauthorized("AUTH: authentication failed; user not found")
        })?;

        self.tokens
            .revoke_token(refresh_token, TokenType::Refresh)
            .await?;

        tracing::debug!(user_id = %user.id, "Tokens refreshed");
        self.tokens.generate_auth_tokens(&user).await
    }

    /// Issues a reset-password token for the account with that email.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<String> {
        self.tokens.generate_reset_password_token(email).await
    }

    /// Sets a new password using a reset-password token.
    pub async fn reset_password(&self, reset_token: &str, new_password: String) -> ApiResult<()> {
        let record = self
            .tokens
            .verify_token(reset_token, TokenType::ResetPassword)
            .await?;
        let user = self.users.find_by_id(&record.user).await.map_err(|_| {
            ApiError::unauthorized("AUTH: authentication failed; user not found")
        })?;

        self.users
            .update_user(
                &user.id,
                UpdateUser {
                    password: Some(new_password),
                    ..Default::default()
                },
            )
            .await?;

        self.tokens
            .delete_tokens_by_user(&user.id, Some(TokenType::ResetPassword))
            .await?;
        self.tokens
            .delete_tokens_by_user(&user.id, Some(TokenType::Refresh))
            .await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn issue(&self, user: User) -> ApiResult<LoginResult> {
        let tokens = self.tokens.generate_auth_tokens(&user).await?;
        Ok(LoginResult {
            user: user.to_public(),
            tokens,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtConfig, JwtManager};
    use axum::http::StatusCode;
    use rcm_core::{PasswordHasher, Stores};
    use std::sync::Arc;

    fn service() -> (AuthService, TokenService) {
        let stores = Stores::in_memory();
        let jwt = Arc::new(
            JwtManager::new(JwtConfig::new("test-secret-key-that-is-long-enough")).unwrap(),
        );
        let tokens = TokenService::new(jwt, stores.tokens.clone(), stores.users.clone());
        let users = UserService::new(
            stores.users.clone(),
            stores.tokens.clone(),
            PasswordHasher::for_testing(),
        );
        (AuthService::new(users, tokens.clone()), tokens)
    }

    async fn signup(auth: &AuthService) -> LoginResult {
        auth.signup(
            "Jane".into(),
            "jane@example.com".into(),
            "password1".into(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_signup_forces_user_role() {
        let (auth, tokens) = service();
        let result = signup(&auth).await;

        assert_eq!(result.user.role, vec![UserRole::User]);
        tokens
            .verify_token(&result.tokens.access.token, TokenType::Access)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login() {
        let (auth, _) = service();
        let created = signup(&auth).await;

        let result = auth.login("JANE@example.com", "password1").await.unwrap();
        assert_eq!(result.user.id, created.user.id);

        let err = auth.login("jane@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "AUTH: password did not match");

        let err = auth.login("nobody@example.com", "x").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "AUTH: user not found");
    }

    #[tokio::test]
    async fn test_logout() {
        let (auth, tokens) = service();
        let result = signup(&auth).await;
        let access = &result.tokens.access.token;
        let refresh = &result.tokens.refresh.token;

        auth.logout(access, refresh).await.unwrap();

        let err = tokens
            .verify_token(access, TokenType::Access)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = auth.logout(access, refresh).await.unwrap_err();
        assert_eq!(err.user_message(), "TOKEN: not found");
    }

    #[tokio::test]
    async fn test_logout_requires_both_tokens() {
        let (auth, tokens) = service();
        let result = signup(&auth).await;

        let err = auth
            .logout(&result.tokens.access.token, "bogus")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        // Nothing was deleted.
        tokens
            .verify_token(&result.tokens.access.token, TokenType::Access)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_refresh_auth() {
        let (auth, tokens) = service();
        let result = signup(&auth).await;
        let old_refresh = result.tokens.refresh.token.clone();

        let fresh = auth.refresh_auth(&old_refresh).await.unwrap();
        assert_ne!(fresh.refresh.token, old_refresh);
        tokens
            .verify_token(&fresh.access.token, TokenType::Access)
            .await
            .unwrap();

        // The old refresh token cannot be replayed.
        let err = auth.refresh_auth(&old_refresh).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        // An access token is not a refresh token.
        let err = auth.refresh_auth(&fresh.access.token).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let (auth, tokens) = service();
        let result = signup(&auth).await;

        let reset = auth.forgot_password("jane@example.com").await.unwrap();
        auth.reset_password(&reset, "brand-new-pass".into())
            .await
            .unwrap();

        auth.login("jane@example.com", "brand-new-pass").await.unwrap();
        assert!(auth.login("jane@example.com", "password1").await.is_err());

        // Reset and refresh tokens are gone; access tokens survive.
        assert!(auth.reset_password(&reset, "again-pass".into()).await.is_err());
        assert!(
            tokens
                .verify_token(&result.tokens.refresh.token, TokenType::Refresh)
                .await
                .is_err()
        );
        tokens
            .verify_token(&result.tokens.access.token, TokenType::Access)
            .await
            .unwrap();
    }
}
