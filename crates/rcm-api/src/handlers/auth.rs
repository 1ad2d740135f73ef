// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;

// =============================================================================
// Signup
// =============================================================================

/// Signup request body.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    /// Login email.
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// POST /{version}/auth/signup
///
/// Registers a plain `user` account and logs it in.
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state
        .auth
        .signup(request.name, request.email, request.password)
        .await?;

    Ok(ApiResponse::created(result, "created"))
}

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// POST /{version}/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.auth.login(&request.email, &request.password).await?;
    Ok(ApiResponse::ok(result, "logged in"))
}

// =============================================================================
// Logout
// =============================================================================

/// Logout request body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    /// Access token being retired. Must be the bearer token.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub access_token: String,
    /// Refresh token issued with it.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub refresh_token: String,
}

/// POST /{version}/auth/logout
///
/// Deletes both token records. A caller can only log out its own session.
pub async fn logout(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<LogoutRequest>,
) -> ApiResult<impl IntoResponse> {
    if ctx.token != request.access_token {
        tracing::warn!(user_id = %ctx.user_id(), "Logout with a foreign access token");
        return Err(ApiError::forbidden("AUTH: no access rights"));
    }

    state
        .auth
        .logout(&request.access_token, &request.refresh_token)
        .await?;

    Ok(ApiResponse::ok((), "logged out"))
}

// =============================================================================
// Refresh Tokens
// =============================================================================

/// Refresh request body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub refresh_token: String,
}

/// POST /{version}/auth/refresh-tokens
pub async fn refresh_tokens(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let tokens = state.auth.refresh_auth(&request.refresh_token).await?;
    Ok(ApiResponse::ok(tokens, "tokens refreshed"))
}

// =============================================================================
// Password Reset
// =============================================================================

/// Forgot-password request body.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    /// Account email.
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
}

/// Issued reset token.
#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    /// Reset-password token.
    pub token: String,
}

/// POST /{version}/auth/forgot-password
///
/// The token is returned in the response; delivering it to the user is
/// left to the caller.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = state.auth.forgot_password(&request.email).await?;
    Ok(ApiResponse::ok(ResetTokenResponse { token }, "reset token created"))
}

/// Reset-password request body.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// Reset-password token.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub token: String,
    /// New password.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// POST /{version}/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .auth
        .reset_password(&request.token, request.password)
        .await?;
    Ok(ApiResponse::ok((), "password reset"))
}
