// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User management handlers.

use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use rcm_core::{PublicUser, UserRole, UserStatus};
use serde::Deserialize;
use validator::Validate;

use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Pagination, ValidatedJson};
use crate::response::{ApiResponse, ResponseMeta};
use crate::services::{CreateUser, UpdateUser};
use crate::state::AppState;

// =============================================================================
// Request Bodies
// =============================================================================

/// Create-user request body.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Display name.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    /// Login email.
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
    /// Status, `active` when absent.
    pub status: Option<UserStatus>,
    /// Roles, `[user]` when absent.
    #[validate(length(min = 1, message = "must hold at least one role"))]
    pub role: Option<Vec<UserRole>>,
}

/// Update-user request body. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// Display name.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: Option<String>,
    /// Login email.
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    /// New password.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: Option<String>,
    /// Status.
    pub status: Option<UserStatus>,
    /// Roles.
    #[validate(length(min = 1, message = "must hold at least one role"))]
    pub role: Option<Vec<UserRole>>,
}

// =============================================================================
// Handlers
// =============================================================================

const BEYOND_OWN_RIGHTS: &str = "USER: cannot manage rights beyond your own";

/// Refuses roles whose combined rights the caller does not hold.
fn ensure_within_rights(state: &AppState, ctx: &AuthContext, roles: &[UserRole]) -> ApiResult<()> {
    if ctx.satisfies(&state.role_rights.rights_for(roles)) {
        Ok(())
    } else {
        Err(ApiError::forbidden(BEYOND_OWN_RIGHTS))
    }
}

/// GET /{version}/users/{userId}
///
/// Only the owner of the record passes the rights check.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.find_by_id(&user_id).await?;
    Ok(ApiResponse::ok(user.to_public(), "getUser"))
}

/// GET /{version}/users
pub async fn list_users(
    State(state): State<AppState>,
    Pagination(params): Pagination,
) -> ApiResult<impl IntoResponse> {
    let listing = state.users.find_all(params.page()).await?;
    let users: Vec<PublicUser> = listing.items.iter().map(PublicUser::from).collect();

    Ok(ApiResponse::ok(users, "allUsers").with_meta(ResponseMeta::pagination(
        listing.total,
        params.page,
        params.limit(),
    )))
}

/// POST /{version}/users
///
/// Granted roles may not carry rights the caller lacks.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(ref roles) = request.role {
        ensure_within_rights(&state, &ctx, roles)?;
    }

    let user = state
        .users
        .create_user(CreateUser {
            name: request.name,
            email: request.email,
            password: request.password,
            role: request.role,
            status: request.status,
        })
        .await?;

    Ok(ApiResponse::created(user.to_public(), "createdUser"))
}

/// PATCH /{version}/users/{userId}
///
/// Neither the new roles nor the target's current roles may carry rights the
/// caller lacks.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(user_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(ref roles) = request.role {
        ensure_within_rights(&state, &ctx, roles)?;
    }
    if !ctx.is_owner(&user_id) {
        if let Some(target) = state.stores.users.find_user(&user_id).await? {
            ensure_within_rights(&state, &ctx, &target.role)?;
        }
    }

    let user = state
        .users
        .update_user(
            &user_id,
            UpdateUser {
                name: request.name,
                email: request.email,
                password: request.password,
                role: request.role,
                status: request.status,
            },
        )
        .await?;

    Ok(ApiResponse::ok(user.to_public(), "updatedUser"))
}

/// DELETE /{version}/users/{userId}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.delete_user(&user_id).await?;
    Ok(ApiResponse::ok(user.to_public(), "deletedUser"))
}
