// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User accounts.

use std::sync::Arc;

use rcm_core::{
    NewUser, PasswordHasher, TokenStore, User, UserChanges, UserRole, UserStatus, UserStore,
    models::normalize_email, store::Page,
};

use super::{Listing, hash_password, require_id};
use crate::error::{ApiError, ApiResult};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Roles, `[user]` when absent.
    pub role: Option<Vec<UserRole>>,
    /// Status, `active` when absent.
    pub status: Option<UserStatus>,
}

/// Partial user update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// Display name.
    pub name: Option<String>,
    /// Login email.
    pub email: Option<String>,
    /// Plain-text password.
    pub password: Option<String>,
    /// Roles.
    pub role: Option<Vec<UserRole>>,
    /// Status.
    pub status: Option<UserStatus>,
}

/// Manages user accounts.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    hasher: PasswordHasher,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    /// Returns the password hasher.
    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Lists users.
    pub async fn find_all(&self, page: Page) -> ApiResult<Listing<User>> {
        let items = self.users.list_users(page).await?;
        let total = self.users.count_users().await?;
        Ok(Listing { items, total, page })
    }

    /// Finds a user by id.
    pub async fn find_by_id(&self, id: &str) -> ApiResult<User> {
        require_id(id, "User: invalid userId")?;
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User: user not found"))
    }

    /// Finds a user by email.
    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        Ok(self.users.find_user_by_email(&normalize_email(email)).await?)
    }

    /// Creates a user with a hashed password.
    pub async fn create_user(&self, input: CreateUser) -> ApiResult<User> {
        let email = normalize_email(&input.email);
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(email_taken(&email));
        }

        let password_hash = hash_password(self.hasher, input.password).await?;
        let mut new_user = NewUser::new(input.name, email, password_hash);
        if let Some(role) = input.role {
            new_user = new_user.with_roles(role);
        }
        if let Some(status) = input.status {
            new_user = new_user.with_status(status);
        }

        let user = self.users.insert_user(new_user.into_user()).await?;
        tracing::info!(user_id = %user.id, role = ?user.role, "User created");
        Ok(user)
    }

    /// Applies a partial update. A new password is re-hashed.
    pub async fn update_user(&self, id: &str, input: UpdateUser) -> ApiResult<User> {
        require_id(id, "User: invalid userId")?;
        let mut user = self
            .users
            .find_user(id)
            .await?
            .ok_or_else(|| ApiError::conflict("User: user not found"))?;

        let email = input.email.as_deref().map(normalize_email);
        if let Some(ref email) = email {
            if *email != user.email && self.users.find_user_by_email(email).await?.is_some() {
                return Err(email_taken(email));
            }
        }

        let password_hash = match input.password {
            Some(password) => Some(hash_password(self.hasher, password).await?),
            None => None,
        };

        user.apply(UserChanges {
            name: input.name,
            email,
            password_hash,
            role: input.role.filter(|r| !r.is_empty()),
            status: input.status,
        });

        let user = self
            .users
            .update_user(user)
            .await?
            .ok_or_else(|| ApiError::conflict("User: user not found"))?;
        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Deletes a user and every token record it owns.
    pub async fn delete_user(&self, id: &str) -> ApiResult<User> {
        require_id(id, "User: invalid userId")?;
        let user = self
            .users
            .delete_user(id)
            .await?
            .ok_or_else(|| ApiError::conflict("User: user not found"))?;

        let revoked = self.tokens.delete_tokens_by_user(&user.id, None).await?;
        tracing::info!(user_id = %user.id, revoked, "User deleted");
        Ok(user)
    }

    /// Creates the bootstrap superadmin unless an account with that email
    /// already exists. Returns the created user.
    pub async fn ensure_superadmin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<Option<User>> {
        if let Some(existing) = self.find_by_email(email).await? {
            if !existing.has_role(UserRole::Superadmin) {
                tracing::warn!(
                    user_id = %existing.id,
                    "Bootstrap account exists without the superadmin role"
                );
            }
            return Ok(None);
        }

        let user = self
            .create_user(CreateUser {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role: Some(vec![UserRole::Superadmin]),
                status: Some(UserStatus::Active),
            })
            .await?;
        Ok(Some(user))
    }
}

fn email_taken(email: &str) -> ApiError {
    ApiError::bad_request(format!("USER: email {} already exists", email))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use rcm_core::{Stores, TokenRecord, TokenType};

    fn service() -> (UserService, Stores) {
        let stores = Stores::in_memory();
        let service = UserService::new(
            stores.users.clone(),
            stores.tokens.clone(),
            PasswordHasher::for_testing(),
        );
        (service, stores)
    }

    fn input(email: &str) -> CreateUser {
        CreateUser {
            name: "Jane Doe".into(),
            email: email.into(),
            password: "password1".into(),
            role: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_defaults() {
        let (service, _) = service();
        let user = service.create_user(input("Jane@Example.com")).await.unwrap();

        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, vec![UserRole::User]);
        assert_eq!(user.status, UserStatus::Active);
        assert_ne!(user.password, "password1");
        assert!(service.hasher().verify("password1", &user.password));
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let (service, _) = service();
        service.create_user(input("jane@example.com")).await.unwrap();

        let err = service
            .create_user(input("JANE@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.user_message(),
            "USER: email jane@example.com already exists"
        );
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let (service, _) = service();
        let user = service.create_user(input("jane@example.com")).await.unwrap();

        assert_eq!(service.find_by_id(&user.id).await.unwrap().id, user.id);

        let err = service.find_by_id("").await.unwrap_err();
        assert_eq!(err.user_message(), "User: invalid userId");

        let err = service.find_by_id("missing").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "User: user not found");
    }

    #[tokio::test]
    async fn test_find_all_paged() {
        let (service, _) = service();
        for i in 0..3 {
            service
                .create_user(input(&format!("user{i}@example.com")))
                .await
                .unwrap();
        }

        let listing = service.find_all(Page::new(1, 1)).await.unwrap();
        assert_eq!(listing.total, 3);
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].email, "user1@example.com");
    }

    #[tokio::test]
    async fn test_update_user() {
        let (service, _) = service();
        let user = service.create_user(input("jane@example.com")).await.unwrap();

        let updated = service
            .update_user(
                &user.id,
                UpdateUser {
                    name: Some("Janet".into()),
                    password: Some("new-password".into()),
                    status: Some(UserStatus::Review),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Janet");
        assert_eq!(updated.status, UserStatus::Review);
        assert!(service.hasher().verify("new-password", &updated.password));
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn test_update_email_conflict() {
        let (service, _) = service();
        let jane = service.create_user(input("jane@example.com")).await.unwrap();
        service.create_user(input("john@example.com")).await.unwrap();

        let err = service
            .update_user(
                &jane.id,
                UpdateUser {
                    email: Some("john@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        // Re-submitting the current email is not a conflict.
        service
            .update_user(
                &jane.id,
                UpdateUser {
                    email: Some("JANE@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (service, _) = service();
        let err = service
            .update_user("missing", UpdateUser::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "User: user not found");
    }

    #[tokio::test]
    async fn test_delete_user_cascades_tokens() {
        let (service, stores) = service();
        let user = service.create_user(input("jane@example.com")).await.unwrap();
        let expires = Utc::now() + chrono::Duration::hours(1);
        for token_type in [TokenType::Access, TokenType::Refresh, TokenType::ResetPassword] {
            stores
                .tokens
                .insert_token(TokenRecord::new(
                    format!("{token_type}-token"),
                    &user.id,
                    token_type,
                    expires,
                ))
                .await
                .unwrap();
        }

        service.delete_user(&user.id).await.unwrap();

        assert!(stores.users.find_user(&user.id).await.unwrap().is_none());
        assert_eq!(
            stores.tokens.delete_tokens_by_user(&user.id, None).await.unwrap(),
            0
        );

        let err = service.delete_user(&user.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_ensure_superadmin() {
        let (service, _) = service();

        let created = service
            .ensure_superadmin("Admin", "admin@example.com", "secret-password")
            .await
            .unwrap()
            .unwrap();
        assert!(created.has_role(UserRole::Superadmin));

        let again = service
            .ensure_superadmin("Admin", "admin@example.com", "secret-password")
            .await
            .unwrap();
        assert!(again.is_none());
    }
}
