// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use rcm_core::{PasswordHasher, Stores};

use crate::auth::{JwtManager, RoleRights};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::services::{AuthService, ClientService, TokenService, UserService};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Passed to handlers via Axum's state extraction mechanism.
#[derive(Clone, Debug)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Persistence backends.
    pub stores: Stores,
    /// JWT manager for token operations.
    pub jwt_manager: Arc<JwtManager>,
    /// Role to rights table.
    pub role_rights: RoleRights,
    /// Token service.
    pub tokens: TokenService,
    /// Authentication flows.
    pub auth: AuthService,
    /// User accounts.
    pub users: UserService,
    /// Client records.
    pub clients: ClientService,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the JWT manager.
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt_manager
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    stores: Option<Stores>,
    jwt_manager: Option<Arc<JwtManager>>,
    role_rights: Option<RoleRights>,
    hasher: Option<PasswordHasher>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the stores. Defaults to a fresh in-memory store.
    pub fn stores(mut self, stores: Stores) -> Self {
        self.stores = Some(stores);
        self
    }

    /// Sets the JWT manager.
    pub fn jwt_manager(mut self, manager: Arc<JwtManager>) -> Self {
        self.jwt_manager = Some(manager);
        self
    }

    /// Sets the role table.
    pub fn role_rights(mut self, roles: RoleRights) -> Self {
        self.role_rights = Some(roles);
        self
    }

    /// Sets the password hasher. Defaults to the configured bcrypt cost.
    pub fn password_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Builds the AppState and wires the services.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let jwt_manager = match self.jwt_manager {
            Some(manager) => manager,
            None => Arc::new(JwtManager::new(config.jwt.clone())?),
        };

        let hasher = match self.hasher {
            Some(hasher) => hasher,
            None => PasswordHasher::new(config.bcrypt_cost)
                .map_err(|e| ApiError::internal(e.to_string()))?,
        };

        let stores = self.stores.unwrap_or_else(Stores::in_memory);
        let role_rights = self.role_rights.unwrap_or_default();

        let tokens = TokenService::new(
            jwt_manager.clone(),
            stores.tokens.clone(),
            stores.users.clone(),
        );
        let users = UserService::new(stores.users.clone(), stores.tokens.clone(), hasher);
        let clients = ClientService::new(stores.clients.clone());
        let auth = AuthService::new(users.clone(), tokens.clone());

        Ok(AppState {
            config: Arc::new(config),
            stores,
            jwt_manager,
            role_rights,
            tokens,
            auth,
            users,
            clients,
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
