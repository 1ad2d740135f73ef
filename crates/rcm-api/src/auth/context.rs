// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;
use std::sync::Arc;

use rcm_core::{User, UserRole};
use uuid::Uuid;

use super::RightsMap;

/// Authentication context for a request.
///
/// Attached to request extensions once the bearer token, its record and its
/// user have been verified.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user.
    pub user: Arc<User>,
    /// Merged rights of the user's roles.
    pub rights: Arc<RightsMap>,
    /// Bearer token the request was authenticated with.
    pub token: String,
    /// Request ID for tracing.
    pub request_id: Uuid,
    /// Client IP address.
    pub client_ip: Option<IpAddr>,
}

impl AuthContext {
    /// Creates a new context.
    pub fn new(user: User, rights: RightsMap, token: impl Into<String>) -> Self {
        Self {
            user: Arc::new(user),
            rights: Arc::new(rights),
            token: token.into(),
            request_id: Uuid::now_v7(),
            client_ip: None,
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Returns `true` if the user holds the role.
    pub fn has_role(&self, role: UserRole) -> bool {
        self.user.has_role(role)
    }

    /// Returns `true` if the held rights cover the requirement.
    pub fn satisfies(&self, required: &RightsMap) -> bool {
        self.rights.satisfies(required)
    }

    /// Returns `true` if the id names the authenticated user.
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.user.id == user_id
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RoleRights;
    use rcm_core::NewUser;

    fn context(role: UserRole) -> AuthContext {
        let user = NewUser::new("Jane", "jane@example.com", "hash")
            .with_roles(vec![role])
            .into_user();
        let rights = RoleRights::default().rights_for(&user.role);
        AuthContext::new(user, rights, "token")
    }

    #[test]
    fn test_context_rights() {
        let ctx = context(UserRole::Admin);

        assert!(ctx.has_role(UserRole::Admin));
        assert!(ctx.satisfies(&RightsMap::parse(["user-rw"]).unwrap()));
        assert!(!ctx.satisfies(&RightsMap::parse(["user-x"]).unwrap()));
        assert_eq!(ctx.token, "token");
    }

    #[test]
    fn test_is_owner() {
        let ctx = context(UserRole::User);
        let id = ctx.user_id().to_string();

        assert!(ctx.is_owner(&id));
        assert!(!ctx.is_owner("someone-else"));
    }

    #[test]
    fn test_with_client_ip() {
        let ctx = context(UserRole::User).with_client_ip("10.0.0.1".parse().unwrap());
        assert_eq!(ctx.client_ip, Some("10.0.0.1".parse().unwrap()));
    }
}
