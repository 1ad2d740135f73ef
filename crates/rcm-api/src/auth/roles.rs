// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Static role to rights table.

use std::collections::HashMap;
use std::sync::Arc;

use rcm_core::UserRole;

use super::rights::{InvalidPermission, RightsMap};

// =============================================================================
// RoleRights
// =============================================================================

/// Maps each role to the rights it grants.
///
/// Built once at startup and shared across all requests.
#[derive(Debug, Clone)]
pub struct RoleRights {
    table: Arc<HashMap<UserRole, RightsMap>>,
}

impl RoleRights {
    /// Returns the permission strings granted to a role by default.
    pub fn default_permissions(role: UserRole) -> &'static [&'static str] {
        match role {
            UserRole::Superadmin => &["user-orwx", "client-orwx", "auth$logout"],
            UserRole::Admin => &["user-orw", "client-orw", "auth$logout"],
            UserRole::User => &["user-o", "auth$logout"],
        }
    }

    /// Creates an empty table. No role grants anything.
    pub fn empty() -> Self {
        Self {
            table: Arc::new(HashMap::new()),
        }
    }

    /// Replaces the rights of a role.
    pub fn with_role<I, S>(mut self, role: UserRole, permissions: I) -> Result<Self, InvalidPermission>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rights = RightsMap::parse(permissions)?;
        Arc::make_mut(&mut self.table).insert(role, rights);
        Ok(self)
    }

    /// Returns the rights of a single role.
    pub fn get(&self, role: UserRole) -> Option<&RightsMap> {
        self.table.get(&role)
    }

    /// Merges the rights of every role the user holds.
    pub fn rights_for(&self, roles: &[UserRole]) -> RightsMap {
        let mut combined = RightsMap::new();
        for role in roles {
            if let Some(rights) = self.table.get(role) {
                combined.merge(rights);
            }
        }
        combined
    }
}

impl Default for RoleRights {
    fn default() -> Self {
        let table = UserRole::ALL
            .iter()
            .filter_map(|&role| {
                RightsMap::parse(Self::default_permissions(role))
                    .ok()
                    .map(|rights| (role, rights))
            })
            .collect();

        Self {
            table: Arc::new(table),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::rights::{Grant, Mode};

    #[test]
    fn test_default_table_parses() {
        for role in UserRole::ALL {
            assert!(RightsMap::parse(RoleRights::default_permissions(role)).is_ok());
        }
        let table = RoleRights::default();
        assert!(table.get(UserRole::Superadmin).is_some());
        assert!(table.get(UserRole::Admin).is_some());
        assert!(table.get(UserRole::User).is_some());
    }

    #[test]
    fn test_user_rights() {
        let rights = RoleRights::default().rights_for(&[UserRole::User]);

        assert!(rights.contains("user", &Grant::Mode(Mode::Own)));
        assert!(!rights.contains("user", &Grant::Mode(Mode::Read)));
        assert!(!rights.contains("client", &Grant::Mode(Mode::Own)));
        assert!(rights.contains("auth", &Grant::Action("logout".into())));
    }

    #[test]
    fn test_admin_cannot_delete() {
        let rights = RoleRights::default().rights_for(&[UserRole::Admin]);
        let delete = RightsMap::parse(["user-x"]).unwrap();

        assert!(!rights.satisfies(&delete));
        assert!(rights.satisfies(&RightsMap::parse(["user-rw", "client-orw"]).unwrap()));
    }

    #[test]
    fn test_merged_roles() {
        let rights = RoleRights::default().rights_for(&[UserRole::User, UserRole::Superadmin]);
        assert!(rights.satisfies(&RightsMap::parse(["user-orwx", "client-x"]).unwrap()));
    }

    #[test]
    fn test_missing_role_contributes_nothing() {
        let table = RoleRights::empty()
            .with_role(UserRole::Admin, ["client-r"])
            .unwrap();

        assert!(table.rights_for(&[UserRole::User]).is_empty());
        assert!(table.rights_for(&[]).is_empty());
        assert_eq!(
            table.rights_for(&[UserRole::User, UserRole::Admin]).to_strings(),
            vec!["client-r"]
        );
    }

    #[test]
    fn test_with_role_rejects_invalid() {
        assert!(RoleRights::empty().with_role(UserRole::User, ["user-z"]).is_err());
    }
}
