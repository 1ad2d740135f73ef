// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User accounts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, normalize_email};

// =============================================================================
// UserRole
// =============================================================================

/// Role granted to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access, including deletes.
    Superadmin,
    /// Manages users and clients.
    Admin,
    /// Regular account; may only see its own record.
    #[default]
    User,
}

impl UserRole {
    /// All known roles.
    pub const ALL: [UserRole; 3] = [UserRole::Superadmin, UserRole::Admin, UserRole::User];

    /// Returns the role name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Superadmin => "superadmin",
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    /// Parses a role name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "superadmin" => Some(UserRole::Superadmin),
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// UserStatus
// =============================================================================

/// Lifecycle status of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UserStatus {
    /// Active account.
    #[default]
    #[serde(rename = "active")]
    Active,
    /// Temporarily inactive.
    #[serde(rename = "inactive")]
    Inactive,
    /// Disabled by an administrator.
    #[serde(rename = "disabled")]
    Disabled,
    /// Awaiting review.
    #[serde(rename = "for review")]
    Review,
}

impl UserStatus {
    /// Returns the status as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Disabled => "disabled",
            UserStatus::Review => "for review",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// User
// =============================================================================

/// A stored user account.
///
/// `password` holds the bcrypt hash. Use [`PublicUser`] for anything that
/// leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unique, normalized email.
    pub email: String,
    /// Bcrypt password hash.
    pub password: String,
    /// Granted roles.
    #[serde(default = "default_roles")]
    pub role: Vec<UserRole>,
    /// Account status.
    #[serde(default)]
    pub status: UserStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

fn default_roles() -> Vec<UserRole> {
    vec![UserRole::User]
}

impl User {
    /// Returns `true` if the user holds the given role.
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role.contains(&role)
    }

    /// Returns the view of this user that is safe to expose.
    pub fn to_public(&self) -> PublicUser {
        PublicUser::from(self)
    }

    /// Applies a partial update and bumps `updated_at`.
    pub fn apply(&mut self, changes: UserChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(email) = changes.email {
            self.email = normalize_email(&email);
        }
        if let Some(password) = changes.password_hash {
            self.password = password;
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// NewUser
// =============================================================================

/// Input for creating a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Email (normalized on conversion).
    pub email: String,
    /// Bcrypt password hash.
    pub password_hash: String,
    /// Roles; defaults to `[user]`.
    pub role: Vec<UserRole>,
    /// Status; defaults to `active`.
    pub status: UserStatus,
}

impl NewUser {
    /// Creates a plain `user` account input.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: default_roles(),
            status: UserStatus::default(),
        }
    }

    /// Sets the roles. An empty list falls back to `[user]`.
    pub fn with_roles(mut self, role: Vec<UserRole>) -> Self {
        self.role = if role.is_empty() { default_roles() } else { role };
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    /// Builds the stored document with a fresh id and timestamps.
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: new_id(),
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password_hash,
            role: self.role,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// UserChanges
// =============================================================================

/// Partial update of a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New bcrypt hash.
    pub password_hash: Option<String>,
    /// New roles.
    pub role: Option<Vec<UserRole>>,
    /// New status.
    pub status: Option<UserStatus>,
}

impl UserChanges {
    /// Returns `true` if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.status.is_none()
    }
}

// =============================================================================
// PublicUser
// =============================================================================

/// User representation without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// Document id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Granted roles.
    pub role: Vec<UserRole>,
    /// Account status.
    pub status: UserStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("SuperAdmin"), Some(UserRole::Superadmin));
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("root"), None);
        assert_eq!(UserRole::User.to_string(), "user");
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&UserStatus::Review).unwrap();
        assert_eq!(json, "\"for review\"");
        let parsed: UserStatus = serde_json::from_str("\"disabled\"").unwrap();
        assert_eq!(parsed, UserStatus::Disabled);
    }

    #[test]
    fn test_new_user_defaults() {
        let user = NewUser::new(" Jane ", "Jane@Example.com", "hash").into_user();
        assert_eq!(user.name, "Jane");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.role, vec![UserRole::User]);
        assert_eq!(user.status, UserStatus::Active);
        assert!(!user.id.is_empty());
    }

    #[test]
    fn test_empty_roles_fall_back() {
        let user = NewUser::new("a", "a@b.c", "h").with_roles(vec![]).into_user();
        assert_eq!(user.role, vec![UserRole::User]);
    }

    #[test]
    fn test_apply_changes() {
        let mut user = NewUser::new("a", "a@b.c", "h").into_user();
        let before = user.updated_at;
        user.apply(UserChanges {
            email: Some("NEW@b.c".into()),
            status: Some(UserStatus::Inactive),
            ..Default::default()
        });
        assert_eq!(user.email, "new@b.c");
        assert_eq!(user.status, UserStatus::Inactive);
        assert_eq!(user.name, "a");
        assert!(user.updated_at >= before);
    }

    #[test]
    fn test_public_user_hides_password() {
        let user = NewUser::new("a", "a@b.c", "secret-hash").into_user();
        let json = serde_json::to_value(user.to_public()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.c");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_user_changes_is_empty() {
        assert!(UserChanges::default().is_empty());
        let changes = UserChanges {
            name: Some("b".into()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
