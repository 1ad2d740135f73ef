// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission strings and merged rights maps.
//!
//! A permission is written either as `resource-modes`, where every mode
//! letter is one of `o` (own), `r` (read), `w` (write) or `x` (delete), or as
//! `route$action`:
//!
//! ```text
//! user-orw      -> user:  {own, read, write}
//! auth$logout   -> auth:  {logout}
//! ```
//!
//! Permissions held by a user are merged into a [`RightsMap`] and compared
//! against the map required by a route.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

/// Resource whose `o` mode ties access to the `userId` path parameter.
pub const OWNERSHIP_RESOURCE: &str = "user";

// =============================================================================
// Mode / Grant
// =============================================================================

/// Access mode on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    /// Own record only (`o`).
    Own,
    /// Read (`r`).
    Read,
    /// Write (`w`).
    Write,
    /// Delete (`x`).
    Delete,
}

impl Mode {
    /// Parses a mode letter.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'o' => Some(Mode::Own),
            'r' => Some(Mode::Read),
            'w' => Some(Mode::Write),
            'x' => Some(Mode::Delete),
            _ => None,
        }
    }

    /// Returns the mode letter.
    pub fn letter(&self) -> char {
        match self {
            Mode::Own => 'o',
            Mode::Read => 'r',
            Mode::Write => 'w',
            Mode::Delete => 'x',
        }
    }
}

/// A single right on a resource: an access mode or a named action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grant {
    /// Access mode.
    Mode(Mode),
    /// Named route action.
    Action(String),
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grant::Mode(mode) => write!(f, "{}", mode.letter()),
            Grant::Action(action) => write!(f, "${}", action),
        }
    }
}

// =============================================================================
// Permission
// =============================================================================

/// Error returned for a malformed permission string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid permission '{0}'")]
pub struct InvalidPermission(pub String);

/// A parsed permission string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    /// Resource or route name.
    pub resource: String,
    /// Rights granted on the resource.
    pub grants: BTreeSet<Grant>,
}

impl Permission {
    /// Parses `resource-modes` or `route$action`.
    pub fn parse(s: &str) -> Result<Self, InvalidPermission> {
        let invalid = || InvalidPermission(s.to_string());

        if let Some((route, action)) = s.split_once('$') {
            if !is_name(route) || !is_name(action) {
                return Err(invalid());
            }
            return Ok(Self {
                resource: route.to_string(),
                grants: BTreeSet::from([Grant::Action(action.to_string())]),
            });
        }

        let (resource, modes) = s.split_once('-').ok_or_else(invalid)?;
        if !is_name(resource) || modes.is_empty() {
            return Err(invalid());
        }

        let grants = modes
            .chars()
            .map(|c| Mode::from_letter(c).map(Grant::Mode))
            .collect::<Option<BTreeSet<_>>>()
            .ok_or_else(invalid)?;

        Ok(Self {
            resource: resource.to_string(),
            grants,
        })
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut modes = String::new();
        for grant in &self.grants {
            match grant {
                Grant::Mode(mode) => modes.push(mode.letter()),
                Grant::Action(action) => return write!(f, "{}${}", self.resource, action),
            }
        }
        write!(f, "{}-{}", self.resource, modes)
    }
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// =============================================================================
// RightsMap
// =============================================================================

/// Resource name to granted rights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RightsMap {
    rights: BTreeMap<String, BTreeSet<Grant>>,
}

impl RightsMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and merges a list of permission strings.
    pub fn parse<I, S>(permissions: I) -> Result<Self, InvalidPermission>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for permission in permissions {
            map.grant(Permission::parse(permission.as_ref())?);
        }
        Ok(map)
    }

    /// Adds the rights of a permission.
    pub fn grant(&mut self, permission: Permission) {
        self.rights
            .entry(permission.resource)
            .or_default()
            .extend(permission.grants);
    }

    /// Unions another map into this one, resource by resource.
    pub fn merge(&mut self, other: &RightsMap) {
        for (resource, grants) in &other.rights {
            self.rights
                .entry(resource.clone())
                .or_default()
                .extend(grants.iter().cloned());
        }
    }

    /// Returns `true` if every resource in `required` is present here with
    /// every required grant. An empty requirement is always satisfied.
    pub fn satisfies(&self, required: &RightsMap) -> bool {
        required.rights.iter().all(|(resource, needed)| {
            self.rights
                .get(resource)
                .is_some_and(|held| needed.is_subset(held))
        })
    }

    /// Returns `true` if this requirement restricts access to the caller's own
    /// user record.
    pub fn requires_ownership(&self) -> bool {
        self.contains(OWNERSHIP_RESOURCE, &Grant::Mode(Mode::Own))
    }

    /// Returns `true` if the resource carries the grant.
    pub fn contains(&self, resource: &str, grant: &Grant) -> bool {
        self.rights
            .get(resource)
            .is_some_and(|grants| grants.contains(grant))
    }

    /// Returns `true` if no rights are held.
    pub fn is_empty(&self) -> bool {
        self.rights.is_empty()
    }

    /// Returns the map as permission strings, one per resource.
    pub fn to_strings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (resource, grants) in &self.rights {
            let modes: String = grants
                .iter()
                .filter_map(|g| match g {
                    Grant::Mode(mode) => Some(mode.letter()),
                    Grant::Action(_) => None,
                })
                .collect();
            if !modes.is_empty() {
                out.push(format!("{resource}-{modes}"));
            }
            for grant in grants {
                if let Grant::Action(action) = grant {
                    out.push(format!("{resource}${action}"));
                }
            }
        }
        out
    }
}

impl fmt::Display for RightsMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_strings().join(", "))
    }
}

// =============================================================================
// Tests
// =============================================================================
