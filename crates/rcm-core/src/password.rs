// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Password hashing.
//!
//! Wraps bcrypt with a configurable work factor. Hashing is CPU-bound, so
//! async callers should run it on a blocking thread.

use crate::error::{CoreError, CoreResult};

/// Bcrypt password hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Default work factor.
    pub const DEFAULT_COST: u32 = 10;
    /// Lowest cost bcrypt accepts.
    pub const MIN_COST: u32 = 4;
    /// Highest cost bcrypt accepts.
    pub const MAX_COST: u32 = 31;

    /// Creates a hasher, rejecting costs bcrypt does not support.
    pub fn new(cost: u32) -> CoreResult<Self> {
        if !(Self::MIN_COST..=Self::MAX_COST).contains(&cost) {
            return Err(CoreError::PasswordHash {
                message: format!(
                    "cost must be between {} and {}, got {}",
                    Self::MIN_COST,
                    Self::MAX_COST,
                    cost
                ),
            });
        }
        Ok(Self { cost })
    }

    /// Creates the cheapest hasher, for tests.
    pub fn for_testing() -> Self {
        Self {
            cost: Self::MIN_COST,
        }
    }

    /// Returns the work factor.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes a plain-text password.
    pub fn hash(&self, password: &str) -> CoreResult<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Checks a plain-text password against a stored hash.
    ///
    /// A malformed hash counts as a mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }
}
