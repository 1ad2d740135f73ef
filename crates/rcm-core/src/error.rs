// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for models and storage backends.
//!
//! Every store implementation reports failures through [`CoreError`], so the
//! service layer can map them to HTTP responses without knowing which
//! backend is active.

use thiserror::Error;

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// CoreError
// =============================================================================

/// Errors raised by the domain and storage layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A unique field already holds the given value.
    #[error("{entity} with {field} '{value}' already exists")]
    Duplicate {
        /// Entity kind (e.g. "user").
        entity: &'static str,
        /// Field carrying the unique constraint.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// The referenced document does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Backend-provided message.
        message: String,
    },

    /// A document could not be (de)serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Password hashing or verification failed.
    #[error("Password hashing failed: {message}")]
    PasswordHash {
        /// Error message.
        message: String,
    },
}

impl CoreError {
    /// Creates a duplicate-key error.
    pub fn duplicate(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns `true` if the error points at a backend outage rather than
    /// a problem with the request.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            CoreError::Storage { .. } | CoreError::Serialization { .. } | CoreError::PasswordHash { .. }
        )
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            CoreError::Duplicate { .. } => "duplicate",
            CoreError::NotFound { .. } => "not_found",
            CoreError::Storage { .. } => "storage",
            CoreError::Serialization { .. } => "serialization",
            CoreError::PasswordHash { .. } => "password_hash",
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for CoreError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::PasswordHash {
            message: err.to_string(),
        }
    }
}
