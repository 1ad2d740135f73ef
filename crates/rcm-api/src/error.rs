// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! Every error renders as
//!
//! ```json
//! { "response": { "code": 403, "message": "AUTH: no access rights" } }
//! ```
//!
//! Validation failures add a `details` object with per-field messages.
//! Server-side failures are logged in full and answered with a generic
//! message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rcm_core::CoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// API error type with HTTP status code mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404).
    #[error("Not found: {message}")]
    NotFound {
        /// Error message.
        message: String,
    },

    /// Bad request (400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Unauthorized (401).
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message.
        message: String,
    },

    /// Forbidden (403).
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Error message.
        message: String,
    },

    /// Request body failed validation (400).
    #[error("Validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
        /// Field-specific errors.
        #[source]
        errors: Option<FieldErrors>,
    },

    /// Conflict (409).
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message.
        message: String,
    },

    /// Service unavailable (503).
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Error message.
        message: String,
    },

    /// Internal server error (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl ApiError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: None,
        }
    }

    /// Creates a validation error with field errors.
    pub fn validation_with_errors(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            errors: Some(errors),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a service unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::Forbidden { .. } => "forbidden",
            ApiError::Validation { .. } => "validation",
            ApiError::Conflict { .. } => "conflict",
            ApiError::ServiceUnavailable { .. } => "unavailable",
            ApiError::Internal { .. } => "internal",
        }
    }

    /// Returns the message sent to the client.
    ///
    /// Server errors are replaced by the status text so internal details
    /// never leave the process.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound { message }
            | ApiError::BadRequest { message }
            | ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::Validation { message, .. }
            | ApiError::Conflict { message } => message.clone(),
            ApiError::ServiceUnavailable { .. } => "Service Unavailable".to_string(),
            ApiError::Internal { .. } => "Internal Server Error".to_string(),
        }
    }

    /// Returns `true` for failures on the server side.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ApiError::Internal { .. } | ApiError::ServiceUnavailable { .. }
        )
    }

    fn field_details(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation {
                errors: Some(errors),
                ..
            } => Some(errors),
            _ => None,
        }
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), status = %status, "Request rejected");
        }

        let envelope = ErrorEnvelope {
            response: ErrorBody {
                code: status.as_u16(),
                message: self.user_message(),
                details: self.field_details().cloned(),
            },
        };

        (status, Json(envelope)).into_response()
    }
}

// =============================================================================
// Error Envelope
// =============================================================================

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error payload.
    pub response: ErrorBody,
}

/// The `response` object of an [`ErrorEnvelope`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code.
    pub code: u16,
    /// Message shown to the caller.
    pub message: String,
    /// Per-field failures, validation errors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

// =============================================================================
// Field Errors
// =============================================================================

/// Failed request fields, sorted by field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldErrors {
    /// One entry per failed rule.
    pub fields: Vec<FieldError>,
}

impl FieldErrors {
    /// Records a failed rule for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns `true` if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Summary line, `"<field>: <message>"` for the first failure.
    fn summary(&self) -> String {
        self.fields
            .first()
            .map(|f| format!("{}: {}", f.field, f.message))
            .unwrap_or_else(|| "Validation failed".to_string())
    }
}

impl std::error::Error for FieldErrors {}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} invalid field(s)", self.fields.len())
    }
}

/// A field and the rule it failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears in the request body.
    pub field: String,
    /// What the value must satisfy.
    pub message: String,
}

// =============================================================================
// From Implementations
// =============================================================================

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut failed: Vec<_> = err.field_errors().into_iter().collect();
        failed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut errors = FieldErrors::default();
        for (field, failures) in failed {
            for failure in failures {
                let message = match failure.message {
                    Some(ref message) => message.to_string(),
                    None => format!("failed '{}' check", failure.code),
                };
                errors.add(field.to_string(), message);
            }
        }

        ApiError::validation_with_errors(errors.summary(), errors)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Duplicate {
                entity,
                field,
                value,
            } => ApiError::bad_request(format!(
                "{}: {} {} already exists",
                entity.to_uppercase(),
                field,
                value
            )),
            CoreError::NotFound { entity, id } => {
                ApiError::not_found(format!("{entity} '{id}' not found"))
            }
            CoreError::Storage { message } => ApiError::service_unavailable(message),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::internal(format!("Background task failed: {}", err))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::Validate;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::not_found("User: user not found"), StatusCode::NOT_FOUND),
            (ApiError::bad_request("TOKEN: not found"), StatusCode::BAD_REQUEST),
            (ApiError::unauthorized("AUTH: invalid token"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("AUTH: no access rights"), StatusCode::FORBIDDEN),
            (ApiError::validation("page must be greater than 0"), StatusCode::BAD_REQUEST),
            (ApiError::conflict("User: user not found"), StatusCode::CONFLICT),
            (ApiError::internal("hash failed"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
        assert_eq!(ApiError::forbidden("x").kind(), "forbidden");
    }

    #[test]
    fn test_internal_message_masked() {
        let err = ApiError::internal("db password rejected");
        assert_eq!(err.user_message(), "Internal Server Error");
        assert_eq!(
            ApiError::forbidden("AUTH: no access rights").user_message(),
            "AUTH: no access rights"
        );
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = ApiError::forbidden("AUTH: no access rights").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["response"]["code"], 403);
        assert_eq!(body["response"]["message"], "AUTH: no access rights");
        assert!(body["response"].get("details").is_none());
    }

    #[derive(Validate)]
    struct SignupForm {
        #[validate(email(message = "must be a valid email"))]
        email: String,
    }

    #[test]
    fn test_from_validator_errors() {
        let form = SignupForm {
            email: "nope".into(),
        };
        let err: ApiError = form.validate().unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "email: must be a valid email");
        let details = err.field_details().unwrap();
        assert_eq!(details.fields[0].field, "email");
        assert!(!details.is_empty());
    }

    #[test]
    fn test_from_core_error() {
        let err: ApiError = CoreError::duplicate("user", "email", "a@b.c").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "USER: email a@b.c already exists");

        let err: ApiError = CoreError::storage("connection refused").into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_server_error());
    }
}
