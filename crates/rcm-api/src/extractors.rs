// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use rcm_core::store::Page;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::AuthContext;
use crate::error::ApiError;

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Extracts the `AuthContext` inserted by the auth middleware. Returns 401
/// on routes the middleware does not cover.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.user.name)
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiError::unauthorized("AUTH: invalid token"))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Extractor for JSON bodies checked with [`Validate`].
///
/// Malformed JSON is a 400; failed field rules are a 400 with per-field
/// details.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Pagination Extractor
// =============================================================================

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Query parameters for pagination.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_per_page", alias = "limit")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Returns the offset for store queries.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit())
    }

    /// Returns the limit for store queries.
    pub fn limit(&self) -> u32 {
        self.per_page.min(MAX_PER_PAGE)
    }

    /// Returns the store page.
    pub fn page(&self) -> Page {
        Page::new(self.offset(), u64::from(self.limit()))
    }

    /// Validates the pagination parameters.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.page == 0 {
            return Err(ApiError::validation("page must be greater than 0"));
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ApiError::validation(format!(
                "perPage must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        Ok(())
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

/// Extractor for pagination parameters.
pub struct Pagination(pub PaginationParams);

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid pagination parameters: {}", e.body_text())))?;

        params.validate()?;
        Ok(Pagination(params))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{self, StatusCode};
    use serde::Deserialize;

    #[test]
    fn test_pagination_offsets() {
        let params = PaginationParams {
            page: 3,
            per_page: 10,
        };
        assert_eq!(params.offset(), 20);
        assert_eq!(params.page(), Page::new(20, 10));

        let params = PaginationParams::default();
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_pagination_validate() {
        assert!(PaginationParams::default().validate().is_ok());
        assert!(PaginationParams { page: 0, per_page: 10 }.validate().is_err());
        assert!(PaginationParams { page: 1, per_page: 101 }.validate().is_err());
    }

    #[tokio::test]
    async fn test_pagination_extractor() {
        let req = http::Request::builder()
            .uri("/users?page=2&perPage=5")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let Pagination(params) = Pagination::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(params.page, 2);
        assert_eq!(params.per_page, 5);
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Body1 {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        http::Request::builder()
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_validated_json() {
        let ValidatedJson(body) = ValidatedJson::<Body1>::from_request(json_request(r#"{"name":"x"}"#), &())
            .await
            .unwrap();
        assert_eq!(body.name, "x");

        let err = ValidatedJson::<Body1>::from_request(json_request(r#"{"name":""}"#), &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "name: must not be empty");

        let err = ValidatedJson::<Body1>::from_request(json_request("{"), &())
            .await
            .err()
            .unwrap();
        assert!(err.user_message().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn test_auth_missing() {
        let req = http::Request::builder().body(Body::empty()).unwrap();
        let (mut parts, _) = req.into_parts();
        let err = Auth::from_request_parts(&mut parts, &()).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
