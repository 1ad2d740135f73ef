// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! Builds the full router over a memory store and drives it in-process
//! with `tower::ServiceExt::oneshot`.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use rcm_api::services::{AuthTokens, CreateUser};
use rcm_api::{ApiConfig, ApiServerBuilder, AppState, JwtConfig};
use rcm_core::{PasswordHasher, User, UserRole};
use serde_json::Value;
use tower::ServiceExt;

use super::fixtures::{TEST_JWT_SECRET, TEST_PASSWORD};

/// Upper bound on response bodies read by the harness.
const MAX_BODY: usize = 1024 * 1024;

// =============================================================================
// TestResponse
// =============================================================================

/// Status and decoded JSON body of a response.
#[derive(Debug)]
pub struct TestResponse {
    /// Response status.
    pub status: StatusCode,
    /// Parsed body, `Value::Null` when empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// Returns the envelope `message` of a success response.
    pub fn message(&self) -> Option<&str> {
        self.body["message"].as_str()
    }

    /// Returns the `response.message` of an error response.
    pub fn error_message(&self) -> Option<&str> {
        self.body["response"]["message"].as_str()
    }

    /// Returns the envelope `data`.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

// =============================================================================
// TestApp
// =============================================================================

/// An application instance isolated to one test.
pub struct TestApp {
    /// Shared state, for seeding and inspecting stores directly.
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Creates an application with the default test configuration.
    pub fn new() -> Self {
        Self::with_config(Self::config())
    }

    /// Returns the default test configuration.
    pub fn config() -> ApiConfig {
        ApiConfig::default()
            .with_jwt(JwtConfig::new(TEST_JWT_SECRET))
            .with_bcrypt_cost(PasswordHasher::MIN_COST)
    }

    /// Creates an application with a custom configuration.
    pub fn with_config(config: ApiConfig) -> Self {
        super::init_test_logging();
        let server = ApiServerBuilder::new()
            .config(config)
            .build()
            .expect("Failed to build test server");
        Self {
            state: server.state().clone(),
            router: server.router(),
        }
    }

    /// Sends a request and decodes the response.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY)
            .await
            .expect("Failed to read response body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Sends a GET request.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Sends a PATCH request with a JSON body.
    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Inserts a user with the given role and [`TEST_PASSWORD`].
    pub async fn seed_user(&self, role: UserRole, email: &str) -> User {
        self.state
            .users
            .create_user(CreateUser {
                name: format!("{} user", role),
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
                role: Some(vec![role]),
                status: None,
            })
            .await
            .expect("Failed to seed user")
    }

    /// Logs a seeded user in and returns the issued tokens.
    pub async fn login(&self, email: &str) -> AuthTokens {
        self.state
            .auth
            .login(email, TEST_PASSWORD)
            .await
            .expect("Failed to log in")
            .tokens
    }

    /// Seeds a user with `role` and returns it with a valid access token.
    pub async fn signed_in(&self, role: UserRole) -> (User, String) {
        let email = format!("{}-{}@example.com", role, rcm_core::models::new_id());
        let user = self.seed_user(role, &email).await;
        let tokens = self.login(&email).await;
        (user, tokens.access.token)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
