// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode, header},
    routing::{MethodRouter, delete, get, patch, post},
};
use rcm_core::Stores;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{JwtManager, RoleRights};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, RightsLayer};
use crate::state::{AppState, AppStateBuilder};

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Returns the shared application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(create_cors_layer(&self.config))
            .layer(DefaultBodyLimit::max(self.config.max_body_size));

        Router::new()
            .route("/health", get(handlers::health))
            .route("/ready", get(handlers::ready))
            .nest(&self.config.base_path(), self.versioned_routes())
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    fn versioned_routes(&self) -> Router<AppState> {
        let public = Router::new()
            .route("/auth/signup", post(handlers::signup))
            .route("/auth/login", post(handlers::login))
            .route("/auth/refresh-tokens", post(handlers::refresh_tokens))
            .route("/auth/forgot-password", post(handlers::forgot_password))
            .route("/auth/reset-password", post(handlers::reset_password));

        let protected = Router::new()
            .route(
                "/auth/logout",
                guarded(post(handlers::logout), &["auth$logout"]),
            )
            .route(
                "/users",
                guarded(get(handlers::list_users), &["user-r"])
                    .merge(guarded(post(handlers::create_user), &["user-w"])),
            )
            .route(
                "/users/{userId}",
                guarded(get(handlers::get_user), &["user-o"])
                    .merge(guarded(patch(handlers::update_user), &["user-w"]))
                    .merge(guarded(delete(handlers::delete_user), &["user-x"])),
            )
            .route(
                "/clients",
                guarded(get(handlers::list_clients), &["client-r"])
                    .merge(guarded(post(handlers::create_client), &["client-w"])),
            )
            .route(
                "/clients/{clientId}",
                guarded(get(handlers::get_client), &["client-o"])
                    .merge(guarded(patch(handlers::update_client), &["client-w"]))
                    .merge(guarded(delete(handlers::delete_client), &["client-x"])),
            )
            .route_layer(AuthLayer::new(
                self.state.tokens.clone(),
                self.state.stores.users.clone(),
                self.state.role_rights.clone(),
            ));

        public.merge(protected)
    }

    /// Runs the server.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        info!(%addr, base_path = %self.config.base_path(), "Starting API server");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn guarded(route: MethodRouter<AppState>, rights: &[&str]) -> MethodRouter<AppState> {
    route.route_layer(RightsLayer::require(rights))
}

/// Creates the CORS layer from configuration.
///
/// Browsers reject a wildcard origin on credentialed requests, so a `*`
/// origin list combined with credentials mirrors the request origin.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let origin = if cors.allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(cors.allow_credentials)
        .max_age(Duration::from_secs(cors.max_age))
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
pub struct ApiServerBuilder {
    state_builder: AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self {
            state_builder: AppState::builder(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the persistence backends.
    pub fn stores(mut self, stores: Stores) -> Self {
        self.state_builder = self.state_builder.stores(stores);
        self
    }

    /// Sets the JWT manager.
    pub fn jwt_manager(mut self, manager: Arc<JwtManager>) -> Self {
        self.state_builder = self.state_builder.jwt_manager(manager);
        self
    }

    /// Sets the role rights table.
    pub fn role_rights(mut self, roles: RoleRights) -> Self {
        self.state_builder = self.state_builder.role_rights(roles);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

impl Default for ApiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use axum::body::Body;
    use axum::http::Request;
    use rcm_core::PasswordHasher;
    use tower::ServiceExt;

    fn test_config() -> ApiConfig {
        ApiConfig::default()
            .with_jwt(JwtConfig::new("test-secret-key-that-is-long-enough"))
            .with_bcrypt_cost(PasswordHasher::MIN_COST)
    }

    fn server() -> ApiServer {
        ApiServerBuilder::new().config(test_config()).build().unwrap()
    }

    #[test]
    fn test_server_builder() {
        assert_eq!(server().addr().port(), 3000);
    }

    #[tokio::test]
    async fn test_health_outside_version_prefix() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/v1/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_mirrors_origin() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/v1/auth/login")
                    .header(header::ORIGIN, "https://app.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }
}
