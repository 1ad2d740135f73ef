// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::response::{ComponentStatus, HealthResponse, ReadinessResponse};
use crate::state::AppState;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Simple liveness check. Returns 200 OK if the service is running.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

// =============================================================================
// Readiness Check
// =============================================================================

/// GET /ready
///
/// Readiness check that verifies the store is reachable.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let store = match state.stores.users.ping().await {
        Ok(()) => ComponentStatus {
            name: "store".to_string(),
            healthy: true,
            message: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Store ping failed");
            ComponentStatus {
                name: "store".to_string(),
                healthy: false,
                message: Some("Store unreachable".to_string()),
            }
        }
    };

    let ready = store.healthy;
    let response = ReadinessResponse {
        ready,
        components: vec![store],
    };

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::config::ApiConfig;
    use axum::body::to_bytes;

    fn state() -> AppState {
        AppState::builder()
            .config(ApiConfig::default().with_jwt(JwtConfig::new("health-check-secret-key-long-enough")))
            .build()
            .unwrap()
    }

    async fn body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_with_memory_store() {
        let response = ready(State(state())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body(response).await;
        assert_eq!(body["ready"], true);
        assert_eq!(body["components"][0]["name"], "store");
    }
}
