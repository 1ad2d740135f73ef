// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token authentication middleware.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, header},
    response::{IntoResponse, Response},
};
use rcm_core::{TokenType, UserStore};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::auth::{AuthContext, RoleRights};
use crate::error::{ApiError, ApiResult};
use crate::services::TokenService;

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer authenticating requests with an access token.
///
/// On success an [`AuthContext`] carrying the user and its merged rights is
/// inserted into the request extensions.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: TokenService,
    users: Arc<dyn UserStore>,
    roles: RoleRights,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(tokens: TokenService, users: Arc<dyn UserStore>, roles: RoleRights) -> Self {
        Self {
            tokens,
            users,
            roles,
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            tokens: self.tokens.clone(),
            users: self.users.clone(),
            roles: self.roles.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for bearer token authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    tokens: TokenService,
    users: Arc<dyn UserStore>,
    roles: RoleRights,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let tokens = self.tokens.clone();
        let users = self.users.clone();
        let roles = self.roles.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let client_ip = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip());

            let Some(token) = extract_bearer_token(&req) else {
                tracing::debug!("No bearer token provided");
                return Ok(ApiError::unauthorized("AUTH: invalid token").into_response());
            };

            match authenticate(&tokens, users.as_ref(), &roles, token).await {
                Ok(mut ctx) => {
                    if let Some(ip) = client_ip {
                        ctx = ctx.with_client_ip(ip);
                    }
                    req.extensions_mut().insert(ctx);
                    inner.call(req).await
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Authentication failed");
                    Ok(e.into_response())
                }
            }
        })
    }
}

/// Runs the verification steps in order: signature and type, user, record.
async fn authenticate(
    tokens: &TokenService,
    users: &dyn UserStore,
    roles: &RoleRights,
    token: String,
) -> ApiResult<AuthContext> {
    let claims = tokens.decode(&token, TokenType::Access)?;

    let user = users
        .find_user(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("AUTH: authentication failed; user not found"))?;

    tokens
        .find_valid_record(&token, TokenType::Access, &user.id)
        .await?;

    let rights = roles.rights_for(&user.role);
    Ok(AuthContext::new(user, rights, token).with_request_id(Uuid::now_v7()))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Tests
// =============================================================================
