// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route rights middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams},
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{AuthContext, InvalidPermission, RightsMap};
use crate::error::ApiError;

/// Path parameter compared against the caller for own-record routes.
pub const OWNER_PARAM: &str = "userId";

const NO_ACCESS: &str = "AUTH: no access rights";

// =============================================================================
// RightsLayer
// =============================================================================

/// Layer checking the caller's rights against a route requirement.
///
/// Must run inside [`AuthLayer`](super::AuthLayer).
#[derive(Clone)]
pub struct RightsLayer {
    required: Arc<Result<RightsMap, InvalidPermission>>,
}

impl RightsLayer {
    /// Creates a layer requiring every listed permission.
    ///
    /// A malformed permission denies every request on the route.
    pub fn require<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let required = RightsMap::parse(permissions);
        if let Err(ref e) = required {
            tracing::error!(error = %e, "Route rights are malformed, route will deny all requests");
        }
        Self {
            required: Arc::new(required),
        }
    }
}

impl<S> Layer<S> for RightsLayer {
    type Service = RightsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RightsMiddleware {
            inner,
            required: self.required.clone(),
        }
    }
}

// =============================================================================
// RightsMiddleware
// =============================================================================

/// Middleware for route rights enforcement.
#[derive(Clone)]
pub struct RightsMiddleware<S> {
    inner: S,
    required: Arc<Result<RightsMap, InvalidPermission>>,
}

impl<S> Service<Request<Body>> for RightsMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let required = self.required.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let required = match required.as_ref() {
                Ok(required) => required,
                Err(e) => {
                    return Ok(ApiError::internal(e.to_string()).into_response());
                }
            };

            let Some(ctx) = req.extensions().get::<AuthContext>().cloned() else {
                tracing::warn!("No auth context found, denying access");
                return Ok(ApiError::unauthorized("AUTH: invalid token").into_response());
            };

            if !ctx.satisfies(required) {
                tracing::warn!(
                    user_id = %ctx.user_id(),
                    required = %required,
                    held = %ctx.rights,
                    "Permission denied"
                );
                return Ok(ApiError::forbidden(NO_ACCESS).into_response());
            }

            if !required.requires_ownership() {
                return inner.call(req).await;
            }

            let (mut parts, body) = req.into_parts();
            let owner = RawPathParams::from_request_parts(&mut parts, &())
                .await
                .ok()
                .and_then(|params| {
                    params
                        .iter()
                        .find(|(key, _)| *key == OWNER_PARAM)
                        .map(|(_, value)| value.to_string())
                });

            match owner {
                Some(owner) if ctx.is_owner(&owner) => {
                    inner.call(Request::from_parts(parts, body)).await
                }
                _ => {
                    tracing::warn!(
                        user_id = %ctx.user_id(),
                        target = ?owner,
                        "Own-record access denied"
                    );
                    Ok(ApiError::forbidden(NO_ACCESS).into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
