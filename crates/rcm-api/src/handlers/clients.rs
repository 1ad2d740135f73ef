// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client management handlers.

use std::borrow::Cow;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use rcm_core::{ClientChanges, ClientName, NewClient};
use serde::Deserialize;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::error::ApiResult;
use crate::extractors::{Pagination, ValidatedJson};
use crate::response::{ApiResponse, ResponseMeta};
use crate::state::AppState;

// =============================================================================
// Request Bodies
// =============================================================================

/// Create-client request body.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct CreateClientRequest(pub NewClient);

impl Validate for CreateClientRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let client = &self.0;
        let mut errors = ValidationErrors::new();

        if client.full_name.trim().is_empty() {
            errors.add("fullName", invalid("length", "must not be empty"));
        }
        check_name(&mut errors, &client.name);
        if !client.email.validate_email() {
            errors.add("email", invalid("email", "must be a valid email"));
        }
        check_alt_emails(&mut errors, &client.alt_emails);

        into_result(errors)
    }
}

/// Update-client request body. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct UpdateClientRequest(pub ClientChanges);

impl Validate for UpdateClientRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let changes = &self.0;
        let mut errors = ValidationErrors::new();

        if changes.is_empty() {
            errors.add("body", invalid("empty", "must change at least one field"));
        }
        if changes.full_name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            errors.add("fullName", invalid("length", "must not be empty"));
        }
        if let Some(ref name) = changes.name {
            check_name(&mut errors, name);
        }
        if changes.email.as_ref().is_some_and(|e| !e.validate_email()) {
            errors.add("email", invalid("email", "must be a valid email"));
        }
        if let Some(ref alt_emails) = changes.alt_emails {
            check_alt_emails(&mut errors, alt_emails);
        }

        into_result(errors)
    }
}

fn check_name(errors: &mut ValidationErrors, name: &ClientName) {
    if !name.is_complete() {
        errors.add("name", invalid("required", "firstName and lastName are required"));
    }
}

fn check_alt_emails(errors: &mut ValidationErrors, alt_emails: &[String]) {
    if alt_emails.iter().any(|e| !e.validate_email()) {
        errors.add("altEmails", invalid("email", "must hold valid emails"));
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /{version}/clients/{clientId}
pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let client = state.clients.find_by_id(&client_id).await?;
    Ok(ApiResponse::ok(client, "getClient"))
}

/// GET /{version}/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Pagination(params): Pagination,
) -> ApiResult<impl IntoResponse> {
    let listing = state.clients.find_all(params.page()).await?;

    Ok(ApiResponse::ok(listing.items, "getAllClients").with_meta(
        ResponseMeta::pagination(listing.total, params.page, params.limit()),
    ))
}

/// POST /{version}/clients
pub async fn create_client(
    State(state): State<AppState>,
    ValidatedJson(CreateClientRequest(input)): ValidatedJson<CreateClientRequest>,
) -> ApiResult<impl IntoResponse> {
    let client = state.clients.create_client(input).await?;
    Ok(ApiResponse::created(client, "createdClient"))
}

/// PATCH /{version}/clients/{clientId}
pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    ValidatedJson(UpdateClientRequest(changes)): ValidatedJson<UpdateClientRequest>,
) -> ApiResult<impl IntoResponse> {
    let client = state.clients.update_client(&client_id, changes).await?;
    Ok(ApiResponse::ok(client, "updatedClient"))
}

/// DELETE /{version}/clients/{clientId}
pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let client = state.clients.delete_client(&client_id).await?;
    Ok(ApiResponse::ok(client, "deletedClient"))
}

// =============================================================================
// Tests
// =============================================================================
