// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Assertions

use axum::http::StatusCode;

use super::harness::TestResponse;

/// Asserts the response status, printing the body on failure.
#[track_caller]
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "unexpected status, body: {}",
        response.body
    );
}

/// Asserts a success envelope with the given status and message.
#[track_caller]
pub fn assert_success(response: &TestResponse, expected: StatusCode, message: &str) {
    assert_status(response, expected);
    assert_eq!(response.message(), Some(message), "body: {}", response.body);
}

/// Asserts an error envelope with the given status and message.
#[track_caller]
pub fn assert_error(response: &TestResponse, expected: StatusCode, message: &str) {
    assert_status(response, expected);
    assert_eq!(
        response.body["response"]["code"].as_u64(),
        Some(u64::from(expected.as_u16())),
        "body: {}",
        response.body
    );
    assert_eq!(
        response.error_message(),
        Some(message),
        "body: {}",
        response.body
    );
}

/// Asserts a validation failure naming `field`.
#[track_caller]
pub fn assert_field_error(response: &TestResponse, field: &str) {
    assert_status(response, StatusCode::BAD_REQUEST);
    let fields = response.body["response"]["details"]["fields"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert!(
        fields.iter().any(|f| f["field"] == field),
        "no error for field '{}', body: {}",
        field,
        response.body
    );
}

/// Asserts that a user document carries no password.
#[track_caller]
pub fn assert_no_password(user: &serde_json::Value) {
    assert!(user.is_object(), "not a user document: {}", user);
    assert!(user.get("password").is_none(), "password leaked: {}", user);
}
