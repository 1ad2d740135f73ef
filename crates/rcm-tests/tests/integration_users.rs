// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User management tests, including role-rights enforcement.

use rcm_tests::prelude::*;

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn test_get_own_record() {
    let app = TestApp::new();
    let (user, token) = app.signed_in(UserRole::User).await;

    let response = app.get(&format!("/v1/users/{}", user.id), Some(&token)).await;

    assert_success(&response, StatusCode::OK, "getUser");
    assert_no_password(response.data());
    assert_eq!(response.data()["id"], user.id.as_str());
}

#[tokio::test]
async fn test_get_foreign_record_denied() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::User).await;
    let other = app.seed_user(UserRole::User, "other@example.com").await;

    let response = app
        .get(&format!("/v1/users/{}", other.id), Some(&token))
        .await;

    assert_error(&response, StatusCode::FORBIDDEN, "AUTH: no access rights");
}

#[tokio::test]
async fn test_ownership_applies_to_superadmin() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Superadmin).await;
    let other = app.seed_user(UserRole::User, "other@example.com").await;

    let response = app
        .get(&format!("/v1/users/{}", other.id), Some(&token))
        .await;

    assert_status(&response, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_users_paginated() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;
    for i in 0..4 {
        app.seed_user(UserRole::User, &format!("user{i}@example.com"))
            .await;
    }

    let response = app.get("/v1/users?page=2&perPage=2", Some(&token)).await;

    assert_success(&response, StatusCode::OK, "allUsers");
    let users = response.data().as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert_no_password(user);
    }

    let meta = &response.body["meta"];
    assert_eq!(meta["total"], 5);
    assert_eq!(meta["page"], 2);
    assert_eq!(meta["perPage"], 2);
    assert_eq!(meta["totalPages"], 3);
}

#[tokio::test]
async fn test_list_users_limit_alias() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Superadmin).await;

    let response = app.get("/v1/users?limit=1", Some(&token)).await;

    assert_status(&response, StatusCode::OK);
    assert_eq!(response.body["meta"]["perPage"], 1);
}

#[tokio::test]
async fn test_list_users_denied_for_user_role() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::User).await;

    let response = app.get("/v1/users", Some(&token)).await;

    assert_error(&response, StatusCode::FORBIDDEN, "AUTH: no access rights");
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_user() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;

    let response = app
        .post(
            "/v1/users",
            Some(&token),
            UserFixtures::create("New@Example.com", &["admin", "user"]),
        )
        .await;

    assert_success(&response, StatusCode::CREATED, "createdUser");
    assert_no_password(response.data());
    assert_eq!(response.data()["email"], "new@example.com");
    assert_eq!(response.data()["role"], json!(["admin", "user"]));
    assert_eq!(response.data()["status"], "active");

    // Stored password is a hash that still accepts the submitted password.
    let stored = app
        .state
        .stores
        .users
        .find_user_by_email("new@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password, TEST_PASSWORD);
    app.login("new@example.com").await;
}

#[tokio::test]
async fn test_create_user_defaults_role() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Superadmin).await;

    let response = app
        .post(
            "/v1/users",
            Some(&token),
            json!({ "name": "Plain", "email": "plain@example.com", "password": TEST_PASSWORD }),
        )
        .await;

    assert_status(&response, StatusCode::CREATED);
    assert_eq!(response.data()["role"], json!(["user"]));
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;
    app.seed_user(UserRole::User, "taken@example.com").await;

    let response = app
        .post(
            "/v1/users",
            Some(&token),
            UserFixtures::create("TAKEN@example.com", &["user"]),
        )
        .await;

    assert_error(
        &response,
        StatusCode::BAD_REQUEST,
        "USER: email taken@example.com already exists",
    );
}

#[tokio::test]
async fn test_create_user_rejects_empty_roles() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;

    let response = app
        .post(
            "/v1/users",
            Some(&token),
            UserFixtures::create("new@example.com", &[]),
        )
        .await;

    assert_field_error(&response, "role");
}

#[tokio::test]
async fn test_create_user_unknown_role() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;

    let response = app
        .post(
            "/v1/users",
            Some(&token),
            UserFixtures::create("new@example.com", &["root"]),
        )
        .await;

    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user_denied_for_user_role() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::User).await;

    let response = app
        .post(
            "/v1/users",
            Some(&token),
            UserFixtures::create("new@example.com", &["user"]),
        )
        .await;

    assert_error(&response, StatusCode::FORBIDDEN, "AUTH: no access rights");
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_user() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;
    let target = app.seed_user(UserRole::User, "target@example.com").await;

    let response = app
        .patch(
            &format!("/v1/users/{}", target.id),
            Some(&token),
            json!({ "name": "Renamed", "status": "for review" }),
        )
        .await;

    assert_success(&response, StatusCode::OK, "updatedUser");
    assert_eq!(response.data()["name"], "Renamed");
    assert_eq!(response.data()["status"], "for review");
    assert_eq!(response.data()["email"], "target@example.com");
}

#[tokio::test]
async fn test_update_user_password_rehashed() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;
    let target = app.seed_user(UserRole::User, "target@example.com").await;

    let response = app
        .patch(
            &format!("/v1/users/{}", target.id),
            Some(&token),
            json!({ "password": "changed-password" }),
        )
        .await;
    assert_status(&response, StatusCode::OK);

    let response = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "target@example.com", "password": "changed-password" }),
        )
        .await;
    assert_status(&response, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_cannot_promote_to_superadmin() {
    let app = TestApp::new();
    let (admin, token) = app.signed_in(UserRole::Admin).await;

    let response = app
        .patch(
            &format!("/v1/users/{}", admin.id),
            Some(&token),
            json!({ "role": ["superadmin"] }),
        )
        .await;
    assert_error(
        &response,
        StatusCode::FORBIDDEN,
        "USER: cannot manage rights beyond your own",
    );

    let stored = app.state.stores.users.find_user(&admin.id).await.unwrap().unwrap();
    assert_eq!(stored.role, vec![UserRole::Admin]);

    let response = app
        .post(
            "/v1/users",
            Some(&token),
            UserFixtures::create("root@example.com", &["superadmin"]),
        )
        .await;
    assert_status(&response, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_edit_superadmin() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;
    let root = app.seed_user(UserRole::Superadmin, "root@example.com").await;

    let response = app
        .patch(
            &format!("/v1/users/{}", root.id),
            Some(&token),
            json!({ "password": "taken-over-1" }),
        )
        .await;
    assert_error(
        &response,
        StatusCode::FORBIDDEN,
        "USER: cannot manage rights beyond your own",
    );
    app.login("root@example.com").await;
}

#[tokio::test]
async fn test_superadmin_can_promote() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Superadmin).await;
    let target = app.seed_user(UserRole::Admin, "target@example.com").await;

    let response = app
        .patch(
            &format!("/v1/users/{}", target.id),
            Some(&token),
            json!({ "role": ["superadmin"] }),
        )
        .await;
    assert_success(&response, StatusCode::OK, "updatedUser");
    assert_eq!(response.data()["role"], json!(["superadmin"]));
}

#[tokio::test]
async fn test_update_missing_user() {
    let app = TestApp::new();
    let (_, token) = app.signed_in(UserRole::Admin).await;

    let response = app
        .patch(
            "/v1/users/does-not-exist",
            Some(&token),
            json!({ "name": "Nobody" }),
        )
        .await;

    assert_error(&response, StatusCode::CONFLICT, "User: user not found");
}

#[tokio::test]
async fn test_update_user_invalid_email() {
    let app = TestApp::new();
    let (admin, token) = app.signed_in(UserRole::Admin).await;

    let response = app
        .patch(
            &format!("/v1/users/{}", admin.id),
            Some(&token),
            json!({ "email": "broken" }),
        )
        .await;

    assert_field_error(&response, "email");
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_user_requires_superadmin() {
    let app = TestApp::new();
    let (_, admin_token) = app.signed_in(UserRole::Admin).await;
    let target = app.seed_user(UserRole::User, "target@example.com").await;
    let uri = format!("/v1/users/{}", target.id);

    let response = app.delete(&uri, Some(&admin_token)).await;
    assert_error(&response, StatusCode::FORBIDDEN, "AUTH: no access rights");

    let (_, root_token) = app.signed_in(UserRole::Superadmin).await;
    let response = app.delete(&uri, Some(&root_token)).await;
    assert_success(&response, StatusCode::OK, "deletedUser");
    assert_no_password(response.data());

    let response = app.delete(&uri, Some(&root_token)).await;
    assert_error(&response, StatusCode::CONFLICT, "User: user not found");
}

#[tokio::test]
async fn test_deleted_user_session_is_dead() {
    let app = TestApp::new();
    let (_, root_token) = app.signed_in(UserRole::Superadmin).await;
    let (target, target_token) = app.signed_in(UserRole::User).await;

    let response = app
        .delete(&format!("/v1/users/{}", target.id), Some(&root_token))
        .await;
    assert_status(&response, StatusCode::OK);

    let response = app
        .get(&format!("/v1/users/{}", target.id), Some(&target_token))
        .await;
    assert_status(&response, StatusCode::UNAUTHORIZED);
}
