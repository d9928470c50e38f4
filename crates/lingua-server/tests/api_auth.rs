mod common;

use axum::http::StatusCode;
use common::{request_json, signup, test_server, TEST_SECRET};
use serde_json::json;

#[tokio::test]
async fn signup_returns_token_bound_to_user() {
    let server = test_server();
    let app = server.app();

    let (user_id, token) = signup(&app, "alice", "pw1").await;

    let subject = lingua_auth::verify_token(TEST_SECRET, &token)
        .expect("signup token should verify");
    assert_eq!(subject, user_id);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let server = test_server();
    let app = server.app();

    signup(&app, "alice", "pw1").await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "username": "alice", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn login_returns_same_user_id() {
    let server = test_server();
    let app = server.app();

    let (user_id, _) = signup(&app, "alice", "pw1").await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id.as_str());

    let token = body["token"].as_str().expect("token missing");
    let subject =
        lingua_auth::verify_token(TEST_SECRET, token).expect("login token should verify");
    assert_eq!(subject, user_id);
}

#[tokio::test]
async fn wrong_password_and_unknown_username_are_indistinguishable() {
    let server = test_server();
    let app = server.app();

    signup(&app, "alice", "pw1").await;

    let (wrong_pw_status, wrong_pw_body) = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    let (unknown_status, unknown_body) = request_json(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "wrong" })),
    )
    .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, unknown_body, "bodies must not leak which case occurred");
}

#[tokio::test]
async fn missing_credentials_rejected() {
    let server = test_server();
    let app = server.app();

    for uri in ["/api/auth/signup", "/api/auth/login"] {
        let (status, _) = request_json(
            &app,
            "POST",
            uri,
            None,
            Some(json!({ "username": "alice" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} without password");

        let (status, _) = request_json(&app, "POST", uri, None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} with empty body");
    }
}

#[tokio::test]
async fn protected_routes_require_valid_bearer() {
    let server = test_server();
    let app = server.app();

    // No header at all
    let (status, _) = request_json(&app, "GET", "/api/conversation/c1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Garbage token
    let (status, _) =
        request_json(&app, "GET", "/api/conversation/c1", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Token signed with a different secret
    let foreign = lingua_auth::issue_token("other-secret", "user-1").expect("issuing should work");
    let (status, _) =
        request_json(&app, "GET", "/api/conversation/c1", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
