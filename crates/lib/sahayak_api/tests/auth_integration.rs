//! Integration tests — build the router over in-memory stores and drive the
//! auth endpoints end to end.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use sahayak_api::{AppState, config::ApiConfig};
use sahayak_core::auth::credentials::InMemoryCredentialStore;
use sahayak_core::auth::jwt::JwtSecret;
use sahayak_core::auth::revocation::InMemoryRevocationLedger;
use sahayak_core::auth::{AuthConfig, AuthService};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-long-enough-for-hs256";

fn app_with(expose_auth_diagnostics: bool) -> Router {
    let secret = JwtSecret::new(SECRET).expect("secret");
    let auth = AuthService::new(
        &secret,
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(InMemoryRevocationLedger::new()),
        AuthConfig {
            bcrypt_cost: 4,
            ..AuthConfig::default()
        },
    )
    .expect("auth service");

    sahayak_api::router(AppState {
        auth,
        config: ApiConfig {
            expose_auth_diagnostics,
            ..ApiConfig::default()
        },
    })
}

fn app() -> Router {
    app_with(false)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("parse JSON")
    };
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn logout_with_bearer(token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn signup_asha(app: &Router) -> Value {
    let (status, json) = send(
        app,
        post_json(
            "/api/auth/signup",
            json!({"name": "Asha", "email": "Asha@Test.com", "password": "secret1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

#[tokio::test]
async fn signup_login_logout_flow() {
    let app = app();

    let signup = signup_asha(&app).await;
    assert_eq!(signup["user"]["email"], "asha@test.com");
    assert_eq!(signup["user"]["name"], "Asha");
    assert_eq!(signup["user"]["userType"], "student");
    assert!(signup["user"].get("passwordHash").is_none());
    let token_a = signup["token"].as_str().expect("token").to_string();

    let (status, login) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"email": "asha@test.com", "password": "secret1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token_b = login["token"].as_str().expect("token").to_string();
    assert_ne!(token_a, token_b);

    let (status, profile) = send(&app, get_with_bearer("/api/profile", &token_a)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], signup["user"]["id"]);

    let (status, body) = send(&app, logout_with_bearer(&token_a)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");

    let (status, _) = send(&app, get_with_bearer("/api/profile", &token_a)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, profile) = send(&app, get_with_bearer("/api/profile", &token_b)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "asha@test.com");

    // Logging out again is still a success.
    let (status, _) = send(&app, logout_with_bearer(&token_a)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_credentials_do_not_reveal_whether_email_exists() {
    let app = app();
    signup_asha(&app).await;

    let wrong_password = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"email": "asha@test.com", "password": "wrongpass"}),
        ),
    )
    .await;
    let unknown_email = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"email": "nobody@test.com", "password": "anything"}),
        ),
    )
    .await;

    assert_eq!(wrong_password.0, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let app = app();
    signup_asha(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/signup",
            json!({"name": "Other", "email": "  asha@TEST.com ", "password": "secret2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "Email already registered");
}

#[tokio::test]
async fn signup_validation_errors() {
    let app = app();
    let cases = [
        (json!({"email": "a@b.co", "password": "secret1"}), "Missing fields"),
        (
            json!({"name": "A", "email": "nope", "password": "secret1"}),
            "Invalid email",
        ),
        (
            json!({"name": "A", "email": "a@b.co", "password": "123"}),
            "Password must be at least 6 characters",
        ),
    ];
    for (body, message) in cases {
        let (status, json) = send(&app, post_json("/api/auth/signup", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], message);
    }
}

#[tokio::test]
async fn check_email_reports_existence() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/api/auth/check-email", json!({"email": "asha@test.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], false);

    signup_asha(&app).await;
    let (_, body) = send(
        &app,
        post_json("/api/auth/check-email", json!({"email": "ASHA@test.com"})),
    )
    .await;
    assert_eq!(body["exists"], true);

    let (status, _) = send(&app, post_json("/api/auth/check-email", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_without_token_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, post_json("/api/auth/logout", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No token provided");
}

#[tokio::test]
async fn token_accepted_from_body_and_query() {
    let app = app();
    let token = signup_asha(&app).await["token"]
        .as_str()
        .expect("token")
        .to_string();

    let req = Request::builder()
        .uri(format!("/api/profile?token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, post_json("/api/auth/logout", json!({"token": token}))).await;
    assert_eq!(status, StatusCode::OK);

    let req = Request::builder()
        .uri(format!("/api/profile?token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_failures_look_identical_without_diagnostics() {
    let app = app();
    let token = signup_asha(&app).await["token"]
        .as_str()
        .expect("token")
        .to_string();
    send(&app, logout_with_bearer(&token)).await;

    let missing = send(
        &app,
        Request::builder()
            .uri("/api/profile")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let malformed = send(&app, get_with_bearer("/api/profile", "not-a-token")).await;
    let revoked = send(&app, get_with_bearer("/api/profile", &token)).await;

    assert_eq!(missing.0, StatusCode::UNAUTHORIZED);
    assert_eq!(missing, malformed);
    assert_eq!(missing, revoked);
}

#[tokio::test]
async fn diagnostics_distinguish_revoked_tokens() {
    let app = app_with(true);
    let token = signup_asha(&app).await["token"]
        .as_str()
        .expect("token")
        .to_string();
    send(&app, logout_with_bearer(&token)).await;

    let (status, body) = send(&app, get_with_bearer("/api/profile", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has been revoked");
}

#[tokio::test]
async fn health_reports_version() {
    let app = app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], sahayak_core::version());
}
