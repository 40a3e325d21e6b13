//! Login, token, and lockout flows.

use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
};
use algoshelf::config::Config;
use http_body_util::BodyExt;
use std::net::SocketAddr;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "integration-test-password";

async fn spawn_app() -> Router {
    spawn_app_with_ttl(24).await
}

async fn spawn_app_with_ttl(token_ttl_hours: i64) -> Router {
    let mut config = Config::default();
    config.security.token_ttl_hours = token_ttl_hours;
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.security.admin_password = ADMIN_PASSWORD.to_string();
    config.security.token_signing_key = "auth-test-signing-key-32-bytes!!".to_string();
    // Cheap hashing keeps the lockout tests fast.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.storage.uploads_path = std::env::temp_dir()
        .join(format!("algoshelf-auth-test-{}", uuid::Uuid::new_v4()))
        .display()
        .to_string();

    let state = algoshelf::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");

    algoshelf::api::router(state)
        .await
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
}

fn login_request(password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::json!({ "password": password }).to_string(),
        ))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn login_returns_usable_token() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(login_request(ADMIN_PASSWORD)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["expires_in_hours"], 24);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn_app().await;

    let response = app.oneshot(login_request("wrong")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "invalid_credential");
}

#[tokio::test]
async fn repeated_failures_lock_the_address() {
    let app = spawn_app().await;

    for _ in 0..5 {
        let response = app.clone().oneshot(login_request("wrong")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the correct password is refused while locked out.
    let response = app.clone().oneshot(login_request(ADMIN_PASSWORD)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .expect("Retry-After header missing");
    assert!(retry_after <= 900);

    let body = json_body(response).await;
    assert_eq!(body["error_kind"], "locked_out");
}

#[tokio::test]
async fn success_before_threshold_clears_the_slate() {
    let app = spawn_app().await;

    for _ in 0..4 {
        app.clone().oneshot(login_request("wrong")).await.unwrap();
    }

    let response = app.clone().oneshot(login_request(ADMIN_PASSWORD)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Counter is reset: another run of failures starts from zero.
    for _ in 0..4 {
        app.clone().oneshot(login_request("wrong")).await.unwrap();
    }
    let response = app.oneshot(login_request(ADMIN_PASSWORD)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error_kind"], "unauthorized");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header("Authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error_kind"], "invalid_token");
}

#[tokio::test]
async fn expired_tokens_get_their_own_error_kind() {
    // A negative TTL makes every issued token already expired.
    let app = spawn_app_with_ttl(-1).await;

    let response = app
        .clone()
        .oneshot(login_request(ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = json_body(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error_kind"], "token_expired");
}

#[tokio::test]
async fn public_reads_need_no_token() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/algorithms")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_password_is_a_validation_error() {
    let app = spawn_app().await;

    let response = app.oneshot(login_request("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
