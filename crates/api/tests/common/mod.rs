//! Shared harness for HTTP-level integration tests.
//!
//! Builds the real application router (same middleware stack as `main.rs`)
//! on top of a `#[sqlx::test]` pool, with a `NoopMessenger` standing in for
//! the bot service and a running notification dispatcher.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use chrono::{TimeDelta, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use slotbook_api::auth::jwt::{generate_credential, JwtConfig};
use slotbook_api::auth::login_tokens::LoginTokenStore;
use slotbook_api::config::ServerConfig;
use slotbook_api::notifications::Dispatcher;
use slotbook_api::router::build_app_router;
use slotbook_api::state::AppState;
use slotbook_core::types::{DbId, UserId};
use slotbook_db::models::service::CreateService;
use slotbook_db::models::slot::CreateSlot;
use slotbook_db::models::user::{CreateUser, User};
use slotbook_db::repositories::{ServiceRepo, SlotRepo, UserRepo};
use slotbook_messenger::{Messenger, NoopMessenger};

/// Shared secret the tests present on bot-originated calls.
pub const TEST_INTERNAL_TOKEN: &str = "test-internal-token";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: test_jwt_config(),
        messenger_base_url: "http://localhost:0".to_string(),
        internal_token: TEST_INTERNAL_TOKEN.to_string(),
        login_token_ttl: Duration::from_secs(3600),
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        session_expiry_hours: 12,
    }
}

/// Build the application router with the default (1 hour) login token TTL.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_ttl(pool, Duration::from_secs(3600))
}

/// Build the application router with a caller-chosen login token TTL, so
/// expiry tests can use a tiny one. Spawns the notification dispatcher the
/// same way `main.rs` does.
pub fn build_test_app_with_ttl(pool: PgPool, login_token_ttl: Duration) -> Router {
    let config = ServerConfig {
        login_token_ttl,
        ..test_config()
    };

    let messenger: Arc<dyn Messenger> = Arc::new(NoopMessenger);
    let event_bus = Arc::new(slotbook_events::EventBus::default());

    let dispatcher = Dispatcher::new(pool.clone(), Arc::clone(&messenger));
    tokio::spawn(dispatcher.run(event_bus.subscribe()));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus,
        messenger,
        login_tokens: Arc::new(LoginTokenStore::new(login_token_ttl)),
    };

    build_app_router(state, &config)
}

/// Mint a session credential for a user, bypassing the handshake.
pub fn auth_token(user_id: UserId) -> String {
    generate_credential(user_id, &test_jwt_config()).expect("credential generation")
}

// ---------------------------------------------------------------------------
// Seed helpers
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, phone: &str, messenger_id: Option<i64>) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            phone: phone.to_string(),
            first_name: "Test".to_string(),
            surname: "User".to_string(),
            messenger_id,
            timezone: String::new(),
        },
    )
    .await
    .expect("user creation")
}

pub async fn create_service(pool: &PgPool, owner_id: UserId) -> DbId {
    ServiceRepo::create(
        pool,
        &CreateService {
            owner_id,
            name: "Haircut".to_string(),
            description: "A haircut".to_string(),
            price: 1500.0,
            duration_mins: 60,
        },
    )
    .await
    .expect("service creation")
    .id
}

/// A slot starting tomorrow for a fresh service of the owner.
pub async fn create_slot(pool: &PgPool, owner_id: UserId) -> DbId {
    let service_id = create_service(pool, owner_id).await;
    let start = Utc::now() + TimeDelta::days(1);
    SlotRepo::create(
        pool,
        &CreateSlot {
            owner_id,
            service_id,
            start_time: start,
            end_time: start + TimeDelta::hours(1),
        },
    )
    .await
    .expect("slot creation")
    .id
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_internal(
    app: Router,
    uri: &str,
    internal_token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-internal-token", internal_token)
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method("PATCH")
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Poll until the user has at least `expected` notification rows (the
/// dispatcher runs asynchronously to the request that triggered it).
pub async fn wait_for_notifications(pool: &PgPool, user_id: UserId, expected: usize) -> usize {
    for _ in 0..50 {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await
                .expect("count query");
        if count as usize >= expected {
            return count as usize;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    0
}

/// Assert a standard error envelope with the given status and code.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
}
