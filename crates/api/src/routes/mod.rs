pub mod auth;
pub mod health;
pub mod notification;
pub mod record;
pub mod slot;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/...           login handshake (mixed public / internal)
/// /records/...        booking requests and status transitions
/// /slots/...          availability slots
/// /notifications/...  in-app notification read-side
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/records", record::router())
        .nest("/slots", slot::router())
        .nest("/notifications", notification::router())
}
