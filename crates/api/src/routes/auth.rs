//! Route definitions for the `/auth` resource.
//!
//! `login`, `pending`, and `claim` are public (they gate on knowledge of the
//! phone / messaging identity plus possession of the messaging account);
//! `confirm` is bot-originated and guarded by the internal token header
//! inside the handler.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login                    -> start handshake (prompt via bot)
/// POST /confirm                  -> bot reports approval (internal token)
/// GET  /pending/{messenger_id}   -> non-destructive credential peek
/// POST /claim                    -> single-use credential claim
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/confirm", post(auth::confirm))
        .route("/pending/{messenger_id}", get(auth::pending))
        .route("/claim", post(auth::claim))
}
