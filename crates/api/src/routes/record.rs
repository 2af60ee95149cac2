//! Route definitions for the `/records` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::record;
use crate::state::AppState;

/// Routes mounted at `/records`.
///
/// ```text
/// POST   /              -> create_record
/// GET    /              -> list_records (own bookings)
/// GET    /{id}          -> get_record
/// PATCH  /{id}/status   -> set_record_status (slot owner only)
/// DELETE /{id}          -> delete_record
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(record::list_records).post(record::create_record))
        .route("/{id}", get(record::get_record).delete(record::delete_record))
        .route("/{id}/status", patch(record::set_record_status))
}
