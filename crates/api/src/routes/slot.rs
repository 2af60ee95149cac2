//! Route definitions for the `/slots` resource.
//!
//! All endpoints require authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::slot;
use crate::state::AppState;

/// Routes mounted at `/slots`.
///
/// ```text
/// POST   /               -> create_slot
/// GET    /               -> list_slots (?owner_id=, defaults to caller)
/// GET    /{id}           -> get_slot
/// DELETE /{id}           -> delete_slot (owner only, notifies clients)
/// GET    /{id}/records   -> list_slot_records (owner only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(slot::list_slots).post(slot::create_slot))
        .route("/{id}", get(slot::get_slot).delete(slot::delete_slot))
        .route("/{id}/records", get(slot::list_slot_records))
}
