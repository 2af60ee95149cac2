//! Handlers for the `/records` resource: booking requests and the status
//! state machine.
//!
//! Every state transition commits in the repository before anything is
//! published on the event bus, so a consumer can never observe a transition
//! that later rolled back. Event contexts are snapshotted from the joined
//! detail row so notification rendering does not re-read booking state.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use slotbook_core::error::CoreError;
use slotbook_core::notify::PartyBrief;
use slotbook_core::status::{validate_status, STATUS_CONFIRM, STATUS_PENDING};
use slotbook_core::types::DbId;
use slotbook_db::models::record::{CreateRecord, Record, RecordDetail};
use slotbook_db::repositories::{RecordRepo, SlotRepo};
use slotbook_events::{BookingEvent, Recipient, RecordContext};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / query types
// ---------------------------------------------------------------------------

/// Request body for `POST /records`.
#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub slot_id: DbId,
}

/// Request body for `PATCH /records/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// Query parameters for `GET /records`.
#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    /// Optional status filter (`pending`, `confirm`, `reject`).
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Event context assembly
// ---------------------------------------------------------------------------

/// Context for the event sent to the slot owner about a client's action.
fn context_for_owner(detail: &RecordDetail) -> RecordContext {
    RecordContext {
        record_id: detail.id,
        recipient: Recipient {
            user_id: detail.owner_id,
            messenger_id: detail.owner_messenger_id,
            timezone: detail.owner_timezone.clone(),
        },
        counterpart: PartyBrief {
            id: detail.client_id,
            name: detail.client_full_name(),
            phone: detail.client_phone.clone(),
        },
        slot: slot_brief(detail),
    }
}

/// Context for the event sent to the client about the owner's decision.
pub(crate) fn context_for_client(detail: &RecordDetail) -> RecordContext {
    RecordContext {
        record_id: detail.id,
        recipient: Recipient {
            user_id: detail.client_id,
            messenger_id: detail.client_messenger_id,
            timezone: detail.client_timezone.clone(),
        },
        counterpart: PartyBrief {
            id: detail.owner_id,
            name: detail.owner_full_name(),
            phone: detail.owner_phone.clone(),
        },
        slot: slot_brief(detail),
    }
}

fn slot_brief(detail: &RecordDetail) -> slotbook_core::notify::SlotBrief {
    slotbook_core::notify::SlotBrief {
        slot_id: detail.slot_id,
        start_time: detail.slot_start,
        end_time: detail.slot_end,
        service_id: detail.service_id,
        service_name: detail.service_name.clone(),
        service_price: detail.service_price,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/records
///
/// File a booking request against a slot. The new record starts `pending`
/// regardless of anything the caller sends. One live request per
/// (slot, client); a repeat attempt is a 409.
pub async fn create_record(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRecordRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Record>>)> {
    let slot = SlotRepo::find_by_id(&state.pool, input.slot_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Slot", input.slot_id)))?;

    if slot.owner_id == auth.user_id {
        return Err(AppError::Core(CoreError::Validation(
            "You cannot book your own slot".into(),
        )));
    }

    if RecordRepo::exists(&state.pool, input.slot_id, auth.user_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "You already have a booking on this slot".into(),
        )));
    }

    // The unique index turns a concurrent duplicate into a 409 here.
    let record = RecordRepo::create(
        &state.pool,
        &CreateRecord {
            slot_id: input.slot_id,
            client_id: auth.user_id,
        },
    )
    .await?;

    let detail = RecordRepo::find_detail(&state.pool, record.id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Record", record.id)))?;

    state
        .event_bus
        .publish(BookingEvent::RecordCreated(context_for_owner(&detail)));

    tracing::info!(record_id = record.id, slot_id = record.slot_id, "Booking filed");
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// GET /api/v1/records
///
/// The authenticated user's own bookings, newest first, optionally filtered
/// by status.
pub async fn list_records(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<RecordQuery>,
) -> AppResult<Json<DataResponse<Vec<Record>>>> {
    if let Some(status) = &params.status {
        validate_status(status).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    }

    let records =
        RecordRepo::find_by_client(&state.pool, auth.user_id, params.status.as_deref()).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/records/{id}
///
/// Full detail of one record, visible only to its client and the slot owner.
pub async fn get_record(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
) -> AppResult<Json<DataResponse<RecordDetail>>> {
    let detail = RecordRepo::find_detail(&state.pool, record_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Record", record_id)))?;

    if detail.client_id != auth.user_id && detail.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Not a party to this booking".into(),
        )));
    }

    Ok(Json(DataResponse { data: detail }))
}

/// PATCH /api/v1/records/{id}/status
///
/// Owner-only status transition. Any of the three statuses may be set at
/// any time; confirming displaces every other live request on the slot in
/// the same transaction. The client is notified of confirm/reject outcomes
/// after commit.
pub async fn set_record_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
    Json(input): Json<SetStatusRequest>,
) -> AppResult<Json<DataResponse<Record>>> {
    validate_status(&input.status).map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    // Snapshot before the transition; confirm may cascade siblings away from
    // their previous statuses and the event must carry pre-decided context.
    let detail = RecordRepo::find_detail(&state.pool, record_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Record", record_id)))?;

    if detail.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the slot owner decides booking status".into(),
        )));
    }

    let prev = RecordRepo::set_status(&state.pool, record_id, &input.status)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Record", record_id)))?;

    // Notify the client on a decision; re-applying the same status or
    // resetting to pending is silent.
    if input.status != prev.status && input.status != STATUS_PENDING {
        state.event_bus.publish(BookingEvent::RecordStatusChanged {
            context: context_for_client(&detail),
            confirmed: input.status == STATUS_CONFIRM,
        });
    }

    let updated = RecordRepo::find_by_id(&state.pool, record_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Record", record_id)))?;
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/records/{id}
///
/// Withdraw a booking (client) or remove it outright (owner). Deleting a
/// confirmed record frees the slot in the same transaction.
pub async fn delete_record(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let record = RecordRepo::find_by_id(&state.pool, record_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Record", record_id)))?;

    if record.client_id != auth.user_id {
        let detail = RecordRepo::find_detail(&state.pool, record_id)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::not_found("Record", record_id)))?;
        if detail.owner_id != auth.user_id {
            return Err(AppError::Core(CoreError::Forbidden(
                "Not a party to this booking".into(),
            )));
        }
    }

    RecordRepo::delete(&state.pool, record_id).await?;
    tracing::info!(record_id, "Booking deleted");
    Ok(StatusCode::NO_CONTENT)
}
