//! Handlers for the `/slots` resource.
//!
//! Slot deletion is the one destructive operation with live dependents:
//! records cascade away at the schema level, so the affected clients are
//! snapshotted *before* the delete and notified after it commits.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use slotbook_core::error::CoreError;
use slotbook_core::status::{validate_status, STATUS_REJECT};
use slotbook_core::types::{DbId, UserId};
use slotbook_db::models::slot::{CreateSlot, Slot, SlotDetails};
use slotbook_db::repositories::{RecordRepo, ServiceRepo, SlotRepo};
use slotbook_events::{BookingEvent, Recipient, SlotDeletedContext};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / query types
// ---------------------------------------------------------------------------

/// Request body for `POST /slots`.
#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    pub service_id: DbId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Query parameters for `GET /slots`.
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    /// Provider whose slots to list; defaults to the authenticated user.
    pub owner_id: Option<UserId>,
}

/// Query parameters for `GET /slots/{id}/records`.
#[derive(Debug, Deserialize)]
pub struct SlotRecordQuery {
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/slots
///
/// Publish an availability slot for one of the caller's services.
pub async fn create_slot(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSlotRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Slot>>)> {
    if input.end_time <= input.start_time {
        return Err(AppError::Core(CoreError::Validation(
            "end_time must be after start_time".into(),
        )));
    }

    let service = ServiceRepo::find_by_id(&state.pool, input.service_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Service", input.service_id)))?;

    if service.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "The service belongs to another provider".into(),
        )));
    }

    let slot = SlotRepo::create(
        &state.pool,
        &CreateSlot {
            owner_id: auth.user_id,
            service_id: input.service_id,
            start_time: input.start_time,
            end_time: input.end_time,
        },
    )
    .await?;

    tracing::info!(slot_id = slot.id, service_id = slot.service_id, "Slot created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: slot })))
}

/// GET /api/v1/slots
///
/// A provider's slots with service details, soonest first. Without an
/// `owner_id` filter this lists the caller's own slots.
pub async fn list_slots(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SlotQuery>,
) -> AppResult<Json<DataResponse<Vec<SlotDetails>>>> {
    let owner_id = params.owner_id.unwrap_or(auth.user_id);
    let slots = SlotRepo::find_by_owner(&state.pool, owner_id).await?;
    Ok(Json(DataResponse { data: slots }))
}

/// GET /api/v1/slots/{id}
pub async fn get_slot(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SlotDetails>>> {
    let slot = SlotRepo::find_by_id_with_details(&state.pool, slot_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Slot", slot_id)))?;
    Ok(Json(DataResponse { data: slot }))
}

/// GET /api/v1/slots/{id}/records
///
/// The booking requests on one of the caller's own slots, optionally
/// filtered by status.
pub async fn list_slot_records(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
    Query(params): Query<SlotRecordQuery>,
) -> AppResult<Json<DataResponse<Vec<slotbook_db::models::record::Record>>>> {
    if let Some(status) = &params.status {
        validate_status(status).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    }

    require_owned_slot(&state, slot_id, auth.user_id).await?;

    let records = RecordRepo::find_by_slot(&state.pool, slot_id, params.status.as_deref()).await?;
    Ok(Json(DataResponse { data: records }))
}

/// DELETE /api/v1/slots/{id}
///
/// Remove a slot and (via cascade) every record on it. Clients with a live
/// request -- pending or confirmed -- are notified after the delete commits;
/// rejected requests get nothing.
pub async fn delete_slot(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
) -> AppResult<StatusCode> {
    require_owned_slot(&state, slot_id, auth.user_id).await?;

    // Snapshot before deleting: the cascade takes the record rows with it.
    let details = SlotRepo::find_by_id_with_details(&state.pool, slot_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Slot", slot_id)))?;
    let brief = details.brief();

    let mut affected = Vec::new();
    for record in RecordRepo::find_by_slot(&state.pool, slot_id, None).await? {
        if record.status == STATUS_REJECT {
            continue;
        }
        if let Some(detail) = RecordRepo::find_detail(&state.pool, record.id).await? {
            affected.push(SlotDeletedContext {
                record_id: detail.id,
                record_status: detail.status.clone(),
                recipient: Recipient {
                    user_id: detail.client_id,
                    messenger_id: detail.client_messenger_id,
                    timezone: detail.client_timezone.clone(),
                },
                slot: brief.clone(),
            });
        }
    }

    if !SlotRepo::delete(&state.pool, slot_id).await? {
        return Err(AppError::Core(CoreError::not_found("Slot", slot_id)));
    }

    let affected_count = affected.len();
    for context in affected {
        state.event_bus.publish(BookingEvent::SlotDeleted(context));
    }

    tracing::info!(slot_id, affected = affected_count, "Slot deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// 404 for an absent slot, 403 for somebody else's.
async fn require_owned_slot(state: &AppState, slot_id: DbId, user_id: UserId) -> AppResult<()> {
    if SlotRepo::find_by_id_and_owner(&state.pool, slot_id, user_id)
        .await?
        .is_some()
    {
        return Ok(());
    }

    match SlotRepo::find_by_id(&state.pool, slot_id).await? {
        Some(_) => Err(AppError::Core(CoreError::Forbidden(
            "The slot belongs to another provider".into(),
        ))),
        None => Err(AppError::Core(CoreError::not_found("Slot", slot_id))),
    }
}
