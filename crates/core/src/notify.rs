//! Notification kinds, typed metadata, and template rendering.
//!
//! Each booking transition maps to one notification kind. Rendering takes a
//! snapshot of the parties and the slot (captured before the transition
//! commits, so it works even when the underlying rows are gone) and produces
//! a title, a human-readable body, and structured metadata. Metadata stays
//! typed through the whole pipeline; it is serialized to a JSON document only
//! at the persistence boundary.
//!
//! Slot times are rendered in the recipient's configured IANA time zone,
//! falling back to [`DEFAULT_TIMEZONE`] when unset or unknown.

use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::Serialize;

use crate::types::{DbId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// A client filed a new booking (sent to the slot owner).
pub const KIND_RECORD_CREATED: &str = "RECORD_CREATED";

/// The provider confirmed the booking (sent to the client).
pub const KIND_RECORD_CONFIRMED: &str = "RECORD_CONFIRMED";

/// The provider rejected the booking (sent to the client).
pub const KIND_RECORD_REJECTED: &str = "RECORD_REJECTED";

/// The provider deleted a slot with live bookings (sent to each client).
pub const KIND_SLOT_DELETED: &str = "SLOT_DELETED";

/// A confirmed booking starts within the next hour (sent to the client).
pub const KIND_RECORD_REMINDER_1H: &str = "RECORD_REMINDER_1H";

/// Fallback zone when an account has no (or an unknown) time zone configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Moscow;

/// How long a new-booking notification stays relevant.
const CREATED_EXPIRY_DAYS: i64 = 30;

/// How long a status-change notification stays relevant.
const STATUS_EXPIRY_DAYS: i64 = 15;

/// Resolve an IANA zone name to a [`Tz`], falling back to the default zone.
pub fn resolve_timezone(name: &str) -> Tz {
    if name.is_empty() {
        return DEFAULT_TIMEZONE;
    }
    name.parse().unwrap_or(DEFAULT_TIMEZONE)
}

/// Format a slot time range in the given zone: full date-time for the start,
/// time-of-day for the end (`14.03.2026 15:00` / `16:30`).
fn format_range(start: Timestamp, end: Timestamp, tz: Tz) -> (String, String) {
    (
        start.with_timezone(&tz).format("%d.%m.%Y %H:%M").to_string(),
        end.with_timezone(&tz).format("%H:%M").to_string(),
    )
}

// ---------------------------------------------------------------------------
// Render context
// ---------------------------------------------------------------------------

/// The party referenced by a notification body (counterpart of the recipient).
#[derive(Debug, Clone, Serialize)]
pub struct PartyBrief {
    pub id: UserId,
    pub name: String,
    pub phone: String,
}

/// The slot and its service as needed for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SlotBrief {
    pub slot_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub service_id: DbId,
    pub service_name: String,
    pub service_price: f64,
}

// ---------------------------------------------------------------------------
// Typed metadata
// ---------------------------------------------------------------------------

/// Structured metadata attached to a notification, one variant per kind.
///
/// Serialized untagged so the persisted document is the flat object the
/// frontend consumes (`record_id`, `service_name`, `action_url`, ...).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NotificationMeta {
    RecordCreated {
        record_id: DbId,
        slot_id: DbId,
        client_id: UserId,
        client_name: String,
        service_id: DbId,
        service_name: String,
        service_price: f64,
        slot_start: String,
        slot_end: String,
        action_url: String,
    },
    RecordStatus {
        record_id: DbId,
        slot_id: DbId,
        status: String,
        owner_id: UserId,
        owner_name: String,
        service_id: DbId,
        service_name: String,
        service_price: f64,
        slot_start: String,
        slot_end: String,
        action_url: String,
    },
    SlotDeleted {
        record_id: DbId,
        slot_id: DbId,
        status: String,
    },
    Reminder {
        record_id: DbId,
        slot_id: DbId,
        slot_start: String,
    },
}

impl NotificationMeta {
    /// Serialize to the generic JSON document stored in the database.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Rendered notification
// ---------------------------------------------------------------------------

/// A fully rendered notification, ready to persist and to push.
#[derive(Debug, Clone)]
pub struct RenderedNotification {
    pub recipient: UserId,
    pub kind: &'static str,
    pub title: String,
    pub body: String,
    pub metadata: NotificationMeta,
    pub expires_at: Option<Timestamp>,
}

fn expires_in_days(days: i64) -> Option<Timestamp> {
    Some(chrono::Utc::now() + TimeDelta::days(days))
}

/// Render the new-booking notification for the slot owner.
///
/// The client's phone is included so the provider can verify who booked.
pub fn render_record_created(
    recipient: UserId,
    record_id: DbId,
    client: &PartyBrief,
    slot: &SlotBrief,
    tz: Tz,
) -> RenderedNotification {
    let (start, end) = format_range(slot.start_time, slot.end_time, tz);
    let body = format!(
        "Client {} (tel: {}) booked \"{}\" ({:.0} rub.)\nTime: {} - {} ({})",
        client.name, client.phone, slot.service_name, slot.service_price, start, end, tz
    );

    RenderedNotification {
        recipient,
        kind: KIND_RECORD_CREATED,
        title: "New booking from a client".to_string(),
        body,
        metadata: NotificationMeta::RecordCreated {
            record_id,
            slot_id: slot.slot_id,
            client_id: client.id,
            client_name: client.name.clone(),
            service_id: slot.service_id,
            service_name: slot.service_name.clone(),
            service_price: slot.service_price,
            slot_start: start,
            slot_end: end,
            action_url: format!("records/{record_id}"),
        },
        expires_at: expires_in_days(CREATED_EXPIRY_DAYS),
    }
}

/// Render the confirm/reject notification for the client.
///
/// `confirmed` selects between the two templates; callers have already
/// filtered out transitions back to `pending`, which produce no notification.
pub fn render_record_status(
    recipient: UserId,
    record_id: DbId,
    confirmed: bool,
    owner: &PartyBrief,
    slot: &SlotBrief,
    tz: Tz,
) -> RenderedNotification {
    let (kind, title, verb, status) = if confirmed {
        (KIND_RECORD_CONFIRMED, "Booking confirmed ✅", "confirmed", "confirm")
    } else {
        (KIND_RECORD_REJECTED, "Booking rejected ❌", "rejected", "reject")
    };

    let (start, end) = format_range(slot.start_time, slot.end_time, tz);
    let body = format!(
        "The provider {} your booking\n\nService: {} ({:.0} rub.)\nProvider: {}\nTime: {} - {} ({})",
        verb, slot.service_name, slot.service_price, owner.name, start, end, tz
    );

    RenderedNotification {
        recipient,
        kind,
        title: title.to_string(),
        body,
        metadata: NotificationMeta::RecordStatus {
            record_id,
            slot_id: slot.slot_id,
            status: status.to_string(),
            owner_id: owner.id,
            owner_name: owner.name.clone(),
            service_id: slot.service_id,
            service_name: slot.service_name.clone(),
            service_price: slot.service_price,
            slot_start: start,
            slot_end: end,
            action_url: format!("/my-records/{record_id}"),
        },
        expires_at: expires_in_days(STATUS_EXPIRY_DAYS),
    }
}

/// Render the slot-cancellation notice for a client whose record was cascaded
/// away. `record_status` is the status the request held before deletion.
pub fn render_slot_deleted(
    recipient: UserId,
    record_id: DbId,
    record_status: &str,
    slot: &SlotBrief,
    tz: Tz,
) -> RenderedNotification {
    let (start, end) = format_range(slot.start_time, slot.end_time, tz);
    let body = format!(
        "The provider deleted the {} - {} slot for \"{}\".\nYour request was in status: {}. \
         Contact the provider if needed.",
        start, end, slot.service_name, record_status
    );

    RenderedNotification {
        recipient,
        kind: KIND_SLOT_DELETED,
        title: "Slot cancelled by the provider".to_string(),
        body,
        metadata: NotificationMeta::SlotDeleted {
            record_id,
            slot_id: slot.slot_id,
            status: record_status.to_string(),
        },
        expires_at: None,
    }
}

/// Render the one-hour reminder for the client of a confirmed booking.
pub fn render_reminder(
    recipient: UserId,
    record_id: DbId,
    owner: &PartyBrief,
    slot: &SlotBrief,
    tz: Tz,
) -> RenderedNotification {
    let start_local = slot.start_time.with_timezone(&tz);
    let end_local = slot.end_time.with_timezone(&tz);
    let body = format!(
        "You have a booking with: {}\nService: {}\nDate: {}\nTime: {} - {} (TZ: {})",
        owner.name,
        slot.service_name,
        start_local.format("%d.%m.%Y"),
        start_local.format("%H:%M"),
        end_local.format("%H:%M"),
        tz
    );

    RenderedNotification {
        recipient,
        kind: KIND_RECORD_REMINDER_1H,
        title: "Reminder: booking in 1 hour".to_string(),
        body,
        metadata: NotificationMeta::Reminder {
            record_id,
            slot_id: slot.slot_id,
            slot_start: start_local.format("%d.%m.%Y %H:%M").to_string(),
        },
        expires_at: None,
    }
}
