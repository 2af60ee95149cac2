//! Slot entity models.

use serde::Serialize;
use slotbook_core::notify::SlotBrief;
use slotbook_core::types::{DbId, MessengerId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `slots` table.
///
/// `is_booked` is derived state: true iff some record on the slot holds
/// status `confirm`. Only the record repository's invariant cascades write it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Slot {
    pub id: DbId,
    pub owner_id: UserId,
    pub service_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub is_booked: bool,
    pub created_at: Timestamp,
}

/// Input for creating a slot.
#[derive(Debug, Clone)]
pub struct CreateSlot {
    pub owner_id: UserId,
    pub service_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

/// A slot joined with its service and owner columns, as needed to render
/// notifications and the public slot view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlotDetails {
    pub id: DbId,
    pub owner_id: UserId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub is_booked: bool,

    pub service_id: DbId,
    pub service_name: String,
    pub service_description: String,
    pub service_price: f64,
    pub service_duration_mins: i32,

    pub owner_name: String,
    pub owner_surname: String,
    pub owner_phone: String,
    pub owner_messenger_id: Option<MessengerId>,
    pub owner_timezone: String,
}

impl SlotDetails {
    /// The rendering snapshot handed to notification templates.
    pub fn brief(&self) -> SlotBrief {
        SlotBrief {
            slot_id: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
            service_id: self.service_id,
            service_name: self.service_name.clone(),
            service_price: self.service_price,
        }
    }
}
