//! Booking record entity models.

use serde::Serialize;
use slotbook_core::types::{DbId, MessengerId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `records` table: one client's booking request against one
/// slot. Status is one of `pending`, `confirm`, `reject`; at most one record
/// per slot holds `confirm` at any time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Record {
    pub id: DbId,
    pub slot_id: DbId,
    pub client_id: UserId,
    pub status: String,
    pub created_at: Timestamp,
}

/// Input for creating a record. New records always start `pending`.
#[derive(Debug, Clone)]
pub struct CreateRecord {
    pub slot_id: DbId,
    pub client_id: UserId,
}

/// A record joined with its client, slot, service, and slot-owner columns.
/// One query yields everything a notification or a bot view needs.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecordDetail {
    pub id: DbId,
    pub status: String,
    pub created_at: Timestamp,

    pub client_id: UserId,
    pub client_name: String,
    pub client_surname: String,
    pub client_phone: String,
    pub client_messenger_id: Option<MessengerId>,
    pub client_timezone: String,

    pub slot_id: DbId,
    pub slot_start: Timestamp,
    pub slot_end: Timestamp,

    pub service_id: DbId,
    pub service_name: String,
    pub service_price: f64,
    pub service_duration_mins: i32,

    pub owner_id: UserId,
    pub owner_name: String,
    pub owner_surname: String,
    pub owner_phone: String,
    pub owner_messenger_id: Option<MessengerId>,
    pub owner_timezone: String,
}

impl RecordDetail {
    pub fn client_full_name(&self) -> String {
        format!("{} {}", self.client_name, self.client_surname)
            .trim()
            .to_string()
    }

    pub fn owner_full_name(&self) -> String {
        format!("{} {}", self.owner_name, self.owner_surname)
            .trim()
            .to_string()
    }
}
