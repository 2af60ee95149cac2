//! Service offering entity models.

use serde::Serialize;
use slotbook_core::types::{DbId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `services` table. Slots reference a service; its name and
/// price appear in every booking notification.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Service {
    pub id: DbId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_mins: i32,
    pub created_at: Timestamp,
}

/// Input for creating a service.
#[derive(Debug, Clone)]
pub struct CreateService {
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_mins: i32,
}
