//! In-app notification entity models.

use serde::Serialize;
use slotbook_core::types::{DbId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `notifications` table. Created only by the dispatcher as a
/// side effect of a booking transition; the recipient may flip `is_read`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: UserId,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub metadata: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

/// Input for persisting a rendered notification. `metadata` is the generic
/// JSON document produced from the typed metadata at this boundary.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: UserId,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub metadata: Option<serde_json::Value>,
    pub expires_at: Option<Timestamp>,
}
