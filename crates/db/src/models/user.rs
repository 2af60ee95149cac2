//! Account entity models.

use serde::Serialize;
use slotbook_core::types::{MessengerId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `users` table.
///
/// `messenger_id` is the account's identity on the external messaging
/// channel; it is `None` until the user has linked the bot. `timezone` is an
/// IANA zone name and may be empty (rendering then falls back to the default
/// zone).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: UserId,
    pub phone: String,
    pub first_name: String,
    pub surname: String,
    pub messenger_id: Option<MessengerId>,
    pub timezone: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Display name used in notification bodies.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
            .trim()
            .to_string()
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub phone: String,
    pub first_name: String,
    pub surname: String,
    pub messenger_id: Option<MessengerId>,
    pub timezone: String,
}
