//! Repository for the `users` table (the account directory).

use slotbook_core::types::{MessengerId, UserId};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, phone, first_name, surname, messenger_id, timezone, created_at, updated_at";

/// Provides lookup and profile operations for accounts.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new account, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (phone, first_name, surname, messenger_id, timezone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.phone)
            .bind(&input.first_name)
            .bind(&input.surname)
            .bind(input.messenger_id)
            .bind(&input.timezone)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: UserId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an account by phone number (the web login entry point).
    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE phone = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Find an account by its messaging-channel identity (the bot entry point).
    pub async fn find_by_messenger_id(
        pool: &PgPool,
        messenger_id: MessengerId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE messenger_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(messenger_id)
            .fetch_optional(pool)
            .await
    }

    /// Update the display name. Returns `true` if the row was updated.
    pub async fn update_names(
        pool: &PgPool,
        id: UserId,
        first_name: &str,
        surname: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET first_name = $2, surname = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(first_name)
        .bind(surname)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the configured IANA time zone. Returns `true` if the row was updated.
    pub async fn update_timezone(
        pool: &PgPool,
        id: UserId,
        timezone: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET timezone = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(timezone)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
