//! Repository for the `slots` table.
//!
//! The booking engine consumes the query slice here: detail fetches for
//! notification rendering, ownership-scoped lookups, and the confirmed-record
//! aggregate used by the `is_booked` recompute. The `is_booked` flag itself
//! is written only by the cascades in [`RecordRepo`](super::RecordRepo).

use slotbook_core::types::{DbId, UserId};
use sqlx::PgPool;

use crate::models::slot::{CreateSlot, Slot, SlotDetails};

const COLUMNS: &str = "id, owner_id, service_id, start_time, end_time, is_booked, created_at";

/// Join producing [`SlotDetails`] rows.
const DETAIL_SELECT: &str = "SELECT \
        slots.id, slots.owner_id, slots.start_time, slots.end_time, slots.is_booked, \
        services.id AS service_id, \
        services.name AS service_name, \
        services.description AS service_description, \
        services.price AS service_price, \
        services.duration_mins AS service_duration_mins, \
        owners.first_name AS owner_name, \
        owners.surname AS owner_surname, \
        owners.phone AS owner_phone, \
        owners.messenger_id AS owner_messenger_id, \
        owners.timezone AS owner_timezone \
     FROM slots \
     JOIN services ON services.id = slots.service_id \
     JOIN users AS owners ON owners.id = slots.owner_id";

pub struct SlotRepo;

impl SlotRepo {
    /// Insert a new slot, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSlot) -> Result<Slot, sqlx::Error> {
        let query = format!(
            "INSERT INTO slots (owner_id, service_id, start_time, end_time)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(input.owner_id)
            .bind(input.service_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Slot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slots WHERE id = $1");
        sqlx::query_as::<_, Slot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a slot with the service and owner columns needed for rendering.
    pub async fn find_by_id_with_details(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SlotDetails>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE slots.id = $1");
        sqlx::query_as::<_, SlotDetails>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All of an owner's slots, soonest first.
    pub async fn find_by_owner(
        pool: &PgPool,
        owner_id: UserId,
    ) -> Result<Vec<SlotDetails>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE slots.owner_id = $1 ORDER BY slots.start_time");
        sqlx::query_as::<_, SlotDetails>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Ownership-scoped lookup: `None` both when the slot does not exist and
    /// when it belongs to someone else. Callers distinguish the two with a
    /// plain [`find_by_id`](Self::find_by_id) when they need to.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: DbId,
        owner_id: UserId,
    ) -> Result<Option<Slot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slots WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Slot>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Does any record on the slot currently hold status `confirm`?
    pub async fn has_confirmed_record(pool: &PgPool, slot_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM records WHERE slot_id = $1 AND status = 'confirm')",
        )
        .bind(slot_id)
        .fetch_one(pool)
        .await
    }

    /// Delete a slot; records cascade at the schema level. Returns `true` if
    /// a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
