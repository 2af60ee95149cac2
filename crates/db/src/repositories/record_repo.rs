//! Repository for the `records` table: the booking state machine.
//!
//! Every transition here runs as one short transaction. The invariants it
//! maintains:
//!
//! - at most one record per `(slot, client)` pair (unique index, pre-checked
//!   for a clean conflict error);
//! - at most one record per slot with status `confirm` (confirming a record
//!   rejects every other non-rejected record on the slot);
//! - `slots.is_booked` is true iff a confirmed record exists on the slot.
//!
//! A failure at any step aborts the whole transition; no partial invariant
//! state is ever visible outside the transaction. Notifications are not this
//! module's concern; callers emit events after commit.

use slotbook_core::status::STATUS_CONFIRM;
use slotbook_core::types::{DbId, Timestamp, UserId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::record::{CreateRecord, Record, RecordDetail};

const COLUMNS: &str = "id, slot_id, client_id, status, created_at";

/// Join producing [`RecordDetail`] rows.
const DETAIL_SELECT: &str = "SELECT \
        records.id, records.status, records.created_at, \
        records.client_id, \
        clients.first_name AS client_name, \
        clients.surname AS client_surname, \
        clients.phone AS client_phone, \
        clients.messenger_id AS client_messenger_id, \
        clients.timezone AS client_timezone, \
        records.slot_id, \
        slots.start_time AS slot_start, \
        slots.end_time AS slot_end, \
        services.id AS service_id, \
        services.name AS service_name, \
        services.price AS service_price, \
        services.duration_mins AS service_duration_mins, \
        slots.owner_id AS owner_id, \
        owners.first_name AS owner_name, \
        owners.surname AS owner_surname, \
        owners.phone AS owner_phone, \
        owners.messenger_id AS owner_messenger_id, \
        owners.timezone AS owner_timezone \
     FROM records \
     JOIN users AS clients ON clients.id = records.client_id \
     JOIN slots ON slots.id = records.slot_id \
     JOIN services ON services.id = slots.service_id \
     JOIN users AS owners ON owners.id = slots.owner_id";

pub struct RecordRepo;

impl RecordRepo {
    /// Does the client already have a record on this slot?
    pub async fn exists(
        pool: &PgPool,
        slot_id: DbId,
        client_id: UserId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM records WHERE slot_id = $1 AND client_id = $2)",
        )
        .bind(slot_id)
        .bind(client_id)
        .fetch_one(pool)
        .await
    }

    /// Insert a new `pending` record.
    ///
    /// The `(slot_id, client_id)` unique index makes concurrent duplicates
    /// fail with a database unique violation even when both passed the
    /// [`exists`](Self::exists) pre-check.
    pub async fn create(pool: &PgPool, input: &CreateRecord) -> Result<Record, sqlx::Error> {
        let query = format!(
            "INSERT INTO records (slot_id, client_id, status)
             VALUES ($1, $2, 'pending')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Record>(&query)
            .bind(input.slot_id)
            .bind(input.client_id)
            .fetch_one(pool)
            .await
    }

    /// Set a record's status, maintaining the per-slot invariants in the same
    /// transaction. Returns the previous record state, or `None` if the
    /// record does not exist.
    ///
    /// - `confirm`: every other non-rejected record on the slot becomes
    ///   `reject` and the slot is marked booked.
    /// - any other status when the record *was* confirmed: `is_booked` is
    ///   recomputed from the remaining records (under the single-confirm
    ///   invariant this yields `false`).
    pub async fn set_status(
        pool: &PgPool,
        record_id: DbId,
        status: &str,
    ) -> Result<Option<Record>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM records WHERE id = $1 FOR UPDATE");
        let Some(prev) = sqlx::query_as::<_, Record>(&query)
            .bind(record_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("UPDATE records SET status = $2 WHERE id = $1")
            .bind(record_id)
            .bind(status)
            .execute(&mut *tx)
            .await?;

        if status == STATUS_CONFIRM {
            // Confirmation is exclusive: displace every other live request.
            sqlx::query(
                "UPDATE records SET status = 'reject'
                 WHERE slot_id = $1 AND id <> $2 AND status <> 'reject'",
            )
            .bind(prev.slot_id)
            .bind(record_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE slots SET is_booked = TRUE WHERE id = $1")
                .bind(prev.slot_id)
                .execute(&mut *tx)
                .await?;
        } else if prev.status == STATUS_CONFIRM {
            Self::recompute_is_booked(&mut tx, prev.slot_id).await?;
        }

        tx.commit().await?;

        tracing::info!(record_id, status, slot_id = prev.slot_id, "Record status updated");
        Ok(Some(prev))
    }

    /// Delete a record; if it was confirmed, recompute the slot's booked flag
    /// in the same transaction. Returns the deleted record, or `None` if it
    /// did not exist.
    pub async fn delete(pool: &PgPool, record_id: DbId) -> Result<Option<Record>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("DELETE FROM records WHERE id = $1 RETURNING {COLUMNS}");
        let Some(deleted) = sqlx::query_as::<_, Record>(&query)
            .bind(record_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if deleted.status == STATUS_CONFIRM {
            Self::recompute_is_booked(&mut tx, deleted.slot_id).await?;
        }

        tx.commit().await?;

        tracing::info!(record_id, slot_id = deleted.slot_id, "Record deleted");
        Ok(Some(deleted))
    }

    /// Recompute `is_booked` as "does any confirmed record remain".
    async fn recompute_is_booked(
        tx: &mut Transaction<'_, Postgres>,
        slot_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE slots SET is_booked = EXISTS (
                 SELECT 1 FROM records WHERE slot_id = $1 AND status = 'confirm'
             )
             WHERE id = $1",
        )
        .bind(slot_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Record>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM records WHERE id = $1");
        sqlx::query_as::<_, Record>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A client's records, newest first, optionally filtered by status.
    pub async fn find_by_client(
        pool: &PgPool,
        client_id: UserId,
        status: Option<&str>,
    ) -> Result<Vec<Record>, sqlx::Error> {
        match status {
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM records
                     WHERE client_id = $1 AND status = $2 ORDER BY id DESC"
                );
                sqlx::query_as::<_, Record>(&query)
                    .bind(client_id)
                    .bind(status)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query =
                    format!("SELECT {COLUMNS} FROM records WHERE client_id = $1 ORDER BY id DESC");
                sqlx::query_as::<_, Record>(&query)
                    .bind(client_id)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// A slot's records in creation order, optionally filtered by status.
    pub async fn find_by_slot(
        pool: &PgPool,
        slot_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<Record>, sqlx::Error> {
        match status {
            Some(status) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM records
                     WHERE slot_id = $1 AND status = $2 ORDER BY id"
                );
                sqlx::query_as::<_, Record>(&query)
                    .bind(slot_id)
                    .bind(status)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query =
                    format!("SELECT {COLUMNS} FROM records WHERE slot_id = $1 ORDER BY id");
                sqlx::query_as::<_, Record>(&query)
                    .bind(slot_id)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// A record joined with every party and slot column needed for rendering.
    pub async fn find_detail(
        pool: &PgPool,
        record_id: DbId,
    ) -> Result<Option<RecordDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE records.id = $1");
        sqlx::query_as::<_, RecordDetail>(&query)
            .bind(record_id)
            .fetch_optional(pool)
            .await
    }

    /// Confirmed records whose slot starts within `[from, to]`, with full
    /// details. Feeds the reminder scan; read-only over booking state.
    pub async fn find_confirmed_starting_between(
        pool: &PgPool,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<RecordDetail>, sqlx::Error> {
        let query = format!(
            "{DETAIL_SELECT}
             WHERE records.status = 'confirm' AND slots.start_time BETWEEN $1 AND $2"
        );
        sqlx::query_as::<_, RecordDetail>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }
}
