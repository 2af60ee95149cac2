//! Repository for the `services` table.

use slotbook_core::types::{DbId, UserId};
use sqlx::PgPool;

use crate::models::service::{CreateService, Service};

const COLUMNS: &str = "id, owner_id, name, description, price, duration_mins, created_at";

pub struct ServiceRepo;

impl ServiceRepo {
    pub async fn create(pool: &PgPool, input: &CreateService) -> Result<Service, sqlx::Error> {
        let query = format!(
            "INSERT INTO services (owner_id, name, description, price, duration_mins)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(input.owner_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.duration_mins)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = $1");
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_owner(pool: &PgPool, owner_id: UserId) -> Result<Vec<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE owner_id = $1 ORDER BY id");
        sqlx::query_as::<_, Service>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }
}
