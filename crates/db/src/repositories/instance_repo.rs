//! Repository for the `instances` table.

use sqlx::PgPool;
use nidb_core::types::DbId;

pub struct InstanceRepo;

impl InstanceRepo {
    /// Insert an instance, returning its ID.
    pub async fn create(pool: &PgPool, name: &str) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO instances (instance_name) VALUES ($1) RETURNING instance_id")
            .bind(name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_name(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT instance_name FROM instances WHERE instance_id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
