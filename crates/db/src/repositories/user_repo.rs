//! Repository for the `users` table.

use sqlx::PgPool;
use nidb_core::types::DbId;

pub struct UserRepo;

impl UserRepo {
    /// Insert a user, returning its ID.
    pub async fn create(pool: &PgPool, username: &str, fullname: &str) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO users (username, user_fullname) VALUES ($1, $2) RETURNING user_id",
        )
        .bind(username)
        .bind(fullname)
        .fetch_one(pool)
        .await
    }

    pub async fn find_id_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT user_id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
    }
}
