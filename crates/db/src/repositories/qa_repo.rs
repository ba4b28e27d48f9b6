//! Repository for the `mr_qa` table.

use sqlx::PgPool;
use nidb_core::types::DbId;

pub struct QaRepo;

impl QaRepo {
    /// Record a placeholder QA result for a series. Returns the new ID.
    pub async fn create(pool: &PgPool, mrseries_id: DbId) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO mr_qa (mrseries_id) VALUES ($1) RETURNING mrqa_id")
            .bind(mrseries_id)
            .fetch_one(pool)
            .await
    }

    /// Delete QA results for every MR series of a project so they are
    /// recomputed. Returns the number of rows removed.
    pub async fn reset_for_project(pool: &PgPool, project_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM mr_qa WHERE mrseries_id IN (
                SELECT se.mrseries_id FROM mr_series se
                JOIN studies st ON st.study_id = se.study_id
                JOIN enrollment e ON e.enrollment_id = st.enrollment_id
                WHERE e.project_id = $1
             )",
        )
        .bind(project_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_for_series(pool: &PgPool, mrseries_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM mr_qa WHERE mrseries_id = $1")
            .bind(mrseries_id)
            .fetch_one(pool)
            .await
    }
}
