//! Repository for the `tags` table.

use sqlx::PgPool;
use nidb_core::types::DbId;

/// Tag type applied from the studies table.
pub const DIAGNOSIS_TAG: &str = "dx";

pub struct TagRepo;

impl TagRepo {
    /// Tag every enrollment with every tag. Existing tags are left alone.
    ///
    /// Returns the number of tags actually inserted.
    pub async fn apply(
        pool: &PgPool,
        tagtype: &str,
        enrollment_ids: &[DbId],
        tags: &[String],
    ) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for &enrollment_id in enrollment_ids {
            for tag in tags {
                let result = sqlx::query(
                    "INSERT INTO tags (tagtype, enrollment_id, tag) VALUES ($1, $2, $3)
                     ON CONFLICT ON CONSTRAINT uq_tags_type_enrollment_tag DO NOTHING",
                )
                .bind(tagtype)
                .bind(enrollment_id)
                .bind(tag)
                .execute(pool)
                .await?;
                inserted += result.rows_affected();
            }
        }
        Ok(inserted)
    }

    /// Tags of one type on an enrollment, alphabetically.
    pub async fn list_for_enrollment(
        pool: &PgPool,
        tagtype: &str,
        enrollment_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT tag FROM tags WHERE tagtype = $1 AND enrollment_id = $2 ORDER BY tag",
        )
        .bind(tagtype)
        .bind(enrollment_id)
        .fetch_all(pool)
        .await
    }
}
