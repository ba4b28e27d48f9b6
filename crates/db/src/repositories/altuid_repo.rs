//! Repository for the `subject_altuid` table.

use sqlx::PgPool;
use nidb_core::altuid::AltUid;
use nidb_core::types::DbId;

use crate::models::subject::AltUidRow;

pub struct AltUidRepo;

impl AltUidRepo {
    /// Alternate IDs of a subject within one enrollment, primary first.
    pub async fn list_for_enrollment(
        pool: &PgPool,
        subject_id: DbId,
        enrollment_id: DbId,
    ) -> Result<Vec<AltUidRow>, sqlx::Error> {
        sqlx::query_as::<_, AltUidRow>(
            "SELECT altuid, isprimary FROM subject_altuid
             WHERE subject_id = $1 AND enrollment_id = $2
             ORDER BY isprimary DESC, altuid",
        )
        .bind(subject_id)
        .bind(enrollment_id)
        .fetch_all(pool)
        .await
    }

    /// Every alternate ID of a subject across enrollments, primary first.
    pub async fn list_for_subject(
        pool: &PgPool,
        subject_id: DbId,
    ) -> Result<Vec<AltUidRow>, sqlx::Error> {
        sqlx::query_as::<_, AltUidRow>(
            "SELECT altuid, isprimary FROM subject_altuid
             WHERE subject_id = $1
             ORDER BY isprimary DESC, altuid",
        )
        .bind(subject_id)
        .fetch_all(pool)
        .await
    }

    /// Replace a subject's alternate IDs within one enrollment.
    ///
    /// Runs in a transaction; duplicates in `altuids` are ignored.
    pub async fn replace(
        pool: &PgPool,
        subject_id: DbId,
        enrollment_id: DbId,
        altuids: &[AltUid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM subject_altuid WHERE subject_id = $1 AND enrollment_id = $2")
            .bind(subject_id)
            .bind(enrollment_id)
            .execute(&mut *tx)
            .await?;
        for alt in altuids {
            sqlx::query(
                "INSERT INTO subject_altuid (subject_id, altuid, isprimary, enrollment_id)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT ON CONSTRAINT uq_subject_altuid DO NOTHING",
            )
            .bind(subject_id)
            .bind(&alt.altuid)
            .bind(alt.is_primary)
            .bind(enrollment_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}
