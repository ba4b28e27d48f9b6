//! Repository for phenotypic measures.

use sqlx::PgPool;
use nidb_core::series_summary::MeasureValue;
use nidb_core::types::DbId;

use crate::models::measure::MeasureRow;

pub struct MeasureRepo;

impl MeasureRepo {
    /// Measures recorded for any of the given enrollments.
    pub async fn list_for_enrollments(
        pool: &PgPool,
        enrollment_ids: &[DbId],
    ) -> Result<Vec<MeasureRow>, sqlx::Error> {
        sqlx::query_as::<_, MeasureRow>(
            "SELECT m.enrollment_id, s.uid,
                    COALESCE(i.instrument_name, '') AS instrument_name,
                    COALESCE(n.measure_name, '') AS measure_name,
                    m.measure_type, m.measure_valuestring, m.measure_valuenum
             FROM measures m
             JOIN enrollment e ON e.enrollment_id = m.enrollment_id
             JOIN subjects s ON s.subject_id = e.subject_id
             LEFT JOIN measureinstruments i ON i.measureinstrument_id = m.instrumentname_id
             LEFT JOIN measurenames n ON n.measurename_id = m.measurename_id
             WHERE m.enrollment_id = ANY($1)
             ORDER BY m.measure_id",
        )
        .bind(enrollment_ids)
        .fetch_all(pool)
        .await
    }

    /// Record a measure, creating the instrument and measure names.
    pub async fn create(
        pool: &PgPool,
        enrollment_id: DbId,
        instrument: &str,
        measure: &str,
        value: &MeasureValue,
    ) -> Result<DbId, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let instrument_id: DbId = sqlx::query_scalar(
            "INSERT INTO measureinstruments (instrument_name) VALUES ($1)
             RETURNING measureinstrument_id",
        )
        .bind(instrument)
        .fetch_one(&mut *tx)
        .await?;
        let name_id: DbId = sqlx::query_scalar(
            "INSERT INTO measurenames (measure_name) VALUES ($1) RETURNING measurename_id",
        )
        .bind(measure)
        .fetch_one(&mut *tx)
        .await?;
        let (measure_type, text, number) = match value {
            MeasureValue::Text(s) => ("s", Some(s.as_str()), None),
            MeasureValue::Number(n) => ("n", None, Some(*n)),
        };
        let id = sqlx::query_scalar(
            "INSERT INTO measures (enrollment_id, instrumentname_id, measurename_id,
                                   measure_type, measure_valuestring, measure_valuenum)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING measure_id",
        )
        .bind(enrollment_id)
        .bind(instrument_id)
        .bind(name_id)
        .bind(measure_type)
        .bind(text)
        .bind(number)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(id)
    }
}
