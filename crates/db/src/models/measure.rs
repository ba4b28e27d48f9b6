//! Phenotypic measure rows.

use serde::Serialize;
use sqlx::FromRow;
use nidb_core::series_summary::{MeasureValue, SubjectMeasure};
use nidb_core::types::DbId;

/// A measure joined with its instrument and measure names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MeasureRow {
    pub enrollment_id: DbId,
    pub uid: String,
    pub instrument_name: String,
    pub measure_name: String,
    pub measure_type: String,
    pub measure_valuestring: Option<String>,
    pub measure_valuenum: Option<f64>,
}

impl From<MeasureRow> for SubjectMeasure {
    fn from(row: MeasureRow) -> Self {
        SubjectMeasure {
            value: MeasureValue::from_columns(
                &row.measure_type,
                row.measure_valuestring,
                row.measure_valuenum,
            ),
            uid: row.uid,
            instrument: row.instrument_name,
            measure: row.measure_name,
        }
    }
}
