//! Series models for the per-modality `{modality}_series` tables.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use nidb_core::mr_qa::{ScanValues, SeriesAcquisition};
use nidb_core::types::DbId;

/// Columns every series table has. The id column is aliased to `series_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Series {
    pub series_id: DbId,
    pub study_id: DbId,
    pub series_num: i32,
    pub series_datetime: Option<NaiveDateTime>,
    pub series_desc: String,
    pub series_protocol: String,
    pub series_altdesc: String,
    pub data_type: Option<String>,
    pub numfiles: i64,
    pub numfiles_beh: i64,
    pub series_size: i64,
    pub ishidden: bool,
}

/// An `mr_series` row with its acquisition parameters.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MrSeries {
    pub mrseries_id: DbId,
    pub study_id: DbId,
    pub series_num: i32,
    pub series_desc: String,
    pub series_protocol: String,
    pub series_sequencename: String,
    pub series_tr: f64,
    pub series_te: f64,
    pub series_ti: f64,
    pub series_flip: f64,
    pub dimx: f64,
    pub dimy: f64,
    pub dimz: f64,
    pub dimt: f64,
    pub slicethickness: f64,
    pub slicespacing: f64,
    pub bandwidth: f64,
}

impl MrSeries {
    pub fn acquisition(&self) -> SeriesAcquisition {
        SeriesAcquisition {
            series_num: self.series_num,
            description: self.series_desc.clone(),
            protocol: self.series_protocol.clone(),
            sequence: self.series_sequencename.clone(),
            values: ScanValues {
                tr: self.series_tr,
                te: self.series_te,
                ti: self.series_ti,
                flip: self.series_flip,
                xdim: self.dimx,
                ydim: self.dimy,
                zdim: self.dimz,
                tdim: self.dimt,
                slice_thickness: self.slicethickness,
                slice_spacing: self.slicespacing,
                bandwidth: self.bandwidth,
            },
        }
    }
}

/// DTO for inserting a series into any modality table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSeries {
    pub study_id: DbId,
    pub series_num: i32,
    pub series_datetime: Option<NaiveDateTime>,
    pub series_desc: String,
    pub series_protocol: String,
    pub data_type: Option<String>,
    pub numfiles: i64,
    pub series_size: i64,
    pub ishidden: bool,
}

/// MR acquisition parameters for a newly inserted `mr_series` row.
#[derive(Debug, Clone, Default)]
pub struct CreateMrParams {
    pub series_sequencename: String,
    pub values: ScanValues,
}

/// Name columns of a series together with its subject, used by the
/// series-name summaries.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SeriesName {
    pub subject_id: DbId,
    pub uid: String,
    pub series_desc: String,
    pub series_protocol: String,
    pub series_altdesc: String,
}

/// A line of the complete project table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SeriesListRow {
    pub subject_id: DbId,
    pub enrollment_id: DbId,
    pub uid: String,
    pub study_datetime: Option<NaiveDateTime>,
    pub series_num: Option<i32>,
    pub series_datetime: Option<NaiveDateTime>,
    pub series_desc: Option<String>,
    pub series_protocol: Option<String>,
    pub numfiles: Option<i64>,
    pub numfiles_beh: Option<i64>,
}
