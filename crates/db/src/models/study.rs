//! Study entity model and DTOs.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use nidb_core::types::DbId;

/// A study row from the `studies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Study {
    pub study_id: DbId,
    pub enrollment_id: DbId,
    pub study_num: i32,
    pub study_modality: String,
    pub study_datetime: Option<NaiveDateTime>,
    pub study_desc: String,
    pub study_type: String,
    pub study_site: String,
    pub study_nidbsite: Option<i64>,
    pub study_ageatscan: Option<f64>,
    pub study_alternateid: String,
}

/// DTO for creating a new study.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStudy {
    pub enrollment_id: DbId,
    pub study_num: i32,
    pub study_modality: String,
    pub study_datetime: Option<NaiveDateTime>,
    pub study_desc: String,
    pub study_ageatscan: Option<f64>,
    pub study_nidbsite: Option<i64>,
}

/// A study of a project joined with its subject and enrollment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectStudy {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub study: Study,
    pub subject_id: DbId,
    pub uid: String,
    pub gender: String,
    pub birthdate: Option<NaiveDate>,
    pub isactive: bool,
    pub enroll_subgroup: String,
}

/// A study of any project in an instance, with the subject details the
/// instance summary shows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InstanceStudy {
    pub enrollment_id: DbId,
    pub study_id: DbId,
    pub study_modality: String,
    pub study_ageatscan: Option<f64>,
    pub subject_id: DbId,
    pub uid: String,
    pub birthdate: Option<NaiveDate>,
    pub project_name: String,
}
