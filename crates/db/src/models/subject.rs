//! Subject, enrollment and alternate-ID models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use nidb_core::altuid::AltUid;
use nidb_core::types::{DbId, Timestamp};

/// A subject row from the `subjects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subject {
    pub subject_id: DbId,
    pub uid: String,
    pub guid: String,
    pub birthdate: Option<NaiveDate>,
    pub gender: String,
    pub ethnicity1: String,
    pub ethnicity2: String,
    pub education: String,
    pub handedness: String,
    pub marital_status: String,
    pub smoking_status: String,
    pub isactive: bool,
}

/// DTO for creating a new subject.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSubject {
    pub uid: String,
    pub guid: String,
    pub birthdate: Option<NaiveDate>,
    pub gender: String,
}

/// A subject enrolled in a project, as listed on the subjects page.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EnrolledSubject {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub subject: Subject,
    pub enrollment_id: DbId,
    pub enroll_subgroup: String,
}

/// An enrollment row from the `enrollment` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub enrollment_id: DbId,
    pub project_id: DbId,
    pub subject_id: DbId,
    pub enroll_subgroup: String,
    pub enroll_startdate: Timestamp,
}

/// An alternate ID row from `subject_altuid`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct AltUidRow {
    pub altuid: String,
    pub isprimary: bool,
}

impl From<AltUidRow> for AltUid {
    fn from(row: AltUidRow) -> Self {
        AltUid {
            altuid: row.altuid,
            is_primary: row.isprimary,
        }
    }
}
