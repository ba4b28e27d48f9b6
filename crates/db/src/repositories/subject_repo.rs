//! Repository for the `subjects` table.

use chrono::NaiveDate;
use sqlx::PgPool;
use nidb_core::demographics::SubjectUpdates;
use nidb_core::types::DbId;

use crate::models::subject::{CreateSubject, EnrolledSubject, Subject};

const COLUMNS: &str = "subject_id, uid, guid, birthdate, gender, ethnicity1, ethnicity2, \
    education, handedness, marital_status, smoking_status, isactive";

/// Same columns qualified with the `s.` alias used in joins.
const JOINED_COLUMNS: &str = "s.subject_id, s.uid, s.guid, s.birthdate, s.gender, s.ethnicity1, \
    s.ethnicity2, s.education, s.handedness, s.marital_status, s.smoking_status, s.isactive";

pub struct SubjectRepo;

impl SubjectRepo {
    /// Insert a new active subject, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSubject) -> Result<Subject, sqlx::Error> {
        let query = format!(
            "INSERT INTO subjects (uid, guid, birthdate, gender)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(&input.uid)
            .bind(&input.guid)
            .bind(input.birthdate)
            .bind(&input.gender)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Subject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subjects WHERE subject_id = $1");
        sqlx::query_as::<_, Subject>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The subject a study belongs to.
    pub async fn find_by_study(
        pool: &PgPool,
        study_id: DbId,
    ) -> Result<Option<Subject>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM subjects s
             JOIN enrollment e ON e.subject_id = s.subject_id
             JOIN studies st ON st.enrollment_id = e.enrollment_id
             WHERE st.study_id = $1"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(study_id)
            .fetch_optional(pool)
            .await
    }

    /// Subjects enrolled in a project with the given active flag, by UID.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
        active: bool,
    ) -> Result<Vec<EnrolledSubject>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}, e.enrollment_id, e.enroll_subgroup
             FROM subjects s
             JOIN enrollment e ON e.subject_id = s.subject_id
             WHERE e.project_id = $1 AND s.isactive = $2
             ORDER BY s.uid"
        );
        sqlx::query_as::<_, EnrolledSubject>(&query)
            .bind(project_id)
            .bind(active)
            .fetch_all(pool)
            .await
    }

    /// Distinct subjects owning any of the given studies, in subject order.
    pub async fn list_for_studies(
        pool: &PgPool,
        study_ids: &[DbId],
    ) -> Result<Vec<Subject>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT {JOINED_COLUMNS} FROM subjects s
             JOIN enrollment e ON e.subject_id = s.subject_id
             JOIN studies st ON st.enrollment_id = e.enrollment_id
             WHERE st.study_id = ANY($1)
             ORDER BY s.subject_id"
        );
        sqlx::query_as::<_, Subject>(&query)
            .bind(study_ids)
            .fetch_all(pool)
            .await
    }

    /// Apply demographic updates. Only `Some` fields are written.
    ///
    /// Returns `false` when there was nothing to write or no such subject.
    pub async fn update_demographics(
        pool: &PgPool,
        id: DbId,
        updates: &SubjectUpdates,
    ) -> Result<bool, sqlx::Error> {
        if updates.is_empty() {
            return Ok(false);
        }
        let result = sqlx::query(
            "UPDATE subjects SET
                guid = COALESCE($2, guid),
                birthdate = COALESCE($3, birthdate),
                gender = COALESCE($4, gender),
                ethnicity1 = COALESCE($5, ethnicity1),
                ethnicity2 = COALESCE($6, ethnicity2),
                education = COALESCE($7, education),
                handedness = COALESCE($8, handedness),
                marital_status = COALESCE($9, marital_status),
                smoking_status = COALESCE($10, smoking_status)
             WHERE subject_id = $1",
        )
        .bind(id)
        .bind(&updates.guid)
        .bind(updates.birthdate)
        .bind(&updates.sex)
        .bind(&updates.ethnicity1)
        .bind(&updates.ethnicity2)
        .bind(&updates.education)
        .bind(&updates.handedness)
        .bind(&updates.marital_status)
        .bind(&updates.smoking_status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the birth date; `None` clears it.
    pub async fn set_birthdate(
        pool: &PgPool,
        id: DbId,
        birthdate: Option<NaiveDate>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE subjects SET birthdate = $2 WHERE subject_id = $1")
            .bind(id)
            .bind(birthdate)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set only the sex column.
    pub async fn update_sex(pool: &PgPool, id: DbId, sex: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE subjects SET gender = $2 WHERE subject_id = $1")
            .bind(id)
            .bind(sex)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a subject active or deleted.
    pub async fn set_active(pool: &PgPool, id: DbId, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE subjects SET isactive = $2 WHERE subject_id = $1")
            .bind(id)
            .bind(active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
