//! Repository for the `studies` table.

use sqlx::PgPool;
use nidb_core::grid::StudyVisitUpdate;
use nidb_core::types::DbId;

use crate::models::study::{CreateStudy, InstanceStudy, ProjectStudy, Study};

const COLUMNS: &str = "study_id, enrollment_id, study_num, study_modality, study_datetime, \
    study_desc, study_type, study_site, study_nidbsite, study_ageatscan, study_alternateid";

const JOINED_COLUMNS: &str = "st.study_id, st.enrollment_id, st.study_num, st.study_modality, \
    st.study_datetime, st.study_desc, st.study_type, st.study_site, st.study_nidbsite, \
    st.study_ageatscan, st.study_alternateid";

pub struct StudyRepo;

impl StudyRepo {
    /// Insert a new study, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateStudy) -> Result<Study, sqlx::Error> {
        let query = format!(
            "INSERT INTO studies (enrollment_id, study_num, study_modality, study_datetime,
                                  study_desc, study_ageatscan, study_nidbsite)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Study>(&query)
            .bind(input.enrollment_id)
            .bind(input.study_num)
            .bind(&input.study_modality)
            .bind(input.study_datetime)
            .bind(&input.study_desc)
            .bind(input.study_ageatscan)
            .bind(input.study_nidbsite)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Study>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM studies WHERE study_id = $1");
        sqlx::query_as::<_, Study>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a study by subject UID and study number.
    pub async fn find_by_uid(
        pool: &PgPool,
        uid: &str,
        study_num: i32,
    ) -> Result<Option<Study>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM studies st
             JOIN enrollment e ON e.enrollment_id = st.enrollment_id
             JOIN subjects s ON s.subject_id = e.subject_id
             WHERE s.uid = $1 AND st.study_num = $2"
        );
        sqlx::query_as::<_, Study>(&query)
            .bind(uid)
            .bind(study_num)
            .fetch_optional(pool)
            .await
    }

    /// Every study of a project with its subject, ordered by UID then
    /// study number.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ProjectStudy>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}, s.subject_id, s.uid, s.gender, s.birthdate, s.isactive,
                    e.enroll_subgroup
             FROM studies st
             JOIN enrollment e ON e.enrollment_id = st.enrollment_id
             JOIN subjects s ON s.subject_id = e.subject_id
             WHERE e.project_id = $1
             ORDER BY s.uid, st.study_num"
        );
        sqlx::query_as::<_, ProjectStudy>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Studies of active subjects in every project of an instance.
    pub async fn list_for_instance(
        pool: &PgPool,
        instance_id: DbId,
    ) -> Result<Vec<InstanceStudy>, sqlx::Error> {
        sqlx::query_as::<_, InstanceStudy>(
            "SELECT e.enrollment_id, st.study_id, st.study_modality, st.study_ageatscan,
                    s.subject_id, s.uid, s.birthdate, p.project_name
             FROM projects p
             JOIN enrollment e ON e.project_id = p.project_id
             JOIN studies st ON st.enrollment_id = e.enrollment_id
             JOIN subjects s ON s.subject_id = e.subject_id
             WHERE p.instance_id = $1 AND s.isactive
             ORDER BY p.project_name, s.uid, st.study_num",
        )
        .bind(instance_id)
        .fetch_all(pool)
        .await
    }

    /// Distinct enrollments of the given studies.
    pub async fn enrollment_ids(pool: &PgPool, study_ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT enrollment_id FROM studies WHERE study_id = ANY($1) ORDER BY enrollment_id",
        )
        .bind(study_ids)
        .fetch_all(pool)
        .await
    }

    /// Re-point a study at another enrollment.
    pub async fn move_to_enrollment(
        pool: &PgPool,
        study_id: DbId,
        enrollment_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE studies SET enrollment_id = $2 WHERE study_id = $1")
            .bind(study_id)
            .bind(enrollment_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Write age-at-scan, visit type and site from the study grid.
    pub async fn update_visit(
        pool: &PgPool,
        study_id: DbId,
        update: &StudyVisitUpdate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE studies SET study_ageatscan = $2, study_type = $3, study_site = $4
             WHERE study_id = $1",
        )
        .bind(study_id)
        .bind(update.age_at_scan)
        .bind(&update.visit)
        .bind(&update.site)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct lower-cased study modalities in a project.
    pub async fn modalities(pool: &PgPool, project_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT LOWER(st.study_modality) AS modality
             FROM studies st
             JOIN enrollment e ON e.enrollment_id = st.enrollment_id
             WHERE e.project_id = $1 AND st.study_modality <> ''
             ORDER BY modality",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
