//! Repository for the `enrollment` table.

use sqlx::PgPool;
use nidb_core::types::DbId;

use crate::models::subject::Enrollment;

const COLUMNS: &str = "enrollment_id, project_id, subject_id, enroll_subgroup, enroll_startdate";

pub struct EnrollmentRepo;

impl EnrollmentRepo {
    /// Enroll a subject in a project, returning the new row.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        subject_id: DbId,
    ) -> Result<Enrollment, sqlx::Error> {
        let query = format!(
            "INSERT INTO enrollment (project_id, subject_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(project_id)
            .bind(subject_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM enrollment WHERE enrollment_id = $1");
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The enrollment of a subject in a project, if any.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        subject_id: DbId,
    ) -> Result<Option<Enrollment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM enrollment WHERE project_id = $1 AND subject_id = $2"
        );
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(project_id)
            .bind(subject_id)
            .fetch_optional(pool)
            .await
    }

    /// Set the subgroup of a subject's enrollment in a project.
    pub async fn update_subgroup(
        pool: &PgPool,
        project_id: DbId,
        subject_id: DbId,
        subgroup: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE enrollment SET enroll_subgroup = $3 WHERE project_id = $1 AND subject_id = $2",
        )
        .bind(project_id)
        .bind(subject_id)
        .bind(subgroup)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct non-empty subgroups used in a project.
    pub async fn subgroups(pool: &PgPool, project_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT enroll_subgroup FROM enrollment
             WHERE project_id = $1 AND enroll_subgroup <> ''
             ORDER BY enroll_subgroup",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
