//! Repository for the `projects` table.

use sqlx::PgPool;
use nidb_core::types::DbId;

use crate::models::project::{
    CreateProject, ModalityCount, Project, ProjectListRow, ProjectPermissions,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "project_id, instance_id, project_name, project_uid, project_costcenter, \
    project_admin, project_pi, project_sharing, project_startdate, project_enddate, project_status";

/// Provides queries over projects and per-user project permissions.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new active project, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (instance_id, project_name, project_costcenter, project_admin, project_pi)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.instance_id)
            .bind(&input.project_name)
            .bind(&input.project_costcenter)
            .bind(input.project_admin)
            .bind(input.project_pi)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE project_id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active projects of an instance ordered by name, with admin and PI
    /// names, the RDoC submission label and the permissions `username`
    /// holds on each. Missing permission rows read as no access.
    pub async fn list_for_instance(
        pool: &PgPool,
        instance_id: DbId,
        username: &str,
    ) -> Result<Vec<ProjectListRow>, sqlx::Error> {
        sqlx::query_as::<_, ProjectListRow>(
            "SELECT p.project_id, p.project_name, p.project_costcenter,
                    adm.user_fullname AS admin_fullname, pi.user_fullname AS pi_fullname,
                    p.project_startdate, p.project_enddate,
                    COALESCE(up.view_data, FALSE) AS view_data,
                    COALESCE(up.view_phi, FALSE) AS view_phi,
                    COALESCE(up.write_data, FALSE) AS write_data,
                    COALESCE(up.write_phi, FALSE) AS write_phi,
                    (SELECT MIN(r.label) FROM rdoc_uploads r
                     WHERE r.project_id = p.project_id) AS rdoc_label
             FROM projects p
             LEFT JOIN users adm ON adm.user_id = p.project_admin
             LEFT JOIN users pi ON pi.user_id = p.project_pi
             LEFT JOIN users u ON u.username = $2
             LEFT JOIN user_project up ON up.project_id = p.project_id AND up.user_id = u.user_id
             WHERE p.instance_id = $1 AND p.project_status = 'active'
             ORDER BY p.project_name",
        )
        .bind(instance_id)
        .bind(username)
        .fetch_all(pool)
        .await
    }

    /// Study counts per (lower-cased) modality for a project.
    pub async fn modality_counts(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ModalityCount>, sqlx::Error> {
        sqlx::query_as::<_, ModalityCount>(
            "SELECT LOWER(s.study_modality) AS modality, COUNT(*) AS num_studies
             FROM studies s
             JOIN enrollment e ON e.enrollment_id = s.enrollment_id
             WHERE e.project_id = $1 AND s.study_modality <> ''
             GROUP BY LOWER(s.study_modality)
             ORDER BY modality",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Grant (or overwrite) a user's permissions on a project.
    pub async fn set_permissions(
        pool: &PgPool,
        user_id: DbId,
        project_id: DbId,
        perms: &ProjectPermissions,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_project (user_id, project_id, view_data, view_phi, write_data, write_phi)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_user_project DO UPDATE SET
                view_data = EXCLUDED.view_data,
                view_phi = EXCLUDED.view_phi,
                write_data = EXCLUDED.write_data,
                write_phi = EXCLUDED.write_phi",
        )
        .bind(user_id)
        .bind(project_id)
        .bind(perms.view_data)
        .bind(perms.view_phi)
        .bind(perms.write_data)
        .bind(perms.write_phi)
        .execute(pool)
        .await?;
        Ok(())
    }
}
