//! Repository for the `rdoc_uploads` table.

use sqlx::PgPool;
use nidb_core::types::DbId;

use crate::models::rdoc::RdocUpload;

pub struct RdocRepo;

impl RdocRepo {
    pub async fn create(
        pool: &PgPool,
        project_id: Option<DbId>,
        label: &str,
    ) -> Result<RdocUpload, sqlx::Error> {
        sqlx::query_as::<_, RdocUpload>(
            "INSERT INTO rdoc_uploads (project_id, label) VALUES ($1, $2)
             RETURNING rdoc_upload_id, project_id, label",
        )
        .bind(project_id)
        .bind(label)
        .fetch_one(pool)
        .await
    }

    /// Uploads carrying the given label, oldest first.
    pub async fn list_by_label(pool: &PgPool, label: &str) -> Result<Vec<RdocUpload>, sqlx::Error> {
        sqlx::query_as::<_, RdocUpload>(
            "SELECT rdoc_upload_id, project_id, label FROM rdoc_uploads
             WHERE label = $1 ORDER BY rdoc_upload_id",
        )
        .bind(label)
        .fetch_all(pool)
        .await
    }

    /// Distinct labels of a project's uploads.
    pub async fn labels_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT label FROM rdoc_uploads WHERE project_id = $1 ORDER BY label",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
