//! Project list and RDoC upload list.

use nidb_core::types::DbId;
use nidb_db::models::project::ProjectListRow;
use nidb_db::models::rdoc::RdocUpload;
use nidb_db::repositories::{InstanceRepo, ProjectRepo, RdocRepo, SeriesRepo};
use serde::Serialize;
use sqlx::PgPool;

use super::projects::{series_modality, ActionContext};
use crate::error::AppResult;

/// Studies and archived bytes of one modality in a project.
#[derive(Debug, Serialize)]
pub struct ModalitySummary {
    pub modality: String,
    pub num_studies: i64,
    pub total_size: i64,
}

#[derive(Debug, Serialize)]
pub struct ProjectListEntry {
    #[serde(flatten)]
    pub project: ProjectListRow,
    /// `None` when the caller may not view the project's data.
    pub modalities: Option<Vec<ModalitySummary>>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListView {
    pub instance_id: Option<DbId>,
    pub instance_name: Option<String>,
    pub projects: Vec<ProjectListEntry>,
}

#[derive(Debug, Serialize)]
pub struct RdocListView {
    pub label: String,
    pub uploads: Vec<RdocUpload>,
}

/// Active projects of the caller's instance.
pub async fn project_list(ctx: &mut ActionContext<'_>) -> AppResult<ProjectListView> {
    let Some(instance_id) = ctx.instance_id()? else {
        ctx.notice("No instance selected");
        return Ok(ProjectListView {
            instance_id: None,
            instance_name: None,
            projects: Vec::new(),
        });
    };

    let pool = ctx.pool();
    let instance_name = InstanceRepo::find_name(pool, instance_id).await?;
    let rows = ProjectRepo::list_for_instance(pool, instance_id, &ctx.user.username).await?;

    let mut projects = Vec::with_capacity(rows.len());
    for project in rows {
        let modalities = if project.view_data {
            Some(modality_summaries(pool, project.project_id).await?)
        } else {
            None
        };
        projects.push(ProjectListEntry {
            project,
            modalities,
        });
    }

    Ok(ProjectListView {
        instance_id: Some(instance_id),
        instance_name,
        projects,
    })
}

async fn modality_summaries(pool: &PgPool, project_id: DbId) -> AppResult<Vec<ModalitySummary>> {
    let counts = ProjectRepo::modality_counts(pool, project_id).await?;
    let mut summaries = Vec::with_capacity(counts.len());
    for count in counts {
        let total_size = match series_modality(pool, &count.modality).await? {
            Some(modality) => SeriesRepo::total_size(pool, &modality, project_id).await?,
            None => 0,
        };
        summaries.push(ModalitySummary {
            modality: count.modality,
            num_studies: count.num_studies,
            total_size,
        });
    }
    Ok(summaries)
}

/// RDoC uploads carrying the requested label.
pub async fn rdoc_list(ctx: &mut ActionContext<'_>) -> AppResult<RdocListView> {
    let label = ctx.params.rdoc_label.trim().to_string();
    let uploads = RdocRepo::list_by_label(ctx.pool(), &label).await?;
    Ok(RdocListView { label, uploads })
}
