//! Project details and study statistics.

use nidb_core::stats::{ProjectStats, StudyStatsInput};
use nidb_db::models::project::{ModalityCount, Project};
use nidb_db::repositories::{EnrollmentRepo, InstanceRepo, ProjectRepo, RdocRepo, StudyRepo};
use serde::Serialize;

use super::projects::ActionContext;
use crate::error::AppResult;

#[derive(Debug, Serialize)]
pub struct ProjectInfoView {
    pub project: Project,
    pub instance_name: Option<String>,
    pub modalities: Vec<ModalityCount>,
    pub subgroups: Vec<String>,
    pub rdoc_labels: Vec<String>,
    pub stats: ProjectStats,
}

pub async fn project_info(ctx: &mut ActionContext<'_>) -> AppResult<ProjectInfoView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();

    let instance_name = match project.instance_id {
        Some(id) => InstanceRepo::find_name(pool, id).await?,
        None => None,
    };
    let studies = StudyRepo::list_for_project(pool, project.project_id).await?;
    let inputs: Vec<StudyStatsInput> = studies
        .into_iter()
        .map(|s| StudyStatsInput {
            uid: s.uid,
            sex: s.gender,
            study_datetime: s.study.study_datetime,
            stored_age: s.study.study_ageatscan,
            birthdate: s.birthdate,
            site_id: s.study.study_nidbsite,
        })
        .collect();

    Ok(ProjectInfoView {
        instance_name,
        modalities: ProjectRepo::modality_counts(pool, project.project_id).await?,
        subgroups: EnrollmentRepo::subgroups(pool, project.project_id).await?,
        rdoc_labels: RdocRepo::labels_for_project(pool, project.project_id).await?,
        stats: ProjectStats::compute(&inputs),
        project,
    })
}
