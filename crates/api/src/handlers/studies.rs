//! Studies table, archive audit, and the study-level bulk actions.

use std::collections::HashMap;

use nidb_core::altuid::{format_altuids, is_blank_list, parse_altuid_list, AltUid};
use nidb_core::audit::{audit_study, AuditSeries, StudyAudit};
use nidb_core::error::CoreError;
use nidb_core::grid::parse_study_grid;
use nidb_core::modality::Modality;
use nidb_core::stats::age_at_study;
use nidb_core::types::DbId;
use nidb_db::models::project::Project;
use nidb_db::models::study::ProjectStudy;
use nidb_db::repositories::{
    AltUidRepo, EnrollmentRepo, ProjectRepo, SeriesRepo, StudyRepo, SubjectRepo, TagRepo,
};
use nidb_db::repositories::tag_repo::DIAGNOSIS_TAG;
use serde::Serialize;

use super::projects::{parse_project_id, series_modality, ActionContext};
use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StudyTableRow {
    #[serde(flatten)]
    pub study: ProjectStudy,
    /// Alternate IDs of the study's enrollment, primary first.
    pub altuids: String,
    pub age_at_scan: Option<f64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StudiesTableView {
    pub project: Project,
    pub studies: Vec<StudyTableRow>,
}

#[derive(Debug, Serialize)]
pub struct StudyAuditView {
    pub archive_dir: String,
    pub num_ok: usize,
    pub audits: Vec<StudyAudit>,
}

/// Every study of the project with subject details, alternate IDs and tags.
pub async fn studies_table(ctx: &mut ActionContext<'_>) -> AppResult<StudiesTableView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();
    let studies = StudyRepo::list_for_project(pool, project.project_id).await?;

    let mut altuids: HashMap<DbId, String> = HashMap::new();
    let mut tags: HashMap<DbId, Vec<String>> = HashMap::new();
    let mut rows = Vec::with_capacity(studies.len());

    for study in studies {
        let enrollment_id = study.study.enrollment_id;
        if !altuids.contains_key(&enrollment_id) {
            let ids: Vec<AltUid> = AltUidRepo::list_for_enrollment(pool, study.subject_id, enrollment_id)
                .await?
                .into_iter()
                .map(AltUid::from)
                .collect();
            altuids.insert(enrollment_id, format_altuids(&ids));
            tags.insert(
                enrollment_id,
                TagRepo::list_for_enrollment(pool, DIAGNOSIS_TAG, enrollment_id).await?,
            );
        }

        let age_at_scan = age_at_study(
            study.study.study_ageatscan,
            study.birthdate,
            study.study.study_datetime,
        );
        rows.push(StudyTableRow {
            altuids: altuids.get(&enrollment_id).cloned().unwrap_or_default(),
            tags: tags.get(&enrollment_id).cloned().unwrap_or_default(),
            age_at_scan,
            study,
        });
    }

    Ok(StudiesTableView {
        project,
        studies: rows,
    })
}

/// Compare every study's series against the files in the archive.
pub async fn audit_studies(ctx: &mut ActionContext<'_>) -> AppResult<StudyAuditView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();
    let archive_dir = ctx.state.config.archive_dir.clone();
    let studies = StudyRepo::list_for_project(pool, project.project_id).await?;

    let mut modalities: HashMap<String, Option<Modality>> = HashMap::new();
    let mut audits = Vec::with_capacity(studies.len());

    for study in &studies {
        let raw = study.study.study_modality.to_lowercase();
        if !modalities.contains_key(&raw) {
            let modality = series_modality(pool, &raw).await?;
            modalities.insert(raw.clone(), modality);
        }
        let Some(Some(modality)) = modalities.get(&raw) else {
            ctx.notice(format!(
                "Study [{}{}] has no series table for modality [{}]",
                study.uid, study.study.study_num, study.study.study_modality
            ));
            continue;
        };

        let series: Vec<AuditSeries> = SeriesRepo::list_for_study(pool, modality, study.study.study_id)
            .await?
            .into_iter()
            .map(|s| AuditSeries {
                series_num: s.series_num,
                data_type: s.data_type,
                num_files: s.numfiles,
            })
            .collect();

        audits.push(audit_study(
            &archive_dir,
            study.study.study_id,
            &study.uid,
            study.study.study_num,
            modality.as_str(),
            &series,
        ));
    }

    let num_ok = audits.iter().filter(|a| a.is_ok()).count();
    tracing::info!(project_id = project.project_id, studies = audits.len(), num_ok, "Audited project studies");

    Ok(StudyAuditView {
        archive_dir: archive_dir.display().to_string(),
        num_ok,
        audits,
    })
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Move the selected studies into `newprojectid`, enrolling subjects there
/// as needed.
pub async fn change_project(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let pool = ctx.pool();
    let target_id = parse_project_id(&ctx.params.newprojectid)?;
    if ProjectRepo::find_by_id(pool, target_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: target_id,
        }));
    }

    for study_id in ctx.study_ids() {
        let Some(study) = StudyRepo::find_by_id(pool, study_id).await? else {
            ctx.notice("This study is not part of an enrollment...");
            continue;
        };
        let Some(current) = EnrollmentRepo::find_by_id(pool, study.enrollment_id).await? else {
            ctx.notice("This study is not part of an enrollment...");
            continue;
        };
        let subject_id = current.subject_id;

        let enrollment = match EnrollmentRepo::find(pool, target_id, subject_id).await? {
            Some(existing) => {
                ctx.notice(format!(
                    "[{subject_id}] is already enrolled in [{target_id}] with enrollment [{}]",
                    existing.enrollment_id
                ));
                existing
            }
            None => {
                let created = EnrollmentRepo::create(pool, target_id, subject_id).await?;
                ctx.notice(format!(
                    "Creating enrollment [{}] for subject [{subject_id}] in project [{target_id}]",
                    created.enrollment_id
                ));
                created
            }
        };

        if study.enrollment_id == enrollment.enrollment_id {
            ctx.notice(format!(
                "Study [{study_id}] is already part of enrollment [{}]",
                enrollment.enrollment_id
            ));
            continue;
        }

        StudyRepo::move_to_enrollment(pool, study_id, enrollment.enrollment_id).await?;
        tracing::info!(
            study_id,
            from = study.enrollment_id,
            to = enrollment.enrollment_id,
            username = %ctx.user.username,
            "Moved study to new enrollment"
        );
        ctx.notice(format!(
            "Moved study from enrollment {} to {}",
            study.enrollment_id, enrollment.enrollment_id
        ));
    }
    Ok(())
}

/// Split the tag box on commas, dropping blanks.
fn split_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tag the enrollments of the selected studies with diagnosis tags.
pub async fn apply_tags(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let study_ids = ctx.study_ids();
    if study_ids.is_empty() {
        ctx.notice("No studies selected");
        return Ok(());
    }

    let pool = ctx.pool();
    let tags = split_tags(&ctx.params.tags);
    let enrollment_ids = StudyRepo::enrollment_ids(pool, &study_ids).await?;
    let inserted = TagRepo::apply(pool, DIAGNOSIS_TAG, &enrollment_ids, &tags).await?;

    for enrollment_id in &enrollment_ids {
        for tag in &tags {
            ctx.notice(format!("Applied tag [{tag}] to enrollmentid [{enrollment_id}]"));
        }
    }
    tracing::info!(
        enrollments = enrollment_ids.len(),
        tags = tags.len(),
        inserted,
        username = %ctx.user.username,
        "Applied diagnosis tags"
    );
    Ok(())
}

/// Apply the pasted study grid.
pub async fn update_study_table(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let pool = ctx.pool();
    let parsed = parse_study_grid(&ctx.params.studytable);
    ctx.notices.extend(parsed.notices);

    let mut updated = 0u64;
    for row in parsed.rows {
        if let Some(visit) = &row.visit_update {
            if StudyRepo::update_visit(pool, row.study_id, visit).await? {
                updated += 1;
            }
        }
        if let Some(sex) = &row.sex {
            if SubjectRepo::update_sex(pool, row.subject_id, sex).await? {
                updated += 1;
            }
        }

        if is_blank_list(&row.altuids) {
            continue;
        }
        let Some(study) = StudyRepo::find_by_id(pool, row.study_id).await? else {
            tracing::debug!(study_id = row.study_id, "Study grid row names an unknown study");
            ctx.notice(format!("StudyID [{}] not found", row.study_id));
            continue;
        };
        AltUidRepo::replace(
            pool,
            row.subject_id,
            study.enrollment_id,
            &parse_altuid_list(&row.altuids),
        )
        .await?;
    }

    tracing::info!(updated, username = %ctx.user.username, "Applied study table");
    ctx.notice(format!("Updated [{updated}] rows"));
    Ok(())
}
