//! Series-name summaries and alternate series names.

use std::collections::{BTreeSet, HashSet};

use nidb_core::altuid::{primary_altuid, AltUid};
use nidb_core::error::CoreError;
use nidb_core::series_summary::{
    self, alternate_name_changes, unique_series as summarize_unique, AltSeriesSummary,
    InstanceSubject, InstanceSummary, SeriesNameRecord, SubjectMeasure, SubjectSeriesName,
    UniqueSeriesEntry,
};
use nidb_core::types::{parse_db_id, DbId};
use nidb_db::models::project::Project;
use nidb_db::repositories::{AltUidRepo, InstanceRepo, MeasureRepo, SeriesRepo, StudyRepo};
use serde::Serialize;

use super::projects::{series_modality, ActionContext};
use crate::error::AppResult;

#[derive(Debug, Serialize)]
pub struct UniqueSeriesView {
    pub project: Project,
    pub series: Vec<UniqueSeriesEntry>,
}

#[derive(Debug, Serialize)]
pub struct AltSeriesSummaryView {
    pub project: Project,
    #[serde(flatten)]
    pub summary: AltSeriesSummary,
}

#[derive(Debug, Serialize)]
pub struct InstanceSummaryView {
    pub instance_id: DbId,
    pub instance_name: Option<String>,
    #[serde(flatten)]
    pub summary: InstanceSummary,
}

/// Distinct series names of the project per modality, hidden series included.
pub async fn unique_series(ctx: &mut ActionContext<'_>) -> AppResult<UniqueSeriesView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();

    let mut records = Vec::new();
    for raw in StudyRepo::modalities(pool, project.project_id).await? {
        let Some(modality) = series_modality(pool, &raw).await? else {
            continue;
        };
        let names =
            SeriesRepo::names_for_project(pool, &modality, project.project_id, true).await?;
        records.extend(names.into_iter().map(|n| SeriesNameRecord {
            modality: modality.as_str().to_string(),
            description: n.series_desc,
            protocol: n.series_protocol,
            altdesc: n.series_altdesc,
        }));
    }

    Ok(UniqueSeriesView {
        project,
        series: summarize_unique(&records),
    })
}

/// Per-subject counts of alternate series names. Hidden series are left out.
pub async fn alt_series_summary(ctx: &mut ActionContext<'_>) -> AppResult<AltSeriesSummaryView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();

    let mut names = Vec::new();
    for raw in StudyRepo::modalities(pool, project.project_id).await? {
        let Some(modality) = series_modality(pool, &raw).await? else {
            continue;
        };
        let rows =
            SeriesRepo::names_for_project(pool, &modality, project.project_id, false).await?;
        names.extend(rows.into_iter().map(|n| SubjectSeriesName {
            uid: n.uid,
            modality: modality.as_str().to_string(),
            altdesc: n.series_altdesc,
        }));
    }

    Ok(AltSeriesSummaryView {
        project,
        summary: series_summary::alt_series_summary(&names),
    })
}

/// Alternate-name counts across the whole instance with subject details and
/// measures.
///
/// The instance comes from `id`, falling back to `instance_id` or the
/// instance header.
pub async fn instance_summary(ctx: &mut ActionContext<'_>) -> AppResult<InstanceSummaryView> {
    let instance_id = match parse_db_id(ctx.params.id.trim()) {
        Some(id) => id,
        None => ctx.instance_id()?.ok_or_else(|| {
            CoreError::InvalidInput(format!("Invalid instance ID [{}]", ctx.params.id.trim()))
        })?,
    };
    let pool = ctx.pool();
    let instance_name = InstanceRepo::find_name(pool, instance_id).await?;
    let studies = StudyRepo::list_for_instance(pool, instance_id).await?;

    let mut seen_uids = HashSet::new();
    let mut subjects = Vec::new();
    for study in &studies {
        if !seen_uids.insert(study.uid.clone()) {
            continue;
        }
        let altuids: Vec<AltUid> = AltUidRepo::list_for_subject(pool, study.subject_id)
            .await?
            .into_iter()
            .map(AltUid::from)
            .collect();
        subjects.push(InstanceSubject {
            uid: study.uid.clone(),
            subject_id: study.subject_id,
            age_at_scan: study.study_ageatscan,
            birthdate: study.birthdate,
            primary_altuid: primary_altuid(&altuids),
            project_name: study.project_name.clone(),
        });
    }

    let modalities: BTreeSet<String> = studies
        .iter()
        .map(|s| s.study_modality.to_lowercase())
        .filter(|m| !m.is_empty())
        .collect();
    let mut names = Vec::new();
    for raw in &modalities {
        let Some(modality) = series_modality(pool, raw).await? else {
            continue;
        };
        let rows = SeriesRepo::names_for_instance(pool, &modality, instance_id).await?;
        names.extend(rows.into_iter().map(|n| SubjectSeriesName {
            uid: n.uid,
            modality: modality.as_str().to_string(),
            altdesc: n.series_altdesc,
        }));
    }

    let enrollment_ids: Vec<DbId> = studies
        .iter()
        .map(|s| s.enrollment_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let measures: Vec<SubjectMeasure> = MeasureRepo::list_for_enrollments(pool, &enrollment_ids)
        .await?
        .into_iter()
        .map(SubjectMeasure::from)
        .collect();

    Ok(InstanceSummaryView {
        instance_id,
        instance_name,
        summary: series_summary::instance_summary(&subjects, &names, &measures),
    })
}

/// Set alternate names on the project's series from the rename form.
pub async fn change_alternate_names(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let project_id = ctx.project_id()?;
    let pool = ctx.pool();
    let params = ctx.params;
    let changes = alternate_name_changes(&params.modalities, &params.old_names, &params.new_names);

    let mut total = 0u64;
    for change in changes {
        let Some(modality) = series_modality(pool, &change.modality).await? else {
            tracing::warn!(modality = %change.modality, "Skipping rename for unknown modality");
            ctx.notice(format!("Invalid modality [{}]", change.modality));
            continue;
        };
        let updated = SeriesRepo::update_altdesc(
            pool,
            &modality,
            project_id,
            &change.old_name,
            &change.new_name,
        )
        .await?;
        total += updated;
        ctx.notice(format!(
            "Added alternate series description for {} series. {} -> {}",
            updated, change.old_name, change.new_name
        ));
    }

    tracing::info!(project_id, updated = total, username = %ctx.user.username, "Changed alternate series names");
    ctx.notice(format!("Updated [{total}] rows"));
    Ok(())
}
