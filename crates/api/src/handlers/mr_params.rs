//! MR scan-parameter ranges: editor, loading from a study, and QA.

use nidb_core::error::CoreError;
use nidb_core::mr_qa::{
    evaluate, mismatched_fields, plan_edits, QaOutcome, ScanParamEdit, ScanParamRange,
    SeriesAcquisition,
};
use nidb_core::study_ref::StudyRef;
use nidb_core::types::DbId;
use nidb_db::models::project::Project;
use nidb_db::models::scan_param::ScanParamRow;
use nidb_db::repositories::{QaRepo, ScanParamRepo, SeriesRepo, StudyRepo};
use serde::Serialize;

use super::projects::ActionContext;
use crate::error::AppResult;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct EditorView {
    pub project: Project,
    pub ranges: Vec<ScanParamRow>,
}

/// A range row the series came closest to, with the fields it failed.
#[derive(Debug, Serialize)]
pub struct NearestRange {
    pub mrscanparam_id: DbId,
    pub mismatched: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SeriesQa {
    #[serde(flatten)]
    pub acquisition: SeriesAcquisition,
    pub outcome: QaOutcome,
    pub matched_id: Option<DbId>,
    pub nearest: Vec<NearestRange>,
}

#[derive(Debug, Serialize)]
pub struct StudyQa {
    pub study_id: DbId,
    pub uid: String,
    pub study_num: i32,
    pub series: Vec<SeriesQa>,
}

#[derive(Debug, Serialize)]
pub struct QaView {
    pub project: Project,
    pub ranges: Vec<ScanParamRow>,
    pub studies: Vec<StudyQa>,
}

/// The project's range table.
pub async fn editor(ctx: &mut ActionContext<'_>) -> AppResult<EditorView> {
    let project = ctx.project().await?;
    let ranges = ScanParamRepo::list_for_project(ctx.pool(), project.project_id).await?;
    Ok(EditorView { project, ranges })
}

/// Check every series of every MR study against the range table.
pub async fn view_qa(ctx: &mut ActionContext<'_>) -> AppResult<QaView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();
    let rows = ScanParamRepo::list_for_project(pool, project.project_id).await?;
    let ranges: Vec<ScanParamRange> = rows.iter().map(ScanParamRow::to_range).collect();

    let mr_studies: Vec<_> = StudyRepo::list_for_project(pool, project.project_id)
        .await?
        .into_iter()
        .filter(|s| s.study.study_modality.eq_ignore_ascii_case("mr"))
        .collect();
    if mr_studies.is_empty() {
        ctx.notice("Found no valid MR studies for this project");
    }

    let mut studies = Vec::with_capacity(mr_studies.len());
    for study in mr_studies {
        let series = SeriesRepo::mr_for_study(pool, study.study.study_id).await?;
        if series.is_empty() {
            ctx.notice(format!(
                "Found no MR series for this study [{}{}]",
                study.uid, study.study.study_num
            ));
        }

        let series = series
            .iter()
            .map(|s| {
                let acquisition = s.acquisition();
                let outcome = evaluate(&acquisition, &ranges);
                let matched_id = match &outcome {
                    QaOutcome::Matched { row } => Some(rows[*row].mrscanparam_id),
                    _ => None,
                };
                let nearest = match &outcome {
                    QaOutcome::Unmatched { nearest, .. } => nearest
                        .iter()
                        .map(|&i| NearestRange {
                            mrscanparam_id: rows[i].mrscanparam_id,
                            mismatched: mismatched_fields(&acquisition, &ranges[i]),
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                SeriesQa {
                    acquisition,
                    outcome,
                    matched_id,
                    nearest,
                }
            })
            .collect();

        studies.push(StudyQa {
            study_id: study.study.study_id,
            uid: study.uid,
            study_num: study.study.study_num,
            series,
        });
    }

    Ok(QaView {
        project,
        ranges: rows,
        studies,
    })
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Apply the editor's rows: insert new, update changed, delete cleared.
pub async fn update_mr_params(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let project_id = ctx.project_id()?;
    let pool = ctx.pool();
    let edits = plan_edits(&ctx.params.scan_param_rows());

    let (mut inserted, mut updated, mut deleted) = (0u32, 0u32, 0u32);
    for edit in edits {
        match edit {
            ScanParamEdit::Insert { range } => {
                ScanParamRepo::insert(pool, project_id, &range).await?;
                inserted += 1;
            }
            ScanParamEdit::Update { id, range } => {
                if ScanParamRepo::update(pool, project_id, id, &range).await? {
                    updated += 1;
                } else {
                    ctx.notice(format!("Scan parameter row [{id}] not found"));
                }
            }
            ScanParamEdit::Delete { id } => {
                if ScanParamRepo::delete(pool, project_id, id).await? {
                    deleted += 1;
                }
            }
        }
    }

    tracing::info!(project_id, inserted, updated, deleted, username = %ctx.user.username, "Saved MR scan parameters");
    ctx.notice(format!(
        "Added [{inserted}], updated [{updated}], deleted [{deleted}] scan parameter rows"
    ));
    Ok(())
}

/// Add exact ranges taken from an existing study (`existingstudy`, e.g.
/// `S1234ABC5`), optionally a single series of it (`existingseries`).
pub async fn load_mr_params(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let project_id = ctx.project_id()?;
    let pool = ctx.pool();
    let params = ctx.params;

    let study_ref = match StudyRef::parse(&params.existingstudy) {
        Ok(r) => r,
        Err(err @ CoreError::InvalidInput(_)) => {
            tracing::warn!(value = %params.existingstudy, "Rejected study reference");
            ctx.notice(err.to_string());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let study = StudyRepo::find_by_uid(pool, &study_ref.uid, study_ref.study_num)
        .await?
        .filter(|s| s.study_modality.eq_ignore_ascii_case("mr"));
    let Some(study) = study else {
        ctx.notice(format!(
            "Invalid study ID [{study_ref}]. Incorrect UID, study number, or study does not contain MR series"
        ));
        return Ok(());
    };

    let mut series = SeriesRepo::mr_for_study(pool, study.study_id).await?;
    let wanted = params.existingseries.trim();
    if !wanted.is_empty() {
        let Ok(series_num) = wanted.parse::<i32>() else {
            ctx.notice(format!("Invalid series number [{wanted}]"));
            return Ok(());
        };
        series.retain(|s| s.series_num == series_num);
    }
    if series.is_empty() {
        ctx.notice(format!("No MR series found for [{study_ref}]"));
        return Ok(());
    }

    for s in &series {
        let range = ScanParamRange::exact_from(&s.acquisition());
        ScanParamRepo::insert(pool, project_id, &range).await?;
        ctx.notice(format!("Adding row [{}]", range.protocol));
    }
    tracing::info!(project_id, study = %study_ref, count = series.len(), "Loaded MR scan parameters from study");
    Ok(())
}

/// Drop the MR QA results of every series in the project.
pub async fn reset_qa(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let project_id = ctx.project_id()?;
    let removed = QaRepo::reset_for_project(ctx.pool(), project_id).await?;
    tracing::info!(project_id, removed, username = %ctx.user.username, "Reset MR QA");
    ctx.notice(format!("Reset QA for [{removed}] series"));
    Ok(())
}
