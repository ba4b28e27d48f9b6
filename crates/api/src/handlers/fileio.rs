//! Obliterate and re-archive actions.
//!
//! None of these touch the archive. They queue `fileio_requests` rows for
//! the archive worker, one per subject or study.

use nidb_core::fileio::{self, FileIoDataType, FileIoRequest};
use nidb_core::types::DbId;
use nidb_db::repositories::{FileIoRepo, SubjectRepo};

use super::projects::ActionContext;
use crate::error::AppResult;

/// Subjects owning the selected studies, as `(ids, uids)`.
async fn selected_subjects(ctx: &mut ActionContext<'_>) -> AppResult<Option<(Vec<DbId>, Vec<String>)>> {
    let study_ids = ctx.study_ids();
    if study_ids.is_empty() {
        ctx.notice("No studies selected");
        return Ok(None);
    }
    let subjects = SubjectRepo::list_for_studies(ctx.pool(), &study_ids).await?;
    Ok(Some(subjects.into_iter().map(|s| (s.subject_id, s.uid)).unzip()))
}

fn selected_studies(ctx: &mut ActionContext<'_>) -> Option<Vec<DbId>> {
    let study_ids = ctx.study_ids();
    if study_ids.is_empty() {
        ctx.notice("No studies selected");
        None
    } else {
        Some(study_ids)
    }
}

async fn enqueue(ctx: &ActionContext<'_>, requests: &[FileIoRequest]) -> AppResult<()> {
    let ids = FileIoRepo::enqueue(ctx.pool(), requests, &ctx.user.username).await?;
    if let Some(first) = requests.first() {
        tracing::info!(
            operation = %first.operation,
            data_type = %first.data_type,
            count = ids.len(),
            username = %ctx.user.username,
            "Queued file-IO requests"
        );
    }
    Ok(())
}

fn join_ids(ids: &[DbId]) -> String {
    ids.iter().map(DbId::to_string).collect::<Vec<_>>().join(", ")
}

pub async fn obliterate_subjects(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let Some((ids, uids)) = selected_subjects(ctx).await? else {
        return Ok(());
    };
    enqueue(ctx, &fileio::obliterate(FileIoDataType::Subject, &ids)).await?;
    ctx.notice(format!("Subjects [{}] queued for obliteration", uids.join(", ")));
    Ok(())
}

pub async fn obliterate_studies(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let Some(ids) = selected_studies(ctx) else {
        return Ok(());
    };
    enqueue(ctx, &fileio::obliterate(FileIoDataType::Study, &ids)).await?;
    ctx.notice(format!("Studies [{}] queued for obliteration", join_ids(&ids)));
    Ok(())
}

pub async fn rearchive_subjects(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let Some((ids, uids)) = selected_subjects(ctx).await? else {
        return Ok(());
    };
    let match_id_only = ctx.params.match_id_only();
    enqueue(ctx, &fileio::rearchive(FileIoDataType::Subject, &ids, match_id_only)).await?;
    ctx.notice(format!("Subjects [{}] queued for re-archiving", uids.join(", ")));
    Ok(())
}

pub async fn rearchive_studies(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let Some(ids) = selected_studies(ctx) else {
        return Ok(());
    };
    let match_id_only = ctx.params.match_id_only();
    enqueue(ctx, &fileio::rearchive(FileIoDataType::Study, &ids, match_id_only)).await?;
    ctx.notice(format!("Studies [{}] queued for re-archiving", join_ids(&ids)));
    Ok(())
}
