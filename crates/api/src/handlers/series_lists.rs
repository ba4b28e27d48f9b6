//! Complete MR series export and cross-server comparison.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use nidb_core::altuid::{export_altuids, AltUid};
use nidb_core::series_list::{
    format_series_list, missing_from_remote, parse_series_list, SeriesListEntry,
};
use nidb_core::types::DbId;
use nidb_db::models::project::Project;
use nidb_db::repositories::{AltUidRepo, SeriesRepo};
use serde::Serialize;

use super::projects::ActionContext;
use crate::error::AppResult;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
pub struct CompleteTableView {
    pub project: Project,
    /// The export as pasted into the comparison form.
    pub text: String,
    pub entries: Vec<SeriesListEntry>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonView {
    pub local_count: usize,
    pub remote_count: usize,
    /// Local series the remote list lacks.
    pub missing: Vec<SeriesListEntry>,
}

fn format_datetime(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .unwrap_or_default()
}

fn format_count(value: Option<i64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// One line per MR series of the project; subjects without studies get a
/// `No Studies` line.
pub async fn complete_table(ctx: &mut ActionContext<'_>) -> AppResult<CompleteTableView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();
    let rows = SeriesRepo::mr_series_list(pool, project.project_id).await?;

    let mut altuids: HashMap<DbId, String> = HashMap::new();
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        if !altuids.contains_key(&row.enrollment_id) {
            let ids: Vec<AltUid> =
                AltUidRepo::list_for_enrollment(pool, row.subject_id, row.enrollment_id)
                    .await?
                    .into_iter()
                    .map(AltUid::from)
                    .collect();
            altuids.insert(row.enrollment_id, export_altuids(&ids));
        }

        entries.push(SeriesListEntry {
            study_datetime: format_datetime(row.study_datetime),
            series_num: row.series_num.map(|n| n.to_string()).unwrap_or_default(),
            series_datetime: format_datetime(row.series_datetime),
            series_desc: row.series_desc.unwrap_or_default(),
            series_protocol: row.series_protocol.unwrap_or_default(),
            num_files: format_count(row.numfiles),
            num_beh_files: format_count(row.numfiles_beh),
            altuids: altuids.get(&row.enrollment_id).cloned().unwrap_or_default(),
            uid: row.uid,
        });
    }

    Ok(CompleteTableView {
        project,
        text: format_series_list(&entries),
        entries,
    })
}

/// Compare the pasted local export (`serieslist1`) against the remote one
/// (`serieslist2`).
pub fn compare(ctx: &mut ActionContext<'_>) -> ComparisonView {
    let local = parse_series_list(&ctx.params.serieslist1);
    let remote = parse_series_list(&ctx.params.serieslist2);
    let missing: Vec<SeriesListEntry> = missing_from_remote(&local, &remote)
        .into_iter()
        .cloned()
        .collect();

    tracing::debug!(
        local = local.len(),
        remote = remote.len(),
        missing = missing.len(),
        "Compared series lists"
    );
    if missing.is_empty() {
        ctx.notice("All local series are present in the remote list");
    }

    ComparisonView {
        local_count: local.len(),
        remote_count: remote.len(),
        missing,
    }
}
