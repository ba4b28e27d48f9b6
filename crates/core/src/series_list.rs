//! Plain-text series lists for comparing a project across two servers.
//!
//! Each server exports one tab-separated line per series. Pasting the
//! remote export next to the local one shows which local series the remote
//! server does not have.

use serde::Serialize;

/// First column of a subject that has no studies.
pub const NO_STUDIES: &str = "No Studies";

/// Columns per line.
pub const SERIES_LIST_COLUMNS: usize = 9;

/// One line of a series list. Values are kept as exported text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeriesListEntry {
    pub study_datetime: String,
    pub series_num: String,
    pub series_datetime: String,
    pub series_desc: String,
    pub series_protocol: String,
    pub num_files: String,
    pub num_beh_files: String,
    pub uid: String,
    pub altuids: String,
}

impl SeriesListEntry {
    /// Tab-separated export line (no trailing newline).
    ///
    /// An empty study datetime is written as [`NO_STUDIES`].
    pub fn to_line(&self) -> String {
        let study = if self.study_datetime.is_empty() {
            NO_STUDIES
        } else {
            self.study_datetime.as_str()
        };
        [
            study,
            self.series_num.as_str(),
            self.series_datetime.as_str(),
            self.series_desc.as_str(),
            self.series_protocol.as_str(),
            self.num_files.as_str(),
            self.num_beh_files.as_str(),
            self.uid.as_str(),
            self.altuids.as_str(),
        ]
        .join("\t")
    }

    /// Parse one export line. Missing trailing columns are empty.
    pub fn from_line(line: &str) -> Self {
        let mut cols = line.trim_end_matches('\r').split('\t').map(str::to_string);
        let mut next = || cols.next().unwrap_or_default();
        Self {
            study_datetime: next(),
            series_num: next(),
            series_datetime: next(),
            series_desc: next(),
            series_protocol: next(),
            num_files: next(),
            num_beh_files: next(),
            uid: next(),
            altuids: next(),
        }
    }

    /// The series columns used for comparison. UID and alternate IDs are
    /// left out since they differ between servers.
    pub fn series_key(&self) -> String {
        [
            self.study_datetime.as_str(),
            self.series_num.as_str(),
            self.series_datetime.as_str(),
            self.series_desc.as_str(),
            self.series_protocol.as_str(),
            self.num_files.as_str(),
            self.num_beh_files.as_str(),
        ]
        .join(",")
        .trim()
        .to_string()
    }
}

/// Render a whole list, one entry per line.
pub fn format_series_list(entries: &[SeriesListEntry]) -> String {
    entries
        .iter()
        .map(|e| e.to_line() + "\n")
        .collect()
}

/// Parse pasted list text, skipping blank lines and subjects without studies.
pub fn parse_series_list(text: &str) -> Vec<SeriesListEntry> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(SeriesListEntry::from_line)
        .filter(|e| e.study_datetime != NO_STUDIES)
        .collect()
}

/// Local entries whose series columns appear nowhere in `remote`.
pub fn missing_from_remote<'a>(
    local: &'a [SeriesListEntry],
    remote: &[SeriesListEntry],
) -> Vec<&'a SeriesListEntry> {
    let remote_keys: std::collections::HashSet<String> =
        remote.iter().map(SeriesListEntry::series_key).collect();
    local
        .iter()
        .filter(|e| !remote_keys.contains(&e.series_key()))
        .collect()
}
