//! Archive audit: compare what the database says a study holds against
//! what is on disk.
//!
//! Series data lives at `{archive}/{uid}/{study_num}/{series_num}/{data_type}`
//! where the data type defaults to the study modality.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::DbId;

/// One series as recorded in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSeries {
    pub series_num: i32,
    pub data_type: Option<String>,
    pub num_files: i64,
}

/// Something wrong with a series directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditProblem {
    Missing { path: String },
    Empty { path: String },
    CountMismatch { path: String, expected: i64, found: i64 },
}

impl fmt::Display for AuditProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { path } => write!(f, "Directory [{path}] does not exist"),
            Self::Empty { path } => write!(f, "Directory [{path}] is empty"),
            Self::CountMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "Number of files in DB [{expected}] different than on filesystem [{found}] for [{path}]"
            ),
        }
    }
}

/// Audit result for one study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyAudit {
    pub study_id: DbId,
    pub uid: String,
    pub study_num: i32,
    pub num_series: usize,
    pub problems: Vec<AuditProblem>,
}

impl StudyAudit {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Directory holding one series' files.
pub fn series_archive_path(
    archive_dir: &Path,
    uid: &str,
    study_num: i32,
    series_num: i32,
    data_type: &str,
) -> PathBuf {
    archive_dir
        .join(uid)
        .join(study_num.to_string())
        .join(series_num.to_string())
        .join(data_type)
}

/// Check one series directory.
pub fn audit_series(
    archive_dir: &Path,
    uid: &str,
    study_num: i32,
    modality: &str,
    series: &AuditSeries,
) -> Option<AuditProblem> {
    let data_type = series
        .data_type
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(modality);
    let dir = series_archive_path(archive_dir, uid, study_num, series.series_num, data_type);
    let path = dir.display().to_string();

    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Some(AuditProblem::Missing { path });
    };
    let found = entries
        .filter_map(Result::ok)
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .count() as i64;

    if found == 0 {
        Some(AuditProblem::Empty { path })
    } else if found != series.num_files {
        Some(AuditProblem::CountMismatch {
            path,
            expected: series.num_files,
            found,
        })
    } else {
        None
    }
}

/// Check every series of a study.
pub fn audit_study(
    archive_dir: &Path,
    study_id: DbId,
    uid: &str,
    study_num: i32,
    modality: &str,
    series: &[AuditSeries],
) -> StudyAudit {
    let problems = series
        .iter()
        .filter_map(|s| audit_series(archive_dir, uid, study_num, modality, s))
        .collect();
    StudyAudit {
        study_id,
        uid: uid.to_string(),
        study_num,
        num_series: series.len(),
        problems,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use assert_matches::assert_matches;

    use super::*;

    fn series(num: i32, data_type: Option<&str>, files: i64) -> AuditSeries {
        AuditSeries {
            series_num: num,
            data_type: data_type.map(String::from),
            num_files: files,
        }
    }

    fn populate(root: &Path, rel: &str, files: usize) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..files {
            fs::write(dir.join(format!("{i}.dcm")), b"x").unwrap();
        }
    }

    #[test]
    fn path_layout() {
        let p = series_archive_path(Path::new("/nidb/archive"), "S1234ABC", 2, 5, "dicom");
        assert_eq!(p, PathBuf::from("/nidb/archive/S1234ABC/2/5/dicom"));
    }

    #[test]
    fn healthy_study() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path(), "S1/1/1/mr", 3);
        populate(tmp.path(), "S1/1/2/nifti", 1);
        let audit = audit_study(
            tmp.path(),
            10,
            "S1",
            1,
            "mr",
            &[series(1, None, 3), series(2, Some("nifti"), 1)],
        );
        assert!(audit.is_ok());
        assert_eq!(audit.num_series, 2);
    }

    #[test]
    fn reports_each_problem() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path(), "S1/1/2/mr", 0);
        populate(tmp.path(), "S1/1/3/mr", 2);
        fs::write(tmp.path().join("S1/1/2/mr/.hidden"), b"x").unwrap();

        let audit = audit_study(
            tmp.path(),
            10,
            "S1",
            1,
            "mr",
            &[series(1, Some(""), 3), series(2, None, 3), series(3, None, 5)],
        );
        assert!(!audit.is_ok());
        assert_eq!(audit.problems.len(), 3);
        assert_matches!(&audit.problems[0], AuditProblem::Missing { path } if path.ends_with("S1/1/1/mr"));
        assert_matches!(&audit.problems[1], AuditProblem::Empty { .. });
        assert_matches!(
            &audit.problems[2],
            AuditProblem::CountMismatch { expected: 5, found: 2, .. }
        );
        assert!(audit.problems[2]
            .to_string()
            .starts_with("Number of files in DB [5] different than on filesystem [2]"));
    }
}
