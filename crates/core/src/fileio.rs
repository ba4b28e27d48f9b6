//! Deferred file-IO requests.
//!
//! Deleting or re-archiving data touches the archive on disk, so the page
//! never does it directly. It queues one request per object and a separate
//! worker picks the requests up.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::types::DbId;

/// Status of a freshly queued request.
pub const STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileIoOperation {
    Delete,
    Rearchive,
    /// Re-archive, matching existing subjects by ID only.
    RearchiveIdOnly,
}

impl FileIoOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Rearchive => "rearchive",
            Self::RearchiveIdOnly => "rearchiveidonly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileIoDataType {
    Subject,
    Study,
}

impl FileIoDataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Study => "study",
        }
    }
}

impl fmt::Display for FileIoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FileIoDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row to insert into `fileio_requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIoRequest {
    pub operation: FileIoOperation,
    pub data_type: FileIoDataType,
    pub data_id: DbId,
}

/// Requests to delete every listed object.
pub fn obliterate(data_type: FileIoDataType, ids: &[DbId]) -> Vec<FileIoRequest> {
    plan(FileIoOperation::Delete, data_type, ids)
}

/// Requests to re-archive every listed object.
pub fn rearchive(data_type: FileIoDataType, ids: &[DbId], match_id_only: bool) -> Vec<FileIoRequest> {
    let operation = if match_id_only {
        FileIoOperation::RearchiveIdOnly
    } else {
        FileIoOperation::Rearchive
    };
    plan(operation, data_type, ids)
}

/// One request per distinct ID, in first-seen order.
fn plan(operation: FileIoOperation, data_type: FileIoDataType, ids: &[DbId]) -> Vec<FileIoRequest> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .map(|&data_id| FileIoRequest {
            operation,
            data_type,
            data_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obliterate_dedupes_in_order() {
        let reqs = obliterate(FileIoDataType::Study, &[5, 3, 5, 9, 3]);
        let ids: Vec<_> = reqs.iter().map(|r| r.data_id).collect();
        assert_eq!(ids, vec![5, 3, 9]);
        assert!(reqs.iter().all(|r| r.operation == FileIoOperation::Delete));
    }

    #[test]
    fn rearchive_operation_follows_flag() {
        let plain = rearchive(FileIoDataType::Subject, &[1], false);
        let id_only = rearchive(FileIoDataType::Subject, &[1], true);
        assert_eq!(plain[0].operation.as_str(), "rearchive");
        assert_eq!(id_only[0].operation.as_str(), "rearchiveidonly");
        assert_eq!(id_only[0].data_type.to_string(), "subject");
    }

    #[test]
    fn nothing_to_queue() {
        assert!(obliterate(FileIoDataType::Subject, &[]).is_empty());
    }
}
