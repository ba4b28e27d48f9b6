//! File-IO request queue rows.

use serde::Serialize;
use sqlx::FromRow;
use nidb_core::types::{DbId, Timestamp};

/// A row from `fileio_requests`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileIoRequestRow {
    pub fileiorequest_id: DbId,
    pub fileio_operation: String,
    pub data_type: String,
    pub data_id: DbId,
    pub username: String,
    pub requestdate: Timestamp,
    pub request_status: String,
}
