//! RDoC upload rows.

use serde::Serialize;
use sqlx::FromRow;
use nidb_core::types::DbId;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RdocUpload {
    pub rdoc_upload_id: DbId,
    pub project_id: Option<DbId>,
    pub label: String,
}
