//! Project entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use nidb_core::types::DbId;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub project_id: DbId,
    pub instance_id: Option<DbId>,
    pub project_name: String,
    pub project_uid: String,
    pub project_costcenter: String,
    pub project_admin: Option<DbId>,
    pub project_pi: Option<DbId>,
    pub project_sharing: String,
    pub project_startdate: Option<NaiveDate>,
    pub project_enddate: Option<NaiveDate>,
    pub project_status: String,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub instance_id: Option<DbId>,
    pub project_name: String,
    pub project_costcenter: String,
    pub project_admin: Option<DbId>,
    pub project_pi: Option<DbId>,
}

/// A project as shown in the project list: joined with the admin and PI
/// names and the caller's permissions on it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectListRow {
    pub project_id: DbId,
    pub project_name: String,
    pub project_costcenter: String,
    pub admin_fullname: Option<String>,
    pub pi_fullname: Option<String>,
    pub project_startdate: Option<NaiveDate>,
    pub project_enddate: Option<NaiveDate>,
    pub view_data: bool,
    pub view_phi: bool,
    pub write_data: bool,
    pub write_phi: bool,
    pub rdoc_label: Option<String>,
}

/// Number of studies of one modality in a project.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ModalityCount {
    pub modality: String,
    pub num_studies: i64,
}

/// Per-project permissions granted to a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPermissions {
    pub view_data: bool,
    pub view_phi: bool,
    pub write_data: bool,
    pub write_phi: bool,
}
