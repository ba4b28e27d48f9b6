//! Dispatcher for `/projects.php`.
//!
//! Every request names an action. A mutating action runs first and leaves
//! its messages on the notice list; then the action's follow-up view is
//! rendered. Both come back in one `{ action, notices, view }` envelope.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::{Form, Query};
use nidb_core::action::{ProjectAction, ViewKind};
use nidb_core::demographics_form::DemographicsForm;
use nidb_core::error::CoreError;
use nidb_core::modality::Modality;
use nidb_core::mr_qa::ScanParamFormRow;
use nidb_core::types::{parse_db_id, DbId};
use nidb_db::models::project::Project;
use nidb_db::repositories::{ProjectRepo, SeriesRepo};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{
    fileio, mr_params, project_info, project_list, series_lists, series_names, studies, subjects,
};
use crate::error::{AppError, AppResult};
use crate::middleware::remote_user::RemoteUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Header naming the caller's instance when no `instance_id` parameter is sent.
pub const INSTANCE_HEADER: &str = "x-nidb-instance";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Every parameter the page reads, under the names its forms submit.
///
/// Array parameters use the `name[]` convention and may repeat. Numeric
/// values are kept as text so bad input can be reported by value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectParams {
    pub action: String,
    pub id: String,
    pub instance_id: String,
    pub newprojectid: String,
    #[serde(rename = "studyids[]")]
    pub study_ids: Vec<String>,
    pub matchidonly: String,
    pub tags: String,
    pub studytable: String,
    pub subjecttable: String,
    pub serieslist1: String,
    pub serieslist2: String,
    pub existingstudy: String,
    pub existingseries: String,
    pub rdoc_label: String,

    #[serde(rename = "modalities[]")]
    pub modalities: Vec<String>,
    #[serde(rename = "oldname[]")]
    pub old_names: Vec<String>,
    #[serde(rename = "newname[]")]
    pub new_names: Vec<String>,

    #[serde(rename = "subjectid[]")]
    pub subject_ids: Vec<String>,
    #[serde(rename = "altuids[]")]
    pub altuids: Vec<String>,
    #[serde(rename = "guids[]")]
    pub guids: Vec<String>,
    #[serde(rename = "birthdates[]")]
    pub birthdates: Vec<String>,
    #[serde(rename = "genders[]")]
    pub genders: Vec<String>,
    #[serde(rename = "ethnicity1[]")]
    pub ethnicity1: Vec<String>,
    #[serde(rename = "ethnicity2[]")]
    pub ethnicity2: Vec<String>,
    #[serde(rename = "education[]")]
    pub education: Vec<String>,
    #[serde(rename = "maritalstatus[]")]
    pub marital_status: Vec<String>,
    #[serde(rename = "smokingstatus[]")]
    pub smoking_status: Vec<String>,
    #[serde(rename = "enrollgroup[]")]
    pub enroll_group: Vec<String>,

    #[serde(rename = "param_rowid[]")]
    pub param_rowid: Vec<String>,
    #[serde(rename = "param_protocol[]")]
    pub param_protocol: Vec<String>,
    #[serde(rename = "param_sequence[]")]
    pub param_sequence: Vec<String>,
    #[serde(rename = "param_tr_min[]")]
    pub param_tr_min: Vec<String>,
    #[serde(rename = "param_tr_max[]")]
    pub param_tr_max: Vec<String>,
    #[serde(rename = "param_te_min[]")]
    pub param_te_min: Vec<String>,
    #[serde(rename = "param_te_max[]")]
    pub param_te_max: Vec<String>,
    #[serde(rename = "param_ti_min[]")]
    pub param_ti_min: Vec<String>,
    #[serde(rename = "param_ti_max[]")]
    pub param_ti_max: Vec<String>,
    #[serde(rename = "param_flip_min[]")]
    pub param_flip_min: Vec<String>,
    #[serde(rename = "param_flip_max[]")]
    pub param_flip_max: Vec<String>,
    #[serde(rename = "param_xdim_min[]")]
    pub param_xdim_min: Vec<String>,
    #[serde(rename = "param_xdim_max[]")]
    pub param_xdim_max: Vec<String>,
    #[serde(rename = "param_ydim_min[]")]
    pub param_ydim_min: Vec<String>,
    #[serde(rename = "param_ydim_max[]")]
    pub param_ydim_max: Vec<String>,
    #[serde(rename = "param_zdim_min[]")]
    pub param_zdim_min: Vec<String>,
    #[serde(rename = "param_zdim_max[]")]
    pub param_zdim_max: Vec<String>,
    #[serde(rename = "param_tdim_min[]")]
    pub param_tdim_min: Vec<String>,
    #[serde(rename = "param_tdim_max[]")]
    pub param_tdim_max: Vec<String>,
    #[serde(rename = "param_slicethickness_min[]")]
    pub param_slicethickness_min: Vec<String>,
    #[serde(rename = "param_slicethickness_max[]")]
    pub param_slicethickness_max: Vec<String>,
    #[serde(rename = "param_slicespacing_min[]")]
    pub param_slicespacing_min: Vec<String>,
    #[serde(rename = "param_slicespacing_max[]")]
    pub param_slicespacing_max: Vec<String>,
    #[serde(rename = "param_bandwidth_min[]")]
    pub param_bandwidth_min: Vec<String>,
    #[serde(rename = "param_bandwidth_max[]")]
    pub param_bandwidth_max: Vec<String>,
}

/// Query-string parameters of a form post (`projects.php?action=..&id=..`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RequestTarget {
    pub action: String,
    pub id: String,
    pub instance_id: String,
    pub newprojectid: String,
}

impl ProjectParams {
    /// Fill addressing fields the form body left empty from the query string.
    pub fn fill_target(&mut self, target: RequestTarget) {
        for (field, value) in [
            (&mut self.action, target.action),
            (&mut self.id, target.id),
            (&mut self.instance_id, target.instance_id),
            (&mut self.newprojectid, target.newprojectid),
        ] {
            if field.trim().is_empty() {
                *field = value;
            }
        }
    }

    /// Re-archive flag: any value other than empty or `0` is set.
    pub fn match_id_only(&self) -> bool {
        let v = self.matchidonly.trim();
        !v.is_empty() && v != "0"
    }

    pub fn demographics_form(&self) -> DemographicsForm {
        DemographicsForm {
            subject_ids: self.subject_ids.clone(),
            altuids: self.altuids.clone(),
            guids: self.guids.clone(),
            birthdates: self.birthdates.clone(),
            sexes: self.genders.clone(),
            ethnicity1s: self.ethnicity1.clone(),
            ethnicity2s: self.ethnicity2.clone(),
            educations: self.education.clone(),
            marital_statuses: self.marital_status.clone(),
            smoking_statuses: self.smoking_status.clone(),
            enroll_groups: self.enroll_group.clone(),
        }
    }

    /// Rows of the MR range editor. Bounds follow `ScanParam::ALL` order.
    pub fn scan_param_rows(&self) -> Vec<ScanParamFormRow> {
        let bounds = [
            (&self.param_tr_min, &self.param_tr_max),
            (&self.param_te_min, &self.param_te_max),
            (&self.param_ti_min, &self.param_ti_max),
            (&self.param_flip_min, &self.param_flip_max),
            (&self.param_xdim_min, &self.param_xdim_max),
            (&self.param_ydim_min, &self.param_ydim_max),
            (&self.param_zdim_min, &self.param_zdim_max),
            (&self.param_tdim_min, &self.param_tdim_max),
            (&self.param_slicethickness_min, &self.param_slicethickness_max),
            (&self.param_slicespacing_min, &self.param_slicespacing_max),
            (&self.param_bandwidth_min, &self.param_bandwidth_max),
        ];
        let rows = self.param_rowid.len().max(self.param_protocol.len());
        (0..rows)
            .map(|i| ScanParamFormRow {
                row_id: cell(&self.param_rowid, i),
                protocol: cell(&self.param_protocol, i),
                sequence: cell(&self.param_sequence, i),
                bounds: bounds
                    .iter()
                    .map(|(min, max)| (cell(min, i), cell(max, i)))
                    .collect(),
            })
            .collect()
    }
}

fn cell(values: &[String], i: usize) -> String {
    values.get(i).cloned().unwrap_or_default()
}

/// Parse a project ID parameter, rejecting anything but digits.
pub fn parse_project_id(raw: &str) -> AppResult<DbId> {
    let raw = raw.trim();
    parse_db_id(raw)
        .ok_or_else(|| CoreError::InvalidInput(format!("Invalid project ID [{raw}]")).into())
}

/// A modality with its own series table, or `None` (logged) when the name is
/// not a valid table prefix or the table does not exist.
pub async fn series_modality(pool: &PgPool, raw: &str) -> AppResult<Option<Modality>> {
    let modality = match Modality::parse(raw) {
        Ok(m) => m,
        Err(err) => {
            tracing::debug!(modality = %raw, error = %err, "Rejected modality name");
            return Ok(None);
        }
    };
    if SeriesRepo::table_exists(pool, &modality).await? {
        Ok(Some(modality))
    } else {
        tracing::debug!(modality = %raw, "No series table for modality");
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Action context
// ---------------------------------------------------------------------------

/// Everything an action or view needs, plus the notices collected so far.
pub struct ActionContext<'a> {
    pub state: &'a AppState,
    pub user: &'a RemoteUser,
    pub params: &'a ProjectParams,
    instance_header: Option<String>,
    pub notices: Vec<String>,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        state: &'a AppState,
        user: &'a RemoteUser,
        params: &'a ProjectParams,
        headers: &HeaderMap,
    ) -> Self {
        let instance_header = headers
            .get(INSTANCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string());
        Self {
            state,
            user,
            params,
            instance_header,
            notices: Vec::new(),
        }
    }

    pub fn pool(&self) -> &'a PgPool {
        &self.state.pool
    }

    pub fn notice(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    /// The `id` parameter as a project ID.
    pub fn project_id(&self) -> AppResult<DbId> {
        parse_project_id(&self.params.id)
    }

    /// The selected project, or 404.
    pub async fn project(&self) -> AppResult<Project> {
        let id = self.project_id()?;
        ProjectRepo::find_by_id(self.pool(), id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Project",
                id,
            }))
    }

    /// The caller's instance from `instance_id` or [`INSTANCE_HEADER`].
    ///
    /// `None` when neither is given; a non-numeric value is a 400.
    pub fn instance_id(&self) -> AppResult<Option<DbId>> {
        let param = self.params.instance_id.trim();
        let raw = if param.is_empty() {
            self.instance_header.as_deref().unwrap_or("")
        } else {
            param
        };
        if raw.is_empty() {
            return Ok(None);
        }
        parse_db_id(raw)
            .map(Some)
            .ok_or_else(|| CoreError::InvalidInput(format!("Invalid instance ID [{raw}]")).into())
    }

    /// Selected study IDs. Non-numeric entries are reported and skipped.
    pub fn study_ids(&mut self) -> Vec<DbId> {
        let params = self.params;
        let mut ids = Vec::with_capacity(params.study_ids.len());
        for raw in &params.study_ids {
            match parse_db_id(raw.trim()) {
                Some(id) => ids.push(id),
                None => {
                    tracing::warn!(value = %raw, "Skipping non-numeric study ID");
                    self.notice(format!("StudyID [{raw}] is not an integer"));
                }
            }
        }
        ids
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A rendered view, tagged by `kind`.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    ProjectList(project_list::ProjectListView),
    StudiesTable(studies::StudiesTableView),
    StudyAudit(studies::StudyAuditView),
    UniqueSeries(series_names::UniqueSeriesView),
    AltSeriesSummary(series_names::AltSeriesSummaryView),
    ProjectInfo(project_info::ProjectInfoView),
    EditSubjects(subjects::EditSubjectsView),
    Subjects(subjects::SubjectsView),
    DeletedSubjects(subjects::SubjectsView),
    CompleteProjectTable(series_lists::CompleteTableView),
    SeriesComparison(series_lists::ComparisonView),
    InstanceSummary(series_names::InstanceSummaryView),
    MrParamEditor(mr_params::EditorView),
    MrParamQa(mr_params::QaView),
    RdocList(project_list::RdocListView),
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub action: ProjectAction,
    pub notices: Vec<String>,
    pub view: View,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /projects.php
pub async fn handle_get(
    State(state): State<AppState>,
    user: RemoteUser,
    headers: HeaderMap,
    Query(params): Query<ProjectParams>,
) -> AppResult<Json<DataResponse<ActionResponse>>> {
    dispatch(&state, &user, &headers, &params).await
}

/// POST /projects.php
///
/// The form body wins; `action`, `id`, `instance_id` and `newprojectid`
/// may also come from the query string.
pub async fn handle_post(
    State(state): State<AppState>,
    user: RemoteUser,
    headers: HeaderMap,
    Query(target): Query<RequestTarget>,
    Form(mut params): Form<ProjectParams>,
) -> AppResult<Json<DataResponse<ActionResponse>>> {
    params.fill_target(target);
    dispatch(&state, &user, &headers, &params).await
}

async fn dispatch(
    state: &AppState,
    user: &RemoteUser,
    headers: &HeaderMap,
    params: &ProjectParams,
) -> AppResult<Json<DataResponse<ActionResponse>>> {
    let action = ProjectAction::from_param(Some(params.action.as_str()));

    if action.requires_site_admin() {
        if let Err(err) = user.require_site_admin() {
            tracing::warn!(?action, username = %user.username, "Site admin action refused");
            return Err(err);
        }
    }

    let mut ctx = ActionContext::new(state, user, params, headers);

    if action.is_mutation() {
        tracing::info!(?action, username = %user.username, id = %params.id, "Running project action");
        run_mutation(&mut ctx, action).await?;
    }

    let kind = action.follow_up(!params.id.trim().is_empty());
    tracing::debug!(?action, ?kind, "Rendering view");
    let view = render_view(&mut ctx, kind).await?;

    Ok(Json(DataResponse {
        data: ActionResponse {
            action,
            notices: ctx.notices,
            view,
        },
    }))
}

async fn run_mutation(ctx: &mut ActionContext<'_>, action: ProjectAction) -> AppResult<()> {
    match action {
        ProjectAction::ChangeProject => studies::change_project(ctx).await,
        ProjectAction::ApplyTags => studies::apply_tags(ctx).await,
        ProjectAction::UpdateStudyTable => studies::update_study_table(ctx).await,
        ProjectAction::UpdateDemographics => subjects::update_demographics(ctx).await,
        ProjectAction::UpdateSubjectTable => subjects::update_subject_table(ctx).await,
        ProjectAction::ChangeAlternateNames => series_names::change_alternate_names(ctx).await,
        ProjectAction::ObliterateSubject => fileio::obliterate_subjects(ctx).await,
        ProjectAction::ObliterateStudy => fileio::obliterate_studies(ctx).await,
        ProjectAction::RearchiveSubjects => fileio::rearchive_subjects(ctx).await,
        ProjectAction::RearchiveStudies => fileio::rearchive_studies(ctx).await,
        ProjectAction::UpdateMrParams => mr_params::update_mr_params(ctx).await,
        ProjectAction::LoadMrParams => mr_params::load_mr_params(ctx).await,
        ProjectAction::ResetQa => mr_params::reset_qa(ctx).await,
        _ => Ok(()),
    }
}

async fn render_view(ctx: &mut ActionContext<'_>, kind: ViewKind) -> AppResult<View> {
    Ok(match kind {
        ViewKind::ProjectList => View::ProjectList(project_list::project_list(ctx).await?),
        ViewKind::StudiesTable => View::StudiesTable(studies::studies_table(ctx).await?),
        ViewKind::StudyAudit => View::StudyAudit(studies::audit_studies(ctx).await?),
        ViewKind::UniqueSeries => View::UniqueSeries(series_names::unique_series(ctx).await?),
        ViewKind::AltSeriesSummary => {
            View::AltSeriesSummary(series_names::alt_series_summary(ctx).await?)
        }
        ViewKind::ProjectInfo => View::ProjectInfo(project_info::project_info(ctx).await?),
        ViewKind::EditSubjects => View::EditSubjects(subjects::edit_subjects(ctx).await?),
        ViewKind::Subjects => View::Subjects(subjects::subjects(ctx, true).await?),
        ViewKind::DeletedSubjects => View::DeletedSubjects(subjects::subjects(ctx, false).await?),
        ViewKind::CompleteProjectTable => {
            View::CompleteProjectTable(series_lists::complete_table(ctx).await?)
        }
        ViewKind::SeriesComparison => View::SeriesComparison(series_lists::compare(ctx)),
        ViewKind::InstanceSummary => {
            View::InstanceSummary(series_names::instance_summary(ctx).await?)
        }
        ViewKind::MrParamEditor => View::MrParamEditor(mr_params::editor(ctx).await?),
        ViewKind::MrParamQa => View::MrParamQa(mr_params::view_qa(ctx).await?),
        ViewKind::RdocList => View::RdocList(project_list::rdoc_list(ctx).await?),
    })
}
