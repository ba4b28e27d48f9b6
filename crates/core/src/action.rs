//! Action dispatch for the project administration page.
//!
//! A request names one action via the `action` parameter. Mutating actions
//! are followed by a view; read-only actions are a view by themselves.
//! Unknown or empty action strings fall back to [`ProjectAction::Default`].

use std::str::FromStr;

use serde::Serialize;

/// Every action the page understands.
///
/// Serializes to the same name the `action` parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectAction {
    DisplayStudies,
    AuditStudies,
    ChangeProject,
    ViewUniqueSeries,
    ViewAltSeriesSummary,
    DisplayProjectInfo,
    EditSubjects,
    DisplaySubjects,
    UpdateDemographics,
    DisplayDeletedSubjects,
    UpdateSubjectTable,
    UpdateStudyTable,
    ApplyTags,
    DisplayCompleteProjectTable,
    CompareSeriesLists,
    ViewInstanceSummary,
    ChangeAlternateNames,
    ObliterateSubject,
    ObliterateStudy,
    RearchiveStudies,
    RearchiveSubjects,
    EditMrParams,
    UpdateMrParams,
    LoadMrParams,
    ViewMrParams,
    ResetQa,
    #[serde(rename = "show_rdoc_list")]
    ShowRdocList,
    Default,
}

/// The read-only views an action can end on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    ProjectList,
    StudiesTable,
    StudyAudit,
    UniqueSeries,
    AltSeriesSummary,
    ProjectInfo,
    EditSubjects,
    Subjects,
    DeletedSubjects,
    CompleteProjectTable,
    SeriesComparison,
    InstanceSummary,
    MrParamEditor,
    MrParamQa,
    RdocList,
}

impl FromStr for ProjectAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "displaystudies" => Self::DisplayStudies,
            "auditstudies" => Self::AuditStudies,
            "changeproject" => Self::ChangeProject,
            "viewuniqueseries" => Self::ViewUniqueSeries,
            "viewaltseriessummary" => Self::ViewAltSeriesSummary,
            "displayprojectinfo" => Self::DisplayProjectInfo,
            "editsubjects" => Self::EditSubjects,
            "displaysubjects" => Self::DisplaySubjects,
            "updatedemographics" => Self::UpdateDemographics,
            "displaydeletedsubjects" => Self::DisplayDeletedSubjects,
            "updatesubjecttable" => Self::UpdateSubjectTable,
            "updatestudytable" => Self::UpdateStudyTable,
            "applytags" => Self::ApplyTags,
            "displaycompleteprojecttable" => Self::DisplayCompleteProjectTable,
            "compareserieslists" => Self::CompareSeriesLists,
            "viewinstancesummary" => Self::ViewInstanceSummary,
            "changealternatenames" => Self::ChangeAlternateNames,
            "obliteratesubject" => Self::ObliterateSubject,
            "obliteratestudy" => Self::ObliterateStudy,
            "rearchivestudies" => Self::RearchiveStudies,
            "rearchivesubjects" => Self::RearchiveSubjects,
            "editmrparams" => Self::EditMrParams,
            "updatemrparams" => Self::UpdateMrParams,
            "loadmrparams" => Self::LoadMrParams,
            "viewmrparams" => Self::ViewMrParams,
            "resetqa" => Self::ResetQa,
            "show_rdoc_list" => Self::ShowRdocList,
            _ => Self::Default,
        })
    }
}

impl ProjectAction {
    /// Parse an optional action parameter; a missing parameter is `Default`.
    pub fn from_param(param: Option<&str>) -> Self {
        param
            .and_then(|s| s.parse().ok())
            .unwrap_or(Self::Default)
    }

    /// The view rendered after this action runs.
    ///
    /// `has_project_id` only matters for [`ProjectAction::Default`], which
    /// shows the project list when no project is selected.
    pub fn follow_up(self, has_project_id: bool) -> ViewKind {
        match self {
            Self::DisplayStudies
            | Self::ChangeProject
            | Self::UpdateStudyTable
            | Self::ApplyTags
            | Self::ResetQa => ViewKind::StudiesTable,
            Self::AuditStudies => ViewKind::StudyAudit,
            Self::ViewUniqueSeries | Self::ChangeAlternateNames => ViewKind::UniqueSeries,
            Self::ViewAltSeriesSummary => ViewKind::AltSeriesSummary,
            Self::DisplayProjectInfo => ViewKind::ProjectInfo,
            Self::EditSubjects | Self::UpdateSubjectTable => ViewKind::EditSubjects,
            Self::DisplaySubjects | Self::UpdateDemographics => ViewKind::Subjects,
            Self::DisplayDeletedSubjects => ViewKind::DeletedSubjects,
            Self::DisplayCompleteProjectTable => ViewKind::CompleteProjectTable,
            Self::CompareSeriesLists => ViewKind::SeriesComparison,
            Self::ViewInstanceSummary => ViewKind::InstanceSummary,
            Self::ObliterateSubject
            | Self::ObliterateStudy
            | Self::RearchiveStudies
            | Self::RearchiveSubjects => ViewKind::ProjectList,
            Self::EditMrParams | Self::UpdateMrParams | Self::LoadMrParams => {
                ViewKind::MrParamEditor
            }
            Self::ViewMrParams => ViewKind::MrParamQa,
            Self::ShowRdocList => ViewKind::RdocList,
            Self::Default => {
                if has_project_id {
                    ViewKind::StudiesTable
                } else {
                    ViewKind::ProjectList
                }
            }
        }
    }

    /// Whether the action changes data (as opposed to only rendering a view).
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::ChangeProject
                | Self::UpdateDemographics
                | Self::UpdateSubjectTable
                | Self::UpdateStudyTable
                | Self::ApplyTags
                | Self::ChangeAlternateNames
                | Self::ObliterateSubject
                | Self::ObliterateStudy
                | Self::RearchiveStudies
                | Self::RearchiveSubjects
                | Self::UpdateMrParams
                | Self::LoadMrParams
                | Self::ResetQa
        )
    }

    /// Actions restricted to site administrators.
    pub fn requires_site_admin(self) -> bool {
        matches!(
            self,
            Self::ChangeProject
                | Self::ApplyTags
                | Self::ObliterateSubject
                | Self::ObliterateStudy
                | Self::RearchiveStudies
                | Self::RearchiveSubjects
                | Self::ResetQa
        )
    }
}
