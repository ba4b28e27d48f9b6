//! Subject listings, the subject grid editor, and demographic updates.

use nidb_core::altuid::{format_altuids, is_blank_list, parse_altuid_list, primary_altuid, AltUid};
use nidb_core::demographics::{
    display_label, Education, Ethnicity1, Ethnicity2, Handedness, MaritalStatus, Sex,
};
use nidb_core::error::CoreError;
use nidb_core::grid::{parse_subject_grid, SubjectGridRow};
use nidb_core::types::DbId;
use nidb_db::models::project::Project;
use nidb_db::models::subject::EnrolledSubject;
use nidb_db::repositories::{AltUidRepo, EnrollmentRepo, SubjectRepo};
use serde::Serialize;
use sqlx::PgPool;

use super::projects::ActionContext;
use crate::error::AppResult;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Display labels for a subject's coded columns.
#[derive(Debug, Serialize)]
pub struct SubjectLabels {
    pub sex: String,
    pub ethnicity1: String,
    pub ethnicity2: String,
    pub education: String,
    pub handedness: String,
    pub marital_status: String,
}

#[derive(Debug, Serialize)]
pub struct SubjectRow {
    #[serde(flatten)]
    pub subject: EnrolledSubject,
    pub altuids: String,
    pub labels: SubjectLabels,
}

#[derive(Debug, Serialize)]
pub struct SubjectsView {
    pub project: Project,
    pub active: bool,
    pub subgroups: Vec<String>,
    pub subjects: Vec<SubjectRow>,
}

/// The subject grid, one row per enrolled subject, in editor column order.
#[derive(Debug, Serialize)]
pub struct EditSubjectsView {
    pub project: Project,
    pub rows: Vec<SubjectGridRow>,
}

async fn enrollment_altuids(
    pool: &PgPool,
    subject_id: DbId,
    enrollment_id: DbId,
) -> AppResult<Vec<AltUid>> {
    Ok(AltUidRepo::list_for_enrollment(pool, subject_id, enrollment_id)
        .await?
        .into_iter()
        .map(AltUid::from)
        .collect())
}

/// Enrolled subjects that are active (or, for the deleted list, inactive).
pub async fn subjects(ctx: &mut ActionContext<'_>, active: bool) -> AppResult<SubjectsView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();
    let enrolled = SubjectRepo::list_for_project(pool, project.project_id, active).await?;
    let subgroups = EnrollmentRepo::subgroups(pool, project.project_id).await?;

    let mut subjects = Vec::with_capacity(enrolled.len());
    for subject in enrolled {
        let altuids =
            enrollment_altuids(pool, subject.subject.subject_id, subject.enrollment_id).await?;
        let s = &subject.subject;
        let labels = SubjectLabels {
            sex: display_label::<Sex>(&s.gender),
            ethnicity1: display_label::<Ethnicity1>(&s.ethnicity1),
            ethnicity2: display_label::<Ethnicity2>(&s.ethnicity2),
            education: display_label::<Education>(&s.education),
            handedness: display_label::<Handedness>(&s.handedness),
            marital_status: display_label::<MaritalStatus>(&s.marital_status),
        };
        subjects.push(SubjectRow {
            altuids: format_altuids(&altuids),
            labels,
            subject,
        });
    }

    Ok(SubjectsView {
        project,
        active,
        subgroups,
        subjects,
    })
}

/// Active subjects laid out as the grid editor expects them.
pub async fn edit_subjects(ctx: &mut ActionContext<'_>) -> AppResult<EditSubjectsView> {
    let project = ctx.project().await?;
    let pool = ctx.pool();
    let enrolled = SubjectRepo::list_for_project(pool, project.project_id, true).await?;

    let mut rows = Vec::with_capacity(enrolled.len());
    for e in enrolled {
        let altuids = enrollment_altuids(pool, e.subject.subject_id, e.enrollment_id).await?;
        let s = e.subject;
        rows.push(SubjectGridRow {
            subject_id: s.subject_id,
            uid: s.uid,
            primary_altuid: primary_altuid(&altuids).unwrap_or_default(),
            altuids: format_altuids(&altuids),
            guid: s.guid,
            birthdate: s.birthdate.map(|d| d.to_string()).unwrap_or_default(),
            sex: s.gender,
            ethnicity1: s.ethnicity1,
            ethnicity2: s.ethnicity2,
            education: s.education,
            handedness: s.handedness,
            marital_status: s.marital_status,
            smoking_status: s.smoking_status,
            enroll_group: e.enroll_subgroup,
        });
    }

    Ok(EditSubjectsView { project, rows })
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Apply the parallel-array demographics form.
///
/// A length mismatch between the arrays aborts the whole update with a
/// notice. Alternate IDs are replaced even when the submitted list is empty.
pub async fn update_demographics(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let project_id = ctx.project_id()?;
    let pool = ctx.pool();

    let parsed = match ctx.params.demographics_form().rows() {
        Ok(parsed) => parsed,
        Err(err @ CoreError::ItemCountMismatch) => {
            tracing::warn!(project_id, error = %err, "Rejected demographics form");
            ctx.notice(err.to_string());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    for notice in &parsed.notices {
        tracing::warn!(project_id, %notice, "Rejected demographics row");
    }
    ctx.notices.extend(parsed.notices);

    let mut updated = 0u64;
    for row in parsed.rows {
        SubjectRepo::update_demographics(pool, row.subject_id, &row.updates).await?;
        SubjectRepo::set_birthdate(pool, row.subject_id, row.birthdate).await?;
        EnrollmentRepo::update_subgroup(pool, project_id, row.subject_id, &row.enroll_group)
            .await?;

        let Some(enrollment) = EnrollmentRepo::find(pool, project_id, row.subject_id).await? else {
            tracing::debug!(project_id, subject_id = row.subject_id, "Subject not enrolled");
            continue;
        };
        AltUidRepo::replace(
            pool,
            row.subject_id,
            enrollment.enrollment_id,
            &parse_altuid_list(&row.altuids),
        )
        .await?;
        updated += 1;
    }

    tracing::info!(project_id, updated, username = %ctx.user.username, "Updated demographics");
    ctx.notice(format!("Updated [{updated}] rows"));
    Ok(())
}

/// Apply the pasted subject grid.
pub async fn update_subject_table(ctx: &mut ActionContext<'_>) -> AppResult<()> {
    let project_id = ctx.project_id()?;
    let pool = ctx.pool();
    let parsed = parse_subject_grid(&ctx.params.subjecttable);
    ctx.notices.extend(parsed.notices);

    let mut updated = 0u64;
    for row in parsed.rows {
        if SubjectRepo::update_demographics(pool, row.subject_id, &row.updates()).await? {
            updated += 1;
        }

        let Some(enrollment) = EnrollmentRepo::find(pool, project_id, row.subject_id).await? else {
            tracing::debug!(project_id, subject_id = row.subject_id, "Subject not enrolled");
            ctx.notice(format!(
                "Subject [{}] is not enrolled in this project",
                row.uid
            ));
            continue;
        };

        EnrollmentRepo::update_subgroup(pool, project_id, row.subject_id, &row.enroll_group)
            .await?;

        if !is_blank_list(&row.altuids) {
            AltUidRepo::replace(
                pool,
                row.subject_id,
                enrollment.enrollment_id,
                &parse_altuid_list(&row.altuids),
            )
            .await?;
        }
    }

    tracing::info!(project_id, updated, username = %ctx.user.username, "Applied subject table");
    ctx.notice(format!("Updated [{updated}] rows"));
    Ok(())
}
