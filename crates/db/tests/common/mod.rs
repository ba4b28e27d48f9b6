//! Seed helpers shared by the repository tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use nidb_core::types::DbId;
use nidb_db::models::project::CreateProject;
use nidb_db::models::study::{CreateStudy, Study};
use nidb_db::models::subject::{CreateSubject, Enrollment, Subject};
use nidb_db::repositories::{EnrollmentRepo, InstanceRepo, ProjectRepo, StudyRepo, SubjectRepo};

pub fn datetime(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

pub async fn instance(pool: &PgPool) -> DbId {
    InstanceRepo::create(pool, "Main").await.unwrap()
}

pub async fn project(pool: &PgPool, instance_id: DbId, name: &str) -> DbId {
    ProjectRepo::create(
        pool,
        &CreateProject {
            instance_id: Some(instance_id),
            project_name: name.to_string(),
            project_costcenter: "999".to_string(),
            project_admin: None,
            project_pi: None,
        },
    )
    .await
    .unwrap()
    .project_id
}

pub async fn subject(pool: &PgPool, uid: &str) -> Subject {
    SubjectRepo::create(
        pool,
        &CreateSubject {
            uid: uid.to_string(),
            gender: "U".to_string(),
            birthdate: NaiveDate::from_ymd_opt(1990, 1, 1),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

pub async fn enroll(pool: &PgPool, project_id: DbId, subject_id: DbId) -> Enrollment {
    EnrollmentRepo::create(pool, project_id, subject_id).await.unwrap()
}

pub async fn study(pool: &PgPool, enrollment_id: DbId, num: i32, modality: &str) -> Study {
    StudyRepo::create(
        pool,
        &CreateStudy {
            enrollment_id,
            study_num: num,
            study_modality: modality.to_string(),
            study_datetime: Some(datetime(2020, 1, num as u32)),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}
