//! Shared helpers for the API integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use nidb_api::config::ServerConfig;
use nidb_api::middleware::remote_user::SITE_ADMIN_HEADER;
use nidb_api::router::build_app_router;
use nidb_api::state::AppState;
use nidb_core::types::DbId;
use nidb_db::models::project::CreateProject;
use nidb_db::models::study::{CreateStudy, Study};
use nidb_db::models::subject::{CreateSubject, Enrollment, Subject};
use nidb_db::repositories::{EnrollmentRepo, InstanceRepo, ProjectRepo, StudyRepo, SubjectRepo};

/// Username sent by the test requests.
pub const TEST_USER: &str = "alice";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        archive_dir: std::env::temp_dir().join("nidb-test-archive"),
        user_header: "x-remote-user".to_string(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config())
}

/// Same as [`build_test_app`] with the archive rooted at `archive_dir`.
pub fn build_test_app_with_archive(pool: PgPool, archive_dir: &Path) -> Router {
    let config = ServerConfig {
        archive_dir: archive_dir.to_path_buf(),
        ..test_config()
    };
    build_test_app_with_config(pool, config)
}

fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// GET without any identity headers.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// GET as [`TEST_USER`].
pub async fn get_as(app: Router, uri: &str, site_admin: bool) -> Response {
    let mut builder = Request::builder().uri(uri).header("x-remote-user", TEST_USER);
    if site_admin {
        builder = builder.header(SITE_ADMIN_HEADER, "1");
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// POST a url-encoded form to `/projects.php` as [`TEST_USER`].
pub async fn post_form(app: Router, fields: &[(&str, &str)], site_admin: bool) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/projects.php")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-remote-user", TEST_USER);
    if site_admin {
        builder = builder.header(SITE_ADMIN_HEADER, "1");
    }
    let request = builder.body(Body::from(encode_form(fields))).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect the response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Notices of an action response.
pub fn notices(json: &serde_json::Value) -> Vec<String> {
    json["data"]["notices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_str().unwrap().to_string())
        .collect()
}

/// Url-encode form pairs. Repeated keys stay repeated.
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

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
