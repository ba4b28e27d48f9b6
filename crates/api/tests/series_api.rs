//! Integration tests for series summaries, alternate names, series-list
//! comparison, the archive audit and the file-IO queue actions.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_as, notices, post_form};
use nidb_core::altuid::parse_altuid_list;
use nidb_core::modality::Modality;
use nidb_core::mr_qa::ScanValues;
use nidb_core::series_summary::MeasureValue;
use nidb_core::types::DbId;
use nidb_db::models::series::{CreateMrParams, CreateSeries};
use nidb_db::repositories::{AltUidRepo, FileIoRepo, MeasureRepo, SeriesRepo};
use sqlx::PgPool;

async fn ct_series(pool: &PgPool, study_id: DbId, num: i32, desc: &str) -> DbId {
    let ct = Modality::parse("ct").unwrap();
    SeriesRepo::create(
        pool,
        &ct,
        &CreateSeries {
            study_id,
            series_num: num,
            series_desc: desc.to_string(),
            numfiles: 10,
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

async fn mr_series(pool: &PgPool, study_id: DbId, num: i32, desc: &str, numfiles: i64) -> DbId {
    SeriesRepo::create_mr(
        pool,
        &CreateSeries {
            study_id,
            series_num: num,
            series_datetime: Some(common::datetime(2020, 1, 1)),
            series_desc: desc.to_string(),
            series_protocol: desc.to_lowercase(),
            numfiles,
            ..Default::default()
        },
        &CreateMrParams {
            series_sequencename: "tfl3d1".to_string(),
            values: ScanValues {
                tr: 2300.0,
                ..Default::default()
            },
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Test: Alternate names and the summaries built on them
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn change_alternate_names_updates_matching_series(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;
    let subject = common::subject(&pool, "S1234ABC").await;
    let enrollment = common::enroll(&pool, project_id, subject.subject_id).await;
    let study = common::study(&pool, enrollment.enrollment_id, 1, "CT").await;
    ct_series(&pool, study.study_id, 1, "head").await;
    ct_series(&pool, study.study_id, 2, "head").await;
    ct_series(&pool, study.study_id, 3, "neck").await;

    let app = common::build_test_app(pool.clone());
    let id = project_id.to_string();
    let json = body_json(
        post_form(
            app,
            &[
                ("action", "changealternatenames"),
                ("id", &id),
                ("modalities[]", "ct"),
                ("oldname[]", "head"),
                ("newname[]", "HEAD"),
                ("modalities[]", "ct"),
                ("oldname[]", "neck"),
                ("newname[]", ""),
            ],
            false,
        )
        .await,
    )
    .await;

    assert_eq!(
        notices(&json),
        vec![
            "Added alternate series description for 2 series. head -> HEAD",
            "Updated [2] rows",
        ]
    );

    let view = &json["data"]["view"];
    assert_eq!(view["kind"], "unique_series");
    let series = view["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["name"], "head");
    assert_eq!(series[0]["count"], 2);
    assert_eq!(series[0]["altdesc"], "HEAD");
    assert_eq!(series[1]["name"], "neck");
    assert_eq!(series[1]["altdesc"], "");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn change_alternate_names_rejects_unknown_modality(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;

    let app = common::build_test_app(pool);
    let id = project_id.to_string();
    let json = body_json(
        post_form(
            app,
            &[
                ("action", "changealternatenames"),
                ("id", &id),
                ("modalities[]", "ct; drop"),
                ("oldname[]", "a"),
                ("newname[]", "b"),
            ],
            false,
        )
        .await,
    )
    .await;

    assert_eq!(
        notices(&json),
        vec!["Invalid modality [ct; drop]", "Updated [0] rows"]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn alt_series_summary_counts_per_subject(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;
    let subject = common::subject(&pool, "S1234ABC").await;
    let enrollment = common::enroll(&pool, project_id, subject.subject_id).await;
    let study = common::study(&pool, enrollment.enrollment_id, 1, "CT").await;
    ct_series(&pool, study.study_id, 1, "head").await;
    ct_series(&pool, study.study_id, 2, "head").await;

    let ct = Modality::parse("ct").unwrap();
    SeriesRepo::update_altdesc(&pool, &ct, project_id, "head", "HEAD")
        .await
        .unwrap();

    let app = common::build_test_app(pool);
    let uri = format!("/projects.php?action=viewaltseriessummary&id={project_id}");
    let json = body_json(get_as(app, &uri, false).await).await;

    let view = &json["data"]["view"];
    assert_eq!(view["kind"], "alt_series_summary");
    assert_eq!(view["columns"][0]["altdesc"], "HEAD");
    assert_eq!(view["columns"][0]["total"], 2);
    assert_eq!(view["rows"][0]["uid"], "S1234ABC");
    assert_eq!(view["rows"][0]["counts"], serde_json::json!([2]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn instance_summary_joins_measures(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;
    let subject = common::subject(&pool, "S1234ABC").await;
    let enrollment = common::enroll(&pool, project_id, subject.subject_id).await;
    let study = common::study(&pool, enrollment.enrollment_id, 1, "CT").await;
    ct_series(&pool, study.study_id, 1, "head").await;

    let ct = Modality::parse("ct").unwrap();
    SeriesRepo::update_altdesc(&pool, &ct, project_id, "head", "HEAD")
        .await
        .unwrap();
    MeasureRepo::create(
        &pool,
        enrollment.enrollment_id,
        "wasi",
        "fsiq",
        &MeasureValue::Number(110.0),
    )
    .await
    .unwrap();

    let app = common::build_test_app(pool);
    let uri = format!("/projects.php?action=viewinstancesummary&id={instance_id}");
    let json = body_json(get_as(app, &uri, false).await).await;

    let view = &json["data"]["view"];
    assert_eq!(view["kind"], "instance_summary");
    assert_eq!(view["instance_name"], "Main");
    assert_eq!(view["measure_columns"], serde_json::json!(["[wasi] - fsiq"]));

    let rows = view["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["uid"], "S1234ABC");
    assert_eq!(rows[0]["project_name"], "Alpha");
    assert_eq!(rows[0]["counts"], serde_json::json!([1]));
    assert_eq!(rows[0]["measures"]["[wasi] - fsiq"], 110.0);
}

// ---------------------------------------------------------------------------
// Test: Complete series table and cross-server comparison
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_project_table_lists_series_and_empty_subjects(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;
    let scanned = common::subject(&pool, "S1234ABC").await;
    let enrollment = common::enroll(&pool, project_id, scanned.subject_id).await;
    let study = common::study(&pool, enrollment.enrollment_id, 1, "MR").await;
    mr_series(&pool, study.study_id, 1, "T1w", 176).await;
    AltUidRepo::replace(
        &pool,
        scanned.subject_id,
        enrollment.enrollment_id,
        &parse_altuid_list("A1, *B2"),
    )
    .await
    .unwrap();

    let waiting = common::subject(&pool, "S0000NEW").await;
    common::enroll(&pool, project_id, waiting.subject_id).await;

    let app = common::build_test_app(pool);
    let uri = format!("/projects.php?action=displaycompleteprojecttable&id={project_id}");
    let json = body_json(get_as(app, &uri, false).await).await;

    let view = &json["data"]["view"];
    assert_eq!(view["kind"], "complete_project_table");
    let entries = view["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);

    let text = view["text"].as_str().unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "No Studies\t\t\t\t\t\t\tS0000NEW\t");
    assert_eq!(
        lines[1],
        "2020-01-01 10:00:00\t1\t2020-01-01 10:00:00\tT1w\tt1w\t176\t0\tS1234ABC\tB2,A1"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn compare_series_lists_reports_missing_series(pool: PgPool) {
    let local = "2020-01-01 10:00:00\t1\t2020-01-01 10:00:00\tT1w\tt1w\t176\t0\tS1234ABC\t\n\
                 2020-01-01 10:00:00\t2\t2020-01-01 10:05:00\tBOLD\tbold\t300\t0\tS1234ABC\t\n\
                 No Studies\t\t\t\t\t\t\tS0000NEW\t\n";
    // Same first series under a different UID on the remote server.
    let remote = "2020-01-01 10:00:00\t1\t2020-01-01 10:00:00\tT1w\tt1w\t176\t0\tS9999XYZ\t*R1\n";

    let app = common::build_test_app(pool);
    let json = body_json(
        post_form(
            app,
            &[
                ("action", "compareserieslists"),
                ("serieslist1", local),
                ("serieslist2", remote),
            ],
            false,
        )
        .await,
    )
    .await;

    let view = &json["data"]["view"];
    assert_eq!(view["kind"], "series_comparison");
    assert_eq!(view["local_count"], 2);
    assert_eq!(view["remote_count"], 1);
    let missing = view["missing"].as_array().unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0]["series_desc"], "BOLD");
    assert!(notices(&json).is_empty());
}

// ---------------------------------------------------------------------------
// Test: Archive audit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn audit_studies_reports_missing_and_miscounted_series(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;
    let subject = common::subject(&pool, "S1234ABC").await;
    let enrollment = common::enroll(&pool, project_id, subject.subject_id).await;
    let study = common::study(&pool, enrollment.enrollment_id, 1, "MR").await;
    mr_series(&pool, study.study_id, 1, "T1w", 2).await;
    mr_series(&pool, study.study_id, 2, "BOLD", 3).await;
    mr_series(&pool, study.study_id, 3, "DTI", 1).await;

    let archive = tempfile::tempdir().unwrap();
    let complete = archive.path().join("S1234ABC/1/1/mr");
    std::fs::create_dir_all(&complete).unwrap();
    std::fs::write(complete.join("a.dcm"), b"").unwrap();
    std::fs::write(complete.join("b.dcm"), b"").unwrap();
    let short = archive.path().join("S1234ABC/1/2/mr");
    std::fs::create_dir_all(&short).unwrap();
    std::fs::write(short.join("a.dcm"), b"").unwrap();

    let app = common::build_test_app_with_archive(pool, archive.path());
    let uri = format!("/projects.php?action=auditstudies&id={project_id}");
    let response = get_as(app, &uri, false).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let view = &json["data"]["view"];
    assert_eq!(view["kind"], "study_audit");
    assert_eq!(view["num_ok"], 0);

    let audit = &view["audits"][0];
    assert_eq!(audit["uid"], "S1234ABC");
    assert_eq!(audit["num_series"], 3);
    let problems = audit["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0]["kind"], "count_mismatch");
    assert_eq!(problems[0]["expected"], 3);
    assert_eq!(problems[0]["found"], 1);
    assert_eq!(problems[1]["kind"], "missing");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn audit_studies_skips_modalities_without_series_table(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;
    let subject = common::subject(&pool, "S1234ABC").await;
    let enrollment = common::enroll(&pool, project_id, subject.subject_id).await;
    common::study(&pool, enrollment.enrollment_id, 1, "XYZ").await;

    let archive = tempfile::tempdir().unwrap();
    let app = common::build_test_app_with_archive(pool, archive.path());
    let uri = format!("/projects.php?action=auditstudies&id={project_id}");
    let json = body_json(get_as(app, &uri, false).await).await;

    assert_eq!(
        notices(&json),
        vec!["Study [S1234ABC1] has no series table for modality [XYZ]"]
    );
    assert!(json["data"]["view"]["audits"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: Obliterate and re-archive queue file-IO requests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn obliterate_subject_queues_one_request_per_subject(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;
    let subject = common::subject(&pool, "S1234ABC").await;
    let enrollment = common::enroll(&pool, project_id, subject.subject_id).await;
    let first = common::study(&pool, enrollment.enrollment_id, 1, "MR").await;
    let second = common::study(&pool, enrollment.enrollment_id, 2, "MR").await;

    let app = common::build_test_app(pool.clone());
    let (inst, a, b) = (
        instance_id.to_string(),
        first.study_id.to_string(),
        second.study_id.to_string(),
    );
    let json = body_json(
        post_form(
            app,
            &[
                ("action", "obliteratesubject"),
                ("instance_id", &inst),
                ("studyids[]", &a),
                ("studyids[]", &b),
            ],
            true,
        )
        .await,
    )
    .await;

    assert_eq!(notices(&json), vec!["Subjects [S1234ABC] queued for obliteration"]);
    assert_eq!(json["data"]["view"]["kind"], "project_list");

    let pending = FileIoRepo::list_pending(&pool).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].fileio_operation, "delete");
    assert_eq!(pending[0].data_type, "subject");
    assert_eq!(pending[0].data_id, subject.subject_id);
    assert_eq!(pending[0].username, common::TEST_USER);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rearchive_studies_honours_match_id_only(pool: PgPool) {
    let instance_id = common::instance(&pool).await;
    let project_id = common::project(&pool, instance_id, "Alpha").await;
    let subject = common::subject(&pool, "S1234ABC").await;
    let enrollment = common::enroll(&pool, project_id, subject.subject_id).await;
    let first = common::study(&pool, enrollment.enrollment_id, 1, "MR").await;
    let second = common::study(&pool, enrollment.enrollment_id, 2, "MR").await;

    let app = common::build_test_app(pool.clone());
    let (a, b) = (first.study_id.to_string(), second.study_id.to_string());
    let json = body_json(
        post_form(
            app,
            &[
                ("action", "rearchivestudies"),
                ("matchidonly", "1"),
                ("studyids[]", &a),
                ("studyids[]", &b),
            ],
            true,
        )
        .await,
    )
    .await;

    assert_eq!(
        notices(&json),
        vec![
            format!("Studies [{a}, {b}] queued for re-archiving"),
            "No instance selected".to_string(),
        ]
    );

    let pending = FileIoRepo::list_pending(&pool).await.unwrap();
    let queued: Vec<_> = pending
        .iter()
        .map(|r| (r.fileio_operation.as_str(), r.data_type.as_str(), r.data_id))
        .collect();
    assert_eq!(
        queued,
        vec![
            ("rearchiveidonly", "study", first.study_id),
            ("rearchiveidonly", "study", second.study_id),
        ]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn obliterate_requires_site_admin(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_form(
        app,
        &[("action", "obliteratestudy"), ("studyids[]", "1")],
        false,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(FileIoRepo::list_pending(&pool).await.unwrap().is_empty());
}
