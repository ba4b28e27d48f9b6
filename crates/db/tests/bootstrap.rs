use sqlx::PgPool;

/// Connect, migrate and confirm the schema is queryable.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    nidb_db::health_check(&pool).await.unwrap();

    let tables = [
        "instances",
        "users",
        "projects",
        "user_project",
        "subjects",
        "enrollment",
        "subject_altuid",
        "studies",
        "mr_series",
        "ct_series",
        "eeg_series",
        "et_series",
        "mr_scanparams",
        "mr_qa",
        "tags",
        "fileio_requests",
        "measures",
        "rdoc_uploads",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// The queue only accepts known operations and data types.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fileio_check_constraints(pool: PgPool) {
    let err = sqlx::query(
        "INSERT INTO fileio_requests (fileio_operation, data_type, data_id, username)
         VALUES ('shred', 'study', 1, 'admin')",
    )
    .execute(&pool)
    .await
    .unwrap_err();
    assert!(err.to_string().contains("check constraint"));
}
