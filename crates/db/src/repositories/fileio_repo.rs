//! Repository for the `fileio_requests` queue.

use sqlx::PgPool;
use nidb_core::fileio::{FileIoRequest, STATUS_PENDING};
use nidb_core::types::DbId;

use crate::models::fileio::FileIoRequestRow;

const COLUMNS: &str =
    "fileiorequest_id, fileio_operation, data_type, data_id, username, requestdate, request_status";

pub struct FileIoRepo;

impl FileIoRepo {
    /// Queue requests on behalf of `username`, returning the new IDs in order.
    pub async fn enqueue(
        pool: &PgPool,
        requests: &[FileIoRequest],
        username: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut ids = Vec::with_capacity(requests.len());
        for req in requests {
            let id = sqlx::query_scalar(
                "INSERT INTO fileio_requests (fileio_operation, data_type, data_id, username, request_status)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING fileiorequest_id",
            )
            .bind(req.operation.as_str())
            .bind(req.data_type.as_str())
            .bind(req.data_id)
            .bind(username)
            .bind(STATUS_PENDING)
            .fetch_one(pool)
            .await?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Pending requests, oldest first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<FileIoRequestRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM fileio_requests WHERE request_status = $1
             ORDER BY fileiorequest_id"
        );
        sqlx::query_as::<_, FileIoRequestRow>(&query)
            .bind(STATUS_PENDING)
            .fetch_all(pool)
            .await
    }
}
