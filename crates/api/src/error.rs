use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nidb_core::error::CoreError;
use serde_json::json;

/// Error returned by `/projects.php` handlers.
///
/// Rejections that end the request become a `{error, code}` JSON body.
/// Input problems that only skip part of an action are reported as notices
/// instead and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status, error code and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => {
                let (status, code) = match core {
                    CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    CoreError::InvalidInput(_) | CoreError::ItemCountMismatch => {
                        (StatusCode::BAD_REQUEST, "BAD_REQUEST")
                    }
                    CoreError::MissingUser { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                    CoreError::SiteAdminRequired => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                };
                (status, code, core.to_string())
            }
            AppError::Database(err) => classify_sqlx_error(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = json!({
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Map a sqlx error to a status: a missing row is 404, a duplicate on a
/// `uq_*` constraint is 409, anything else is a logged 500.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint().is_some_and(|c| c.starts_with("uq_")) =>
        {
            let constraint = db_err.constraint().unwrap_or_default();
            (
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("Duplicate value violates unique constraint: {constraint}"),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn core_errors_map_to_statuses() {
        let cases = [
            (
                AppError::from(CoreError::NotFound { entity: "Project", id: 7 }),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Project [7] not found",
            ),
            (
                CoreError::InvalidInput("Invalid project ID [x]".into()).into(),
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                "Invalid project ID [x]",
            ),
            (
                CoreError::ItemCountMismatch.into(),
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                "Error in number of items received",
            ),
            (
                CoreError::MissingUser { header: "x-remote-user".into() }.into(),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing x-remote-user header",
            ),
            (
                CoreError::SiteAdminRequired.into(),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Site admin required",
            ),
        ];

        for (err, status, code, message) in cases {
            let (got_status, json) = render(err).await;
            assert_eq!(got_status, status, "{code}");
            assert_eq!(json["code"], code);
            assert_eq!(json["error"], message);
        }
    }

    #[tokio::test]
    async fn missing_row_is_not_found() {
        let (status, json) = render(sqlx::Error::RowNotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn other_database_errors_are_sanitized() {
        let (status, json) = render(sqlx::Error::PoolTimedOut.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"], "An internal error occurred");
    }
}
