use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::warn;

use pastetrail_common::Error;

/// HTTP-facing error. Core error kinds map to status codes without being
/// collapsed, so clients can distinguish retryable failures.
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    Unauthorized,
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "invalid credentials" }),
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            Self::Core(e) => match &e {
                Error::Validation(message) => {
                    (StatusCode::BAD_REQUEST, json!({ "error": message }))
                }
                Error::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
                Error::Conflict {
                    message,
                    existing_id,
                } => (
                    StatusCode::CONFLICT,
                    json!({ "error": message, "existing_id": existing_id }),
                ),
                Error::Io(message) => {
                    warn!(error = %message, "transient I/O failure");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        json!({ "error": "temporary storage failure, retry", "transient": true }),
                    )
                }
                Error::Database(db) => {
                    warn!(error = %db, "database failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": "internal error" }),
                    )
                }
            },
        };
        (status, Json(body)).into_response()
    }
}
