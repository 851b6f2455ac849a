use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{DbErr, retry::is_connection_reset};
use services::services::assignment::AssignmentError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Missing or invalid X-User-Id header")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

fn db_err_status(err: &DbErr) -> StatusCode {
    if is_connection_reset(err) {
        StatusCode::SERVICE_UNAVAILABLE
    } else if matches!(err, DbErr::RecordNotFound(_)) {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Assignment(err) => match err {
                AssignmentError::NotFound => (StatusCode::NOT_FOUND, "AssignmentError"),
                AssignmentError::Duplicate => (StatusCode::CONFLICT, "AssignmentError"),
                AssignmentError::InvalidMonth
                | AssignmentError::EmptyBulk
                | AssignmentError::TooManyRows
                | AssignmentError::UnknownClient(_)
                | AssignmentError::UnknownEmployees(_)
                | AssignmentError::BlankEmployee
                | AssignmentError::NoOpChange { .. } => {
                    (StatusCode::BAD_REQUEST, "AssignmentError")
                }
                AssignmentError::Database(db_err) => (db_err_status(db_err), "AssignmentError"),
            },
            ApiError::Database(err) => (db_err_status(err), "DatabaseError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal"),
        };

        let message = self.to_string();
        if status_code.is_server_error() {
            tracing::error!("{}: {}", error_type, message);
        }

        (
            status_code,
            Json(ApiResponse::<()>::error(&message)),
        )
            .into_response()
    }
}
