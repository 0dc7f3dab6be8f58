use crate::services::storage::StorageError;
use crate::services::upload_service::UploadError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// JSON body of every error response.
#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorBody {
    pub error: String,
    /// Client-supplied name of the file that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Multipart(e) => e.status(),
            AppError::Upload(UploadError::InvalidFilename { .. }) => StatusCode::BAD_REQUEST,
            AppError::Upload(UploadError::Body(e)) => body_status(e),
            AppError::Upload(UploadError::Storage { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            AppError::Multipart(e) => ErrorBody {
                error: e.body_text(),
                filename: None,
            },
            AppError::Upload(e) => ErrorBody {
                filename: e.filename().map(str::to_string),
                error: e.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Status of a body read failure. Multipart errors carry their own
/// (413 for an exceeded body limit), anything else is a 400.
fn body_status(error: &StorageError) -> StatusCode {
    match error {
        StorageError::Read(io) => io
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
            .map_or(StatusCode::BAD_REQUEST, MultipartError::status),
        _ => StatusCode::BAD_REQUEST,
    }
}
