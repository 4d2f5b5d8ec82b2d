use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::file_service::DeletionOutcome;
use crate::services::remote::RemoteError;
use crate::services::staging::StageError;
use crate::utils::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    /// Remote upload failed; the backend's message goes back to the client
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Remote backend unreachable or misbehaving outside the upload path
    #[error("Remote storage error: {0}")]
    Backend(String),

    /// A delete that left at least one backend in an unknown state
    #[error("Deletion incomplete for '{}'", .0.filename)]
    Deletion(DeletionOutcome),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.message)
    }
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        AppError::Backend(e.to_string())
    }
}

impl From<StageError> for AppError {
    fn from(e: StageError) -> Self {
        match e {
            StageError::TooLarge { limit } => AppError::PayloadTooLarge(format!(
                "File exceeds the maximum upload size of {} bytes",
                limit
            )),
            StageError::Io(io) => {
                // The request body itself failed mid-stream (body limit, client abort)
                if let Some(multipart) = io
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<MultipartError>())
                {
                    return multipart_error_kind(multipart.status(), multipart.body_text());
                }
                AppError::Io(io)
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        multipart_error_kind(e.status(), e.body_text())
    }
}

fn multipart_error_kind(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(text)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Upload(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Backend(msg) => {
                tracing::error!("Remote storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Deletion(outcome) => {
                let message = outcome
                    .error_message()
                    .unwrap_or_else(|| outcome.summary());
                tracing::error!("Deletion incomplete: {}", message);

                let body = Json(json!({
                    "error": message,
                    "success": false,
                    "filename": outcome.filename,
                    "local_deleted": outcome.local_deleted(),
                    "mega_deleted": outcome.mega_deleted(),
                    "local_status": outcome.local.as_str(),
                    "mega_status": outcome.remote.as_str(),
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
