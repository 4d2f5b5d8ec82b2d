use crate::api::error::AppError;
use crate::utils::validation::sanitize_filename;
use axum::{
    Json,
    extract::{Multipart, State},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::*;

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = Multipart, description = "Multipart form with a `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored locally and remotely", body = UploadResponse),
        (status = 400, description = "No file part / no selected file / invalid name", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 413, description = "File exceeds the configured maximum", body = ErrorResponse),
        (status = 500, description = "Remote upload or local commit failed", body = ErrorResponse)
    ),
    security(
        ("bearer" = [])
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let result: Result<Json<UploadResponse>, AppError> = async {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some("file") {
                continue;
            }

            let original_filename = field.file_name().unwrap_or_default().to_string();
            if original_filename.is_empty() {
                return Err(AppError::BadRequest("No selected file".to_string()));
            }
            let filename = sanitize_filename(&original_filename)?;

            let body_with_io_error = field.map_err(std::io::Error::other);
            let reader = StreamReader::new(body_with_io_error);

            let receipt = state.file_service.upload(&filename, reader).await?;
            tracing::info!(
                "✅ Upload of '{}' complete ({} bytes)",
                receipt.filename,
                receipt.size
            );
            return Ok(Json(receipt.into()));
        }

        Err(AppError::BadRequest("No file part".to_string()))
    }
    .await;

    match result {
        Ok(res) => Ok(res),
        Err(e) => {
            // Drain what is left so the client sees our response, not a reset connection
            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
