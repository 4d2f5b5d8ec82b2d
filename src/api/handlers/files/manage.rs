use crate::api::error::AppError;
use crate::services::file_service::VerificationReport;
use crate::utils::validation::sanitize_filename;
use axum::{
    Json,
    extract::{Path, State},
};

use super::types::*;

#[utoipa::path(
    delete,
    path = "/api/files/{filename}",
    params(
        ("filename" = String, Path, description = "Name of the file to delete")
    ),
    responses(
        (status = 200, description = "Deleted from at least one backend", body = DeleteResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "File not found in any storage", body = ErrorResponse),
        (status = 500, description = "A backend could not be reconciled; partial state included", body = DeleteErrorResponse)
    ),
    security(
        ("bearer" = [])
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let filename = sanitize_filename(&filename)?;

    let outcome = state.file_service.delete(&filename).await.into_result()?;
    Ok(Json(DeleteResponse::from(&outcome)))
}

#[utoipa::path(
    get,
    path = "/api/verify-deletion/{filename}",
    params(
        ("filename" = String, Path, description = "Name to check in both backends")
    ),
    responses(
        (status = 200, description = "Current existence in each backend", body = VerificationReport),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Remote storage unreachable", body = ErrorResponse)
    ),
    security(
        ("bearer" = [])
    ),
    tag = "files"
)]
pub async fn verify_deletion(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> Result<Json<VerificationReport>, AppError> {
    let filename = sanitize_filename(&filename)?;

    let report = state.file_service.verify_deletion(&filename).await?;
    Ok(Json(report))
}
