use crate::api::error::AppError;
use crate::services::local_store::FileRecord;
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/api/files",
    responses(
        (status = 200, description = "Files in the local store", body = [FileRecord]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer" = [])
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<FileRecord>>, AppError> {
    let files = state.file_service.local().list().await?;
    Ok(Json(files))
}
