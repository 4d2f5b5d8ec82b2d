use serde::Serialize;
use utoipa::ToSchema;

use crate::services::file_service::{DeletionOutcome, UploadReceipt};

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Shareable link to the remote copy
    pub file_url: String,
    /// Name the file was stored under, after sanitization
    pub filename: String,
}

impl From<UploadReceipt> for UploadResponse {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            message: "File uploaded to local storage and remote storage".to_string(),
            file_url: receipt.remote_url,
            filename: receipt.filename,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub local_deleted: bool,
    pub mega_deleted: bool,
    /// `deleted` | `not_found` | `error`
    pub local_status: String,
    /// `deleted` | `not_found` | `error`
    pub mega_status: String,
}

impl From<&DeletionOutcome> for DeleteResponse {
    fn from(outcome: &DeletionOutcome) -> Self {
        Self {
            success: outcome.success(),
            message: outcome.summary(),
            local_deleted: outcome.local_deleted(),
            mega_deleted: outcome.mega_deleted(),
            local_status: outcome.local.as_str().to_string(),
            mega_status: outcome.remote.as_str().to_string(),
        }
    }
}

/// Body of a 500 from `DELETE /api/files/{filename}`
#[derive(Serialize, ToSchema)]
pub struct DeleteErrorResponse {
    pub error: String,
    pub success: bool,
    pub filename: String,
    pub local_deleted: bool,
    pub mega_deleted: bool,
    pub local_status: String,
    pub mega_status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
