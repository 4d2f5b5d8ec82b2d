use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::AppError;
use crate::services::remote::RemoteObjectId;

/// State of one backend after a delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// The file was there and this request removed it
    Deleted,
    /// The file was not there to begin with
    NotFound,
    /// The backend could not be brought to a known state
    Error(String),
}

impl BackendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendStatus::Deleted => "deleted",
            BackendStatus::NotFound => "not_found",
            BackendStatus::Error(_) => "error",
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, BackendStatus::Deleted)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BackendStatus::Error(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Per-backend result of a delete request. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub filename: String,
    pub local: BackendStatus,
    pub remote: BackendStatus,
}

impl DeletionOutcome {
    pub fn local_deleted(&self) -> bool {
        self.local.is_deleted()
    }

    pub fn mega_deleted(&self) -> bool {
        self.remote.is_deleted()
    }

    /// True iff at least one backend transitioned to deleted
    pub fn success(&self) -> bool {
        self.local_deleted() || self.mega_deleted()
    }

    pub fn has_error(&self) -> bool {
        self.local.error().is_some() || self.remote.error().is_some()
    }

    pub fn summary(&self) -> String {
        use BackendStatus::*;

        match (&self.local, &self.remote) {
            (Deleted, Deleted) => "File deleted from local storage and remote storage".to_string(),
            (Deleted, NotFound) => {
                "File deleted from local storage (not found in remote storage)".to_string()
            }
            (NotFound, Deleted) => {
                "File deleted from remote storage (not found in local storage)".to_string()
            }
            (NotFound, NotFound) => "File not found in any storage".to_string(),
            (local, remote) => format!(
                "Local storage: {}; remote storage: {}",
                describe(local),
                describe(remote)
            ),
        }
    }

    /// Message for the failure response, naming every backend that errored
    pub fn error_message(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(reason) = self.local.error() {
            parts.push(format!("local storage: {}", reason));
        }
        if let Some(reason) = self.remote.error() {
            parts.push(format!("remote storage: {}", reason));
        }
        if parts.is_empty() {
            None
        } else {
            Some(format!(
                "Failed to delete '{}' from {}",
                self.filename,
                parts.join("; ")
            ))
        }
    }

    /// Map the outcome onto the HTTP contract: any backend error wins,
    /// then success, and "not found" only when nothing failed.
    pub fn into_result(self) -> Result<DeletionOutcome, AppError> {
        if self.has_error() {
            Err(AppError::Deletion(self))
        } else if self.success() {
            Ok(self)
        } else {
            Err(AppError::NotFound("File not found in any storage".to_string()))
        }
    }
}

fn describe(status: &BackendStatus) -> String {
    match status {
        BackendStatus::Error(reason) => format!("error ({})", reason),
        other => other.as_str().replace('_', " "),
    }
}

/// What a committed upload produced
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub filename: String,
    pub size: u64,
    pub remote_id: RemoteObjectId,
    pub remote_url: String,
}

/// Read-only reconciliation check for one name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VerificationReport {
    pub filename: String,
    pub exists_in_local: bool,
    pub exists_in_mega: bool,
    pub fully_deleted: bool,
}

impl VerificationReport {
    pub fn new(filename: impl Into<String>, exists_in_local: bool, exists_in_mega: bool) -> Self {
        Self {
            filename: filename.into(),
            exists_in_local,
            exists_in_mega,
            fully_deleted: !(exists_in_local || exists_in_mega),
        }
    }
}
