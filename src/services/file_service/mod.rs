use crate::config::GatewayConfig;
use crate::services::local_store::LocalStore;
use crate::services::remote::RemoteStorage;
use crate::services::staging::StagingArea;
use crate::utils::retry::RetryPolicy;
use std::sync::Arc;

pub mod delete;
pub mod types;
pub mod upload;

pub use types::{BackendStatus, DeletionOutcome, UploadReceipt, VerificationReport};

/// Coordinates the file lifecycle across the local store and the remote
/// account. Holds no per-request state; the two backends are the only
/// shared resources.
pub struct FileService {
    local: LocalStore,
    staging: StagingArea,
    remote: Arc<dyn RemoteStorage>,
    delete_retry: RetryPolicy,
    max_upload_size: usize,
}

impl FileService {
    pub fn new(
        local: LocalStore,
        staging: StagingArea,
        remote: Arc<dyn RemoteStorage>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            local,
            staging,
            remote,
            delete_retry: config.delete_retry,
            max_upload_size: config.max_upload_size,
        }
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }
}
