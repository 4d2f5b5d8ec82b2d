use crate::services::remote::{RemoteError, RemoteSession};
use crate::utils::retry::Attempt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use super::FileService;
use super::types::{BackendStatus, DeletionOutcome, VerificationReport};

impl FileService {
    /// Delete `filename` (sanitized) from both backends and report what
    /// happened to each of them.
    ///
    /// Local removal does not depend on the remote side; the remote side is
    /// retried under `delete_retry` and only counts as deleted once a fresh
    /// lookup no longer finds the name.
    pub async fn delete(&self, filename: &str) -> DeletionOutcome {
        let local = match self.local.remove(filename).await {
            Ok(true) => {
                info!("🗑️  Removed '{}' from local store", filename);
                BackendStatus::Deleted
            }
            Ok(false) => BackendStatus::NotFound,
            Err(e) => {
                error!("❌ Failed to remove '{}' from local store: {}", filename, e);
                BackendStatus::Error(e.to_string())
            }
        };

        let remote = self.delete_remote(filename).await;

        let outcome = DeletionOutcome {
            filename: filename.to_string(),
            local,
            remote,
        };
        info!(
            filename,
            local = outcome.local.as_str(),
            remote = outcome.remote.as_str(),
            "Delete finished"
        );
        outcome
    }

    async fn delete_remote(&self, filename: &str) -> BackendStatus {
        let session = match self.remote.authenticate().await {
            Ok(session) => session,
            Err(e) => {
                error!("❌ {}", e);
                return BackendStatus::Error(e.to_string());
            }
        };
        let session: &dyn RemoteSession = session.as_ref();

        // Once a delete has been sent, later absence means we removed it
        let delete_sent = AtomicBool::new(false);
        let sent = &delete_sent;

        let result = self
            .delete_retry
            .run(
                move |attempt| delete_attempt(session, filename, sent, attempt),
                move || async move {
                    match session.try_resolve_id(filename).await {
                        Ok(None) => Some(absent_status(sent)),
                        Ok(Some(_)) => None,
                        Err(e) => {
                            warn!("Re-check for '{}' failed: {}", filename, e);
                            None
                        }
                    }
                },
            )
            .await;

        match result {
            Ok(Some(status)) => status,
            Ok(None) => {
                let reason = format!(
                    "'{}' still present after {} attempts",
                    filename,
                    self.delete_retry.max_attempts.max(1)
                );
                error!("❌ {}", reason);
                BackendStatus::Error(reason)
            }
            Err(e) => {
                error!("❌ Giving up on remote delete of '{}': {}", filename, e);
                BackendStatus::Error(e.to_string())
            }
        }
    }

    /// Local and remote existence of `filename`, without changing anything
    pub async fn verify_deletion(&self, filename: &str) -> Result<VerificationReport, RemoteError> {
        let exists_in_local = self.local.exists(filename).await;
        let session = self.remote.authenticate().await?;
        let exists_in_mega = session.resolve_id(filename).await.is_some();

        Ok(VerificationReport::new(
            filename,
            exists_in_local,
            exists_in_mega,
        ))
    }
}

fn absent_status(delete_sent: &AtomicBool) -> BackendStatus {
    if delete_sent.load(Ordering::SeqCst) {
        BackendStatus::Deleted
    } else {
        BackendStatus::NotFound
    }
}

/// resolve -> delete -> re-resolve
async fn delete_attempt(
    session: &dyn RemoteSession,
    filename: &str,
    delete_sent: &AtomicBool,
    attempt: u32,
) -> Result<Attempt<BackendStatus>, RemoteError> {
    let Some(id) = session.try_resolve_id(filename).await? else {
        // Nothing to delete, on the first attempt or after an earlier one
        return Ok(Attempt::Done(absent_status(delete_sent)));
    };

    debug!(attempt, "Deleting remote object {} for '{}'", id, filename);
    delete_sent.store(true, Ordering::SeqCst);
    session.delete(&id).await?;

    // Never trust the delete call itself; the listing is authoritative
    match session.try_resolve_id(filename).await? {
        None => {
            info!("☁️  Confirmed '{}' is gone from remote storage", filename);
            Ok(Attempt::Done(BackendStatus::Deleted))
        }
        Some(still_there) => {
            debug!(
                attempt,
                "'{}' still listed as {} after delete",
                filename,
                still_there
            );
            Ok(Attempt::Retry)
        }
    }
}
