use crate::api::error::AppError;
use crate::services::remote::{RemoteError, RemoteObjectId, RemoteSession};
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

use super::{FileService, types::UploadReceipt};

fn upload_error(e: RemoteError) -> AppError {
    error!("❌ {}", e);
    AppError::Upload(e.to_string())
}

/// Undo a remote upload that will not be committed
async fn discard_remote(session: &dyn RemoteSession, remote_id: &RemoteObjectId) {
    if let Err(cleanup) = session.delete(remote_id).await {
        warn!(
            "⚠️  Could not remove remote object {} after failed upload: {}",
            remote_id, cleanup
        );
    }
}

impl FileService {
    /// Stage -> upload to remote -> fetch the share link -> commit locally.
    ///
    /// `filename` must already be sanitized. A failure at any step leaves
    /// nothing behind in either backend.
    pub async fn upload<R>(&self, filename: &str, reader: R) -> Result<UploadReceipt, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        // 1. Receive into the staging area; dropped (and removed) on every early return
        let staged = self
            .staging
            .stage(filename, reader, self.max_upload_size)
            .await?;
        let size = staged.size();
        info!("📦 Staged '{}' ({} bytes)", filename, size);

        // 2. Remote first, so a failure here leaves no local file
        let session = self.remote.authenticate().await.map_err(upload_error)?;
        let remote_id = session
            .upload(staged.path(), filename)
            .await
            .map_err(upload_error)?;
        info!("☁️  Uploaded '{}' to {} storage as {}", filename, self.remote.kind(), remote_id);

        // 3. Share link, while nothing is committed locally yet
        let remote_url = match session.upload_link(&remote_id).await {
            Ok(url) => url,
            Err(e) => {
                discard_remote(session.as_ref(), &remote_id).await;
                return Err(upload_error(e));
            }
        };

        // 4. Commit point: the staged file moves into the local store
        if let Err(e) = self.local.commit(staged).await {
            error!("❌ Local commit of '{}' failed: {}", filename, e);
            discard_remote(session.as_ref(), &remote_id).await;
            return Err(AppError::Internal(format!(
                "Failed to store '{}' locally: {}",
                filename, e
            )));
        }
        info!("💾 Committed '{}' to local store", filename);

        Ok(UploadReceipt {
            filename: filename.to_string(),
            size,
            remote_id,
            remote_url,
        })
    }
}
