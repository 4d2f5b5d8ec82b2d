use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod s3;

pub use memory::MemoryRemoteStorage;
pub use s3::S3RemoteStorage;

/// Identifier assigned by the remote backend on upload.
///
/// Opaque: it cannot be derived from the file name, so name -> id always
/// goes through a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteObjectId(String);

impl RemoteObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub id: RemoteObjectId,
    /// Display name stored with the object; not guaranteed unique
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("Remote authentication failed: {0}")]
    Authentication(String),

    #[error("Remote upload failed: {0}")]
    Upload(String),

    #[error("Failed to create remote link: {0}")]
    Link(String),

    #[error("Remote listing failed: {0}")]
    Listing(String),

    #[error("Remote delete failed: {0}")]
    Delete(String),
}

/// Entry point to the remote account. Every request authenticates and works
/// through the returned session.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    async fn authenticate(&self) -> Result<Arc<dyn RemoteSession>, RemoteError>;

    /// Short backend name for logs and health output
    fn kind(&self) -> &'static str;
}

/// Authenticated handle on the remote account
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Upload the file at `path`, stored under display name `name`
    async fn upload(&self, path: &Path, name: &str) -> Result<RemoteObjectId, RemoteError>;

    /// Shareable URL for an uploaded object
    async fn upload_link(&self, id: &RemoteObjectId) -> Result<String, RemoteError>;

    /// Every object in the account, in backend order
    async fn list(&self) -> Result<Vec<RemoteObject>, RemoteError>;

    async fn delete(&self, id: &RemoteObjectId) -> Result<(), RemoteError>;

    /// Name -> id by linear scan of the full listing, first match wins.
    ///
    /// O(total remote objects). Never cache the result across a mutating
    /// call; re-resolve instead.
    async fn try_resolve_id(&self, name: &str) -> Result<Option<RemoteObjectId>, RemoteError> {
        let objects = self.list().await?;
        Ok(objects
            .into_iter()
            .find(|object| object.name == name)
            .map(|object| object.id))
    }

    /// Like [`try_resolve_id`](Self::try_resolve_id), but a failed listing is
    /// logged and reported as "no match".
    async fn resolve_id(&self, name: &str) -> Option<RemoteObjectId> {
        match self.try_resolve_id(name).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Could not resolve '{}' on remote storage: {}", name, e);
                None
            }
        }
    }
}
