use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum StageError {
    #[error("File exceeds the maximum upload size of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Failed to stage upload: {0}")]
    Io(#[from] io::Error),
}

/// Temporary holding directory for uploads that are not committed yet
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

/// An upload received into the staging area and owned by one request.
///
/// Lives in its own temp directory, named after the sanitized filename.
/// Dropping it removes the directory and anything left inside, so every
/// exit path cleans up; a commit moves the file out first.
#[derive(Debug)]
pub struct StagedUpload {
    dir: TempDir,
    path: PathBuf,
    name: String,
    size: u64,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `reader` to `<staging>/upload-XXXX/<name>`, rejecting anything
    /// larger than `max_size` bytes.
    pub async fn stage<R>(
        &self,
        name: &str,
        reader: R,
        max_size: usize,
    ) -> Result<StagedUpload, StageError>
    where
        R: AsyncRead + Unpin,
    {
        let dir = tempfile::Builder::new()
            .prefix("upload-")
            .tempdir_in(&self.root)?;
        let path = dir.path().join(name);

        let mut file = fs::File::create(&path).await?;
        // One byte past the limit is enough to know it was exceeded
        let mut limited = reader.take((max_size as u64).saturating_add(1));
        let size = tokio::io::copy(&mut limited, &mut file).await?;
        file.flush().await?;
        drop(file);

        if size > max_size as u64 {
            tracing::warn!("Upload '{}' exceeds {} bytes, discarding", name, max_size);
            return Err(StageError::TooLarge { limit: max_size });
        }

        tracing::debug!("Staged '{}' ({} bytes) at {}", name, size, path.display());
        Ok(StagedUpload {
            dir,
            path,
            name: name.to_string(),
            size,
        })
    }
}
