use chrono::{DateTime, Local};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use utoipa::ToSchema;

use crate::services::staging::StagedUpload;

/// A file in the local store, recomputed from `stat` on every request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub modification_date: String,
}

/// Directory of files addressed by sanitized name. The directory itself is
/// the index; nothing is cached.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for an already sanitized name
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub async fn list(&self) -> io::Result<Vec<FileRecord>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut records = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // In-flight commits and other dot-files are not part of the store
            if name.starts_with('.') {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                // Removed between read_dir and stat
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };

            records.push(FileRecord {
                name,
                size: metadata.len(),
                modification_date: format_modified(&metadata),
            });
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    pub async fn exists(&self, name: &str) -> bool {
        fs::metadata(self.path_for(name))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Open a stored file for streaming, together with its size
    pub async fn open(&self, name: &str) -> io::Result<Option<(fs::File, u64)>> {
        let path = self.path_for(name);
        match fs::metadata(&path).await {
            Ok(m) if m.is_file() => {
                let file = fs::File::open(&path).await?;
                Ok(Some((file, m.len())))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove a stored file. `Ok(false)` when there was nothing to remove.
    pub async fn remove(&self, name: &str) -> io::Result<bool> {
        let path = self.path_for(name);
        match fs::metadata(&path).await {
            Ok(m) if m.is_file() => {}
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        }

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            // Lost a race with another delete of the same name
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Move a staged upload into the store under its name, replacing any
    /// previous file. This is the commit point of an upload.
    pub async fn commit(&self, staged: StagedUpload) -> io::Result<PathBuf> {
        let target = self.path_for(staged.name());

        match fs::rename(staged.path(), &target).await {
            Ok(()) => {}
            Err(e) => {
                // Staging and store on different filesystems: copy into a
                // temp file next to the target, then rename over it.
                tracing::debug!("rename into local store failed ({}), copying instead", e);
                let source = staged.path().to_path_buf();
                let root = self.root.clone();
                let dest = target.clone();
                tokio::task::spawn_blocking(move || -> io::Result<()> {
                    let mut tmp = tempfile::Builder::new().prefix(".commit-").tempfile_in(&root)?;
                    let mut src = std::fs::File::open(&source)?;
                    io::copy(&mut src, tmp.as_file_mut())?;
                    tmp.as_file().sync_all()?;
                    tmp.persist(&dest).map_err(|e| e.error)?;
                    Ok(())
                })
                .await
                .map_err(io::Error::other)??;
            }
        }

        // The staging directory (now without the file) is removed here
        drop(staged);
        Ok(target)
    }
}

fn format_modified(metadata: &std::fs::Metadata) -> String {
    metadata
        .modified()
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::staging::StagingArea;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_list_skips_dirs_and_dotfiles() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        fs::write(dir.path().join("b.txt"), b"bb").await.unwrap();
        fs::write(dir.path().join("a.txt"), b"a").await.unwrap();
        fs::write(dir.path().join(".commit-xyz"), b"tmp").await.unwrap();
        fs::create_dir(dir.path().join("subdir")).await.unwrap();

        let records = store.list().await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(records[1].size, 2);
        assert_eq!(records[0].modification_date.len(), "2024-01-01 00:00:00".len());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        fs::write(store.path_for("gone.txt"), b"x").await.unwrap();

        assert!(store.exists("gone.txt").await);
        assert!(store.remove("gone.txt").await.unwrap());
        assert!(!store.exists("gone.txt").await);
        assert!(!store.remove("gone.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_ignores_directories() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        fs::create_dir(store.path_for("folder")).await.unwrap();

        assert!(!store.remove("folder").await.unwrap());
        assert!(store.path_for("folder").is_dir());
    }

    #[tokio::test]
    async fn test_commit_replaces_existing() {
        let dir = tempdir().unwrap();
        let store_dir = dir.path().join("store");
        let staging_dir = dir.path().join("staging");
        fs::create_dir_all(&store_dir).await.unwrap();
        fs::create_dir_all(&staging_dir).await.unwrap();

        let store = LocalStore::new(&store_dir);
        let staging = StagingArea::new(&staging_dir);
        fs::write(store.path_for("doc.txt"), b"old").await.unwrap();

        let staged = staging
            .stage("doc.txt", &b"new content"[..], 1024)
            .await
            .unwrap();
        let staged_dir = staged.path().parent().unwrap().to_path_buf();

        store.commit(staged).await.unwrap();

        assert_eq!(fs::read(store.path_for("doc.txt")).await.unwrap(), b"new content");
        assert!(!staged_dir.exists());
    }

    #[tokio::test]
    async fn test_open_missing() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.open("nope.bin").await.unwrap().is_none());
    }
}
