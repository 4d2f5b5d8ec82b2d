use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::{RemoteError, RemoteObject, RemoteObjectId, RemoteSession, RemoteStorage};

struct StoredObject {
    id: RemoteObjectId,
    name: String,
    data: Bytes,
    /// Set once deleted: number of further listings that still show the object
    visible_for: Option<u32>,
}

#[derive(Default)]
struct MemoryState {
    objects: Mutex<Vec<StoredObject>>,
    fail_authentication: AtomicBool,
    failing_uploads: AtomicU32,
    failing_links: AtomicU32,
    failing_listings: AtomicU32,
    /// 1-based listing calls that fail regardless of `failing_listings`
    failing_listing_calls: Mutex<Vec<u32>>,
    failing_deletes: AtomicU32,
    ignore_deletes: AtomicBool,
    delete_lag: AtomicU32,
    list_calls: AtomicU32,
    delete_calls: AtomicU32,
}

impl MemoryState {
    fn objects(&self) -> MutexGuard<'_, Vec<StoredObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Consume one injected failure, if any are left
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// In-process remote backend.
///
/// Behaves like an eventually consistent object store whose faults can be
/// scripted, which is what the reconciliation paths need to be exercised.
#[derive(Default)]
pub struct MemoryRemoteStorage {
    state: Arc<MemoryState>,
}

impl MemoryRemoteStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_authentication(&self, fail: bool) {
        self.state.fail_authentication.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_uploads(&self, count: u32) {
        self.state.failing_uploads.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_links(&self, count: u32) {
        self.state.failing_links.store(count, Ordering::SeqCst);
    }

    /// Fail the `call`-th listing (counted from 1 across the backend's lifetime)
    pub fn fail_listing_call(&self, call: u32) {
        self.state
            .failing_listing_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn fail_next_listings(&self, count: u32) {
        self.state.failing_listings.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_deletes(&self, count: u32) {
        self.state.failing_deletes.store(count, Ordering::SeqCst);
    }

    /// Acknowledge deletes without removing anything
    pub fn ignore_deletes(&self, ignore: bool) {
        self.state.ignore_deletes.store(ignore, Ordering::SeqCst);
    }

    /// Deleted objects keep showing up in the next `listings` listings
    pub fn delay_delete_visibility(&self, listings: u32) {
        self.state.delete_lag.store(listings, Ordering::SeqCst);
    }

    /// Store an object directly, bypassing fault injection
    pub fn insert(&self, name: &str, data: impl Into<Bytes>) -> RemoteObjectId {
        let id = RemoteObjectId::new(Uuid::new_v4().to_string());
        self.state.objects().push(StoredObject {
            id: id.clone(),
            name: name.to_string(),
            data: data.into(),
            visible_for: None,
        });
        id
    }

    /// Names of objects that have not been deleted
    pub fn object_names(&self) -> Vec<String> {
        self.state
            .objects()
            .iter()
            .filter(|o| o.visible_for.is_none())
            .map(|o| o.name.clone())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.object_names().iter().any(|n| n == name)
    }

    pub fn content(&self, name: &str) -> Option<Bytes> {
        self.state
            .objects()
            .iter()
            .find(|o| o.name == name && o.visible_for.is_none())
            .map(|o| o.data.clone())
    }

    pub fn list_calls(&self) -> u32 {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u32 {
        self.state.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStorage for MemoryRemoteStorage {
    async fn authenticate(&self) -> Result<Arc<dyn RemoteSession>, RemoteError> {
        if self.state.fail_authentication.load(Ordering::SeqCst) {
            return Err(RemoteError::Authentication("invalid credentials".to_string()));
        }
        Ok(Arc::new(MemorySession {
            state: self.state.clone(),
        }))
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

struct MemorySession {
    state: Arc<MemoryState>,
}

#[async_trait]
impl RemoteSession for MemorySession {
    async fn upload(&self, path: &Path, name: &str) -> Result<RemoteObjectId, RemoteError> {
        if take_failure(&self.state.failing_uploads) {
            return Err(RemoteError::Upload("simulated upload failure".to_string()));
        }

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| RemoteError::Upload(format!("{}: {}", path.display(), e)))?;

        let id = RemoteObjectId::new(Uuid::new_v4().to_string());
        self.state.objects().push(StoredObject {
            id: id.clone(),
            name: name.to_string(),
            data: Bytes::from(data),
            visible_for: None,
        });
        Ok(id)
    }

    async fn upload_link(&self, id: &RemoteObjectId) -> Result<String, RemoteError> {
        if take_failure(&self.state.failing_links) {
            return Err(RemoteError::Link("simulated link failure".to_string()));
        }

        let objects = self.state.objects();
        objects
            .iter()
            .find(|o| &o.id == id)
            .map(|o| format!("memory://{}/{}", o.id, o.name))
            .ok_or_else(|| RemoteError::Link(format!("unknown object {}", id)))
    }

    async fn list(&self) -> Result<Vec<RemoteObject>, RemoteError> {
        let call = self.state.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let scheduled = self
            .state
            .failing_listing_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&call);
        if scheduled || take_failure(&self.state.failing_listings) {
            return Err(RemoteError::Listing("simulated listing failure".to_string()));
        }

        let mut objects = self.state.objects();
        objects.retain(|o| o.visible_for != Some(0));

        let listing = objects
            .iter()
            .map(|o| RemoteObject {
                id: o.id.clone(),
                name: o.name.clone(),
                size: o.data.len() as u64,
            })
            .collect();

        for object in objects.iter_mut() {
            if let Some(remaining) = object.visible_for.as_mut() {
                *remaining = remaining.saturating_sub(1);
            }
        }

        Ok(listing)
    }

    async fn delete(&self, id: &RemoteObjectId) -> Result<(), RemoteError> {
        self.state.delete_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.state.failing_deletes) {
            return Err(RemoteError::Delete("simulated delete failure".to_string()));
        }
        if self.state.ignore_deletes.load(Ordering::SeqCst) {
            return Ok(());
        }

        let lag = self.state.delete_lag.load(Ordering::SeqCst);
        let mut objects = self.state.objects();
        if lag == 0 {
            objects.retain(|o| &o.id != id);
        } else if let Some(object) = objects
            .iter_mut()
            .find(|o| &o.id == id && o.visible_for.is_none())
        {
            object.visible_for = Some(lag);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_first_match() {
        let remote = MemoryRemoteStorage::new();
        let first = remote.insert("dup.txt", "one");
        remote.insert("dup.txt", "two");
        remote.insert("other.txt", "three");

        let session = remote.authenticate().await.unwrap();
        assert_eq!(session.resolve_id("dup.txt").await, Some(first));
        assert_eq!(session.resolve_id("missing.txt").await, None);
    }

    #[tokio::test]
    async fn test_resolve_swallows_listing_errors() {
        let remote = MemoryRemoteStorage::new();
        remote.insert("a.txt", "a");
        remote.fail_next_listings(1);

        let session = remote.authenticate().await.unwrap();
        assert_eq!(session.resolve_id("a.txt").await, None);
        // Failure budget used up; next lookup sees the object
        assert!(session.resolve_id("a.txt").await.is_some());
    }

    #[tokio::test]
    async fn test_try_resolve_reports_listing_errors() {
        let remote = MemoryRemoteStorage::new();
        remote.fail_next_listings(1);

        let session = remote.authenticate().await.unwrap();
        assert!(matches!(
            session.try_resolve_id("a.txt").await,
            Err(RemoteError::Listing(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_specific_listing_call() {
        let remote = MemoryRemoteStorage::new();
        remote.insert("a.txt", "a");
        remote.fail_listing_call(2);

        let session = remote.authenticate().await.unwrap();
        assert!(session.try_resolve_id("a.txt").await.unwrap().is_some());
        assert!(session.try_resolve_id("a.txt").await.is_err());
        assert!(session.try_resolve_id("a.txt").await.unwrap().is_some());
        assert_eq!(remote.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_delete_visibility_lag() {
        let remote = MemoryRemoteStorage::new();
        let id = remote.insert("lag.txt", "x");
        remote.delay_delete_visibility(1);

        let session = remote.authenticate().await.unwrap();
        session.delete(&id).await.unwrap();
        assert!(!remote.contains("lag.txt"));

        assert!(session.resolve_id("lag.txt").await.is_some());
        assert!(session.resolve_id("lag.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_authentication_failure() {
        let remote = MemoryRemoteStorage::new();
        remote.fail_authentication(true);
        assert!(matches!(
            remote.authenticate().await,
            Err(RemoteError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_and_link() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let remote = MemoryRemoteStorage::new();
        let session = remote.authenticate().await.unwrap();
        let id = session.upload(&path, "hello.txt").await.unwrap();

        assert_eq!(remote.content("hello.txt").unwrap(), Bytes::from_static(b"hello"));
        let link = session.upload_link(&id).await.unwrap();
        assert!(link.ends_with("/hello.txt"));
    }
}
