use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{RemoteError, RemoteObject, RemoteObjectId, RemoteSession, RemoteStorage};

/// S3-compatible remote account.
///
/// Objects are stored as `{prefix}{uuid}/{name}`: the whole key is the
/// opaque id, the last segment is the display name.
pub struct S3RemoteStorage {
    client: Client,
    bucket: String,
    prefix: String,
    link_expiry: Duration,
}

impl S3RemoteStorage {
    pub fn new(client: Client, bucket: String, prefix: String, link_expiry: Duration) -> Self {
        Self {
            client,
            bucket,
            prefix,
            link_expiry,
        }
    }
}

#[async_trait]
impl RemoteStorage for S3RemoteStorage {
    async fn authenticate(&self) -> Result<Arc<dyn RemoteSession>, RemoteError> {
        // HeadBucket fails fast on bad credentials or a missing bucket
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| RemoteError::Authentication(DisplayErrorContext(e).to_string()))?;

        Ok(Arc::new(S3Session {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            link_expiry: self.link_expiry,
        }))
    }

    fn kind(&self) -> &'static str {
        "s3"
    }
}

struct S3Session {
    client: Client,
    bucket: String,
    prefix: String,
    link_expiry: Duration,
}

/// Display name encoded in a key, if the key is one of ours
fn name_from_key<'k>(prefix: &str, key: &'k str) -> Option<&'k str> {
    let rest = key.strip_prefix(prefix)?;
    let (_uuid, name) = rest.split_once('/')?;
    (!name.is_empty() && !name.contains('/')).then_some(name)
}

#[async_trait]
impl RemoteSession for S3Session {
    async fn upload(&self, path: &Path, name: &str) -> Result<RemoteObjectId, RemoteError> {
        let key = format!("{}{}/{}", self.prefix, Uuid::new_v4(), name);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| RemoteError::Upload(format!("{}: {}", path.display(), e)))?;

        let content_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .to_string();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed: key={}, error={:?}", key, e);
                RemoteError::Upload(DisplayErrorContext(e).to_string())
            })?;

        Ok(RemoteObjectId::new(key))
    }

    async fn upload_link(&self, id: &RemoteObjectId) -> Result<String, RemoteError> {
        let presigning = PresigningConfig::expires_in(self.link_expiry)
            .map_err(|e| RemoteError::Link(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(id.as_str())
            .presigned(presigning)
            .await
            .map_err(|e| RemoteError::Link(DisplayErrorContext(e).to_string()))?;

        Ok(request.uri().to_string())
    }

    async fn list(&self) -> Result<Vec<RemoteObject>, RemoteError> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&self.prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| RemoteError::Listing(DisplayErrorContext(e).to_string()))?;

            for object in res.contents.unwrap_or_default() {
                let Some(key) = object.key else { continue };
                let Some(name) = name_from_key(&self.prefix, &key).map(str::to_string) else {
                    continue;
                };
                objects.push(RemoteObject {
                    id: RemoteObjectId::new(key),
                    name,
                    size: object.size.unwrap_or(0).max(0) as u64,
                });
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn delete(&self, id: &RemoteObjectId) -> Result<(), RemoteError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(id.as_str())
            .send()
            .await
            .map_err(|e| RemoteError::Delete(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }
}
