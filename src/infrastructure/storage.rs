use crate::config::{RemoteBackendKind, RemoteConfig};
use crate::services::remote::{MemoryRemoteStorage, RemoteStorage, S3RemoteStorage};
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the remote backend and check once that it accepts our credentials.
///
/// A failed check is only logged: every request authenticates on its own,
/// so the gateway can start before the remote side is reachable.
pub async fn setup_remote(config: &RemoteConfig) -> Arc<dyn RemoteStorage> {
    let remote: Arc<dyn RemoteStorage> = match config.backend {
        RemoteBackendKind::Memory => {
            warn!("☁️  Using in-memory remote storage; remote copies are lost on restart");
            Arc::new(MemoryRemoteStorage::new())
        }
        RemoteBackendKind::S3 => {
            info!(
                "☁️  S3 Storage: {} (Bucket: {}, Prefix: '{}')",
                config.endpoint.as_deref().unwrap_or("aws default"),
                config.bucket,
                config.prefix
            );
            Arc::new(S3RemoteStorage::new(
                build_s3_client(config).await,
                config.bucket.clone(),
                config.prefix.clone(),
                config.link_expiry,
            ))
        }
    };

    match remote.authenticate().await {
        Ok(_) => info!("✅ Remote storage ({}) authenticated", remote.kind()),
        Err(e) => warn!("⚠️  Remote storage not reachable at startup: {}", e),
    }

    remote
}

async fn build_s3_client(config: &RemoteConfig) -> aws_sdk_s3::Client {
    let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        ));
    }

    let aws_config = loader.load().await;

    // Self-hosted S3 endpoints generally need path-style addressing
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint.is_some())
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
