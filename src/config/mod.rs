use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::retry::RetryPolicy;

/// Which remote storage implementation backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteBackendKind {
    /// S3-compatible object storage account
    S3,
    /// In-process store, for development and tests
    Memory,
}

impl RemoteBackendKind {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "s3" | "minio" => Self::S3,
            "memory" | "mem" => Self::Memory,
            other => {
                tracing::warn!("Unknown remote backend '{}', using s3", other);
                Self::S3
            }
        }
    }
}

/// Credentials and addressing for the remote object storage account
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub backend: RemoteBackendKind,

    /// Custom endpoint (MinIO, R2, ...). `None` uses the AWS default.
    pub endpoint: Option<String>,

    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: String,

    /// Key prefix under which all uploaded objects live (default: "files/")
    pub prefix: String,

    /// Lifetime of the shareable links returned by uploads (default: 7 days)
    pub link_expiry: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: RemoteBackendKind::S3,
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key: None,
            secret_key: None,
            bucket: "file-gateway".to_string(),
            prefix: "files/".to_string(),
            link_expiry: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Gateway configuration, built once at startup and passed into the app state
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Shared secret expected in `Authorization: Bearer <token>`
    pub api_token: String,

    /// Maximum upload size in bytes (default: 16 MB)
    pub max_upload_size: usize,

    /// Directory holding the local copies (default: "shared_files")
    pub local_store_path: PathBuf,

    /// Directory receiving in-flight uploads (default: "temp_uploads")
    pub staging_path: PathBuf,

    /// Bounded retry applied to the remote delete-confirm cycle (default: 3 x 1s)
    pub delete_retry: RetryPolicy,

    pub remote: RemoteConfig,
}

impl GatewayConfig {
    pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024; // 16 MB

    /// Load configuration from environment variables.
    ///
    /// Fails when `TOKEN` is missing, since every `/api` route depends on it.
    pub fn from_env() -> Result<Self> {
        let api_token = env::var("TOKEN").unwrap_or_default();
        if api_token.trim().is_empty() {
            bail!("TOKEN not found in environment variables. Check your .env file");
        }

        let default_remote = RemoteConfig::default();
        let default_retry = RetryPolicy::default();

        let remote = RemoteConfig {
            backend: env::var("REMOTE_BACKEND")
                .map(|v| RemoteBackendKind::parse(&v))
                .unwrap_or(default_remote.backend),
            endpoint: env::var("REMOTE_ENDPOINT").ok().filter(|v| !v.is_empty()),
            region: env::var("REMOTE_REGION").unwrap_or(default_remote.region),
            access_key: env::var("REMOTE_ACCESS_KEY").ok(),
            secret_key: env::var("REMOTE_SECRET_KEY").ok(),
            bucket: env::var("REMOTE_BUCKET").unwrap_or(default_remote.bucket),
            prefix: env::var("REMOTE_PREFIX")
                .map(|p| normalize_prefix(&p))
                .unwrap_or(default_remote.prefix),
            link_expiry: env::var("REMOTE_LINK_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default_remote.link_expiry),
        };

        Ok(Self {
            api_token,

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Self::DEFAULT_MAX_UPLOAD_SIZE),

            local_store_path: env::var("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("shared_files")),

            staging_path: env::var("STAGING_FOLDER")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("temp_uploads")),

            delete_retry: RetryPolicy {
                max_attempts: env::var("DELETE_RETRY_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default_retry.max_attempts),
                delay: env::var("DELETE_RETRY_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(default_retry.delay),
            },

            remote,
        })
    }

    /// Create config for development: in-memory remote, no retry delay,
    /// directories rooted under `root`.
    pub fn development(api_token: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            api_token: api_token.into(),
            max_upload_size: Self::DEFAULT_MAX_UPLOAD_SIZE,
            local_store_path: root.join("shared_files"),
            staging_path: root.join("temp_uploads"),
            delete_retry: RetryPolicy {
                max_attempts: 3,
                delay: Duration::ZERO,
            },
            remote: RemoteConfig {
                backend: RemoteBackendKind::Memory,
                ..RemoteConfig::default()
            },
        }
    }
}

/// Ensure a non-empty prefix ends with exactly one '/'
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}
