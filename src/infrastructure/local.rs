use crate::config::GatewayConfig;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// Create the local store and staging directories, and clear staging
/// directories orphaned by a previous run.
pub async fn setup_local_dirs(config: &GatewayConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.local_store_path).await?;
    fs::create_dir_all(&config.staging_path).await?;

    info!("📂 Local store: {}", config.local_store_path.display());
    info!("📂 Staging area: {}", config.staging_path.display());

    let removed = clear_stale_staging(&config.staging_path).await?;
    if removed > 0 {
        info!("🧹 Removed {} stale staging directories", removed);
    }

    Ok(())
}

async fn clear_stale_staging(staging: &Path) -> anyhow::Result<usize> {
    let mut removed = 0;
    let mut entries = fs::read_dir(staging).await?;

    while let Some(entry) = entries.next_entry().await? {
        let stale = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with("upload-"));
        if !stale || !entry.file_type().await?.is_dir() {
            continue;
        }

        match fs::remove_dir_all(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("⚠️  Could not remove {}: {}", entry.path().display(), e),
        }
    }

    Ok(removed)
}
