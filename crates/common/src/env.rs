//! Environment/runtime helpers
//!
//! Sanity checks run once at startup, before the store is opened.

use std::path::Path;

use tracing::debug;

/// Ensure the parent directory of a file-backed store exists.
pub async fn ensure_parent_dir(file: &Path) -> anyhow::Result<()> {
    let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    debug!(dir = %dir.display(), "data directory ready");
    Ok(())
}
