//! Environment/runtime helpers
//!
//! Sanity checks to ensure the directories the client writes to exist at startup.

use std::path::Path;

use tracing::debug;

/// Ensure the parent directory of a state file exists so the first write succeeds.
pub async fn ensure_parent_dir(file_path: impl AsRef<Path>) -> anyhow::Result<()> {
    let file_path = file_path.as_ref();
    let Some(parent) = file_path.parent() else { return Ok(()) };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    if tokio::fs::metadata(parent).await.is_err() {
        debug!(dir = %parent.display(), "creating state directory");
    }
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_parent() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("movieflix_env_{}", uuid::Uuid::new_v4()));
        let file = root.join("nested").join("session.json");
        ensure_parent_dir(&file).await?;
        assert!(tokio::fs::metadata(root.join("nested")).await?.is_dir());

        // bare file names have no directory to create
        ensure_parent_dir("session.json").await?;

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
