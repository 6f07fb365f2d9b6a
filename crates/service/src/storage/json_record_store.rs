use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::errors::StorageError;

/// Generic JSON file holding at most one record.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a reader sees either the previous record or the new one. An
/// unreadable or corrupt file loads as no record.
pub struct JsonRecordStore<T> {
    file_path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonRecordStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into(), _record: PhantomData }
    }

    pub fn path(&self) -> &Path { &self.file_path }

    pub async fn load(&self) -> Result<Option<T>, StorageError> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<T>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %self.file_path.display(), error = %e, "discarding unreadable record");
                Ok(None)
            }
        }
    }

    /// Replace the stored record.
    pub async fn save(&self, record: &T) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(record)?;
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        if let Err(e) = write_private(&tmp, &data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(path = %self.file_path.display(), "record saved");
        Ok(())
    }

    /// Delete the stored record; a missing file counts as cleared.
    pub async fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "record".to_string());
        self.file_path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4()))
    }
}

/// The record carries a bearer token, so the file is owner-only on unix.
async fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}
