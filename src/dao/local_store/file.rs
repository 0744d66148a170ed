use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::fs;
use tracing::{debug, warn};

use crate::dao::{
    models::LocalSnapshot,
    storage::{StorageError, StorageResult},
};

use super::{SnapshotStore, decode_snapshot};

/// Snapshot slot backed by a JSON file, replaced atomically through a sibling temp file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: Arc<PathBuf>,
}

impl FileSnapshotStore {
    /// Use `path` as the durable slot. Parent directories are created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    /// Location of the slot on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn write(&self, snapshot: &LocalSnapshot) -> StorageResult<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::write(parent, source))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, &body)
            .await
            .map_err(|source| StorageError::write(&temp, source))?;
        fs::rename(&temp, self.path.as_path())
            .await
            .map_err(|source| StorageError::write(&self.path, source))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, snapshot: LocalSnapshot) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write(&snapshot).await })
    }

    fn load(&self) -> BoxFuture<'static, Option<LocalSnapshot>> {
        let store = self.clone();
        Box::pin(async move {
            let path = store.path();
            match fs::read_to_string(path).await {
                Ok(raw) => decode_snapshot(&raw, &path.display().to_string()),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no local snapshot yet");
                    None
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to read local snapshot");
                    None
                }
            }
        })
    }
}
