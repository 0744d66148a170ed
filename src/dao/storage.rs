use std::{io, path::Path};

use thiserror::Error;

/// Result alias for local persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised while writing the local snapshot, regardless of the backing slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to encode local snapshot")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write local snapshot to `{path}`")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Construct a write error for the given slot path.
    pub fn write(path: &Path, source: io::Error) -> Self {
        StorageError::Write {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(source: serde_json::Error) -> Self {
        StorageError::Encode { source }
    }
}
