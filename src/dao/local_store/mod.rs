mod file;
mod memory;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use futures::future::BoxFuture;
use tracing::warn;

use crate::dao::{models::LocalSnapshot, storage::StorageResult};

/// Durable single-slot storage for the full local snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Overwrite the slot with `snapshot`. Readers never observe a partial write.
    fn save(&self, snapshot: LocalSnapshot) -> BoxFuture<'static, StorageResult<()>>;
    /// Read the slot back. Missing, unreadable or corrupt payloads all yield `None`.
    fn load(&self) -> BoxFuture<'static, Option<LocalSnapshot>>;
}

/// Decode a stored payload, logging and discarding anything malformed.
fn decode_snapshot(raw: &str, origin: &str) -> Option<LocalSnapshot> {
    match serde_json::from_str::<LocalSnapshot>(raw) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(origin, error = %err, "stored snapshot is corrupt; starting from empty state");
            None
        }
    }
}
