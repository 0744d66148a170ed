use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::dao::{models::LocalSnapshot, storage::StorageResult};

use super::{SnapshotStore, decode_snapshot};

/// In-process snapshot slot. Still goes through JSON so it behaves like the file slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySnapshotStore {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with an arbitrary payload, corrupt or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// Raw payload currently held by the slot.
    pub async fn raw(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, snapshot: LocalSnapshot) -> BoxFuture<'static, StorageResult<()>> {
        let slot = self.slot.clone();
        Box::pin(async move {
            let body = serde_json::to_string(&snapshot)?;
            *slot.lock().await = Some(body);
            Ok(())
        })
    }

    fn load(&self) -> BoxFuture<'static, Option<LocalSnapshot>> {
        let slot = self.slot.clone();
        Box::pin(async move {
            let raw = slot.lock().await.clone()?;
            decode_snapshot(&raw, "memory")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn corrupt_payload_is_treated_as_empty() {
        let store = MemorySnapshotStore::with_raw("[[[");
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn empty_slot_loads_as_none() {
        assert!(MemorySnapshotStore::new().load().await.is_none());
    }
}
