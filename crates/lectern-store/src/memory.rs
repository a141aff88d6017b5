use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, StoreError};
use crate::store::DurableStore;

/// In-memory [`DurableStore`] for tests and ephemeral sessions.
///
/// Writes can be made to fail on demand so callers can exercise their
/// write-failure handling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail with [`StoreError::Unavailable`].
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DurableStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.locked().get(key).cloned())
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if self.reject_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("writes rejected".into()));
        }
        self.locked().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_raw(&self, key: &str) -> Result<()> {
        self.locked().remove(key);
        Ok(())
    }
}
