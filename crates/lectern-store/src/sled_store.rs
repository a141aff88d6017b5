use std::path::Path;

use crate::error::Result;
use crate::store::DurableStore;

/// Durable store backed by an embedded [`sled`] database.
///
/// Sled operations are fast enough to run inline on the async executor; the
/// database flushes in the background on its own cadence.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Wrap an already-open database handle.
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }
}

impl DurableStore for SledStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    async fn delete_raw(&self, key: &str) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }
}
