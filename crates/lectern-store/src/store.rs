use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Asynchronous durable key/value persistence.
///
/// Documents are stored as raw bytes; the JSON helpers layer serde on top so
/// callers deal in typed values. Implementations: [`SledStore`] in
/// production, [`MemoryStore`] in tests.
///
/// [`SledStore`]: crate::SledStore
/// [`MemoryStore`]: crate::MemoryStore
pub trait DurableStore: Send + Sync {
    /// Fetch the raw document stored under `key`, if any.
    fn get_raw(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store `value` under `key`, replacing any previous document.
    fn put_raw(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Remove the document stored under `key`, if any.
    fn delete_raw(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Fetch and deserialize a JSON document.
    fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>>> + Send {
        async move {
            match self.get_raw(key).await? {
                Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
                None => Ok(None),
            }
        }
    }

    /// Serialize and store a JSON document.
    fn put_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            let raw = serde_json::to_vec(value)?;
            self.put_raw(key, raw).await
        }
    }
}

impl<S: DurableStore> DurableStore for std::sync::Arc<S> {
    fn get_raw(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send {
        S::get_raw(self, key)
    }

    fn put_raw(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send {
        S::put_raw(self, key, value)
    }

    fn delete_raw(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        S::delete_raw(self, key)
    }
}
