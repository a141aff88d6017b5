//! Durable key/value persistence for fetched corpora.
//!
//! The store is the offline source of truth: once a translation has been
//! fetched once it is served from here across restarts. There is exactly one
//! writer (the loader) and many readers; staleness is handled by the
//! in-memory working set, not by versioning.

mod error;
mod memory;
mod sled_store;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sled_store::SledStore;
pub use store::DurableStore;
