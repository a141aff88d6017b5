//! Streaming corpus acquisition with offline-first fallback.
//!
//! The [`CorpusLoader`] orchestrates durable-store lookup, streaming HTTP
//! fetch with byte-level progress, JSON decoding, best-effort extras
//! patching and write-through persistence. Network I/O goes through the
//! [`HttpClient`] trait; [`ReqwestClient`] is the production implementation
//! and tests script their own.

mod error;
mod http;
mod loader;
mod progress;

pub use error::LoadError;
pub use http::{BoxStream, HttpBody, HttpClient};
pub use loader::{CorpusLoader, FETCH_TIMEOUT};
pub use progress::{ProgressFn, TRANSFER_CAP, transfer_percent};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
