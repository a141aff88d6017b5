//! Offline-first corpus reading library.
//!
//! [`Library`] is the composition root: it wires the durable store, the
//! streaming corpus loader and the in-memory working-set cache together and
//! exposes the read surface the presentation layer consumes: load a
//! translation with progress, look up a chapter or verse, and warm the
//! chapters around the reader's position in the background.

mod config;
mod library;

pub use config::LibraryConfig;
pub use library::{CachedDoc, Library};

pub use lectern_cache::{CacheStats, WorkingSet, queue_adjacent_chapters};
pub use lectern_corpus::{BOOK_ORDER, Book, ChapterText, Corpus, chapter_key, translation_key};
pub use lectern_fetch::{CorpusLoader, HttpBody, HttpClient, LoadError, ProgressFn};
pub use lectern_store::{DurableStore, MemoryStore, SledStore, StoreError};

#[cfg(feature = "reqwest")]
pub use lectern_fetch::ReqwestClient;
