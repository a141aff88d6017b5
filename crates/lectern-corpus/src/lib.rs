//! Data model for a hierarchical text corpus.
//!
//! A corpus is a three-level mapping: book name → chapter number → verse
//! number → verse text. Chapter and verse keys are numeric strings; the maps
//! themselves are unordered and consumers order keys numerically through the
//! helpers on [`Corpus`].

mod canon;
mod corpus;
mod key;

pub use canon::{BOOK_ORDER, canonical_index};
pub use corpus::{Book, ChapterText, Corpus};
pub use key::{ChapterKey, chapter_key, store_key, translation_key};
