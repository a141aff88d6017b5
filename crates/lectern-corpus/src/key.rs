//! Cache and durable-store key construction.
//!
//! Keys are opaque strings to the cache; the loader and prefetch coordinator
//! own their construction through these helpers.

use std::fmt;

/// In-memory cache key for a whole translation.
pub fn translation_key(translation: &str) -> String {
    format!("bible:{translation}")
}

/// In-memory cache key for a single chapter.
pub fn chapter_key(translation: &str, book: &str, chapter: &str) -> String {
    format!("{translation}:{book}:{chapter}")
}

/// Durable-store key under which a persisted translation lives.
pub fn store_key(translation: &str) -> String {
    format!("bible-{translation}")
}

/// A chapter cache key split back into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterKey {
    pub translation: String,
    pub book: String,
    pub chapter: String,
}

impl ChapterKey {
    /// Parse `<translation>:<book>:<chapter>`.
    ///
    /// Translation ids and book names contain no colon, so the three-way
    /// split is unambiguous. Whole-translation keys (`bible:<id>`) and
    /// anything without a numeric chapter are rejected.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, ':');
        let translation = parts.next()?;
        let book = parts.next()?;
        let chapter = parts.next()?;
        if translation.is_empty() || book.is_empty() {
            return None;
        }
        chapter.parse::<u32>().ok()?;
        Some(Self {
            translation: translation.to_string(),
            book: book.to_string(),
            chapter: chapter.to_string(),
        })
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.translation, self.book, self.chapter)
    }
}
