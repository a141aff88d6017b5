use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::canon::canonical_index;

/// Verse number (numeric string) to verse text.
pub type ChapterText = HashMap<String, String>;

/// Chapter number (numeric string) to chapter contents.
pub type Book = HashMap<String, ChapterText>;

/// The full book → chapter → verse mapping for one translation.
///
/// Once fetched, a corpus is immutable except for patch-merge additions
/// applied at load time; patches only ever add new top-level books
/// (see [`Corpus::merge_books`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus(HashMap<String, Book>);

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_book(&self, book: &str) -> bool {
        self.0.contains_key(book)
    }

    pub fn book(&self, book: &str) -> Option<&Book> {
        self.0.get(book)
    }

    pub fn chapter(&self, book: &str, chapter: &str) -> Option<&ChapterText> {
        self.0.get(book)?.get(chapter)
    }

    pub fn verse(&self, book: &str, chapter: &str, verse: &str) -> Option<&str> {
        self.chapter(book, chapter)?.get(verse).map(String::as_str)
    }

    /// Book names present, canonical books first in display order, then any
    /// supplemental books alphabetically.
    pub fn books(&self) -> Vec<&str> {
        let mut books: Vec<&str> = self.0.keys().map(String::as_str).collect();
        books.sort_by_key(|b| (canonical_index(b).unwrap_or(usize::MAX), *b));
        books
    }

    /// Chapter numbers of `book` in numeric order.
    pub fn chapters(&self, book: &str) -> Vec<&str> {
        self.0
            .get(book)
            .map(|b| sorted_numeric(b.keys()))
            .unwrap_or_default()
    }

    pub fn chapter_count(&self, book: &str) -> usize {
        self.0.get(book).map(HashMap::len).unwrap_or(0)
    }

    /// Verse numbers of a chapter in numeric order.
    pub fn verses(&self, book: &str, chapter: &str) -> Vec<&str> {
        self.chapter(book, chapter)
            .map(|c| sorted_numeric(c.keys()))
            .unwrap_or_default()
    }

    /// Merge a patch document into this corpus as additional books.
    ///
    /// Existing books are never rewritten. Returns the names of the books
    /// actually added.
    pub fn merge_books(&mut self, extras: HashMap<String, Book>) -> Vec<String> {
        let mut added = Vec::new();
        for (name, book) in extras {
            if let std::collections::hash_map::Entry::Vacant(slot) = self.0.entry(name.clone()) {
                slot.insert(book);
                added.push(name);
            }
        }
        added.sort();
        added
    }
}

/// Numeric-string sort; keys that fail to parse sort last.
fn sorted_numeric<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut keys: Vec<&str> = keys.map(String::as_str).collect();
    keys.sort_by_key(|k| k.parse::<u32>().unwrap_or(u32::MAX));
    keys
}
