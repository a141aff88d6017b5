use std::time::Duration;

use tokio::time::Instant;

/// Book-keeping wrapper around one cached value.
///
/// Created on `set`; `last_accessed` and `access_count` refresh on every
/// successful `get`. Expiry is measured from creation, not last access.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    pub value: V,
    pub created: Instant,
    pub last_accessed: Instant,
    pub access_count: u64,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        let now = Instant::now();
        Self { value, created: now, last_accessed: now, access_count: 1 }
    }

    pub fn expired(&self, ttl: Duration) -> bool {
        self.created.elapsed() > ttl
    }

    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_accessed = Instant::now();
    }
}
