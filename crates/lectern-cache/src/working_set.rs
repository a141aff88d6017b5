use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::entry::CacheEntry;

/// How many queued keys one drain cycle fetches before yielding.
const PREFETCH_BATCH: usize = 3;

/// Pause between drain cycles, so successive batches are chained through the
/// timer instead of recursing and the executor is never starved.
const DRAIN_PAUSE: Duration = Duration::from_millis(100);

/// Default cadence of the background expiry sweep.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Aggregate cache counters, mostly for diagnostics surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub total_accesses: u64,
    pub avg_age: Duration,
}

/// Bounded in-memory cache with LRU eviction, TTL expiry and a deduplicated
/// background prefetch queue.
///
/// Keys are opaque strings; values are generic. Entries expire `ttl` after
/// creation, checked lazily on `get`/`has` and eagerly by
/// [`WorkingSet::sweep_expired`]. The backing map is only mutated in
/// synchronous sections between await points; the drain flag is the sole
/// mutual-exclusion mechanism for the prefetch queue.
pub struct WorkingSet<V> {
    state: Mutex<State<V>>,
    max_size: usize,
    ttl: Duration,
    draining: AtomicBool,
}

struct State<V> {
    entries: HashMap<String, CacheEntry<V>>,
    prefetch_queue: VecDeque<String>,
}

impl<V> WorkingSet<V> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(State { entries: HashMap::new(), prefetch_queue: VecDeque::new() }),
            max_size,
            ttl,
            draining: AtomicBool::new(false),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.locked().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().entries.is_empty()
    }

    /// Look up `key`, refreshing its recency metadata on a hit.
    ///
    /// An entry older than the TTL is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let mut state = self.locked();
        let expired = match state.entries.get(key) {
            Some(entry) => entry.expired(self.ttl),
            None => return None,
        };
        if expired {
            state.entries.remove(key);
            return None;
        }
        let entry = state.entries.get_mut(key)?;
        entry.touch();
        Some(entry.value.clone())
    }

    /// Insert or overwrite `key`, evicting the least recently used entry
    /// first when the cache is at capacity.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut state = self.locked();
        if state.entries.len() >= self.max_size && !state.entries.contains_key(&key) {
            evict_lru(&mut state.entries);
        }
        state.entries.insert(key, CacheEntry::new(value));
    }

    /// Same expiry check as `get`, without touching access metadata.
    pub fn has(&self, key: &str) -> bool {
        let mut state = self.locked();
        let expired = match state.entries.get(key) {
            Some(entry) => entry.expired(self.ttl),
            None => return false,
        };
        if expired {
            state.entries.remove(key);
            return false;
        }
        true
    }

    pub fn delete(&self, key: &str) -> bool {
        self.locked().entries.remove(key).is_some()
    }

    /// Drop every entry and empty the prefetch queue.
    pub fn clear(&self) {
        let mut state = self.locked();
        state.entries.clear();
        state.prefetch_queue.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.locked();
        let total_accesses = state.entries.values().map(|e| e.access_count).sum();
        let size = state.entries.len();
        let avg_age = if size == 0 {
            Duration::ZERO
        } else {
            state.entries.values().map(|e| e.created.elapsed()).sum::<Duration>() / size as u32
        };
        CacheStats { size, max_size: self.max_size, total_accesses, avg_age }
    }

    /// Queue `key` for background fetching. No-op if already queued; keys
    /// stay in the queue while their fetch is in flight, so re-enqueueing a
    /// key mid-fetch is also a no-op.
    pub fn queue_prefetch(&self, key: impl Into<String>) {
        let key = key.into();
        let mut state = self.locked();
        if !state.prefetch_queue.contains(&key) {
            state.prefetch_queue.push_back(key);
        }
    }

    /// Number of keys waiting in the prefetch queue.
    pub fn pending_prefetches(&self) -> usize {
        self.locked().prefetch_queue.len()
    }

    /// Drain the prefetch queue through `fetch`, a few keys per cycle.
    ///
    /// Returns immediately when a drain is already running or the queue is
    /// empty. Each cycle takes up to three queued keys sequentially;
    /// a key that is already cached is skipped, a failed fetch is logged and
    /// the batch continues, and the key leaves the queue in every case.
    /// Cycles are separated by a short pause so control returns to the
    /// executor between batches. The drain flag clears when this future
    /// completes or is dropped mid-batch, so an aborted drain never blocks
    /// later ones.
    pub async fn process_prefetch_queue<F, Fut, E>(&self, mut fetch: F)
    where
        V: Clone,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        if self.draining.swap(true, Ordering::AcqRel) {
            return;
        }
        let _reset = DrainGuard(&self.draining);

        loop {
            let batch: Vec<String> = {
                let state = self.locked();
                state.prefetch_queue.iter().take(PREFETCH_BATCH).cloned().collect()
            };
            if batch.is_empty() {
                break;
            }

            for key in batch {
                if !self.has(&key) {
                    match fetch(key.clone()).await {
                        // A clear() that landed mid-fetch already dropped
                        // the key from the queue; its value must not come
                        // back into the emptied cache.
                        Ok(value) if self.queued(&key) => self.set(key.clone(), value),
                        Ok(_) => {}
                        Err(err) => warn!(key = %key, error = %err, "prefetch failed"),
                    }
                }
                self.unqueue(&key);
            }

            if self.locked().prefetch_queue.is_empty() {
                break;
            }
            tokio::time::sleep(DRAIN_PAUSE).await;
        }
    }

    /// Remove every entry older than the TTL, regardless of access history.
    ///
    /// This bounds memory for keys that nobody reads often enough to trip
    /// the lazy expiry in `get`/`has`. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let mut state = self.locked();
        let before = state.entries.len();
        let ttl = self.ttl;
        state.entries.retain(|_, entry| !entry.expired(ttl));
        let removed = before - state.entries.len();
        if removed > 0 {
            debug!(removed, remaining = state.entries.len(), "swept expired cache entries");
        }
        removed
    }

    /// Run [`WorkingSet::sweep_expired`] every `period` until the returned
    /// task is aborted or the runtime shuts down.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()>
    where
        V: Send + 'static,
    {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                cache.sweep_expired();
            }
        })
    }

    fn queued(&self, key: &str) -> bool {
        self.locked().prefetch_queue.iter().any(|k| *k == key)
    }

    fn unqueue(&self, key: &str) {
        let mut state = self.locked();
        if let Some(pos) = state.prefetch_queue.iter().position(|k| *k == key) {
            state.prefetch_queue.remove(pos);
        }
    }

    fn locked(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Clears the drain flag when the owning drain future finishes, including
/// when it is dropped at an await point.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Remove the entry with the smallest last-accessed instant. Ties break by
/// map iteration order, which is stable within a single scan.
fn evict_lru<V>(entries: &mut HashMap<String, CacheEntry<V>>) {
    let oldest = entries
        .iter()
        .min_by_key(|(_, entry)| entry.last_accessed)
        .map(|(key, _)| key.clone());
    if let Some(key) = oldest {
        entries.remove(&key);
    }
}
