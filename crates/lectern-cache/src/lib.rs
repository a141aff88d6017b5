//! Bounded in-memory working-set cache with background prefetching.
//!
//! [`WorkingSet`] keeps the most relevant subdivisions of a corpus (single
//! chapters, whole translations) in memory behind opaque string keys, with
//! least-recently-used eviction, per-entry time-to-live expiry and a
//! deduplicated prefetch queue drained a few keys at a time.
//!
//! Instances are constructed explicitly and owned by the application's
//! composition root; tests build their own rather than sharing process
//! state. All timers run on `tokio::time`, so paused-clock tests drive
//! expiry and drain scheduling deterministically.

mod entry;
mod prefetch;
mod working_set;

pub use prefetch::queue_adjacent_chapters;
pub use working_set::{CacheStats, SWEEP_PERIOD, WorkingSet};
