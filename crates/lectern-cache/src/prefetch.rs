//! Adjacent-chapter prefetch coordination.

use lectern_corpus::chapter_key;

use crate::working_set::WorkingSet;

/// Queue the chapters adjacent to the reader's position for background
/// fetching.
///
/// Enqueues `chapter - 1` when there is a previous chapter and `chapter + 1`
/// when there is a next one. Pure queue mutation: no I/O happens here, so
/// "what should be warmed" stays decoupled from "when it gets fetched".
/// Draining is [`WorkingSet::process_prefetch_queue`]'s job.
pub fn queue_adjacent_chapters<V>(
    cache: &WorkingSet<V>,
    translation: &str,
    book: &str,
    chapter: u32,
    total_chapters: u32,
) {
    if chapter > 1 {
        cache.queue_prefetch(chapter_key(translation, book, &(chapter - 1).to_string()));
    }
    if chapter < total_chapters {
        cache.queue_prefetch(chapter_key(translation, book, &(chapter + 1).to_string()));
    }
}
