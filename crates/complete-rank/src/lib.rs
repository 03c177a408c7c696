//! Candidate ordering and output encodings (spec.md §4.3).

mod format;

pub use format::{format_candidates, Formatted};

use std::cmp::Ordering;

use complete_model::{Candidate, DISTANCE_NOT_FOUND};
use complete_text::TokenIndex;

/// Fills in `candidate.distance` for every candidate in `candidates`: the
/// byte offset of the matching identifier's first occurrence in the
/// unsaved-buffer token index (spec.md §3, §4.5), or [`DISTANCE_NOT_FOUND`]
/// if the completion text is not a token in the buffer.
pub fn assign_distances(candidates: &mut [Candidate], unsaved: &[u8]) {
    let index = TokenIndex::build(unsaved);
    for candidate in candidates {
        candidate.distance = match index.first_offset(&candidate.completion) {
            Some(offset) => offset as i32,
            None => DISTANCE_NOT_FOUND,
        };
    }
}

/// Strict weak order: priority, then distance, then lexicographic
/// completion text (spec.md §4.3).
pub fn compare(l: &Candidate, r: &Candidate) -> Ordering {
    l.priority
        .cmp(&r.priority)
        .then_with(|| l.distance.cmp(&r.distance))
        .then_with(|| l.completion.cmp(&r.completion))
}

/// Sorts `candidates` in place using [`compare`]. Stable, so re-sorting an
/// already-sorted list is a no-op on the output bytes (spec.md §8).
pub fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(compare);
}
