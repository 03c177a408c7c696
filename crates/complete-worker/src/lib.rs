//! The pending request queue, the background worker, and the control
//! surface that ties the completion engine together (spec.md §4.1, §4.2,
//! §5).

mod control;
mod queue;
mod worker;

pub use control::CompletionCore;
pub use queue::{DumpSlot, SharedState};
pub use worker::Worker;

use std::num::NonZeroUsize;

/// Cache sizing knobs for a `CompletionCore`: the translation-unit LRU
/// capacity and the per-file completion LRU capacity (spec.md §4.4).
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub cache_size: NonZeroUsize,
    pub completion_cap: NonZeroUsize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            // Matches the default `CompletionThread` cache size in the
            // original implementation.
            cache_size: NonZeroUsize::new(32).expect("32 is non-zero"),
            completion_cap: NonZeroUsize::new(10).expect("10 is non-zero"),
        }
    }
}
