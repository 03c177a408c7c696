//! The shared state guarded by the single mutex/condvar pair spec.md §5
//! describes: the pending request queue, the shutdown flag, the outstanding
//! dump handoff, and the watchset producers consult for `isCached`.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

use complete_model::{FileId, Request};

/// A one-shot handoff for a single outstanding `dump` call, guarded by its
/// own mutex/condvar pair (spec.md §9's "pair (mutex, condition, slot) per
/// outstanding dump").
#[derive(Default)]
pub struct DumpSlot {
    report: Mutex<Option<String>>,
    ready: Condvar,
}

impl DumpSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the worker once the report is rendered.
    pub fn publish(&self, report: String) {
        let mut guard = self.report.lock().expect("dump slot mutex poisoned");
        *guard = Some(report);
        self.ready.notify_all();
    }

    /// Called by the blocked `dump` caller; consumes the report.
    pub fn wait(&self) -> String {
        let mut guard = self.report.lock().expect("dump slot mutex poisoned");
        while guard.is_none() {
            guard = self.ready.wait(guard).expect("dump slot mutex poisoned");
        }
        guard.take().expect("dump slot signalled with no report")
    }
}

/// State behind the single mutex the worker and all producers share.
pub struct SharedState {
    pub pending: VecDeque<Request>,
    pub shutdown: bool,
    pub dump_request: Option<Arc<DumpSlot>>,
    pub watchset: HashSet<FileId>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            shutdown: false,
            dump_request: None,
            watchset: HashSet::new(),
        }
    }

    /// Enqueues `request`, applying supersession and the priority-insertion
    /// rule from spec.md §4.1.
    ///
    /// Supersession: an existing pending request sharing `request`'s
    /// (source path, flags) key is removed and finalized without a reply.
    /// Priority: if `request`'s file already has a cache entry (per the
    /// watchset), it is inserted before the first pending request whose
    /// file is not cached; otherwise it is appended at the tail.
    pub fn enqueue(&mut self, request: Request) {
        if let Some(pos) = self
            .pending
            .iter()
            .position(|pending| pending.supersedes_key(&request.source.path, request.flags))
        {
            let superseded = self.pending.remove(pos).expect("position just found");
            superseded.finish_without_reply();
        }

        if self.watchset.contains(&request.source.file_id) {
            let insert_at = self
                .pending
                .iter()
                .position(|pending| !self.watchset.contains(&pending.source.file_id))
                .unwrap_or(self.pending.len());
            self.pending.insert(insert_at, request);
        } else {
            self.pending.push_back(request);
        }
    }

    /// Drains every pending request, finalizing each without a reply
    /// (spec.md §5: "shutdown cancels all pending requests by draining
    /// them without answering").
    pub fn drain_without_reply(&mut self) {
        while let Some(request) = self.pending.pop_front() {
            request.finish_without_reply();
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// The queue lock plus its condition variable, shared by every producer and
/// the worker.
pub type Shared = Arc<(Mutex<SharedState>, Condvar)>;

pub fn new_shared() -> Shared {
    Arc::new((Mutex::new(SharedState::new()), Condvar::new()))
}
