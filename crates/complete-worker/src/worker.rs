//! The single background worker thread: drains the pending queue, decides
//! parse/reparse/reuse for each request, drives the semantic library,
//! ranks and caches candidates, and replies (spec.md §4.2).

use std::fmt::Write as _;
use std::path::Path;
use std::time::SystemTime;

use complete_cache::{hash_unsaved, Completions, SourceFile, TranslationUnitCache};
use complete_engine::SemanticLibrary;
use complete_model::{FileId, Location, Request, Source};

use crate::queue::Shared;
use crate::WorkerConfig;

/// Owns all semantic-library state and both cache LRUs. Constructed once per
/// `CompletionCore` and moved into the background thread `CompletionCore`
/// spawns; nothing else ever touches it (spec.md §5).
pub struct Worker<E: SemanticLibrary> {
    engine: E,
    tu_cache: TranslationUnitCache<E::TranslationUnit>,
    completion_cap: std::num::NonZeroUsize,
    shared: Shared,
}

fn fs_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl<E: SemanticLibrary> Worker<E> {
    pub fn new(engine: E, config: WorkerConfig, shared: Shared) -> Self {
        Self {
            engine,
            tu_cache: TranslationUnitCache::new(config.cache_size),
            completion_cap: config.completion_cap,
            shared,
        }
    }

    /// The main loop (spec.md §4.2, steps 1-3): acquire the queue lock,
    /// service an outstanding dump, exit on drained shutdown, otherwise
    /// detach the head request and process it with the lock released.
    pub fn run(mut self) {
        let shared = self.shared.clone();
        let (lock, cvar) = &*shared;

        'outer: loop {
            let request;
            {
                let mut state = lock.lock().expect("queue mutex poisoned");
                loop {
                    if let Some(slot) = state.dump_request.take() {
                        let report = self.render_dump();
                        slot.publish(report);
                        continue;
                    }
                    if state.shutdown && state.pending.is_empty() {
                        break 'outer;
                    }
                    if let Some(head) = state.pending.pop_front() {
                        request = head;
                        break;
                    }
                    state = cvar.wait(state).expect("queue mutex poisoned");
                }
            }
            self.process(request);
        }
    }

    /// Processing a single request, exactly as spec.md §4.2 describes.
    fn process(&mut self, mut request: Request) {
        let file_id = request.source.file_id;
        let encoding = request.flags.encoding();
        let is_warm_up = request.flags.is_warm_up();
        let refresh = request.flags.is_refresh();
        let include_macros = request.flags.include_macros();
        let unsaved = request.unsaved.clone();
        let mtime = fs_mtime(&request.source.path);
        let unsaved_hash = hash_unsaved(unsaved.as_deref());

        let source_matches = self
            .tu_cache
            .peek(file_id)
            .is_some_and(|entry| entry.source == request.source);

        if !source_matches || refresh {
            if !self.parse_fresh_and_install(file_id, &request.source, unsaved.as_deref()) {
                request.reply(&[]);
                return;
            }
        } else {
            let cache_hit = !is_warm_up
                && request.location.as_ref().is_some_and(|loc| {
                    let entry = self
                        .tu_cache
                        .get_mut(file_id)
                        .expect("source_matches implies entry present");
                    entry.unsaved_hash == unsaved_hash
                        && entry.mtime == mtime
                        && entry.completions.get(loc).is_some()
                });

            if cache_hit {
                let loc = request.location.clone().expect("cache_hit implies a location");
                let entry = self
                    .tu_cache
                    .get_mut(file_id)
                    .expect("source_matches implies entry present");
                entry.completions_served += 1;
                let candidates = entry
                    .completions
                    .get(&loc)
                    .expect("cache_hit just checked this location")
                    .candidates
                    .clone();
                let bytes = complete_rank::format_candidates(&candidates, encoding);
                request.reply(&bytes);
                return;
            }

            let reparsed = self.reparse_in_place(file_id, &request.source, unsaved.as_deref(), unsaved_hash, mtime);
            if !reparsed && !self.parse_fresh_and_install(file_id, &request.source, unsaved.as_deref()) {
                request.reply(&[]);
                return;
            }
        }

        let Some(location) = request.location.clone() else {
            // WarmUp request: the cache is populated, nothing more to do.
            request.finish_without_reply();
            return;
        };

        let entry = self
            .tu_cache
            .get_mut(file_id)
            .expect("just parsed or reparsed above");
        let outcome = self
            .engine
            .code_complete_at(&mut entry.unit, &location, unsaved.as_deref(), include_macros);

        match outcome {
            Ok(complete) => {
                entry.code_complete_time_ms += complete.elapsed_ms;
                entry.completions_served += 1;
                let mut candidates = complete.candidates;

                let buffer = match unsaved {
                    Some(bytes) => bytes,
                    None => std::fs::read(&request.source.path).unwrap_or_default(),
                };
                complete_rank::assign_distances(&mut candidates, &buffer);
                complete_rank::sort_candidates(&mut candidates);

                entry.completions.insert(Completions {
                    location: location.clone(),
                    candidates: candidates.clone(),
                });

                let bytes = complete_rank::format_candidates(&candidates, encoding);
                request.reply(&bytes);
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %request.source.path.display(),
                    "code_complete_at failed"
                );
                request.reply(&[]);
            }
        }
    }

    /// Parses `source` from scratch and installs it at `file_id`, evicting
    /// the LRU tail if the cache is over capacity. Returns `false` (and logs)
    /// on a parse failure, per spec.md §7's *ParseFailed* handling.
    fn parse_fresh_and_install(&mut self, file_id: FileId, source: &Source, unsaved: Option<&[u8]>) -> bool {
        match self.engine.parse(source, unsaved) {
            Ok(outcome) => {
                let mut entry = SourceFile::new(outcome.unit, source.clone(), self.completion_cap);
                entry.parse_time_ms = outcome.elapsed_ms;
                entry.unsaved_hash = hash_unsaved(unsaved);
                entry.mtime = fs_mtime(&source.path);
                let evicted = self.tu_cache.insert(file_id, entry);
                self.sync_watchset(file_id, evicted.map(|(id, _)| id));
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %source.path.display(), "parse failed");
                false
            }
        }
    }

    /// Reparses the existing entry for `file_id` in place, clearing its
    /// completion cache. Returns `false` on a reparse failure, which the
    /// caller degrades to a fresh parse (spec.md §7's *ReparseFailed*).
    fn reparse_in_place(
        &mut self,
        file_id: FileId,
        source: &Source,
        unsaved: Option<&[u8]>,
        unsaved_hash: u64,
        mtime: Option<SystemTime>,
    ) -> bool {
        let entry = self
            .tu_cache
            .get_mut(file_id)
            .expect("caller only reaches here when an entry is present");
        match self.engine.reparse(&mut entry.unit, unsaved) {
            Ok(elapsed) => {
                entry.reparse_time_ms += elapsed;
                entry.unsaved_hash = unsaved_hash;
                entry.mtime = mtime;
                entry.completions.clear();
                self.sync_watchset(file_id, None);
                true
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %source.path.display(),
                    "reparse failed, falling back to a fresh parse"
                );
                false
            }
        }
    }

    /// Mirrors the translation-unit cache's key set into the shared
    /// watchset producers read for `isCached` and the priority-insertion
    /// rule, without exposing the cache itself across the thread boundary.
    fn sync_watchset(&self, inserted: FileId, evicted: Option<FileId>) {
        let (lock, _cvar) = &*self.shared;
        let mut state = lock.lock().expect("queue mutex poisoned");
        state.watchset.insert(inserted);
        if let Some(evicted) = evicted {
            state.watchset.remove(&evicted);
        }
    }

    /// Renders the free-form multi-line cache report spec.md §6 describes
    /// for `dump`: per cached file, its path, cumulative timings, served
    /// count, and ordered cached locations.
    fn render_dump(&self) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "translation units: {}", self.tu_cache.len());
        for (file_id, entry) in self.tu_cache.iter() {
            let _ = writeln!(
                report,
                "- {} (file_id={}) parse={}ms reparse={}ms complete={}ms served={}",
                entry.source.path.display(),
                file_id.raw(),
                entry.parse_time_ms,
                entry.reparse_time_ms,
                entry.code_complete_time_ms,
                entry.completions_served,
            );
            for loc in entry.completions.locations() {
                let _ = writeln!(report, "    {}:{}:{}", loc.path.display(), loc.line, loc.column);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complete_engine::fake::{candidate, FakeLibrary};
    use complete_model::{Flags, RecordingConnection, SharedRecording, Source};
    use std::num::NonZeroUsize;
    use std::path::PathBuf;

    fn config() -> WorkerConfig {
        WorkerConfig {
            cache_size: NonZeroUsize::new(2).unwrap(),
            completion_cap: NonZeroUsize::new(4).unwrap(),
        }
    }

    fn source(path: &str, id: u32) -> Source {
        Source::new(PathBuf::from(path), FileId::from_raw(id), vec![])
    }

    #[test]
    fn cold_hit_parses_and_caches_the_answer() {
        let mut engine = FakeLibrary::new();
        engine.set_candidates("/tmp/a.cpp", vec![candidate("foo")]);
        let shared = crate::queue::new_shared();
        let mut worker = Worker::new(engine, config(), shared.clone());

        let conn = SharedRecording::new();
        let request = Request::new(
            source("/tmp/a.cpp", 1),
            Some(Location::new(PathBuf::from("/tmp/a.cpp"), 10, 5)),
            Flags::empty(),
            Some(b"int foo; f".to_vec()),
            Some(conn.connection()),
        );
        worker.process(request);

        assert!(conn.finished());
        assert!(String::from_utf8(conn.written()).unwrap().contains("foo"));
        assert!(worker.tu_cache.contains(FileId::from_raw(1)));
    }

    #[test]
    fn warm_up_populates_cache_without_a_reply() {
        let engine = FakeLibrary::new();
        let shared = crate::queue::new_shared();
        let mut worker = Worker::new(engine, config(), shared);
        let request = Request::warm_up(source("/tmp/a.cpp", 1), None);
        worker.process(request);
        assert!(worker.tu_cache.contains(FileId::from_raw(1)));
    }

    #[test]
    fn warm_reuse_serves_from_cache_without_reparsing() {
        let mut engine = FakeLibrary::new();
        engine.set_candidates("/tmp/a.cpp", vec![candidate("foo")]);
        let shared = crate::queue::new_shared();
        let mut worker = Worker::new(engine, config(), shared);

        let loc = Location::new(PathBuf::from("/tmp/a.cpp"), 10, 5);
        let unsaved = Some(b"int foo; f".to_vec());

        let first = SharedRecording::new();
        worker.process(Request::new(
            source("/tmp/a.cpp", 1),
            Some(loc.clone()),
            Flags::empty(),
            unsaved.clone(),
            Some(first.connection()),
        ));

        let second = SharedRecording::new();
        worker.process(Request::new(
            source("/tmp/a.cpp", 1),
            Some(loc),
            Flags::empty(),
            unsaved,
            Some(second.connection()),
        ));

        assert_eq!(first.written(), second.written());
        assert_eq!(worker.engine.parses, 1);
        assert_eq!(worker.engine.reparses, 0);
    }

    #[test]
    fn disk_mtime_change_triggers_reparse_even_with_unchanged_unsaved_hash() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"int foo;\nfoo.b").unwrap();
        let path = file.path().to_path_buf();

        let mut engine = FakeLibrary::new();
        engine.set_candidates(path.to_str().unwrap(), vec![candidate("foo")]);
        let shared = crate::queue::new_shared();
        let mut worker = Worker::new(engine, config(), shared);

        let loc = Location::new(path.clone(), 2, 5);
        let src = Source::new(path.clone(), FileId::from_raw(1), vec![]);

        worker.process(Request::new(
            src.clone(),
            Some(loc.clone()),
            Flags::empty(),
            None,
            Some(Box::new(RecordingConnection::default())),
        ));
        worker.process(Request::new(
            src.clone(),
            Some(loc.clone()),
            Flags::empty(),
            None,
            Some(Box::new(RecordingConnection::default())),
        ));
        assert_eq!(worker.engine.parses, 1);
        assert_eq!(worker.engine.reparses, 0);

        // Touch the file's mtime forward without changing the cached
        // unsaved-buffer hash (both requests pass `unsaved = None`).
        let later = SystemTime::now() + std::time::Duration::from_secs(120);
        file.as_file().set_modified(later).unwrap();

        worker.process(Request::new(
            src,
            Some(loc),
            Flags::empty(),
            None,
            Some(Box::new(RecordingConnection::default())),
        ));
        assert_eq!(worker.engine.parses, 1);
        assert_eq!(worker.engine.reparses, 1);
    }

    #[test]
    fn refresh_clears_completions_and_reparses_fresh() {
        let mut engine = FakeLibrary::new();
        engine.set_candidates("/tmp/a.cpp", vec![candidate("foo")]);
        let shared = crate::queue::new_shared();
        let mut worker = Worker::new(engine, config(), shared);

        let loc = Location::new(PathBuf::from("/tmp/a.cpp"), 10, 5);
        let unsaved = Some(b"int foo; f".to_vec());

        worker.process(Request::new(
            source("/tmp/a.cpp", 1),
            Some(loc.clone()),
            Flags::empty(),
            unsaved.clone(),
            Some(Box::new(RecordingConnection::default())),
        ));

        worker.process(Request::new(
            source("/tmp/a.cpp", 1),
            Some(loc),
            Flags::REFRESH,
            unsaved,
            Some(Box::new(RecordingConnection::default())),
        ));

        assert_eq!(worker.engine.parses, 2);
        assert!(worker.tu_cache.contains(FileId::from_raw(1)));
    }

    #[test]
    fn eviction_releases_the_least_recently_used_file() {
        let engine = FakeLibrary::new();
        let shared = crate::queue::new_shared();
        let mut worker = Worker::new(engine, config(), shared);

        for (path, id) in [("/tmp/a.cpp", 1), ("/tmp/b.cpp", 2), ("/tmp/c.cpp", 3)] {
            worker.process(Request::warm_up(source(path, id), None));
        }

        assert!(!worker.tu_cache.contains(FileId::from_raw(1)));
        assert!(worker.tu_cache.contains(FileId::from_raw(2)));
        assert!(worker.tu_cache.contains(FileId::from_raw(3)));
    }

    #[test]
    fn parse_failure_replies_empty_without_caching() {
        let mut engine = FakeLibrary::new();
        engine.fail_parse_for("/tmp/a.cpp");
        let shared = crate::queue::new_shared();
        let mut worker = Worker::new(engine, config(), shared);

        let conn = SharedRecording::new();
        worker.process(Request::new(
            source("/tmp/a.cpp", 1),
            Some(Location::new(PathBuf::from("/tmp/a.cpp"), 1, 1)),
            Flags::empty(),
            None,
            Some(conn.connection()),
        ));

        assert!(conn.finished());
        assert!(conn.written().is_empty());
        assert!(!worker.tu_cache.contains(FileId::from_raw(1)));
    }

    #[test]
    fn reparse_failure_degrades_to_a_fresh_parse() {
        let mut engine = FakeLibrary::new();
        engine.set_candidates("/tmp/a.cpp", vec![candidate("foo")]);
        engine.fail_reparse_for("/tmp/a.cpp");
        let shared = crate::queue::new_shared();
        let mut worker = Worker::new(engine, config(), shared);

        worker.process(Request::warm_up(source("/tmp/a.cpp", 1), None));
        let conn = SharedRecording::new();
        worker.process(Request::new(
            source("/tmp/a.cpp", 1),
            Some(Location::new(PathBuf::from("/tmp/a.cpp"), 1, 1)),
            Flags::empty(),
            Some(b"different buffer".to_vec()),
            Some(conn.connection()),
        ));

        assert_eq!(worker.engine.reparses, 1);
        assert_eq!(worker.engine.parses, 2);
        assert!(conn.finished());
    }
}
