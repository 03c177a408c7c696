//! The translation-unit cache and its nested per-file completion cache
//! (spec.md §3, §4.4).
//!
//! Both levels are realized with [`lru::LruCache`]'s arena-backed storage
//! rather than a hand-rolled intrusive doubly-linked list -- see DESIGN.md
//! for why this still satisfies spec.md §9's "ordered container with O(1)
//! move-to-front and O(1) detach" requirement.

use std::hash::Hasher;
use std::num::NonZeroUsize;
use std::time::SystemTime;

use ahash::AHasher;
use lru::LruCache;

use complete_model::{Candidate, FileId, Location, Source};

/// A 64-bit fingerprint of an unsaved buffer. Any stable hash suffices
/// (spec.md §9); `ahash` is already the teacher repository's choice for
/// non-cryptographic content hashing.
pub fn hash_unsaved(bytes: Option<&[u8]>) -> u64 {
    let mut hasher = AHasher::default();
    if let Some(bytes) = bytes {
        hasher.write(bytes);
    }
    hasher.finish()
}

/// One (file, location) answer (spec.md §3).
#[derive(Debug, Clone)]
pub struct Completions {
    pub location: Location,
    pub candidates: Vec<Candidate>,
}

/// Per-file LRU of `Completions`, keyed by location. Capacity is a small
/// fixed constant, typically ≤ 10 (spec.md §4.4).
pub struct CompletionCache {
    inner: LruCache<Location, Completions>,
}

impl CompletionCache {
    pub fn new(cap: NonZeroUsize) -> Self {
        Self {
            inner: LruCache::new(cap),
        }
    }

    /// Promotes and returns the cached answer for `location`, if present.
    pub fn get(&mut self, location: &Location) -> Option<&Completions> {
        self.inner.get(location).map(|c| &*c)
    }

    /// Inserts a new answer at the front, evicting the tail if the per-file
    /// cap is exceeded.
    pub fn insert(&mut self, completions: Completions) {
        self.inner.put(completions.location.clone(), completions);
    }

    /// Clears every cached answer for this file -- used on `Refresh` and on
    /// reparse (spec.md §3).
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Cached locations from most- to least-recently used, for `dump`.
    pub fn locations(&self) -> Vec<Location> {
        self.inner.iter().map(|(loc, _)| loc.clone()).collect()
    }
}

/// One cached translation unit (spec.md §3). Generic over the semantic
/// library's opaque handle type so this crate never depends on
/// `complete-engine`'s libclang bindings; `U`'s `Drop` impl is the release
/// site for the underlying translation unit.
pub struct SourceFile<U> {
    pub unit: U,
    pub source: Source,
    pub unsaved_hash: u64,
    pub mtime: Option<SystemTime>,
    pub parse_time_ms: u64,
    pub reparse_time_ms: u64,
    pub code_complete_time_ms: u64,
    pub completions_served: u64,
    pub completions: CompletionCache,
}

impl<U> SourceFile<U> {
    pub fn new(unit: U, source: Source, completion_cap: NonZeroUsize) -> Self {
        Self {
            unit,
            source,
            unsaved_hash: hash_unsaved(None),
            mtime: None,
            parse_time_ms: 0,
            reparse_time_ms: 0,
            code_complete_time_ms: 0,
            completions_served: 0,
            completions: CompletionCache::new(completion_cap),
        }
    }
}

/// LRU keyed by file id; each entry owns one parsed unit and its nested
/// completion cache (spec.md §3, §4.4).
pub struct TranslationUnitCache<U> {
    inner: LruCache<FileId, SourceFile<U>>,
}

impl<U> TranslationUnitCache<U> {
    pub fn new(cap: NonZeroUsize) -> Self {
        Self {
            inner: LruCache::new(cap),
        }
    }

    pub fn contains(&self, file_id: FileId) -> bool {
        self.inner.contains(&file_id)
    }

    /// Promotes `file_id` to most-recently-used and returns it, if present.
    pub fn get_mut(&mut self, file_id: FileId) -> Option<&mut SourceFile<U>> {
        self.inner.get_mut(&file_id)
    }

    /// Looks up `file_id` without disturbing LRU order.
    pub fn peek(&self, file_id: FileId) -> Option<&SourceFile<U>> {
        self.inner.peek(&file_id)
    }

    /// Inserts or replaces the entry for `file_id` at the front, evicting
    /// the tail if the cache is over capacity. Returns the evicted
    /// `(FileId, SourceFile<U>)` pair when eviction happened for a
    /// *different* file id; dropping it releases the evicted unit and
    /// cascades into dropping its nested completion cache (spec.md §4.4).
    pub fn insert(&mut self, file_id: FileId, entry: SourceFile<U>) -> Option<(FileId, SourceFile<U>)> {
        self.inner.push(file_id, entry).filter(|(evicted_id, _)| *evicted_id != file_id)
    }

    /// Removes and returns the entry for `file_id`, releasing its unit when
    /// the caller drops the result.
    pub fn remove(&mut self, file_id: FileId) -> Option<SourceFile<U>> {
        self.inner.pop(&file_id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn cap(&self) -> NonZeroUsize {
        self.inner.cap()
    }

    /// Entries from most- to least-recently used, for `dump`.
    pub fn iter(&self) -> impl Iterator<Item = (&FileId, &SourceFile<U>)> {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file_source(id: u32) -> Source {
        Source::new(
            PathBuf::from(format!("/tmp/{id}.cpp")),
            FileId::from_raw(id),
            vec![],
        )
    }

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn eviction_drops_tail_when_over_capacity() {
        let mut cache: TranslationUnitCache<u32> = TranslationUnitCache::new(cap(2));
        cache.insert(FileId::from_raw(1), SourceFile::new(1, file_source(1), cap(4)));
        cache.insert(FileId::from_raw(2), SourceFile::new(2, file_source(2), cap(4)));
        assert!(cache.contains(FileId::from_raw(1)));

        let evicted = cache.insert(FileId::from_raw(3), SourceFile::new(3, file_source(3), cap(4)));
        assert!(evicted.is_some());
        assert_eq!(evicted.unwrap().0, FileId::from_raw(1));
        assert!(!cache.contains(FileId::from_raw(1)));
        assert!(cache.contains(FileId::from_raw(2)));
        assert!(cache.contains(FileId::from_raw(3)));
        assert!(cache.len() <= cache.cap().get());
    }

    #[test]
    fn get_mut_promotes_entry_to_most_recently_used() {
        let mut cache: TranslationUnitCache<u32> = TranslationUnitCache::new(cap(2));
        cache.insert(FileId::from_raw(1), SourceFile::new(1, file_source(1), cap(4)));
        cache.insert(FileId::from_raw(2), SourceFile::new(2, file_source(2), cap(4)));
        // touch file 1 so it becomes MRU
        cache.get_mut(FileId::from_raw(1));
        let evicted = cache.insert(FileId::from_raw(3), SourceFile::new(3, file_source(3), cap(4)));
        assert_eq!(evicted.unwrap().0, FileId::from_raw(2));
        assert!(cache.contains(FileId::from_raw(1)));
    }

    #[test]
    fn replacing_same_file_id_is_not_reported_as_eviction() {
        let mut cache: TranslationUnitCache<u32> = TranslationUnitCache::new(cap(2));
        cache.insert(FileId::from_raw(1), SourceFile::new(1, file_source(1), cap(4)));
        let replaced = cache.insert(FileId::from_raw(1), SourceFile::new(99, file_source(1), cap(4)));
        assert!(replaced.is_none());
        assert_eq!(cache.peek(FileId::from_raw(1)).unwrap().unit, 99);
    }

    #[test]
    fn completion_cache_roundtrips_and_evicts() {
        let mut completions = CompletionCache::new(cap(1));
        let loc_a = Location::new(PathBuf::from("/tmp/a.cpp"), 1, 1);
        let loc_b = Location::new(PathBuf::from("/tmp/a.cpp"), 2, 1);
        completions.insert(Completions {
            location: loc_a.clone(),
            candidates: vec![],
        });
        assert!(completions.get(&loc_a).is_some());
        completions.insert(Completions {
            location: loc_b.clone(),
            candidates: vec![],
        });
        // cap 1: inserting b evicts a
        assert!(completions.get(&loc_a).is_none());
        assert!(completions.get(&loc_b).is_some());
    }

    #[test]
    fn refresh_clears_every_cached_location() {
        let mut completions = CompletionCache::new(cap(8));
        for i in 0..3 {
            completions.insert(Completions {
                location: Location::new(PathBuf::from("/tmp/a.cpp"), i + 1, 1),
                candidates: vec![],
            });
        }
        assert_eq!(completions.len(), 3);
        completions.clear();
        assert!(completions.is_empty());
    }

    #[test]
    fn hash_unsaved_is_stable_for_same_bytes() {
        assert_eq!(hash_unsaved(Some(b"abc")), hash_unsaved(Some(b"abc")));
        assert_ne!(hash_unsaved(Some(b"abc")), hash_unsaved(Some(b"abd")));
        assert_eq!(hash_unsaved(None), hash_unsaved(None));
    }
}
