use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::CompletionError;

/// Opaque, `Copy` identifier for a canonicalized source path.
///
/// Stands in for the external file-identifier table mentioned in spec.md §1:
/// the completion core only ever needs a stable, small key to index its
/// caches by, not the table's internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Minimal path interner standing in for the external file-identifier table.
///
/// `complete-worker` and `complete-cli` share one of these so that the same
/// path always maps to the same `FileId` for the lifetime of the process.
#[derive(Default)]
pub struct FileIdTable {
    inner: Mutex<HashMap<PathBuf, FileId>>,
    next: AtomicU32,
}

impl FileIdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `FileId` for `path`, allocating a new one on first sight.
    pub fn intern(&self, path: &Path) -> FileId {
        let mut guard = self.inner.lock().expect("file id table mutex poisoned");
        if let Some(id) = guard.get(path) {
            return *id;
        }
        let id = FileId(self.next.fetch_add(1, Ordering::Relaxed));
        guard.insert(path.to_path_buf(), id);
        id
    }

    /// Returns the `FileId` already assigned to `path`, if any.
    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.inner
            .lock()
            .expect("file id table mutex poisoned")
            .get(path)
            .copied()
    }
}

/// Path plus compiler arguments identifying one translation unit.
///
/// Equality drives the worker's parse/reparse/reuse decision (spec.md §4.2):
/// if a cache entry's stored `Source` no longer equals the one on an incoming
/// request, the entry is discarded and the unit is parsed fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub path: PathBuf,
    pub file_id: FileId,
    pub args: Vec<String>,
}

impl Source {
    pub fn new(path: PathBuf, file_id: FileId, args: Vec<String>) -> Self {
        Self {
            path,
            file_id,
            args,
        }
    }
}

/// A completion location: path plus 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(path: PathBuf, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// Parses `path:line:col`, matching the last two colon-separated integers
    /// so that Windows-style `C:\foo\bar.cpp:10:5` paths still resolve, per
    /// spec.md §6.
    pub fn parse(text: &str) -> Result<Self, CompletionError> {
        let bad = || CompletionError::BadLocation(text.to_string());

        let last_colon = text.rfind(':').ok_or_else(bad)?;
        let (rest, col_str) = text.split_at(last_colon);
        let col_str = &col_str[1..];

        let prev_colon = rest.rfind(':').ok_or_else(bad)?;
        let (path_str, line_str) = rest.split_at(prev_colon);
        let line_str = &line_str[1..];

        let line: u32 = line_str.parse().map_err(|_| bad())?;
        let column: u32 = col_str.parse().map_err(|_| bad())?;
        if line == 0 || column == 0 || path_str.is_empty() {
            return Err(bad());
        }

        Ok(Self {
            path: PathBuf::from(path_str),
            line,
            column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unix_path() {
        let loc = Location::parse("/tmp/foo.cpp:10:5").unwrap();
        assert_eq!(loc.path, PathBuf::from("/tmp/foo.cpp"));
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 5);
    }

    #[test]
    fn parses_windows_style_path_with_colon() {
        let loc = Location::parse(r"C:\foo\bar.cpp:12:3").unwrap();
        assert_eq!(loc.path, PathBuf::from(r"C:\foo\bar.cpp"));
        assert_eq!(loc.line, 12);
        assert_eq!(loc.column, 3);
    }

    #[test]
    fn rejects_zero_line_or_column() {
        assert!(Location::parse("/tmp/foo.cpp:0:5").is_err());
        assert!(Location::parse("/tmp/foo.cpp:5:0").is_err());
    }

    #[test]
    fn rejects_malformed_location() {
        assert!(Location::parse("/tmp/foo.cpp").is_err());
        assert!(Location::parse("/tmp/foo.cpp:5").is_err());
    }

    #[test]
    fn file_id_table_is_stable_and_dedups() {
        let table = FileIdTable::new();
        let a = table.intern(Path::new("/tmp/a.cpp"));
        let b = table.intern(Path::new("/tmp/b.cpp"));
        let a_again = table.intern(Path::new("/tmp/a.cpp"));
        assert_eq!(a, a_again);
        assert_ne!(a, b);
        assert_eq!(table.lookup(Path::new("/tmp/a.cpp")), Some(a));
        assert_eq!(table.lookup(Path::new("/tmp/missing.cpp")), None);
    }
}
