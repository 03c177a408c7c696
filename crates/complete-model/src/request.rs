use crate::connection::Connection;
use crate::flags::Flags;
use crate::source::{Location, Source};

/// An immutable job record (spec.md §3).
///
/// `WarmUp` requests have no `location` and no `connection`; their purpose is
/// solely to populate the translation-unit cache. `Refresh` forces
/// re-parsing even if the cache holds a matching entry.
pub struct Request {
    pub source: Source,
    pub location: Option<Location>,
    pub flags: Flags,
    pub unsaved: Option<Vec<u8>>,
    pub connection: Option<Box<dyn Connection>>,
}

impl Request {
    pub fn new(
        source: Source,
        location: Option<Location>,
        flags: Flags,
        unsaved: Option<Vec<u8>>,
        connection: Option<Box<dyn Connection>>,
    ) -> Self {
        Self {
            source,
            location,
            flags,
            unsaved,
            connection,
        }
    }

    /// Builds a pure cache-fill request: no location, no reply sink.
    pub fn warm_up(source: Source, unsaved: Option<Vec<u8>>) -> Self {
        Self {
            source,
            location: None,
            flags: Flags::WARM_UP,
            unsaved,
            connection: None,
        }
    }

    /// True if this request and `other` share the (source path, flags) key
    /// that makes one supersede the other (spec.md §4.1).
    pub fn supersedes_key(&self, path: &std::path::Path, flags: Flags) -> bool {
        self.source.path == path && self.flags == flags
    }

    /// Finalizes the connection without ever writing a reply: used for
    /// superseded requests and for requests rejected after shutdown.
    pub fn finish_without_reply(mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.finish();
        }
    }

    /// Writes `bytes` to the connection (if any) and finalizes it.
    pub fn reply(mut self, bytes: &[u8]) {
        if let Some(mut conn) = self.connection.take() {
            conn.write(bytes);
            conn.finish();
        }
    }
}

impl Drop for Request {
    fn drop(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SharedRecording;
    use crate::source::FileId;
    use std::path::PathBuf;

    fn source() -> Source {
        Source::new(PathBuf::from("/tmp/a.cpp"), FileId::from_raw(1), vec![])
    }

    #[test]
    fn reply_writes_then_finishes_exactly_once() {
        let shared = SharedRecording::new();
        let req = Request::new(source(), None, Flags::empty(), None, Some(shared.connection()));
        req.reply(b"ok");
        assert_eq!(shared.written(), b"ok");
        assert!(shared.finished());
    }

    #[test]
    fn drop_without_reply_still_finishes_connection() {
        let shared = SharedRecording::new();
        {
            let _req = Request::new(source(), None, Flags::empty(), None, Some(shared.connection()));
        }
        assert!(shared.written().is_empty());
        assert!(shared.finished());
    }

    #[test]
    fn warm_up_has_no_location_or_connection() {
        let req = Request::warm_up(source(), None);
        assert!(req.location.is_none());
        assert!(req.connection.is_none());
        assert!(req.flags.is_warm_up());
    }
}
