//! Shared data model for the asynchronous C/C++ completion engine.
//!
//! This crate carries no behavior of its own beyond small helpers (`Location`
//! parsing, the `FileId` interner); it exists so the cache, engine, and
//! worker crates can agree on one set of request/candidate/error types
//! without depending on each other.

mod candidate;
mod connection;
mod error;
mod flags;
mod request;
mod source;

pub use candidate::{Candidate, CursorKind, DISTANCE_NOT_FOUND};
pub use connection::{Connection, RecordingConnection, SharedRecording};
pub use error::CompletionError;
pub use flags::{Encoding, Flags};
pub use request::Request;
pub use source::{FileId, FileIdTable, Location, Source};
