use std::path::PathBuf;

/// Errors the control surface or worker can report for a single request.
///
/// These never cross request boundaries: a failure here degrades the one
/// request that triggered it (see `spec.md` §7); the cache and worker survive.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("failed to parse translation unit for {path}")]
    ParseFailed { path: PathBuf },

    #[error("failed to reparse translation unit for {path}")]
    ReparseFailed { path: PathBuf },

    #[error("invalid completion location: {0}")]
    BadLocation(String),

    #[error("completion engine is shutting down")]
    Shutdown,

    #[error("dump already in progress")]
    DumpBusy,
}
