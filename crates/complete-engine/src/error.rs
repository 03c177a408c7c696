use std::path::PathBuf;

/// Failures surfaced by a `SemanticLibrary` implementation (spec.md §7).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("the semantic library returned no translation unit for {path}")]
    ParseFailed { path: PathBuf },

    #[error("the semantic library rejected the reparse request for {path}")]
    ReparseFailed { path: PathBuf },

    #[error("the semantic library could not be loaded: {0}")]
    LibraryUnavailable(String),
}
