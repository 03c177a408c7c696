//! Abstraction over the "semantic analysis library" spec.md §6 treats as an
//! external, swappable component. `complete-worker` only ever talks to
//! `SemanticLibrary`; the libclang-backed implementation lives in
//! [`clang`], and a deterministic test double lives in [`fake`].

mod clang_impl;
mod error;
pub mod fake;

pub use clang_impl::ClangLibrary;
pub use error::EngineError;

use complete_model::{Candidate, Location, Source};

/// Outcome of parsing or reparsing a translation unit: the handle plus how
/// long the semantic library took, for the cache's bookkeeping fields
/// (spec.md §3).
pub struct ParseOutcome<U> {
    pub unit: U,
    pub elapsed_ms: u64,
}

/// Outcome of a single code-complete call.
pub struct CodeCompleteOutcome {
    pub candidates: Vec<Candidate>,
    pub elapsed_ms: u64,
}

/// The semantic analysis library the worker drives (spec.md §4.1, §6).
///
/// A single `SemanticLibrary` instance is owned exclusively by the worker
/// thread; nothing about this trait is `Sync`, matching the "library-thread
/// affinity is a documented constraint, not a mutex" note in spec.md §9.
pub trait SemanticLibrary {
    /// Opaque handle to one parsed translation unit. Dropping it must
    /// release whatever resources the library allocated for it.
    type TranslationUnit: Send + 'static;

    /// Parses `source` from scratch, optionally substituting `unsaved` for
    /// the on-disk contents of `source.path`.
    fn parse(
        &mut self,
        source: &Source,
        unsaved: Option<&[u8]>,
    ) -> Result<ParseOutcome<Self::TranslationUnit>, EngineError>;

    /// Re-parses an existing unit in place, e.g. because the unsaved buffer
    /// changed since it was last parsed.
    fn reparse(
        &mut self,
        unit: &mut Self::TranslationUnit,
        unsaved: Option<&[u8]>,
    ) -> Result<u64, EngineError>;

    /// Computes completions at `location`. An empty result is not an error
    /// (spec.md §4.3's `NoCandidates` case); only an unusable unit or a
    /// library-level failure returns `Err`.
    fn code_complete_at(
        &mut self,
        unit: &mut Self::TranslationUnit,
        location: &Location,
        unsaved: Option<&[u8]>,
        include_macros: bool,
    ) -> Result<CodeCompleteOutcome, EngineError>;
}
