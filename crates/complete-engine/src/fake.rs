//! A deterministic [`SemanticLibrary`] double for `complete-worker`'s tests,
//! so the worker's queueing, supersession, and caching behavior can be
//! exercised without linking libclang.

use std::collections::HashMap;

use complete_model::{Candidate, CursorKind, Location, Source};

use crate::{CodeCompleteOutcome, EngineError, ParseOutcome, SemanticLibrary};

/// An opaque "parsed" handle carrying just enough state for assertions:
/// which source it was parsed from, and how many times it has been
/// reparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeUnit {
    pub source: Source,
    pub reparse_count: u32,
}

/// Scripted behavior for [`FakeLibrary`]: map a path to either a fixed list
/// of candidates or a forced failure, so tests can drive every branch of
/// the worker's parse/reparse/complete decision tree.
#[derive(Default)]
pub struct FakeLibrary {
    pub candidates: HashMap<std::path::PathBuf, Vec<Candidate>>,
    pub fail_parse: std::collections::HashSet<std::path::PathBuf>,
    pub fail_reparse: std::collections::HashSet<std::path::PathBuf>,
    pub parses: u32,
    pub reparses: u32,
    pub completions: u32,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_candidates(&mut self, path: impl Into<std::path::PathBuf>, candidates: Vec<Candidate>) {
        self.candidates.insert(path.into(), candidates);
    }

    pub fn fail_parse_for(&mut self, path: impl Into<std::path::PathBuf>) {
        self.fail_parse.insert(path.into());
    }

    pub fn fail_reparse_for(&mut self, path: impl Into<std::path::PathBuf>) {
        self.fail_reparse.insert(path.into());
    }
}

impl SemanticLibrary for FakeLibrary {
    type TranslationUnit = FakeUnit;

    fn parse(
        &mut self,
        source: &Source,
        _unsaved: Option<&[u8]>,
    ) -> Result<ParseOutcome<Self::TranslationUnit>, EngineError> {
        self.parses += 1;
        if self.fail_parse.contains(&source.path) {
            return Err(EngineError::ParseFailed { path: source.path.clone() });
        }
        Ok(ParseOutcome {
            unit: FakeUnit {
                source: source.clone(),
                reparse_count: 0,
            },
            elapsed_ms: 1,
        })
    }

    fn reparse(
        &mut self,
        unit: &mut Self::TranslationUnit,
        _unsaved: Option<&[u8]>,
    ) -> Result<u64, EngineError> {
        self.reparses += 1;
        if self.fail_reparse.contains(&unit.source.path) {
            return Err(EngineError::ReparseFailed { path: unit.source.path.clone() });
        }
        unit.reparse_count += 1;
        Ok(1)
    }

    fn code_complete_at(
        &mut self,
        unit: &mut Self::TranslationUnit,
        location: &Location,
        _unsaved: Option<&[u8]>,
        _include_macros: bool,
    ) -> Result<CodeCompleteOutcome, EngineError> {
        self.completions += 1;
        let _ = location;
        let candidates = self.candidates.get(&unit.source.path).cloned().unwrap_or_default();
        Ok(CodeCompleteOutcome {
            candidates,
            elapsed_ms: 1,
        })
    }
}

/// Convenience constructor used across `complete-worker`'s scenario tests.
pub fn candidate(name: &str) -> Candidate {
    Candidate::new(name.to_string(), format!("{name}()"), 0, CursorKind::FunctionDecl)
}
