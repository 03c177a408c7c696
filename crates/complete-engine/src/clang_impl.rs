//! `clang-sys` FFI bindings to libclang (spec.md §6's "semantic analysis
//! library").
//!
//! The higher-level safe `clang` crate ties a `TranslationUnit<'i>` to the
//! lifetime of the `Index<'i>` that created it, which cannot be stored as an
//! owned, `'static` value inside `complete-cache`'s generic `SourceFile<U>`.
//! We drive the raw C API directly instead, the same way the original
//! `CompletionThread` wraps bare `CXIndex`/`CXTranslationUnit` handles.

use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_uint};
use std::time::Instant;

use clang_sys::*;
use tracing::warn;

use complete_model::{Candidate, CursorKind, Location, Source};

use crate::{CodeCompleteOutcome, EngineError, ParseOutcome, SemanticLibrary};

/// Owns one `CXIndex`. Every `ClangTranslationUnit` produced by this index
/// must be disposed before (or as) the index itself is disposed; in
/// practice the worker drops translation units via `complete-cache`'s LRU
/// well before it drops the `ClangLibrary` at shutdown.
pub struct ClangLibrary {
    index: CXIndex,
}

// Safety: libclang documents that a `CXIndex` and the translation units
// parsed from it may be used from any single thread, as long as that use is
// serialized -- which is exactly what "one worker thread owns the semantic
// library" (spec.md §5) already guarantees. Nothing here is ever touched
// concurrently.
unsafe impl Send for ClangLibrary {}

impl ClangLibrary {
    pub fn new() -> Result<Self, EngineError> {
        unsafe {
            clang_sys::load().map_err(|e| EngineError::LibraryUnavailable(e.to_string()))?;
            let index = clang_createIndex(0, 0);
            if index.is_null() {
                return Err(EngineError::LibraryUnavailable(
                    "clang_createIndex returned null".to_string(),
                ));
            }
            Ok(Self { index })
        }
    }
}

impl Drop for ClangLibrary {
    fn drop(&mut self) {
        unsafe {
            clang_disposeIndex(self.index);
        }
    }
}

/// Owns one `CXTranslationUnit`. Disposing it releases the AST, preamble,
/// and cached completion data libclang allocated for it (spec.md §4.4's
/// cascade-on-eviction is this `Drop` impl running when the cache's
/// `LruCache` drops the evicted entry).
pub struct ClangTranslationUnit(CXTranslationUnit);

// Safety: see `ClangLibrary`. The handle is only ever touched by the worker
// thread that owns the `ClangLibrary` it was parsed from.
unsafe impl Send for ClangTranslationUnit {}

impl Drop for ClangTranslationUnit {
    fn drop(&mut self) {
        unsafe {
            clang_disposeTranslationUnit(self.0);
        }
    }
}

unsafe fn cxstring_into_string(s: CXString) -> String {
    let ptr = clang_getCString(s);
    let owned = if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    };
    clang_disposeString(s);
    owned
}

fn build_unsaved<'a>(
    filename: &'a CString,
    contents: &'a Option<CString>,
) -> Vec<CXUnsavedFile> {
    match contents {
        Some(contents) => vec![CXUnsavedFile {
            Filename: filename.as_ptr(),
            Contents: contents.as_ptr(),
            Length: contents.as_bytes().len() as std::os::raw::c_ulong,
        }],
        None => Vec::new(),
    }
}

fn map_cursor_kind(kind: CXCursorKind) -> CursorKind {
    match kind {
        CXCursor_FunctionDecl => CursorKind::FunctionDecl,
        CXCursor_CXXMethod => CursorKind::CxxMethod,
        CXCursor_Constructor => CursorKind::Constructor,
        CXCursor_Destructor => CursorKind::Destructor,
        CXCursor_VarDecl => CursorKind::VarDecl,
        CXCursor_FieldDecl => CursorKind::FieldDecl,
        CXCursor_ParmDecl => CursorKind::ParmDecl,
        CXCursor_ClassDecl => CursorKind::ClassDecl,
        CXCursor_StructDecl => CursorKind::StructDecl,
        CXCursor_EnumDecl => CursorKind::EnumDecl,
        CXCursor_EnumConstantDecl => CursorKind::EnumConstantDecl,
        CXCursor_TypedefDecl => CursorKind::Typedef,
        CXCursor_MacroDefinition => CursorKind::MacroDefinition,
        CXCursor_Namespace => CursorKind::Namespace,
        CXCursor_NotImplemented | CXCursor_InvalidFile => CursorKind::NotFound,
        other => CursorKind::Other(format!("{other}")),
    }
}

/// Extracts the `TypedText` and `CurrentParameter` chunks plus a full
/// signature string from a completion's chunk list (spec.md §4.3 fields).
unsafe fn read_completion_string(cs: CXCompletionString) -> (String, String, Option<String>) {
    let num_chunks = clang_getNumCompletionChunks(cs);
    let mut completion = String::new();
    let mut signature = String::new();
    let mut annotation: Option<String> = None;

    for i in 0..num_chunks {
        let kind = clang_getCompletionChunkKind(cs, i);
        let text = cxstring_into_string(clang_getCompletionChunkText(cs, i));
        if kind == CXCompletionChunk_TypedText {
            completion = text.clone();
        }
        if kind == CXCompletionChunk_CurrentParameter {
            annotation = Some(text.clone());
        }
        if kind != CXCompletionChunk_Informative && kind != CXCompletionChunk_Optional {
            signature.push_str(&text);
        }
    }

    (completion, signature, annotation)
}

unsafe fn candidate_from_result(result: &CXCompletionResult) -> Option<Candidate> {
    let cs = result.CompletionString;
    if cs.is_null() {
        return None;
    }
    if clang_getCompletionAvailability(cs) == CXAvailability_NotAvailable {
        return None;
    }

    let (completion, signature, annotation) = read_completion_string(cs);
    if completion.is_empty() {
        return None;
    }

    let priority = clang_getCompletionPriority(cs) as i32;
    let mut candidate = Candidate::new(completion, signature, priority, map_cursor_kind(result.CursorKind));
    candidate.annotation = annotation;

    let mut parent_kind: CXCursorKind = 0;
    let parent = cxstring_into_string(clang_getCompletionParent(cs, &mut parent_kind));
    candidate.parent = (!parent.is_empty()).then_some(parent);

    let brief = cxstring_into_string(clang_getCompletionBriefComment(cs));
    candidate.brief_comment = (!brief.is_empty()).then_some(brief);

    Some(candidate)
}

unsafe fn extract_candidates(results: *mut CXCodeCompleteResults) -> Vec<Candidate> {
    if results.is_null() {
        return Vec::new();
    }
    let slice = std::slice::from_raw_parts((*results).Results, (*results).NumResults as usize);
    slice.iter().filter_map(candidate_from_result).collect()
}

impl SemanticLibrary for ClangLibrary {
    type TranslationUnit = ClangTranslationUnit;

    fn parse(
        &mut self,
        source: &Source,
        unsaved: Option<&[u8]>,
    ) -> Result<ParseOutcome<Self::TranslationUnit>, EngineError> {
        let start = Instant::now();
        let filename = CString::new(source.path.to_string_lossy().as_bytes())
            .map_err(|_| EngineError::ParseFailed { path: source.path.clone() })?;
        let args: Vec<CString> = source
            .args
            .iter()
            .filter_map(|a| CString::new(a.as_str()).ok())
            .collect();
        let arg_ptrs: Vec<*const std::os::raw::c_char> = args.iter().map(|a| a.as_ptr()).collect();

        let contents = unsaved.map(CString::new).transpose().unwrap_or(None);
        let mut unsaved_files = build_unsaved(&filename, &contents);

        let options = CXTranslationUnit_PrecompiledPreamble | CXTranslationUnit_CacheCompletionResults;

        let tu = unsafe {
            clang_parseTranslationUnit(
                self.index,
                filename.as_ptr(),
                arg_ptrs.as_ptr(),
                arg_ptrs.len() as c_int,
                unsaved_files.as_mut_ptr(),
                unsaved_files.len() as c_uint,
                options,
            )
        };

        if tu.is_null() {
            return Err(EngineError::ParseFailed { path: source.path.clone() });
        }

        Ok(ParseOutcome {
            unit: ClangTranslationUnit(tu),
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn reparse(
        &mut self,
        unit: &mut Self::TranslationUnit,
        unsaved: Option<&[u8]>,
    ) -> Result<u64, EngineError> {
        let start = Instant::now();
        let filename = CString::new(
            unsafe { cxstring_into_string(clang_getTranslationUnitSpelling(unit.0)) }.as_bytes(),
        )
        .unwrap_or_default();
        let contents = unsaved.map(CString::new).transpose().unwrap_or(None);
        let mut unsaved_files = build_unsaved(&filename, &contents);

        let result = unsafe {
            clang_reparseTranslationUnit(
                unit.0,
                unsaved_files.len() as c_uint,
                unsaved_files.as_mut_ptr(),
                clang_defaultReparseOptions(unit.0),
            )
        };

        if result != 0 {
            warn!(code = result, "libclang reparse failed");
            return Err(EngineError::ReparseFailed {
                path: std::path::PathBuf::from(filename.to_string_lossy().into_owned()),
            });
        }

        Ok(start.elapsed().as_millis() as u64)
    }

    fn code_complete_at(
        &mut self,
        unit: &mut Self::TranslationUnit,
        location: &Location,
        unsaved: Option<&[u8]>,
        include_macros: bool,
    ) -> Result<CodeCompleteOutcome, EngineError> {
        let start = Instant::now();
        let filename = CString::new(location.path.to_string_lossy().as_bytes())
            .map_err(|_| EngineError::ParseFailed { path: location.path.clone() })?;
        let contents = unsaved.map(CString::new).transpose().unwrap_or(None);
        let mut unsaved_files = build_unsaved(&filename, &contents);

        let mut options = unsafe { clang_defaultCodeCompleteOptions() };
        if include_macros {
            options |= CXCodeComplete_IncludeMacros;
        }

        let results = unsafe {
            clang_codeCompleteAt(
                unit.0,
                filename.as_ptr(),
                location.line,
                location.column,
                unsaved_files.as_mut_ptr(),
                unsaved_files.len() as c_uint,
                options,
            )
        };

        let candidates = unsafe { extract_candidates(results) };
        if !results.is_null() {
            unsafe {
                clang_disposeCodeCompleteResults(results);
            }
        }

        Ok(CodeCompleteOutcome {
            candidates,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}
