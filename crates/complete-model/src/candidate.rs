use std::fmt;

/// Coarse cursor-kind tag reported by the semantic library for a completion
/// result. Only the kinds that matter for ranking/display are enumerated;
/// anything else is preserved verbatim so encodings never lose information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorKind {
    FunctionDecl,
    CxxMethod,
    Constructor,
    Destructor,
    VarDecl,
    FieldDecl,
    ParmDecl,
    ClassDecl,
    StructDecl,
    EnumDecl,
    EnumConstantDecl,
    Typedef,
    MacroDefinition,
    Namespace,
    NotFound,
    Other(String),
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CursorKind::FunctionDecl => "FunctionDecl",
            CursorKind::CxxMethod => "CXXMethod",
            CursorKind::Constructor => "Constructor",
            CursorKind::Destructor => "Destructor",
            CursorKind::VarDecl => "VarDecl",
            CursorKind::FieldDecl => "FieldDecl",
            CursorKind::ParmDecl => "ParmDecl",
            CursorKind::ClassDecl => "ClassDecl",
            CursorKind::StructDecl => "StructDecl",
            CursorKind::EnumDecl => "EnumDecl",
            CursorKind::EnumConstantDecl => "EnumConstantDecl",
            CursorKind::Typedef => "Typedef",
            CursorKind::MacroDefinition => "MacroDefinition",
            CursorKind::Namespace => "Namespace",
            CursorKind::NotFound => "NotFound",
            CursorKind::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// Sentinel distance for a candidate whose completion text is not present as
/// a token in the unsaved buffer (spec.md §4.3).
pub const DISTANCE_NOT_FOUND: i32 = i32::MAX;

/// One completion suggestion, assembled from a semantic-library result plus
/// the token-index-derived distance (spec.md §3, §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub completion: String,
    pub signature: String,
    pub annotation: Option<String>,
    pub parent: Option<String>,
    pub brief_comment: Option<String>,
    pub priority: i32,
    pub distance: i32,
    pub cursor_kind: CursorKind,
}

impl Candidate {
    pub fn new(completion: String, signature: String, priority: i32, cursor_kind: CursorKind) -> Self {
        Self {
            completion,
            signature,
            annotation: None,
            parent: None,
            brief_comment: None,
            priority,
            distance: DISTANCE_NOT_FOUND,
            cursor_kind,
        }
    }
}
