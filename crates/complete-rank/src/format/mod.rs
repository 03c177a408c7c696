mod elisp;
mod json;
mod plain;
mod xml;

use complete_model::{Candidate, Encoding};

/// The encoded reply bytes for a completion result set, ready to hand to a
/// `Connection`.
pub type Formatted = Vec<u8>;

/// Emits `candidates` in the requested `encoding`. Candidate order is
/// preserved verbatim in all four encodings (spec.md §4.3).
pub fn format_candidates(candidates: &[Candidate], encoding: Encoding) -> Formatted {
    match encoding {
        Encoding::Elisp => elisp::format(candidates),
        Encoding::Xml => xml::format(candidates),
        Encoding::Json => json::format(candidates),
        Encoding::Plain => plain::format(candidates),
    }
}
