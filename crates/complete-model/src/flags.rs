bitflags::bitflags! {
    /// Per-request flag set, mirroring `CompletionThread::Flag` from the
    /// original implementation 1:1 (spec.md §6).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// Force re-parsing even if the cache holds a matching entry.
        const REFRESH = 0x01;
        /// Encode the reply as an Elisp s-expression.
        const ELISP = 0x02;
        /// Encode the reply as XML.
        const XML = 0x04;
        /// Encode the reply as JSON.
        const JSON = 0x08;
        /// Pass the "include macros" option to the semantic library.
        const INCLUDE_MACROS = 0x10;
        /// Pure cache-fill request: no location, no reply.
        const WARM_UP = 0x20;
    }
}

/// The output encoding selected by a request's flags.
///
/// `Elisp`, `Xml` and `Json` are mutually exclusive per spec.md §6; if more
/// than one is set we resolve deterministically in that order so behavior
/// stays defined rather than relying on caller discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Elisp,
    Xml,
    Json,
    Plain,
}

impl Flags {
    pub fn encoding(self) -> Encoding {
        if self.contains(Flags::ELISP) {
            Encoding::Elisp
        } else if self.contains(Flags::XML) {
            Encoding::Xml
        } else if self.contains(Flags::JSON) {
            Encoding::Json
        } else {
            Encoding::Plain
        }
    }

    pub fn is_warm_up(self) -> bool {
        self.contains(Flags::WARM_UP)
    }

    pub fn is_refresh(self) -> bool {
        self.contains(Flags::REFRESH)
    }

    pub fn include_macros(self) -> bool {
        self.contains(Flags::INCLUDE_MACROS)
    }
}
