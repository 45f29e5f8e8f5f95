//! The character-level XML parser.
//!
//! The parser is layered bottom-up:
//!
//! - [`source`]: character sources ([`StrSource`], [`DecodingSource`]).
//! - [`cursor`]: the [`Cursor`] with line/column tracking and checkpoints.
//! - [`matchers`]: single-character and literal matchers, XML character classes.
//! - [`grammar`]: XML productions (names, references, literals, comments, ...).
//! - [`decl`]: value objects built with the `name = "value"` combinator.
//! - `xml`: node construction, from single elements up to whole documents.
//!
//! Everything below `xml` returns [`PResult`](crate::error::PResult) and never
//! raises; entry points choose with [`OnMismatch`] whether a mismatch becomes
//! `None` or an error.

pub mod cursor;
pub mod decl;
pub mod grammar;
pub mod matchers;
pub mod source;
mod xml;

pub use cursor::Cursor;
pub use decl::{Attribute, DocType, Encoding, Production, Standalone, Version, XmlDecl};
pub use grammar::Reference;
pub use source::{CharSource, DecodingSource, StrSource};

/// Default maximum element nesting depth.
pub const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum length (in characters) of an element or attribute name.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// What a caller-facing entry point does when the input does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnMismatch {
    /// Return `Ok(None)`; the diagnostic stays available through
    /// [`Cursor::last_error`].
    Absent,
    /// Return the diagnostic as `Err(XmlError::Parse)`.
    #[default]
    Raise,
}

/// Parse options controlling node construction and limits.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use xmlgrove::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .no_blanks(true)
///     .keep_comments(false)
///     .max_depth(128);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// If true, whitespace-only text nodes are not created.
    pub no_blanks: bool,
    /// If false, comments are read but not added to the tree.
    pub keep_comments: bool,
    /// If false, processing instructions are read but not added to the tree.
    pub keep_processing_instructions: bool,

    // -- Limits --
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum length in characters of an element or attribute name (default: 50,000).
    pub max_name_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            no_blanks: false,
            keep_comments: true,
            keep_processing_instructions: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Enables or disables stripping of blank text nodes.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    /// Keeps or drops comments.
    #[must_use]
    pub fn keep_comments(mut self, yes: bool) -> Self {
        self.keep_comments = yes;
        self
    }

    /// Keeps or drops processing instructions.
    #[must_use]
    pub fn keep_processing_instructions(mut self, yes: bool) -> Self {
        self.keep_processing_instructions = yes;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum element/attribute name length.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }
}
