//! Error types and diagnostics for XML parsing.
//!
//! Two kinds of failure are kept apart:
//!
//! - a **grammar mismatch** is an ordinary value. Every production returns
//!   [`PResult`], and on failure it hands back a [`Diagnostic`] naming what was
//!   expected and where. Building a diagnostic never formats a string; the
//!   message is produced lazily by `Display`.
//! - an **error** ([`XmlError`]) is what a caller-facing entry point raises: a
//!   grammar mismatch the caller asked to surface, an I/O failure of the
//!   character source, or an encoding failure.
//!
//! Structural misuse of the tree (a position that does not belong to the
//! parent, a stale node id) is a programmer error and panics instead.

use std::fmt;
use std::io;

use crate::encoding::EncodingError;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based character offset from the start of the input.
    pub offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What a grammar production expected to find.
///
/// Each production reports its own variant so failures stay specific; the
/// text is only rendered when the diagnostic is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// A single literal character, e.g. a closing quote.
    Char(char),
    /// A literal string such as `<!--` or `?>`.
    Literal(&'static str),
    /// Anything but the given character next.
    NotChar(char),
    /// Anything but the given string next.
    NotLiteral(&'static str),
    /// A character in the inclusive range.
    Range(char, char),
    /// A character outside the inclusive range.
    OutsideRange(char, char),
    /// One of the characters of the set.
    OneOf(&'static str),
    /// A character not in the set.
    NoneOf(&'static str),
    /// A character of the described class.
    Class(&'static str),
    /// A name equal to the given keyword (`version`, `encoding`, ...).
    NameToBe(&'static str),
    /// An XML `Name`.
    Name,
    /// A space-separated list of names.
    Names,
    /// An XML `Nmtoken`.
    Token,
    /// A space-separated list of tokens.
    Tokens,
    /// One whitespace character.
    Space,
    /// A `'` or `"` character.
    Quote,
    /// An entity or character reference.
    Reference,
    /// A parameter-entity reference (`%name;`).
    PeReference,
    /// A comment (`<!-- ... -->`).
    Comment,
    /// A comment body without `--`.
    NoDoubleHyphen,
    /// A CDATA section.
    CData,
    /// A processing instruction target.
    PiTarget,
    /// A processing instruction target other than `xml`.
    NonReservedPiTarget,
    /// Character data terminated before `?>` or `]]>` was found.
    Terminator(&'static str),
    /// A decimal number.
    Number,
    /// A decimal number that fits in a byte.
    NumberInRange,
    /// A `major.minor` version number.
    Version,
    /// An encoding name (`EncName`).
    EncodingName,
    /// `yes` or `no`.
    YesNo,
    /// A public identifier character.
    PubidChar,
    /// A start tag.
    StartTag,
    /// The end tag closing the named element.
    EndTag(String),
    /// An attribute whose name is not already present on the element.
    UniqueAttribute(String),
    /// A reference to one of the predefined entities.
    KnownEntity(String),
    /// A root element.
    RootElement,
    /// The end of the input.
    EndOfInput,
    /// Element nesting within the configured limit.
    Depth(u32),
    /// A name within the configured length limit.
    NameLength(usize),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "Expected '{c}' character"),
            Self::Literal(s) => write!(f, "Expected '{s}'"),
            Self::NotChar(c) => write!(f, "Expected anything but '{c}'"),
            Self::NotLiteral(s) => write!(f, "Expected anything but '{s}'"),
            Self::Range(lo, hi) => write!(f, "Expected character in range '{lo}'-'{hi}'"),
            Self::OutsideRange(lo, hi) => {
                write!(f, "Expected character outside range '{lo}'-'{hi}'")
            }
            Self::OneOf(set) => write!(f, "Expected one of \"{set}\""),
            Self::NoneOf(set) => write!(f, "Expected character not in \"{set}\""),
            Self::Class(name) => write!(f, "Expected {name}"),
            Self::NameToBe(s) => write!(f, "Expected name to be '{s}'"),
            Self::Name => f.write_str("Expected name"),
            Self::Names => f.write_str("Expected names"),
            Self::Token => f.write_str("Expected name token"),
            Self::Tokens => f.write_str("Expected name tokens"),
            Self::Space => f.write_str("Expected whitespace"),
            Self::Quote => f.write_str("Expected quote character"),
            Self::Reference => f.write_str("Expected reference"),
            Self::PeReference => f.write_str("Expected parameter-entity reference"),
            Self::Comment => f.write_str("Expected comment"),
            Self::NoDoubleHyphen => f.write_str("Expected no '--' inside comment"),
            Self::CData => f.write_str("Expected CDATA section"),
            Self::PiTarget => f.write_str("Expected processing instruction target"),
            Self::NonReservedPiTarget => {
                f.write_str("Expected processing instruction target other than 'xml'")
            }
            Self::Terminator(s) => write!(f, "Expected '{s}' before end of input"),
            Self::Number => f.write_str("Expected number"),
            Self::NumberInRange => f.write_str("Expected number in range 0-255"),
            Self::Version => f.write_str("Expected version"),
            Self::EncodingName => f.write_str("Expected valid XML encoding name"),
            Self::YesNo => f.write_str("Expected 'yes' or 'no' value"),
            Self::PubidChar => f.write_str("Expected public identifier character"),
            Self::StartTag => f.write_str("Expected start tag"),
            Self::EndTag(name) => write!(f, "Expected end tag '</{name}>'"),
            Self::UniqueAttribute(name) => {
                write!(f, "Expected attribute '{name}' to appear only once")
            }
            Self::KnownEntity(name) => write!(f, "Expected known entity instead of '&{name};'"),
            Self::RootElement => f.write_str("Expected root element"),
            Self::EndOfInput => f.write_str("Expected end of input"),
            Self::Depth(max) => write!(f, "Expected element nesting of at most {max}"),
            Self::NameLength(max) => write!(f, "Expected name of at most {max} characters"),
        }
    }
}

/// A positioned grammar mismatch.
///
/// The location is where the failing production started (the cursor is
/// restored there), except for combinators, which pass along the innermost
/// diagnostic unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What the production expected.
    pub expected: Expected,
    /// Where the expectation was not met.
    pub location: SourceLocation,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(expected: Expected, location: SourceLocation) -> Self {
        Self { expected, location }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at line {} col {})",
            self.expected, self.location.line, self.location.column
        )
    }
}

/// The result of a grammar production.
pub type PResult<T> = Result<T, Diagnostic>;

/// The error type returned when a caller asks for a failed parse to be raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The formatted expectation.
    pub message: String,
    /// Where in the source the parse failed.
    pub location: SourceLocation,
}

impl From<Diagnostic> for ParseError {
    fn from(diag: Diagnostic) -> Self {
        Self {
            message: diag.expected.to_string(),
            location: diag.location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at line {} col {})",
            self.message, self.location.line, self.location.column
        )
    }
}

impl std::error::Error for ParseError {}

/// Every failure a caller-facing entry point can raise.
#[derive(Debug)]
pub enum XmlError {
    /// The input did not match the XML grammar.
    Parse(ParseError),
    /// The character source failed (not simply end of input).
    Io(io::Error),
    /// The bytes could not be decoded into characters.
    Encoding(EncodingError),
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Io(e) => write!(f, "read error: {e}"),
            Self::Encoding(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for XmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Encoding(e) => Some(e),
        }
    }
}

impl From<ParseError> for XmlError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<Diagnostic> for XmlError {
    fn from(diag: Diagnostic) -> Self {
        Self::Parse(diag.into())
    }
}

impl From<io::Error> for XmlError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<EncodingError> for XmlError {
    fn from(e: EncodingError) -> Self {
        Self::Encoding(e)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(line: u32, column: u32) -> SourceLocation {
        SourceLocation {
            line,
            column,
            offset: 0,
        }
    }

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(Expected::Char('\''), at(1, 6));
        assert_eq!(diag.to_string(), "Expected ''' character (at line 1 col 6)");

        let diag = Diagnostic::new(Expected::NameToBe("version"), at(1, 1));
        assert_eq!(
            diag.to_string(),
            "Expected name to be 'version' (at line 1 col 1)"
        );
    }

    #[test]
    fn test_parse_error_keeps_diagnostic_text() {
        let diag = Diagnostic::new(Expected::Version, at(1, 12));
        let err = ParseError::from(diag.clone());
        assert_eq!(err.to_string(), diag.to_string());
        assert_eq!(err.location, diag.location);
    }

    #[test]
    fn test_xml_error_display() {
        let err = XmlError::from(Diagnostic::new(Expected::RootElement, at(3, 1)));
        assert_eq!(
            err.to_string(),
            "parse error: Expected root element (at line 3 col 1)"
        );

        let err = XmlError::from(io::Error::new(io::ErrorKind::Other, "disk on fire"));
        assert_eq!(err.to_string(), "read error: disk on fire");
    }

    #[test]
    fn test_xml_error_source() {
        use std::error::Error as _;

        let err = XmlError::from(Diagnostic::new(Expected::Name, at(1, 1)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_expected_messages_are_specific() {
        assert_eq!(
            Expected::EndTag("a".to_string()).to_string(),
            "Expected end tag '</a>'"
        );
        assert_eq!(
            Expected::YesNo.to_string(),
            "Expected 'yes' or 'no' value"
        );
        assert_eq!(
            Expected::EncodingName.to_string(),
            "Expected valid XML encoding name"
        );
    }
}
