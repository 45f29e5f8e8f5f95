//! Value objects read with the `name = "value"` combinator.
//!
//! Attributes and the fields of the XML declaration all share one shape, so
//! each type here is a thin wrapper around
//! [`Cursor::read_name_and_quoted_value`]. [`DocType`] is the exception: it
//! records the document type declaration's name and external identifier and
//! keeps its internal subset as unprocessed text.

use std::borrow::Cow;
use std::fmt;

use super::cursor::Cursor;
use super::source::{CharSource, StrSource};
use super::OnMismatch;
use crate::encoding::{self, EncodingError};
use crate::error::{Expected, PResult, XmlError};
use crate::util::escape_attribute;

/// A grammar rule that produces a value.
///
/// [`read`](Production::read) is the raw production; [`parse`](Production::parse)
/// is the caller-facing entry point that records the mismatch on the cursor and
/// either returns `None` or raises it.
pub trait Production: Sized {
    /// Reads the value, rewinding the cursor on failure.
    fn read<S: CharSource>(cursor: &mut Cursor<S>) -> PResult<Self>;

    /// Reads the value and converts a mismatch according to `mode`.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Parse` on a mismatch in [`OnMismatch::Raise`] mode
    /// and `XmlError::Io` if the character source failed.
    fn parse<S: CharSource>(
        cursor: &mut Cursor<S>,
        mode: OnMismatch,
    ) -> Result<Option<Self>, XmlError> {
        let result = Self::read(cursor);
        cursor.finish(result, mode)
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// An attribute of an element.
///
/// The value is stored as written between the quotes, with entity and
/// character references left in place. Use
/// [`unescaped_value`](Attribute::unescaped_value) for the text it denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,
    /// The attribute value, references intact.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute from a value that is already in attribute-value
    /// syntax (no `<`, `&` only as part of a reference).
    #[must_use]
    pub fn new(name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: raw_value.into(),
        }
    }

    /// Creates an attribute whose value is plain text, escaping it as needed.
    #[must_use]
    pub fn from_unescaped(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            value: escape_attribute(value).into_owned(),
        }
    }

    /// Returns the value as written.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the value with references expanded and white space
    /// normalized (XML 1.0 §3.3.3).
    ///
    /// Entity references other than the five predefined ones are kept
    /// as written, since there is no DTD to resolve them against.
    #[must_use]
    pub fn unescaped_value(&self) -> Cow<'_, str> {
        if !self.value.contains(['&', '\t', '\n', '\r']) {
            return Cow::Borrowed(&self.value);
        }
        let mut out = String::with_capacity(self.value.len());
        let mut cursor = Cursor::new(StrSource::new(&self.value));
        loop {
            cursor.take_while(&mut out, |c| c != '&' && c != '\t' && c != '\n' && c != '\r');
            match cursor.peek() {
                None => break,
                Some('&') => match cursor.read_reference() {
                    Ok(reference) => match reference.resolve() {
                        Some(c) => out.push(c),
                        None => out.push_str(&reference.to_string()),
                    },
                    Err(_) => {
                        cursor.read();
                        out.push('&');
                    }
                },
                Some(_) => {
                    cursor.read();
                    out.push(' ');
                }
            }
        }
        Cow::Owned(out)
    }
}

impl Production for Attribute {
    /// `Attribute ::= Name Eq AttValue` `[41]`
    fn read<S: CharSource>(cursor: &mut Cursor<S>) -> PResult<Self> {
        let (name, value) =
            cursor.read_name_and_quoted_value(Cursor::read_name, Cursor::read_attribute_value)?;
        Ok(Self { name, value })
    }
}

// ---------------------------------------------------------------------------
// XML declaration fields
// ---------------------------------------------------------------------------

/// `version = 'major.minor'`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Default for Version {
    fn default() -> Self {
        Self { major: 1, minor: 0 }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Production for Version {
    /// `VersionInfo ::= 'version' Eq ("'" VersionNum "'" | '"' VersionNum '"')` `[24]`
    fn read<S: CharSource>(cursor: &mut Cursor<S>) -> PResult<Self> {
        let ((), version) = cursor
            .read_name_and_quoted_value(|c| c.match_name("version"), |c, _| c.read_version())?;
        Ok(version)
    }
}

/// `encoding = 'name'`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Encoding {
    pub name: String,
}

impl Encoding {
    /// Creates an encoding field.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns `true` for the UTF-8 labels.
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        self.name.eq_ignore_ascii_case("UTF-8") || self.name.eq_ignore_ascii_case("UTF8")
    }

    /// Looks the name up in `encoding_rs`.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError` if the label is unknown.
    pub fn to_encoding_rs(&self) -> Result<&'static encoding_rs::Encoding, EncodingError> {
        encoding::lookup(&self.name)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Production for Encoding {
    /// `EncodingDecl ::= 'encoding' Eq ('"' EncName '"' | "'" EncName "'")` `[80]`
    fn read<S: CharSource>(cursor: &mut Cursor<S>) -> PResult<Self> {
        let ((), name) = cursor.read_name_and_quoted_value(
            |c| c.match_name("encoding"),
            |c, _| c.read_encoding_name(),
        )?;
        Ok(Self { name })
    }
}

/// `standalone = 'yes' | 'no'`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Standalone(pub bool);

impl fmt::Display for Standalone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "yes" } else { "no" })
    }
}

impl Production for Standalone {
    /// `SDDecl ::= 'standalone' Eq (("'" ('yes' | 'no') "'") | ('"' ('yes' | 'no') '"'))` `[32]`
    fn read<S: CharSource>(cursor: &mut Cursor<S>) -> PResult<Self> {
        let ((), yes) = cursor
            .read_name_and_quoted_value(|c| c.match_name("standalone"), |c, _| c.read_yes_no())?;
        Ok(Self(yes))
    }
}

/// The XML declaration, `<?xml version="1.0" ...?>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlDecl {
    pub version: Version,
    pub encoding: Option<Encoding>,
    pub standalone: Option<Standalone>,
}

impl Production for XmlDecl {
    /// `XMLDecl ::= '<?xml' VersionInfo EncodingDecl? SDDecl? S? '?>'` `[23]`
    fn read<S: CharSource>(cursor: &mut Cursor<S>) -> PResult<Self> {
        cursor.attempt(|c| {
            c.match_str("<?xml")?;
            c.read_spaces()?;
            let version = Version::read(c)?;
            let encoding = optional_field(c, "encoding", Encoding::read)?;
            let standalone = optional_field(c, "standalone", Standalone::read)?;
            c.skip_spaces();
            c.match_str("?>")?;
            Ok(Self {
                version,
                encoding,
                standalone,
            })
        })
    }
}

/// `(S keyword Eq value)?`. Once `keyword` is seen the field must be valid.
fn optional_field<S: CharSource, T>(
    cursor: &mut Cursor<S>,
    keyword: &str,
    read: impl FnOnce(&mut Cursor<S>) -> PResult<T>,
) -> PResult<Option<T>> {
    cursor.push();
    if cursor.read_spaces().is_err() || !cursor.looking_at(keyword) {
        cursor.pop();
        return Ok(None);
    }
    match read(cursor) {
        Ok(value) => {
            cursor.drop_checkpoint();
            Ok(Some(value))
        }
        Err(e) => {
            cursor.pop();
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Document type declaration
// ---------------------------------------------------------------------------

/// `<!DOCTYPE name ExternalID? [internal subset]?>`
///
/// The internal subset is kept verbatim and not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocType {
    /// The declared root element name.
    pub name: String,
    /// The public identifier, if any.
    pub public_id: Option<String>,
    /// The system identifier, if any.
    pub system_id: Option<String>,
    /// The text between `[` and `]`, if present.
    pub internal_subset: Option<String>,
}

impl DocType {
    /// A declaration with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_id: None,
            system_id: None,
            internal_subset: None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<!DOCTYPE {}", self.name)?;
        match (&self.public_id, &self.system_id) {
            (Some(public), Some(system)) => write!(f, " PUBLIC \"{public}\" \"{system}\"")?,
            (Some(public), None) => write!(f, " PUBLIC \"{public}\"")?,
            (None, Some(system)) if system.contains('"') => write!(f, " SYSTEM '{system}'")?,
            (None, Some(system)) => write!(f, " SYSTEM \"{system}\"")?,
            (None, None) => {}
        }
        if let Some(subset) = &self.internal_subset {
            write!(f, " [{subset}]")?;
        }
        f.write_str(">")
    }
}

impl Production for DocType {
    /// `doctypedecl ::= '<!DOCTYPE' S Name (S ExternalID)? S? ('[' intSubset ']' S?)? '>'` `[28]`
    fn read<S: CharSource>(cursor: &mut Cursor<S>) -> PResult<Self> {
        cursor.attempt(|c| {
            c.match_str("<!DOCTYPE")?;
            c.read_spaces()?;
            let mut doctype = Self::new(c.read_name()?);

            c.push();
            let has_space = c.read_spaces().is_ok();
            if has_space && c.match_str("SYSTEM").is_ok() {
                c.drop_checkpoint();
                c.read_spaces()?;
                doctype.system_id = Some(c.read_quoted(Cursor::read_system_literal)?);
            } else if has_space && c.match_str("PUBLIC").is_ok() {
                c.drop_checkpoint();
                c.read_spaces()?;
                doctype.public_id = Some(c.read_quoted(Cursor::read_pubid_literal)?);
                c.read_spaces()?;
                doctype.system_id = Some(c.read_quoted(Cursor::read_system_literal)?);
            } else {
                c.pop();
            }

            c.skip_spaces();
            if c.match_char('[').is_ok() {
                doctype.internal_subset = Some(read_internal_subset(c)?);
                c.match_char(']')?;
                c.skip_spaces();
            }
            c.match_char('>')?;
            Ok(doctype)
        })
    }
}

/// Collects the internal subset up to its closing `]`, stepping over quoted
/// literals, comments and processing instructions so a `]` inside them does
/// not end the subset.
fn read_internal_subset<S: CharSource>(cursor: &mut Cursor<S>) -> PResult<String> {
    let mut subset = String::new();
    loop {
        match cursor.peek() {
            None => return cursor.fail(Expected::Terminator("]")),
            Some(']') => return Ok(subset),
            Some(q @ ('"' | '\'')) => {
                let literal = cursor.read_quoted(Cursor::read_system_literal)?;
                subset.push(q);
                subset.push_str(&literal);
                subset.push(q);
            }
            Some('<') if cursor.looking_at("<!--") => {
                let body = cursor.read_comment()?;
                subset.push_str("<!--");
                subset.push_str(&body);
                subset.push_str("-->");
            }
            Some('<') if cursor.looking_at("<?") => {
                cursor.match_str("<?")?;
                let data = cursor.read_pi_content()?;
                cursor.match_str("?>")?;
                subset.push_str("<?");
                subset.push_str(&data);
                subset.push_str("?>");
            }
            Some(c) => {
                cursor.read();
                subset.push(c);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cursor(text: &str) -> Cursor<StrSource<'_>> {
        Cursor::new(StrSource::new(text))
    }

    #[test]
    fn test_attribute_read() {
        let mut c = cursor("id = \"a&amp;b\" rest");
        let attr = Attribute::read(&mut c).unwrap();
        assert_eq!(attr, Attribute::new("id", "a&amp;b"));
        assert_eq!(attr.unescaped_value(), "a&b");
    }

    #[test]
    fn test_attribute_unescaped_value() {
        let attr = Attribute::new("a", "x&#65;&#x42;&lt;&custom;\ty");
        assert_eq!(attr.unescaped_value(), "xAB<&custom; y");
        assert!(matches!(
            Attribute::new("a", "plain").unescaped_value(),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_attribute_from_unescaped() {
        let attr = Attribute::from_unescaped("title", "a < b & \"c\"");
        assert_eq!(attr.value(), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(attr.unescaped_value(), "a < b & \"c\"");
    }

    #[test]
    fn test_xml_decl_full() {
        let mut c = cursor("<?xml version='1.0' encoding=\"UTF-8\" standalone='yes' ?><a/>");
        let decl = XmlDecl::read(&mut c).unwrap();
        assert_eq!(decl.version, Version { major: 1, minor: 0 });
        assert_eq!(decl.encoding, Some(Encoding::new("UTF-8")));
        assert_eq!(decl.standalone, Some(Standalone(true)));
        assert!(c.looking_at("<a/>"));
    }

    #[test]
    fn test_xml_decl_minimal() {
        let mut c = cursor("<?xml version=\"1.1\"?>");
        let decl = XmlDecl::read(&mut c).unwrap();
        assert_eq!(decl.version.to_string(), "1.1");
        assert_eq!(decl.encoding, None);
        assert_eq!(decl.standalone, None);
    }

    #[test]
    fn test_xml_decl_bad_encoding_is_reported() {
        let mut c = cursor("<?xml version='1.0' encoding='8bit'?>");
        let err = XmlDecl::read(&mut c).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected valid XML encoding name (at line 1 col 31)"
        );
        assert_eq!(c.offset(), 0);
    }

    #[test]
    fn test_xml_decl_fields_out_of_order() {
        let mut c = cursor("<?xml version='1.0' standalone='no' encoding='UTF-8'?>");
        assert!(XmlDecl::read(&mut c).is_err());
    }

    #[test]
    fn test_encoding_helpers() {
        assert!(Encoding::new("utf-8").is_utf8());
        assert!(!Encoding::new("ISO-8859-1").is_utf8());
        assert_eq!(
            Encoding::new("Shift_JIS").to_encoding_rs().unwrap().name(),
            "Shift_JIS"
        );
        assert!(Encoding::new("nope").to_encoding_rs().is_err());
    }

    #[test]
    fn test_doctype_system() {
        let mut c = cursor("<!DOCTYPE note SYSTEM \"note.dtd\">");
        let dt = DocType::read(&mut c).unwrap();
        assert_eq!(dt.name, "note");
        assert_eq!(dt.system_id.as_deref(), Some("note.dtd"));
        assert_eq!(dt.public_id, None);
        assert_eq!(dt.to_string(), "<!DOCTYPE note SYSTEM \"note.dtd\">");
    }

    #[test]
    fn test_doctype_public() {
        let text = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \
                    \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">";
        let dt = DocType::read(&mut cursor(text)).unwrap();
        assert_eq!(dt.public_id.as_deref(), Some("-//W3C//DTD XHTML 1.0 Strict//EN"));
        assert_eq!(dt.to_string(), text.replace("  ", " "));
    }

    #[test]
    fn test_doctype_internal_subset() {
        let text = "<!DOCTYPE a [\n<!ENTITY x \"]\">\n<!-- ] -->\n]>";
        let dt = DocType::read(&mut cursor(text)).unwrap();
        assert_eq!(
            dt.internal_subset.as_deref(),
            Some("\n<!ENTITY x \"]\">\n<!-- ] -->\n")
        );
    }

    #[test]
    fn test_doctype_unterminated() {
        let mut c = cursor("<!DOCTYPE a [ <!ELEMENT a ANY>");
        assert!(DocType::read(&mut c).is_err());
        assert_eq!(c.offset(), 0);
    }

    #[test]
    fn test_parse_modes() {
        let mut c = cursor("standalone = 'maybe'");
        assert_eq!(Standalone::parse(&mut c, OnMismatch::Absent).unwrap(), None);
        assert_eq!(
            c.last_error().unwrap().to_string(),
            "Expected 'yes' or 'no' value (at line 1 col 15)"
        );
        assert!(Standalone::parse(&mut c, OnMismatch::Raise).is_err());
    }
}
