//! Encoding detection and transcoding.
//!
//! Bytes become characters in one of two ways: a whole buffer is decoded up
//! front by [`decode_document`], or a reader is decoded incrementally by
//! [`DecodingSource`](crate::parser::DecodingSource). Both choose the encoding
//! with [`detect_encoding`]:
//!
//! 1. A byte order mark wins (UTF-8, UTF-16LE, UTF-16BE).
//! 2. Otherwise the first bytes are checked for the `<?xml` pattern of a
//!    BOM-less UTF-16 document (XML 1.0 Appendix F).
//! 3. Otherwise the prefix is read as ASCII and, if it starts with an XML
//!    declaration, its `encoding` field is looked up with `encoding_rs`.
//! 4. If none of the above apply, the document is UTF-8.

use std::fmt;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::parser::{Cursor, Production, StrSource, XmlDecl};

/// How many leading bytes are inspected for an XML declaration.
pub const SNIFF_LEN: usize = 512;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error: {}", self.message)
    }
}

impl std::error::Error for EncodingError {}

/// Looks for a byte order mark.
///
/// Returns the encoding it indicates and its length in bytes.
///
/// # Examples
///
/// ```
/// use xmlgrove::encoding::detect_bom;
///
/// let (enc, len) = detect_bom(b"\xEF\xBB\xBF<a/>").unwrap();
/// assert_eq!(enc.name(), "UTF-8");
/// assert_eq!(len, 3);
/// assert!(detect_bom(b"<a/>").is_none());
/// ```
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
    Encoding::for_bom(bytes)
}

/// Chooses the encoding of a document from its leading bytes.
///
/// `prefix` only needs to cover the XML declaration; [`SNIFF_LEN`] bytes
/// are always enough for one that is well-formed. Returns the encoding and
/// the number of BOM bytes to skip.
///
/// # Errors
///
/// Returns `EncodingError` if the declaration names an encoding that
/// `encoding_rs` does not know.
pub fn detect_encoding(prefix: &[u8]) -> Result<(&'static Encoding, usize), EncodingError> {
    if let Some(found) = detect_bom(prefix) {
        return Ok(found);
    }
    match prefix {
        [0x3C, 0x00, 0x3F, 0x00, ..] => return Ok((UTF_16LE, 0)),
        [0x00, 0x3C, 0x00, 0x3F, ..] => return Ok((UTF_16BE, 0)),
        _ => {}
    }
    match declared_encoding(prefix) {
        // A UTF-16 label without a BOM cannot describe ASCII-compatible bytes.
        Some(label) if is_utf16_label(&label) => Ok((UTF_8, 0)),
        Some(label) => Ok((lookup(&label)?, 0)),
        None => Ok((UTF_8, 0)),
    }
}

/// Looks up an encoding by its IANA label, case-insensitively.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown.
pub fn lookup(label: &str) -> Result<&'static Encoding, EncodingError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))
}

/// Transcodes a byte slice from the named encoding into a `String`.
///
/// # Errors
///
/// Returns `EncodingError` if the encoding name is not recognized or if
/// the input contains malformed byte sequences.
///
/// # Examples
///
/// ```
/// use xmlgrove::encoding::transcode;
///
/// let result = transcode(b"caf\xE9", "ISO-8859-1").unwrap();
/// assert_eq!(result, "caf\u{e9}");
/// ```
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, EncodingError> {
    decode_with(lookup(label)?, bytes)
}

/// Decodes a complete XML document into a `String`.
///
/// The encoding is chosen by [`detect_encoding`]; a leading BOM is removed.
///
/// # Errors
///
/// Returns `EncodingError` if the declared encoding is unknown or the bytes
/// are malformed for the chosen encoding.
///
/// # Examples
///
/// ```
/// use xmlgrove::encoding::decode_document;
///
/// let text = decode_document(b"\xEF\xBB\xBF<root/>").unwrap();
/// assert_eq!(text, "<root/>");
/// ```
pub fn decode_document(bytes: &[u8]) -> Result<String, EncodingError> {
    let prefix = &bytes[..bytes.len().min(SNIFF_LEN)];
    let (encoding, bom_len) = detect_encoding(prefix)?;
    decode_with(encoding, &bytes[bom_len..])
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, EncodingError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Reads the `encoding` field of an XML declaration at the start of `prefix`.
///
/// The declaration is restricted to ASCII, so every byte is mapped to the
/// character with the same value and handed to the declaration grammar.
fn declared_encoding(prefix: &[u8]) -> Option<String> {
    if !prefix.starts_with(b"<?xml") {
        return None;
    }
    let end = prefix.windows(2).position(|w| w == b"?>")? + 2;
    let text: String = prefix[..end].iter().map(|&b| char::from(b)).collect();
    let mut cursor = Cursor::new(StrSource::new(&text));
    let decl = XmlDecl::read(&mut cursor).ok()?;
    decl.encoding.map(|e| e.name)
}

fn is_utf16_label(label: &str) -> bool {
    let upper = label.to_ascii_uppercase();
    upper == "UTF-16" || upper == "UTF-16LE" || upper == "UTF-16BE"
}
