//! Character sources feeding a [`Cursor`](super::Cursor).
//!
//! The parser never sees bytes. A source yields Unicode scalar values one at
//! a time; [`StrSource`] walks an in-memory string and [`DecodingSource`]
//! decodes a byte stream incrementally with `encoding_rs`, so 8-, 16- and
//! 32-bit code unit inputs all reach the grammar as `char`.

use std::io::{self, Read};
use std::str::Chars;

use encoding_rs::{Decoder, Encoding};

use crate::encoding::{self, SNIFF_LEN};

/// A forward-only stream of characters.
pub trait CharSource {
    /// Returns the next character, or `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the underlying input fails. Callers treat such
    /// an error as fatal and do not call again.
    fn next_char(&mut self) -> io::Result<Option<char>>;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        (**self).next_char()
    }
}

/// A source over a borrowed string.
#[derive(Debug, Clone)]
pub struct StrSource<'a> {
    chars: Chars<'a>,
}

impl<'a> StrSource<'a> {
    /// Creates a source over `text`. A leading U+FEFF is skipped.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        Self {
            chars: text.chars(),
        }
    }
}

impl CharSource for StrSource<'_> {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        Ok(self.chars.next())
    }
}

const CHUNK: usize = 8 * 1024;

/// A source that decodes bytes from a reader.
///
/// The decoder is chosen once, from the first bytes of the stream, using
/// [`encoding::detect_encoding`]. Malformed byte sequences are reported as
/// [`io::ErrorKind::InvalidData`].
pub struct DecodingSource<R> {
    reader: R,
    decoder: Decoder,
    /// Bytes already read while sniffing, not yet decoded.
    pending: Vec<u8>,
    buf: Vec<u8>,
    decoded: String,
    pos: usize,
    finished: bool,
}

impl<R: Read> DecodingSource<R> {
    /// Creates a source, detecting the encoding from a BOM or the XML
    /// declaration.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the first read fails or the declared encoding
    /// is unknown.
    pub fn new(mut reader: R) -> io::Result<Self> {
        let mut prefix = Vec::with_capacity(SNIFF_LEN);
        (&mut reader)
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut prefix)?;
        let (detected, bom_len) = encoding::detect_encoding(&prefix)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        prefix.drain(..bom_len);
        let mut source = Self::with_encoding(reader, detected);
        source.pending = prefix;
        Ok(source)
    }

    /// Creates a source that decodes with a fixed encoding.
    pub fn with_encoding(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            decoder: encoding.new_decoder_without_bom_handling(),
            pending: Vec::new(),
            buf: vec![0; CHUNK],
            decoded: String::new(),
            pos: 0,
            finished: false,
        }
    }

    /// The encoding in use.
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.decoder.encoding()
    }

    fn refill(&mut self) -> io::Result<()> {
        let input = if self.pending.is_empty() {
            let n = loop {
                match self.reader.read(&mut self.buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e),
                }
            };
            &self.buf[..n]
        } else {
            &self.pending[..]
        };
        let last = input.is_empty();

        self.decoded.clear();
        self.pos = 0;
        let needed = self
            .decoder
            .max_utf8_buffer_length(input.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "decode buffer overflow"))?;
        self.decoded.reserve(needed);
        let (_, _, had_errors) = self.decoder.decode_to_string(input, &mut self.decoded, last);
        self.pending.clear();
        if had_errors {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "malformed byte sequence for encoding {}",
                    self.decoder.encoding().name()
                ),
            ));
        }
        self.finished = last;
        Ok(())
    }
}

impl<R: Read> CharSource for DecodingSource<R> {
    fn next_char(&mut self) -> io::Result<Option<char>> {
        loop {
            if let Some(c) = self.decoded[self.pos..].chars().next() {
                self.pos += c.len_utf8();
                return Ok(Some(c));
            }
            if self.finished {
                return Ok(None);
            }
            self.refill()?;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(mut source: impl CharSource) -> String {
        let mut out = String::new();
        while let Some(c) = source.next_char().unwrap() {
            out.push(c);
        }
        out
    }

    #[test]
    fn test_str_source_skips_bom() {
        assert_eq!(drain(StrSource::new("\u{FEFF}<a/>")), "<a/>");
    }

    #[test]
    fn test_decoding_source_utf8() {
        let source = DecodingSource::new("<a>caf\u{e9}</a>".as_bytes()).unwrap();
        assert_eq!(source.encoding().name(), "UTF-8");
        assert_eq!(drain(source), "<a>caf\u{e9}</a>");
    }

    #[test]
    fn test_decoding_source_utf16le_bom() {
        let bytes: &[u8] = b"\xFF\xFE<\x00a\x00/\x00>\x00";
        let source = DecodingSource::new(bytes).unwrap();
        assert_eq!(source.encoding().name(), "UTF-16LE");
        assert_eq!(drain(source), "<a/>");
    }

    #[test]
    fn test_decoding_source_declared_latin1() {
        let bytes: &[u8] = b"<?xml version='1.0' encoding='ISO-8859-1'?><a>\xE9</a>";
        let source = DecodingSource::new(bytes).unwrap();
        assert!(drain(source).ends_with("<a>\u{e9}</a>"));
    }

    #[test]
    fn test_decoding_source_across_chunks() {
        let text = "\u{1F600}".repeat(CHUNK);
        let source = DecodingSource::new(text.as_bytes()).unwrap();
        assert_eq!(drain(source), text);
    }

    #[test]
    fn test_decoding_source_malformed() {
        let bytes: &[u8] = b"<a>\xFF</a>";
        let mut source = DecodingSource::new(bytes).unwrap();
        let mut err = None;
        for _ in 0..16 {
            match source.next_char() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    err = Some(e);
                    break;
                }
            }
        }
        assert_eq!(err.unwrap().kind(), io::ErrorKind::InvalidData);
    }
}
