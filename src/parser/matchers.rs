//! Lexical matchers and XML character classes.
//!
//! Matchers are the smallest productions: each looks at one character (or a
//! literal string) and either consumes it or fails without moving. Every
//! grammar rule in [`grammar`](super::grammar) is composed from them.

use super::cursor::Cursor;
use super::source::CharSource;
use crate::error::{Expected, PResult};

// -------------------------------------------------------------------------
// Character classes (XML 1.0 Fifth Edition)
// -------------------------------------------------------------------------

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
#[must_use]
pub fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is white space per XML 1.0 §2.3 `[3]`.
#[must_use]
pub fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
#[must_use]
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 `[4a]`.
#[must_use]
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Returns `true` if `c` is a valid `PubidChar` per XML 1.0 §2.3 `[13]`.
#[must_use]
pub fn is_pubid_char(c: char) -> bool {
    matches!(c,
        ' ' | '\r' | '\n' |
        'a'..='z' | 'A'..='Z' | '0'..='9' |
        '-' | '\'' | '(' | ')' | '+' | ',' | '.' | '/' | ':' |
        '=' | '?' | ';' | '!' | '*' | '#' | '@' | '$' | '_' | '%'
    )
}

/// First character of an `EncName` (XML 1.0 §4.3.3 `[81]`).
#[must_use]
pub fn is_encoding_start_char(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Subsequent characters of an `EncName`.
#[must_use]
pub fn is_encoding_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

// -------------------------------------------------------------------------
// Matchers
// -------------------------------------------------------------------------

impl<S: CharSource> Cursor<S> {
    /// Consumes `expected` if it is the next character.
    pub fn match_char(&mut self, expected: char) -> PResult<()> {
        if self.peek() == Some(expected) {
            self.read();
            Ok(())
        } else {
            self.fail(Expected::Char(expected))
        }
    }

    /// Consumes `expected` if the input continues with it. Nothing is
    /// consumed on failure.
    pub fn match_str(&mut self, expected: &'static str) -> PResult<()> {
        if !self.looking_at(expected) {
            return self.fail(Expected::Literal(expected));
        }
        for _ in expected.chars() {
            self.read();
        }
        Ok(())
    }

    /// Consumes one character in `lo..=hi`.
    pub fn match_range(&mut self, lo: char, hi: char) -> PResult<char> {
        self.match_if(|c| (lo..=hi).contains(&c), Expected::Range(lo, hi))
    }

    /// Consumes one character outside `lo..=hi`. End of input never matches.
    pub fn match_not_range(&mut self, lo: char, hi: char) -> PResult<char> {
        self.match_if(|c| !(lo..=hi).contains(&c), Expected::OutsideRange(lo, hi))
    }

    /// Consumes one character drawn from `set`.
    pub fn match_in(&mut self, set: &'static str) -> PResult<char> {
        self.match_if(|c| set.contains(c), Expected::OneOf(set))
    }

    /// Consumes one character not drawn from `set`. End of input never matches.
    pub fn match_not_in(&mut self, set: &'static str) -> PResult<char> {
        self.match_if(|c| !set.contains(c), Expected::NoneOf(set))
    }

    /// Consumes one character satisfying `pred`, failing with `expected`.
    pub fn match_if(&mut self, pred: impl Fn(char) -> bool, expected: Expected) -> PResult<char> {
        match self.peek() {
            Some(c) if pred(c) => {
                self.read();
                Ok(c)
            }
            _ => self.fail(expected),
        }
    }

    /// Succeeds without consuming anything unless `c` is next.
    pub fn match_not(&mut self, c: char) -> PResult<()> {
        if self.peek() == Some(c) {
            self.fail(Expected::NotChar(c))
        } else {
            Ok(())
        }
    }

    /// Succeeds without consuming anything unless the input continues with `s`.
    pub fn match_not_str(&mut self, s: &'static str) -> PResult<()> {
        if self.looking_at(s) {
            self.fail(Expected::NotLiteral(s))
        } else {
            Ok(())
        }
    }

    /// Returns `true` if the input continues with `s`. Consumes nothing.
    pub fn looking_at(&mut self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, expected)| self.peek_nth(i) == Some(expected))
    }

    /// Consumes characters while `pred` holds, appending them to `out`.
    /// Returns how many were consumed.
    pub fn take_while(&mut self, out: &mut String, pred: impl Fn(char) -> bool) -> usize {
        let mut n = 0;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.read();
            out.push(c);
            n += 1;
        }
        n
    }

    /// Consumes characters while `pred` holds. Returns how many were consumed.
    pub fn skip_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut n = 0;
        while self.peek().is_some_and(&pred) {
            self.read();
            n += 1;
        }
        n
    }
}
