//! Grammar productions.
//!
//! Each production is a method on [`Cursor`] returning [`PResult`]. On
//! success the cursor sits just past the recognized text; on failure it is
//! back where the production started and the [`Diagnostic`](crate::error::Diagnostic)
//! says what was expected. Leaf productions report their own starting
//! position; combinators pass the innermost diagnostic through untouched.
//!
//! Production numbers in comments refer to XML 1.0 (Fifth Edition).

use std::fmt;

use super::cursor::Cursor;
use super::decl::Version;
use super::matchers::{
    is_encoding_char, is_encoding_start_char, is_name_char, is_name_start_char, is_pubid_char,
    is_space, is_xml_char,
};
use super::source::CharSource;
use crate::error::{Diagnostic, Expected, PResult};

/// An entity or character reference as written in the source.
///
/// `Display` reproduces the reference text; [`resolve`](Reference::resolve)
/// gives the character it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `&name;`
    Entity(String),
    /// `&#digits;` or `&#xdigits;`
    Char {
        /// The referenced character.
        value: char,
        /// The digits as written.
        digits: String,
        /// Whether the digits are hexadecimal.
        hex: bool,
    },
}

impl Reference {
    /// Returns the character this reference expands to, if known without a DTD.
    #[must_use]
    pub fn resolve(&self) -> Option<char> {
        match self {
            Self::Entity(name) => predefined_entity(name),
            Self::Char { value, .. } => Some(*value),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(name) => write!(f, "&{name};"),
            Self::Char { digits, hex: true, .. } => write!(f, "&#x{digits};"),
            Self::Char { digits, hex: false, .. } => write!(f, "&#{digits};"),
        }
    }
}

/// The five entities every XML processor knows (XML 1.0 §4.6).
#[must_use]
pub fn predefined_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => None,
    }
}

impl<S: CharSource> Cursor<S> {
    // --- white space and punctuation ---

    /// One white-space character.
    pub fn read_space(&mut self) -> PResult<char> {
        self.match_if(is_space, Expected::Space)
    }

    /// `S ::= (#x20 | #x9 | #xD | #xA)+` `[3]`
    pub fn read_spaces(&mut self) -> PResult<()> {
        self.read_space()?;
        self.skip_spaces();
        Ok(())
    }

    /// `S?`. Returns `true` if anything was skipped.
    pub fn skip_spaces(&mut self) -> bool {
        self.skip_while(is_space) > 0
    }

    /// `Eq ::= S? '=' S?` `[25]`
    pub fn read_eq(&mut self) -> PResult<()> {
        self.attempt(|c| {
            c.skip_spaces();
            c.match_char('=')?;
            c.skip_spaces();
            Ok(())
        })
    }

    /// An opening `'` or `"`.
    pub fn read_quote(&mut self) -> PResult<char> {
        self.match_if(|c| c == '\'' || c == '"', Expected::Quote)
    }

    // --- names and tokens ---

    /// `Name ::= NameStartChar (NameChar)*` `[5]`
    pub fn read_name(&mut self) -> PResult<String> {
        if !self.peek().is_some_and(is_name_start_char) {
            return self.fail(Expected::Name);
        }
        let mut name = String::new();
        self.take_while(&mut name, is_name_char);
        Ok(name)
    }

    /// `Names ::= Name (#x20 Name)*` `[6]`
    pub fn read_names(&mut self) -> PResult<Vec<String>> {
        let first = self.read_name().or_else(|_| self.fail(Expected::Names))?;
        let mut names = vec![first];
        while let Ok(name) = self.attempt(|c| {
            c.match_char(' ')?;
            c.read_name()
        }) {
            names.push(name);
        }
        Ok(names)
    }

    /// `Nmtoken ::= (NameChar)+` `[7]`
    pub fn read_token(&mut self) -> PResult<String> {
        let mut token = String::new();
        if self.take_while(&mut token, is_name_char) == 0 {
            return self.fail(Expected::Token);
        }
        Ok(token)
    }

    /// `Nmtokens ::= Nmtoken (#x20 Nmtoken)*` `[8]`
    pub fn read_tokens(&mut self) -> PResult<Vec<String>> {
        let first = self.read_token().or_else(|_| self.fail(Expected::Tokens))?;
        let mut tokens = vec![first];
        while let Ok(token) = self.attempt(|c| {
            c.match_char(' ')?;
            c.read_token()
        }) {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// A `Name` that must equal `expected`.
    pub fn match_name(&mut self, expected: &'static str) -> PResult<()> {
        self.attempt_as(Expected::NameToBe(expected), |c| {
            let name = c.read_name()?;
            if name == expected {
                Ok(())
            } else {
                c.fail(Expected::Name)
            }
        })
    }

    // --- references ---

    /// `Reference ::= EntityRef | CharRef` `[67]`
    ///
    /// The reference is recognized, not resolved: unknown entity names are
    /// accepted here. Character references must name a valid `Char`.
    pub fn read_reference(&mut self) -> PResult<Reference> {
        self.attempt_as(Expected::Reference, |c| {
            c.match_char('&')?;
            if c.match_char('#').is_err() {
                let name = c.read_name()?;
                c.match_char(';')?;
                return Ok(Reference::Entity(name));
            }
            let hex = c.match_char('x').is_ok();
            let radix = if hex { 16 } else { 10 };
            let mut digits = String::new();
            if c.take_while(&mut digits, |d| d.is_digit(radix)) == 0 {
                return c.fail(Expected::Number);
            }
            c.match_char(';')?;
            let value = u32::from_str_radix(&digits, radix)
                .ok()
                .and_then(char::from_u32)
                .filter(|&v| is_xml_char(v));
            match value {
                Some(value) => Ok(Reference::Char { value, digits, hex }),
                None => c.fail(Expected::Class("reference to a valid XML character")),
            }
        })
    }

    /// `PEReference ::= '%' Name ';'` `[69]`. Returns the entity name.
    pub fn read_pe_reference(&mut self) -> PResult<String> {
        self.attempt_as(Expected::PeReference, |c| {
            c.match_char('%')?;
            let name = c.read_name()?;
            c.match_char(';')?;
            Ok(name)
        })
    }

    // --- literals ---

    /// The body of `AttValue` `[10]`, up to (not including) `quote`.
    ///
    /// References are kept as written. Reading stops without failing at the
    /// first character that is neither literal text nor a well-formed
    /// reference; the caller's closing-quote check reports the problem.
    pub fn read_attribute_value(&mut self, quote: char) -> PResult<String> {
        let mut value = String::new();
        loop {
            let before = self.offset();
            self.take_while(&mut value, |c| {
                c != '<' && c != '&' && c != quote && is_xml_char(c)
            });
            if self.peek() == Some('&') {
                if let Ok(reference) = self.read_reference() {
                    value.push_str(&reference.to_string());
                }
            }
            if self.offset() == before {
                return Ok(value);
            }
        }
    }

    /// The body of `EntityValue` `[9]`, up to (not including) `quote`.
    ///
    /// Like [`read_attribute_value`](Self::read_attribute_value), but `%`
    /// starts a parameter-entity reference and `<` is allowed.
    pub fn read_entity_value(&mut self, quote: char) -> PResult<String> {
        let mut value = String::new();
        loop {
            let before = self.offset();
            self.take_while(&mut value, |c| {
                c != '%' && c != '&' && c != quote && is_xml_char(c)
            });
            match self.peek() {
                Some('&') => {
                    if let Ok(reference) = self.read_reference() {
                        value.push_str(&reference.to_string());
                    }
                }
                Some('%') => {
                    if let Ok(name) = self.read_pe_reference() {
                        value.push('%');
                        value.push_str(&name);
                        value.push(';');
                    }
                }
                _ => {}
            }
            if self.offset() == before {
                return Ok(value);
            }
        }
    }

    /// The body of `SystemLiteral` `[11]`.
    pub fn read_system_literal(&mut self, quote: char) -> PResult<String> {
        let mut literal = String::new();
        self.take_while(&mut literal, |c| c != quote && is_xml_char(c));
        Ok(literal)
    }

    /// The body of `PubidLiteral` `[12]`.
    pub fn read_pubid_literal(&mut self, quote: char) -> PResult<String> {
        let mut literal = String::new();
        self.take_while(&mut literal, |c| c != quote && is_pubid_char(c));
        Ok(literal)
    }

    /// `CharData ::= [^<&]* - ([^<&]* ']]>' [^<&]*)` `[14]`
    ///
    /// Stops before `<`, `&`, `]]>` or a character that is not allowed in XML.
    pub fn read_char_data(&mut self) -> PResult<String> {
        let mut data = String::new();
        while let Some(c) = self.peek() {
            if c == '<' || c == '&' || !is_xml_char(c) || (c == ']' && self.looking_at("]]>")) {
                break;
            }
            self.read();
            data.push(c);
        }
        Ok(data)
    }

    // --- markup ---

    /// `Comment ::= '<!--' ((Char - '-') | ('-' (Char - '-')))* '-->'` `[15]`
    ///
    /// Returns the text between the delimiters.
    pub fn read_comment(&mut self) -> PResult<String> {
        if !self.looking_at("<!--") {
            return self.fail(Expected::Comment);
        }
        self.attempt(|c| {
            c.match_str("<!--")?;
            let mut body = String::new();
            loop {
                if c.looking_at("--") {
                    return match c.match_str("-->") {
                        Ok(()) => Ok(body),
                        Err(_) => c.fail(Expected::NoDoubleHyphen),
                    };
                }
                body.push(c.read_markup_char("-->")?);
            }
        })
    }

    /// `CDSect ::= '<![CDATA[' CData ']]>'` `[18]`
    ///
    /// Returns the section content.
    pub fn read_cdata(&mut self) -> PResult<String> {
        if !self.looking_at("<![CDATA[") {
            return self.fail(Expected::CData);
        }
        self.attempt(|c| {
            c.match_str("<![CDATA[")?;
            let mut data = String::new();
            while c.match_str("]]>").is_err() {
                data.push(c.read_markup_char("]]>")?);
            }
            Ok(data)
        })
    }

    /// `PITarget ::= Name - (('X' | 'x') ('M' | 'm') ('L' | 'l'))` `[17]`
    pub fn read_pi_target(&mut self) -> PResult<String> {
        let start = self.location();
        self.attempt(|c| {
            let target = c.read_name()?;
            if target.eq_ignore_ascii_case("xml") {
                return c.fail(Expected::NonReservedPiTarget);
            }
            Ok(target)
        })
        .map_err(|e| match e.expected {
            Expected::NonReservedPiTarget => Diagnostic::new(e.expected, start),
            _ => Diagnostic::new(Expected::PiTarget, start),
        })
    }

    /// Processing instruction data: everything up to (not including) `?>`.
    pub fn read_pi_content(&mut self) -> PResult<String> {
        self.attempt(|c| {
            let mut data = String::new();
            while !c.looking_at("?>") {
                data.push(c.read_markup_char("?>")?);
            }
            Ok(data)
        })
    }

    /// One character of markup content that must end with `terminator`.
    fn read_markup_char(&mut self, terminator: &'static str) -> PResult<char> {
        match self.peek() {
            Some(c) if is_xml_char(c) => {
                self.read();
                Ok(c)
            }
            Some(_) => self.fail(Expected::Class("character allowed in XML")),
            None => self.fail(Expected::Terminator(terminator)),
        }
    }

    // --- declaration fields ---

    /// One or more decimal digits forming a value in `0..=255`.
    pub fn read_number(&mut self) -> PResult<u8> {
        let start = self.location();
        self.attempt(|c| {
            let mut digits = String::new();
            if c.take_while(&mut digits, |d| d.is_ascii_digit()) == 0 {
                return Err(Diagnostic::new(Expected::Number, start));
            }
            digits
                .parse::<u8>()
                .map_err(|_| Diagnostic::new(Expected::NumberInRange, start))
        })
    }

    /// `VersionNum ::= Number '.' Number`
    pub fn read_version(&mut self) -> PResult<Version> {
        self.attempt_as(Expected::Version, |c| {
            let major = c.read_number()?;
            c.match_char('.')?;
            let minor = c.read_number()?;
            Ok(Version { major, minor })
        })
    }

    /// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*` `[81]`
    pub fn read_encoding_name(&mut self) -> PResult<String> {
        if !self.peek().is_some_and(is_encoding_start_char) {
            return self.fail(Expected::EncodingName);
        }
        let mut name = String::new();
        self.take_while(&mut name, is_encoding_char);
        Ok(name)
    }

    /// `'yes' | 'no'`
    pub fn read_yes_no(&mut self) -> PResult<bool> {
        if self.match_str("yes").is_ok() {
            Ok(true)
        } else if self.match_str("no").is_ok() {
            Ok(false)
        } else {
            self.fail(Expected::YesNo)
        }
    }

    // --- combinators ---

    /// A quote, a body read by `value`, and the same quote again.
    ///
    /// `value` receives the opening quote so it can stop in front of it.
    pub fn read_quoted<T>(&mut self, value: impl FnOnce(&mut Self, char) -> PResult<T>) -> PResult<T> {
        self.attempt(|c| {
            let quote = c.read_quote()?;
            let v = value(c, quote)?;
            c.match_char(quote)?;
            Ok(v)
        })
    }

    /// `name Eq quoted-value`, the shape shared by attributes and the
    /// declaration fields.
    pub fn read_name_and_quoted_value<N, T>(
        &mut self,
        name: impl FnOnce(&mut Self) -> PResult<N>,
        value: impl FnOnce(&mut Self, char) -> PResult<T>,
    ) -> PResult<(N, T)> {
        self.attempt(|c| {
            let n = name(c)?;
            c.read_eq()?;
            let v = c.read_quoted(value)?;
            Ok((n, v))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::StrSource;
    use pretty_assertions::assert_eq;

    fn cursor(text: &str) -> Cursor<StrSource<'_>> {
        Cursor::new(StrSource::new(text))
    }

    /// Runs a failing production and checks the cursor did not move.
    fn assert_rejects<'a, T: std::fmt::Debug>(
        text: &'a str,
        skip: usize,
        production: impl FnOnce(&mut Cursor<StrSource<'a>>) -> PResult<T>,
    ) -> String {
        let mut c = cursor(text);
        for _ in 0..skip {
            c.read();
        }
        let before = c.location();
        let err = production(&mut c).unwrap_err();
        assert_eq!(c.location(), before, "cursor moved on failure");
        assert_eq!(c.depth(), 0);
        err.to_string()
    }

    #[test]
    fn test_read_name() {
        let mut c = cursor("foo:bar-1 rest");
        assert_eq!(c.read_name().unwrap(), "foo:bar-1");
        assert_eq!(c.peek(), Some(' '));
        assert_eq!(
            assert_rejects("1abc", 0, Cursor::read_name),
            "Expected name (at line 1 col 1)"
        );
    }

    #[test]
    fn test_read_names_and_tokens() {
        let mut c = cursor("a b c  d");
        assert_eq!(c.read_names().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(c.peek(), Some(' '));

        let mut c = cursor("1 -x .y");
        assert_eq!(c.read_tokens().unwrap(), vec!["1", "-x", ".y"]);
        assert!(c.at_end());
    }

    #[test]
    fn test_match_name() {
        let mut c = cursor("version=");
        assert!(c.match_name("version").is_ok());
        assert_eq!(
            assert_rejects("versions", 0, |c| c.match_name("version")),
            "Expected name to be 'version' (at line 1 col 1)"
        );
    }

    #[test]
    fn test_read_eq() {
        let mut c = cursor("  =\t'");
        assert!(c.read_eq().is_ok());
        assert_eq!(c.peek(), Some('\''));
        assert_rejects("  :", 0, Cursor::read_eq);
    }

    #[test]
    fn test_read_reference() {
        let mut c = cursor("&amp;&#65;&#x1F600;");
        assert_eq!(c.read_reference().unwrap(), Reference::Entity("amp".into()));
        assert_eq!(c.read_reference().unwrap().resolve(), Some('A'));
        let hex = c.read_reference().unwrap();
        assert_eq!(hex.resolve(), Some('\u{1F600}'));
        assert_eq!(hex.to_string(), "&#x1F600;");
    }

    #[test]
    fn test_read_reference_rejects() {
        assert_rejects("&bar", 0, Cursor::read_reference);
        assert_rejects("&#BAR;", 0, Cursor::read_reference);
        assert_rejects("&#0;", 0, Cursor::read_reference);
        assert_rejects("&#99999999999;", 0, Cursor::read_reference);
        assert_rejects("&;", 0, Cursor::read_reference);
    }

    #[test]
    fn test_read_pe_reference() {
        let mut c = cursor("%ent;");
        assert_eq!(c.read_pe_reference().unwrap(), "ent");
        assert_rejects("%ent", 0, Cursor::read_pe_reference);
    }

    #[test]
    fn test_attribute_value_keeps_references() {
        let mut c = cursor("a&amp;b&#1337;c'");
        assert_eq!(c.read_attribute_value('\'').unwrap(), "a&amp;b&#1337;c");
        assert_eq!(c.peek(), Some('\''));
    }

    #[test]
    fn test_attribute_value_stops_on_bad_reference() {
        let mut c = cursor("ab&bar'");
        assert_eq!(c.read_attribute_value('\'').unwrap(), "ab");
        assert_eq!(c.peek(), Some('&'));

        let mut c = cursor("&bar'");
        assert_eq!(c.read_attribute_value('\'').unwrap(), "");
        assert_eq!(c.offset(), 0);
    }

    #[test]
    fn test_attribute_value_other_quote_is_literal() {
        let mut c = cursor("it's\"");
        assert_eq!(c.read_attribute_value('"').unwrap(), "it's");
    }

    #[test]
    fn test_entity_value() {
        let mut c = cursor("<b>%pe;&x;\"");
        assert_eq!(c.read_entity_value('"').unwrap(), "<b>%pe;&x;");
        let mut c = cursor("%\"");
        assert_eq!(c.read_entity_value('"').unwrap(), "");
    }

    #[test]
    fn test_literals() {
        let mut c = cursor("http://x/y.dtd\"");
        assert_eq!(c.read_system_literal('"').unwrap(), "http://x/y.dtd");
        let mut c = cursor("-//W3C//DTD X//EN\"");
        assert_eq!(c.read_pubid_literal('"').unwrap(), "-//W3C//DTD X//EN");
        let mut c = cursor("a{b'");
        assert_eq!(c.read_pubid_literal('\'').unwrap(), "a");
    }

    #[test]
    fn test_read_char_data() {
        let mut c = cursor("hello &amp;");
        assert_eq!(c.read_char_data().unwrap(), "hello ");
        let mut c = cursor("a]b]]>c");
        assert_eq!(c.read_char_data().unwrap(), "a]b");
    }

    #[test]
    fn test_read_comment() {
        let mut c = cursor("<!-- a - b -->x");
        assert_eq!(c.read_comment().unwrap(), " a - b ");
        assert_eq!(c.peek(), Some('x'));
        let mut c = cursor("<!---->");
        assert_eq!(c.read_comment().unwrap(), "");
    }

    #[test]
    fn test_read_comment_rejects_double_hyphen() {
        assert_eq!(
            assert_rejects("<!-- a -- b -->", 0, Cursor::read_comment),
            "Expected no '--' inside comment (at line 1 col 8)"
        );
        assert_rejects("<!-- a --->", 0, Cursor::read_comment);
        assert_rejects("<!-- open", 0, Cursor::read_comment);
        assert_rejects("<!- x -->", 0, Cursor::read_comment);
    }

    #[test]
    fn test_read_cdata() {
        let mut c = cursor("<![CDATA[<a> & ]] ]]>");
        assert_eq!(c.read_cdata().unwrap(), "<a> & ]] ");
        assert!(c.at_end());
        assert_rejects("<![CDATA[open", 0, Cursor::read_cdata);
    }

    #[test]
    fn test_read_pi_target() {
        let mut c = cursor("xml-stylesheet ");
        assert_eq!(c.read_pi_target().unwrap(), "xml-stylesheet");
        assert_eq!(
            assert_rejects("XmL ", 0, Cursor::read_pi_target),
            "Expected processing instruction target other than 'xml' (at line 1 col 1)"
        );
    }

    #[test]
    fn test_read_pi_content() {
        let mut c = cursor("type=\"a\" ?>");
        assert_eq!(c.read_pi_content().unwrap(), "type=\"a\" ");
        assert!(c.looking_at("?>"));
        assert_rejects("no end", 0, Cursor::read_pi_content);
    }

    #[test]
    fn test_read_number() {
        assert_eq!(cursor("0").read_number().unwrap(), 0);
        assert_eq!(cursor("255").read_number().unwrap(), 255);
        assert_eq!(
            assert_rejects("256", 0, Cursor::read_number),
            "Expected number in range 0-255 (at line 1 col 1)"
        );
        assert_rejects("x", 0, Cursor::read_number);
    }

    #[test]
    fn test_read_version() {
        assert_eq!(
            cursor("1.0").read_version().unwrap(),
            Version { major: 1, minor: 0 }
        );
        assert_eq!(
            assert_rejects("1.", 0, Cursor::read_version),
            "Expected version (at line 1 col 1)"
        );
        assert_rejects("300.0", 0, Cursor::read_version);
    }

    #[test]
    fn test_read_encoding_name() {
        assert_eq!(cursor("UTF-8'").read_encoding_name().unwrap(), "UTF-8");
        assert_eq!(
            cursor("ISO_8859.1").read_encoding_name().unwrap(),
            "ISO_8859.1"
        );
        assert_rejects("42", 0, Cursor::read_encoding_name);
    }

    #[test]
    fn test_read_yes_no() {
        assert!(cursor("yes").read_yes_no().unwrap());
        assert!(!cursor("no").read_yes_no().unwrap());
        assert_rejects("maybe", 0, Cursor::read_yes_no);
    }

    #[test]
    fn test_read_quoted_reports_missing_quote() {
        assert_eq!(
            assert_rejects("'abc", 0, |c| c.read_quoted(Cursor::read_attribute_value)),
            "Expected ''' character (at line 1 col 5)"
        );
        assert_rejects("'abc\"", 0, |c| c.read_quoted(Cursor::read_attribute_value));
    }

    #[test]
    fn test_name_and_quoted_value() {
        let mut c = cursor("key = \"v&lt;\"/>");
        let (name, value) = c
            .read_name_and_quoted_value(Cursor::read_name, Cursor::read_attribute_value)
            .unwrap();
        assert_eq!(name, "key");
        assert_eq!(value, "v&lt;");
        assert_eq!(c.peek(), Some('/'));
    }

    #[test]
    fn test_positions_after_newlines() {
        let err = assert_rejects("\n\n  bad", 4, Cursor::read_number);
        assert_eq!(err, "Expected number (at line 3 col 3)");
    }
}
