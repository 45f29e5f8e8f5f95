//! Node construction: elements, text, and whole documents.
//!
//! The productions here build tree nodes as they match. They follow the
//! same contract as the rest of the grammar (a mismatch is a
//! [`Diagnostic`] value) and the public entry points on [`Document`] turn
//! it into an error or `None` through [`Cursor::finish`].

use std::io::Read;

use super::cursor::Cursor;
use super::decl::{Attribute, DocType, Production, XmlDecl};
use super::grammar::{predefined_entity, Reference};
use super::matchers::{is_name_start_char, is_space};
use super::source::{CharSource, DecodingSource, StrSource};
use super::{OnMismatch, ParseOptions};
use crate::encoding::decode_document;
use crate::error::{Diagnostic, Expected, PResult, XmlError};
use crate::tree::{CData, Comment, Document, Element, NodeId, NodeKind, ProcessingInstruction, Text};
use crate::util::log_debug;

/// Builds nodes from a cursor, enforcing the configured limits.
struct TreeBuilder<'a, S> {
    cursor: &'a mut Cursor<S>,
    options: &'a ParseOptions,
    depth: u32,
}

impl<'a, S: CharSource> TreeBuilder<'a, S> {
    fn new(cursor: &'a mut Cursor<S>, options: &'a ParseOptions) -> Self {
        Self {
            cursor,
            options,
            depth: 0,
        }
    }

    // --- Document ---
    // See XML 1.0 §2.1: [1] document ::= prolog element Misc*

    fn read_document(&mut self) -> PResult<Document> {
        let decl = if self.at_xml_decl() {
            Some(XmlDecl::read(self.cursor)?)
        } else {
            None
        };

        let mut prolog = Vec::new();
        self.read_misc(&mut prolog)?;
        let doctype = if self.cursor.looking_at("<!DOCTYPE") {
            let doctype = DocType::read(self.cursor)?;
            self.read_misc(&mut prolog)?;
            Some(doctype)
        } else {
            None
        };

        if !self.at_start_tag() {
            return self.cursor.fail(Expected::RootElement);
        }
        let (element, empty) = self.read_start_tag()?;
        let name = element.name.clone();
        let mut doc = Document::with_root(element);
        if let Some(decl) = decl {
            doc.version = Some(decl.version);
            doc.encoding = decl.encoding;
            doc.standalone = decl.standalone;
        }
        doc.doctype = doctype;

        let document = doc.document_node();
        let root = doc.root();
        for kind in prolog {
            let id = doc.create(kind);
            doc.link_before(document, Some(root), id);
        }

        if !empty {
            self.enter()?;
            self.read_content(&mut doc, root)?;
            self.read_end_tag(&name)?;
            self.depth -= 1;
        }

        let mut epilog = Vec::new();
        self.read_misc(&mut epilog)?;
        for kind in epilog {
            doc.append(document, kind);
        }

        if !self.cursor.at_end() {
            return self.cursor.fail(Expected::EndOfInput);
        }
        Ok(doc)
    }

    /// `<?xml` followed by white space; anything else starting with `<?xml`
    /// is a processing instruction with a reserved target.
    fn at_xml_decl(&mut self) -> bool {
        self.cursor.looking_at("<?xml") && self.cursor.peek_nth(5).is_some_and(is_space)
    }

    fn at_start_tag(&mut self) -> bool {
        self.cursor.peek() == Some('<') && self.cursor.peek_nth(1).is_some_and(is_name_start_char)
    }

    /// `Misc ::= Comment | PI | S` `[27]`, collecting the nodes to keep.
    fn read_misc(&mut self, out: &mut Vec<NodeKind>) -> PResult<()> {
        loop {
            self.cursor.skip_spaces();
            if self.cursor.looking_at("<!--") {
                let comment = self.cursor.read_comment()?;
                if self.options.keep_comments {
                    out.push(Comment::new(comment).into());
                }
            } else if self.cursor.looking_at("<?") {
                let pi = self.read_pi()?;
                if self.options.keep_processing_instructions {
                    out.push(pi.into());
                }
            } else {
                return Ok(());
            }
        }
    }

    // --- Elements ---
    // See XML 1.0 §3.1: [39] element ::= EmptyElemTag | STag content ETag

    /// Reads an element and everything below it as the last child of `parent`.
    fn read_element(&mut self, doc: &mut Document, parent: NodeId) -> PResult<NodeId> {
        let (element, empty) = self.read_start_tag()?;
        let name = element.name.clone();
        let id = doc.append(parent, element);
        if !empty {
            self.enter()?;
            self.read_content(doc, id)?;
            self.read_end_tag(&name)?;
            self.depth -= 1;
        }
        Ok(id)
    }

    /// Reads an element into `doc` without attaching it. On failure nothing
    /// is left behind.
    fn read_detached_element(&mut self, doc: &mut Document) -> PResult<NodeId> {
        let (element, empty) = self.read_start_tag()?;
        let name = element.name.clone();
        let id = doc.create(element);
        if empty {
            return Ok(id);
        }
        let body = self.enter().and_then(|()| {
            self.read_content(doc, id)?;
            self.read_end_tag(&name)
        });
        match body {
            Ok(()) => {
                self.depth -= 1;
                Ok(id)
            }
            Err(e) => {
                doc.remove(id);
                Err(e)
            }
        }
    }

    fn enter(&mut self) -> PResult<()> {
        if self.depth >= self.options.max_depth {
            return self.cursor.fail(Expected::Depth(self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    /// `STag ::= '<' Name (S Attribute)* S? '>'` `[40]` or
    /// `EmptyElemTag ::= '<' Name (S Attribute)* S? '/>'` `[44]`.
    ///
    /// Returns the element and whether the tag was empty.
    fn read_start_tag(&mut self) -> PResult<(Element, bool)> {
        let max = self.options.max_name_length;
        self.cursor.attempt(|c| {
            c.match_char('<')?;
            let mut element = Element::new(read_limited_name(c, max)?);
            loop {
                if !c.skip_spaces() || !c.peek().is_some_and(is_name_start_char) {
                    break;
                }
                let start = c.location();
                let attribute = Attribute::read(c)?;
                if attribute.name.chars().count() > max {
                    return Err(Diagnostic::new(Expected::NameLength(max), start));
                }
                if element.attribute(&attribute.name).is_some() {
                    return Err(Diagnostic::new(
                        Expected::UniqueAttribute(attribute.name),
                        start,
                    ));
                }
                element.attributes.push(attribute);
            }
            if c.match_str("/>").is_ok() {
                return Ok((element, true));
            }
            c.match_char('>')?;
            Ok((element, false))
        })
    }

    /// `ETag ::= '</' Name S? '>'` `[42]`, which must close `name`.
    fn read_end_tag(&mut self, name: &str) -> PResult<()> {
        let start = self.cursor.location();
        self.cursor
            .attempt(|c| {
                c.match_str("</")?;
                if c.read_name()? != name {
                    return c.fail(Expected::StartTag);
                }
                c.skip_spaces();
                c.match_char('>')
            })
            .map_err(|_| Diagnostic::new(Expected::EndTag(name.to_string()), start))
    }

    /// `content ::= CharData? ((element | Reference | CDSect | PI | Comment) CharData?)*` `[43]`
    ///
    /// Stops in front of `</` or at end of input; the end tag check reports
    /// what is missing.
    fn read_content(&mut self, doc: &mut Document, parent: NodeId) -> PResult<()> {
        loop {
            match self.cursor.peek() {
                None => return Ok(()),
                Some('<') => {
                    if self.cursor.looking_at("</") {
                        return Ok(());
                    } else if self.cursor.looking_at("<![CDATA[") {
                        let data = self.cursor.read_cdata()?;
                        doc.append(parent, CData::new(data));
                    } else if self.cursor.looking_at("<!--") {
                        let comment = self.cursor.read_comment()?;
                        if self.options.keep_comments {
                            doc.append(parent, Comment::new(comment));
                        }
                    } else if self.cursor.looking_at("<?") {
                        let pi = self.read_pi()?;
                        if self.options.keep_processing_instructions {
                            doc.append(parent, pi);
                        }
                    } else {
                        self.read_element(doc, parent)?;
                    }
                }
                Some(_) => {
                    let text = self.read_text()?;
                    if text.is_empty() {
                        return self.cursor.fail(Expected::Class("character data"));
                    }
                    self.append_text(doc, parent, text);
                }
            }
        }
    }

    /// Adds text to `parent`, merging with a text node it directly follows.
    fn append_text(&self, doc: &mut Document, parent: NodeId, text: String) {
        if let Some(last) = doc.last_child(parent) {
            if let Some(previous) = doc.get_mut::<Text>(last) {
                previous.data.push_str(&text);
                return;
            }
        }
        if self.options.no_blanks && text.chars().all(is_space) {
            return;
        }
        doc.append(parent, Text::new(text));
    }

    // --- Text ---

    /// Character data with references expanded.
    ///
    /// Only character references and the five predefined entities can be
    /// expanded; any other entity reference is an error.
    fn read_text(&mut self) -> PResult<String> {
        let mut text = String::new();
        loop {
            text.push_str(&self.cursor.read_char_data()?);
            if self.cursor.peek() != Some('&') {
                return Ok(text);
            }
            let start = self.cursor.location();
            match self.cursor.read_reference()? {
                Reference::Char { value, .. } => text.push(value),
                Reference::Entity(name) => match predefined_entity(&name) {
                    Some(c) => text.push(c),
                    None => return Err(Diagnostic::new(Expected::KnownEntity(name), start)),
                },
            }
        }
    }

    // --- Processing instructions ---
    // See XML 1.0 §2.6: [16] PI ::= '<?' PITarget (S (Char* - (Char* '?>' Char*)))? '?>'

    fn read_pi(&mut self) -> PResult<ProcessingInstruction> {
        self.cursor.attempt(|c| {
            c.match_str("<?")?;
            let target = c.read_pi_target()?;
            let data = if c.skip_spaces() {
                Some(c.read_pi_content()?).filter(|d| !d.is_empty())
            } else {
                None
            };
            c.match_str("?>")?;
            Ok(ProcessingInstruction::new(target, data))
        })
    }
}

/// Reads a name no longer than `max` characters.
fn read_limited_name<S: CharSource>(cursor: &mut Cursor<S>, max: usize) -> PResult<String> {
    let start = cursor.location();
    let name = cursor.read_name()?;
    if name.chars().count() > max {
        return Err(Diagnostic::new(Expected::NameLength(max), start));
    }
    Ok(name)
}

impl Document {
    /// Parses a document from a string with default options.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Parse` if the input is not a well-formed document.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlgrove::Document;
    ///
    /// let doc = Document::parse_str("<greeting lang=\"en\">hi &amp; bye</greeting>").unwrap();
    /// assert_eq!(doc.root_element().attribute_value("lang"), Some("en"));
    /// assert_eq!(doc.text_content(doc.root()), "hi & bye");
    /// ```
    pub fn parse_str(text: &str) -> Result<Document, XmlError> {
        let mut cursor = Cursor::new(StrSource::new(text));
        Self::parse_document(&mut cursor, &ParseOptions::default())
    }

    /// Parses a document from raw bytes, detecting the encoding from the
    /// byte order mark or the XML declaration.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Encoding` if the bytes cannot be decoded and
    /// `XmlError::Parse` if the text is not a well-formed document.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Document, XmlError> {
        let text = decode_document(bytes)?;
        Self::parse_str(&text)
    }

    /// Parses a document from a byte stream, decoding it incrementally.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Io` if reading fails (including malformed bytes
    /// for the detected encoding), `XmlError::Encoding` for an unsupported
    /// declared encoding, and `XmlError::Parse` for a malformed document.
    pub fn parse_reader<R: Read>(reader: R) -> Result<Document, XmlError> {
        let source = DecodingSource::new(reader)?;
        let mut cursor = Cursor::new(source);
        Self::parse_document(&mut cursor, &ParseOptions::default())
    }

    /// Parses a document from `cursor` with the given options.
    ///
    /// In [`OnMismatch::Absent`] mode a malformed document yields `Ok(None)`
    /// and the diagnostic stays on the cursor as [`Cursor::last_error`].
    /// The cursor is not rewound after a failure.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Io` if the source fails, and `XmlError::Parse` for
    /// a malformed document in [`OnMismatch::Raise`] mode.
    pub fn parse_with_options<S: CharSource>(
        cursor: &mut Cursor<S>,
        options: &ParseOptions,
        mode: OnMismatch,
    ) -> Result<Option<Document>, XmlError> {
        log_debug!("parsing document at {}", cursor.location());
        let result = TreeBuilder::new(cursor, options).read_document();
        let doc = cursor.finish(result, mode)?;
        log_debug!("document parse {}", if doc.is_some() { "finished" } else { "failed" });
        Ok(doc)
    }

    fn parse_document<S: CharSource>(
        cursor: &mut Cursor<S>,
        options: &ParseOptions,
    ) -> Result<Document, XmlError> {
        log_debug!("parsing document");
        let result = TreeBuilder::new(cursor, options).read_document();
        cursor.complete(result)
    }

    /// Parses one element (with its content) at the cursor into this
    /// document, detached. Attach it with one of the `*_move` operations.
    ///
    /// On a mismatch the cursor is back where it started and the document
    /// is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Io` if the source fails, and `XmlError::Parse` for
    /// a malformed element in [`OnMismatch::Raise`] mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlgrove::{Cursor, Document};
    /// use xmlgrove::parser::{OnMismatch, StrSource};
    ///
    /// let mut doc = Document::new("list");
    /// let mut cursor = Cursor::new(StrSource::new("<item n=\"1\">one</item>"));
    /// let item = doc.parse_element(&mut cursor, OnMismatch::Raise).unwrap().unwrap();
    /// let root = doc.root();
    /// doc.push_back_move(root, item);
    /// assert_eq!(doc.text_content(root), "one");
    /// ```
    pub fn parse_element<S: CharSource>(
        &mut self,
        cursor: &mut Cursor<S>,
        mode: OnMismatch,
    ) -> Result<Option<NodeId>, XmlError> {
        let options = ParseOptions::default();
        let result = cursor.attempt(|c| TreeBuilder::new(c, &options).read_detached_element(self));
        cursor.finish(result, mode)
    }

    /// Parses character data (with references expanded) at the cursor into
    /// a detached text node. Stops in front of markup.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Io` if the source fails, and `XmlError::Parse` in
    /// [`OnMismatch::Raise`] mode if there is no text or it contains an
    /// unknown entity reference.
    pub fn parse_text<S: CharSource>(
        &mut self,
        cursor: &mut Cursor<S>,
        mode: OnMismatch,
    ) -> Result<Option<NodeId>, XmlError> {
        let options = ParseOptions::default();
        let result = cursor.attempt(|c| {
            let text = TreeBuilder::new(c, &options).read_text()?;
            if text.is_empty() {
                return c.fail(Expected::Class("character data"));
            }
            Ok(text)
        });
        let text = cursor.finish(result, mode)?;
        Ok(text.map(|text| self.create_text(text)))
    }
}
