//! XML serializer.
//!
//! Serializes a `Document` tree into a well-formed XML string.

use std::fmt;

use crate::tree::{CData, Comment, Document, Element, NodeId, NodeKind, ProcessingInstruction, Text};
use crate::util::{escape_text, quote_raw_attribute};

/// Options controlling XML serialization output.
///
/// # Examples
///
/// ```
/// use xmlgrove::Document;
/// use xmlgrove::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(true));
/// assert!(xml.contains("  <child>"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
    /// Whether to write the XML declaration. Defaults to `true`.
    pub declaration: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
            declaration: true,
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented (pretty-printed) output.
    ///
    /// When enabled, child elements are placed on their own lines. Elements
    /// with mixed content (text next to elements) are written as they are.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Enables or disables the XML declaration.
    #[must_use]
    pub fn declaration(mut self, yes: bool) -> Self {
        self.declaration = yes;
        self
    }
}

/// Serializes a document to an XML string.
///
/// # Examples
///
/// ```
/// use xmlgrove::Document;
/// use xmlgrove::serial::serialize;
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// assert_eq!(
///     serialize(&doc),
///     "<?xml version=\"1.0\"?>\n<root><child>Hello</child></root>\n"
/// );
/// ```
#[must_use]
pub fn serialize(doc: &Document) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document to an XML string with the given options.
///
/// Every top-level node (the document type declaration, prolog comments
/// and processing instructions, the root element) ends with a newline.
#[must_use]
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> String {
    let mut output = String::new();

    if options.declaration {
        output.push_str("<?xml version=\"");
        match doc.version {
            Some(version) => output.push_str(&version.to_string()),
            None => output.push_str("1.0"),
        }
        output.push('"');
        if let Some(encoding) = &doc.encoding {
            output.push_str(" encoding=\"");
            output.push_str(&encoding.name);
            output.push('"');
        }
        if let Some(standalone) = doc.standalone {
            output.push_str(" standalone=\"");
            output.push_str(&standalone.to_string());
            output.push('"');
        }
        output.push_str("?>\n");
    }

    if let Some(doctype) = &doc.doctype {
        output.push_str(&doctype.to_string());
        output.push('\n');
    }

    let mut writer = Writer {
        doc,
        out: &mut output,
        options,
    };
    for child in doc.children::<NodeKind>(doc.document_node()) {
        writer.node(child.id(), 0, false);
        writer.out.push('\n');
    }

    output
}

/// Serializes one node and its subtree, without a declaration.
///
/// ```
/// use xmlgrove::Document;
/// use xmlgrove::serial::{serialize_node, SerializeOptions};
///
/// let doc = Document::parse_str("<r><a x=\"1\">t</a></r>").unwrap();
/// let a = doc.first_child(doc.root()).unwrap();
/// assert_eq!(serialize_node(&doc, a, &SerializeOptions::default()), "<a x=\"1\">t</a>");
/// ```
#[must_use]
pub fn serialize_node(doc: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut output = String::new();
    let mut writer = Writer {
        doc,
        out: &mut output,
        options,
    };
    if matches!(doc.kind(id), NodeKind::Document) {
        for child in doc.children::<NodeKind>(id) {
            writer.node(child.id(), 0, false);
            writer.out.push('\n');
        }
    } else {
        writer.node(id, 0, false);
    }
    output
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}

struct Writer<'a> {
    doc: &'a Document,
    out: &'a mut String,
    options: &'a SerializeOptions,
}

impl Writer<'_> {
    fn pad(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.options.indent_str);
        }
    }

    fn node(&mut self, id: NodeId, depth: usize, own_line: bool) {
        if own_line {
            self.pad(depth);
        }
        let doc = self.doc;
        match doc.kind(id) {
            NodeKind::Element(element) => self.element(id, element, depth),
            NodeKind::Text(Text { data }) => self.out.push_str(&escape_text(data)),
            NodeKind::CData(CData { data }) => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(data);
                self.out.push_str("]]>");
            }
            NodeKind::Comment(Comment { data }) => {
                self.out.push_str("<!--");
                self.out.push_str(data);
                self.out.push_str("-->");
            }
            NodeKind::ProcessingInstruction(ProcessingInstruction { target, data }) => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if let Some(d) = data {
                    self.out.push(' ');
                    self.out.push_str(d);
                }
                self.out.push_str("?>");
            }
            // Only reachable through serialize_node, which unwraps it.
            NodeKind::Document => {}
        }
        if own_line {
            self.out.push('\n');
        }
    }

    fn element(&mut self, id: NodeId, element: &Element, depth: usize) {
        self.out.push('<');
        self.out.push_str(&element.name);
        for attr in &element.attributes {
            self.out.push(' ');
            self.out.push_str(&attr.name);
            self.out.push_str("=\"");
            self.out.push_str(&quote_raw_attribute(&attr.value));
            self.out.push('"');
        }

        let doc = self.doc;
        if doc.is_empty(id) {
            self.out.push_str("/>");
            return;
        }
        self.out.push('>');

        let element_only = self.options.indent && is_element_only(doc, id);
        if element_only {
            self.out.push('\n');
        }
        for child in doc.children::<NodeKind>(id) {
            if element_only && is_blank(child.value()) {
                continue;
            }
            self.node(child.id(), depth + 1, element_only);
        }
        if element_only {
            self.pad(depth);
        }
        self.out.push_str("</");
        self.out.push_str(&element.name);
        self.out.push('>');
    }
}

/// Returns `true` if the element contains only other elements (and optional
/// whitespace text), meaning it's safe to add indentation.
fn is_element_only(doc: &Document, id: NodeId) -> bool {
    let mut has_element_child = false;
    for child in doc.children::<NodeKind>(id) {
        match child.value() {
            NodeKind::Element(_) => has_element_child = true,
            NodeKind::Text(Text { data }) => {
                if !data.trim().is_empty() {
                    return false;
                }
            }
            NodeKind::CData(_) => return false,
            _ => {}
        }
    }
    has_element_child
}

fn is_blank(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Text(Text { data }) if data.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{DocType, Standalone};
    use crate::Attribute;
    use pretty_assertions::assert_eq;

    fn body(xml: &str) -> String {
        let doc = Document::parse_str(xml).unwrap();
        serialize_with_options(&doc, &SerializeOptions::default().declaration(false))
    }

    #[test]
    fn test_roundtrip_simple() {
        assert_eq!(body("<root><child>Hello</child></root>"), "<root><child>Hello</child></root>\n");
    }

    #[test]
    fn test_attributes_keep_references() {
        assert_eq!(
            body("<a x='say &quot;hi&quot; &amp; &#65;' y=\"'\"/>"),
            "<a x=\"say &quot;hi&quot; &amp; &#65;\" y=\"'\"/>\n"
        );
    }

    #[test]
    fn test_attribute_quote_in_single_quoted_value() {
        assert_eq!(body("<a x='\"'/>"), "<a x=\"&quot;\"/>\n");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(body("<a>1 &lt; 2 &amp;&amp; 3 &gt; 2</a>"), "<a>1 &lt; 2 &amp;&amp; 3 &gt; 2</a>\n");
    }

    #[test]
    fn test_markup_nodes() {
        assert_eq!(
            body("<!--top--><a><![CDATA[<x>]]><!-- c --><?pi data?><?bare?></a>"),
            "<!--top-->\n<a><![CDATA[<x>]]><!-- c --><?pi data?><?bare?></a>\n"
        );
    }

    #[test]
    fn test_declaration_fields() {
        let mut doc = Document::new("r");
        assert_eq!(serialize(&doc), "<?xml version=\"1.0\"?>\n<r/>\n");
        doc.encoding = Some(crate::parser::Encoding::new("UTF-8"));
        doc.standalone = Some(Standalone(false));
        doc.doctype = Some(DocType::new("r"));
        assert_eq!(
            doc.to_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n<!DOCTYPE r>\n<r/>\n"
        );
    }

    #[test]
    fn test_indent() {
        let doc = Document::parse_str("<a>\n<b><c/></b><d>text<e/></d>\n</a>").unwrap();
        let xml = serialize_with_options(
            &doc,
            &SerializeOptions::default().declaration(false).indent(true),
        );
        assert_eq!(xml, "<a>\n  <b>\n    <c/>\n  </b>\n  <d>text<e/></d>\n</a>\n");
    }

    #[test]
    fn test_indent_str() {
        let doc = Document::parse_str("<a><b/></a>").unwrap();
        let options = SerializeOptions::default()
            .declaration(false)
            .indent(true)
            .indent_str("\t");
        assert_eq!(serialize_with_options(&doc, &options), "<a>\n\t<b/>\n</a>\n");
    }

    #[test]
    fn test_serialize_built_tree() {
        let mut doc = Document::new("list");
        let root = doc.root();
        let item = doc
            .emplace_back(root, Element::new("item").with_attribute(Attribute::from_unescaped("k", "a\"b")))
            .node()
            .unwrap();
        doc.emplace_back(item, Text::new("<&>"));
        assert_eq!(
            serialize_node(&doc, root, &SerializeOptions::default()),
            "<list><item k=\"a&quot;b\">&lt;&amp;&gt;</item></list>"
        );
    }

    #[test]
    fn test_serialize_document_node() {
        let doc = Document::parse_str("<?p?><r/>").unwrap();
        assert_eq!(
            serialize_node(&doc, doc.document_node(), &SerializeOptions::default()),
            "<?p?>\n<r/>\n"
        );
    }
}
