//! Node type definitions.
//!
//! `NodeKind` is the closed set of node payloads. Links (parent, siblings,
//! children) live in `NodeData`, never here, so cloning a payload never
//! clones tree structure.

use crate::parser::Attribute;

/// The kind of an XML node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,
    /// An element, e.g. `<div class="x">`.
    Element(Element),
    /// Character data.
    Text(Text),
    /// A CDATA section, e.g. `<![CDATA[...]]>`.
    CData(CData),
    /// A comment, e.g. `<!-- ... -->`.
    Comment(Comment),
    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction(ProcessingInstruction),
}

impl NodeKind {
    /// Returns `true` for the kinds that own a child list.
    #[must_use]
    pub fn can_have_children(&self) -> bool {
        matches!(self, Self::Document | Self::Element(_))
    }

    /// The element name or processing instruction target.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Element(e) => Some(&e.name),
            Self::ProcessingInstruction(pi) => Some(&pi.target),
            _ => None,
        }
    }

    /// The character content of text, CDATA, comment and PI nodes.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(Text { data }) | Self::CData(CData { data }) | Self::Comment(Comment { data }) => {
                Some(data)
            }
            Self::ProcessingInstruction(pi) => pi.data.as_deref(),
            _ => None,
        }
    }
}

/// An element: a name, attributes in document order, and (in the tree) children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// The element name.
    pub name: String,
    /// Attributes, unique by name, in insertion order.
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Creates an element with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Adds or replaces an attribute, builder style.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.set_attribute(attribute);
        self
    }

    /// Returns the element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns the raw value of the named attribute.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(Attribute::value)
    }

    /// Sets an attribute. An existing attribute with the same name is
    /// replaced in place and returned.
    pub fn set_attribute(&mut self, attribute: Attribute) -> Option<Attribute> {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(slot) => Some(std::mem::replace(slot, attribute)),
            None => {
                self.attributes.push(attribute);
                None
            }
        }
    }

    /// Removes and returns the named attribute.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index))
    }
}

/// Character data, stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub data: String,
}

impl Text {
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// The content of a CDATA section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CData {
    pub data: String,
}

impl CData {
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// The text of a comment, without delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub data: String,
}

impl Comment {
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// A processing instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    /// The target, never `xml` in any case.
    pub target: String,
    /// Everything after the target and its separating white space.
    pub data: Option<String>,
}

impl ProcessingInstruction {
    #[must_use]
    pub fn new(target: impl Into<String>, data: Option<String>) -> Self {
        Self {
            target: target.into(),
            data,
        }
    }
}

macro_rules! into_kind {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for NodeKind {
                fn from(value: $ty) -> Self {
                    Self::$ty(value)
                }
            }
        )*
    };
}

into_kind!(Element, Text, CData, Comment, ProcessingInstruction);
