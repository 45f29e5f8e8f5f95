//! # xmlgrove
//!
//! An XML document object model with a backtracking recursive-descent
//! parser. Documents are arena trees of typed nodes that can be navigated,
//! edited, copied between documents and written back out.
//!
//! ## Quick Start
//!
//! ```
//! use xmlgrove::{Document, Element, Text};
//!
//! let mut doc = Document::parse_str("<list><item>one</item></list>").unwrap();
//! let root = doc.root();
//! let item = doc.emplace_back(root, Element::new("item")).node().unwrap();
//! doc.emplace_back(item, Text::new("two"));
//!
//! let names: Vec<_> = doc.children::<Element>(root).map(|e| e.name.clone()).collect();
//! assert_eq!(names, ["item", "item"]);
//! assert_eq!(
//!     doc.to_string(),
//!     "<?xml version=\"1.0\"?>\n<list><item>one</item><item>two</item></list>\n"
//! );
//! ```
//!
//! ## Parsing building blocks
//!
//! Every grammar production is a method on [`Cursor`] returning
//! [`PResult`](error::PResult). A failed production leaves the cursor where
//! it started, so productions compose freely:
//!
//! ```
//! use xmlgrove::Cursor;
//! use xmlgrove::parser::{OnMismatch, Production, StrSource, Version};
//!
//! let mut cursor = Cursor::new(StrSource::new("version = '1.x'"));
//! assert!(Version::parse(&mut cursor, OnMismatch::Absent).unwrap().is_none());
//! assert_eq!(
//!     cursor.last_error().unwrap().to_string(),
//!     "Expected version (at line 1 col 12)"
//! );
//! assert_eq!(cursor.location().offset, 0);
//! ```

pub mod encoding;
pub mod error;
pub mod parser;
pub mod serial;
pub mod tree;

mod util;

// Re-export primary types at the crate root for convenience.
pub use error::{ParseError, XmlError};
pub use parser::{Attribute, Cursor};
pub use tree::{Document, Element, NodeId, Text};
