//! Basic XML parsing and tree navigation.
//!
//! Run with: `cargo run --example basic_parse`
#![allow(clippy::expect_used)]

use xmlgrove::tree::NodeKind;
use xmlgrove::{Document, Element};

fn main() {
    let xml = r#"<?xml version="1.0"?>
<bookstore>
  <!-- two titles in stock -->
  <book category="fiction">
    <title lang="en">The Great Gatsby</title>
    <author>F. Scott Fitzgerald</author>
    <year>1925</year>
    <price>10.99</price>
  </book>
  <book category="science">
    <title lang="en">A Brief History of Time</title>
    <author>Stephen Hawking</author>
    <year>1988</year>
    <price>14.99</price>
  </book>
</bookstore>"#;

    let doc = Document::parse_str(xml).expect("failed to parse XML");
    let root = doc.root();

    println!("Root element: {}", doc.root_element().name());
    println!("Child nodes of any kind: {}", doc.size(root));

    // Only the element children; text and comments are skipped.
    for book in doc.children::<Element>(root) {
        let category = book.attribute_value("category").unwrap_or("unknown");
        println!("\n<{}> (category={category})", book.name);

        for field in doc.children::<Element>(book.id()) {
            println!("  {}: {}", field.name, doc.text_content(field.id()));
        }
    }

    // Walking all kinds, back to front.
    let kinds: Vec<&str> = doc
        .children::<NodeKind>(root)
        .rev()
        .map(|n| match n.value() {
            NodeKind::Element(_) => "element",
            NodeKind::Text(_) => "text",
            NodeKind::Comment(_) => "comment",
            _ => "other",
        })
        .collect();
    println!("\nKinds in reverse: {kinds:?}");

    match Document::parse_str("<bookstore><book></bookstore>") {
        Ok(_) => println!("unexpectedly well-formed"),
        Err(e) => println!("\nMalformed input: {e}"),
    }
}
