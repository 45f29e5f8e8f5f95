//! Building and editing a document in memory.
//!
//! Run with: `cargo run --example build_tree`
#![allow(clippy::expect_used)]

use xmlgrove::parser::{OnMismatch, StrSource};
use xmlgrove::serial::{serialize_with_options, SerializeOptions};
use xmlgrove::tree::{Comment, NodeKind};
use xmlgrove::{Attribute, Cursor, Document, Element, Text};

fn main() {
    let mut doc = Document::new("inventory");
    let root = doc.root();

    doc.emplace_back(root, Comment::new(" generated "));
    for (sku, qty) in [("a-1", "4"), ("b-2", "0"), ("c-3", "12")] {
        let item = Element::new("item")
            .with_attribute(Attribute::new("sku", sku))
            .with_attribute(Attribute::new("qty", qty));
        doc.emplace_back(root, item);
    }

    // Remove items that are out of stock, walking elements only.
    let mut pos = doc.begin::<Element>(root);
    while !pos.is_end() {
        if pos.get(&doc).attribute_value("qty") == Some("0") {
            pos = doc.erase(root, pos);
        } else {
            pos = pos.next(&doc);
        }
    }

    // Parse a fragment into the document and move it into place.
    let mut cursor = Cursor::new(StrSource::new("<note>restock &amp; recount</note>"));
    let note = doc
        .parse_element(&mut cursor, OnMismatch::Raise)
        .expect("fragment should parse")
        .expect("raise mode returns a node");
    doc.push_front_move(root, note);

    // Copy the first item to the end, then annotate the copy.
    let first_item = doc.begin::<Element>(root).next(&doc);
    let source = first_item.node().expect("an item is left");
    let copy_id = doc.push_back(root, source).node().expect("copy is attached");
    if let NodeKind::Element(element) = doc.kind(copy_id) {
        println!("copied <{}>", element.name);
    }
    doc.emplace_back(copy_id, Text::new("duplicate"));

    doc.check_consistency();

    let options = SerializeOptions::default().indent(true);
    print!("{}", serialize_with_options(&doc, &options));

    // A subtree becomes a document of its own.
    let standalone = Document::from_subtree(&doc, copy_id);
    print!("{standalone}");
}
