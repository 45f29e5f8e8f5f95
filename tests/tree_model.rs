//! Tree model tests: copy and move insertion, typed traversal, and link
//! consistency under long mutation sequences.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use xmlgrove::tree::{Comment, NodeKind};
use xmlgrove::{Document, Element, NodeId, Text};

fn child_ids(doc: &Document, parent: NodeId) -> Vec<NodeId> {
    doc.children::<NodeKind>(parent).map(|n| n.id()).collect()
}

fn element_names(doc: &Document, parent: NodeId) -> Vec<String> {
    doc.children::<Element>(parent).map(|e| e.name.clone()).collect()
}

#[test]
fn test_new_document() {
    let doc = Document::new("root");
    assert_eq!(doc.root_element().name(), "root");
    assert_eq!(doc.size(doc.document_node()), 1);
    assert_eq!(doc.first_child(doc.root()), None);
    assert_eq!(doc.last_child(doc.root()), None);
    doc.check_consistency();
}

// ---------------------------------------------------------------------------
// Copy insertion: equal content, new identity
// ---------------------------------------------------------------------------

#[test]
fn test_insert_copies_in_position() {
    let mut doc = Document::new("parent");
    let parent = doc.root();
    let child1 = doc.create_element("child1");
    let child2 = doc.create_element("child2");
    let child3 = doc.create_element("child3");

    let begin = doc.begin::<NodeKind>(parent);
    doc.insert(parent, begin, child1);
    let first = doc.first_child(parent).unwrap();
    assert_ne!(first, child1);
    assert_eq!(doc.kind(first), doc.kind(child1));
    assert_eq!(doc.first_child(parent), doc.last_child(parent));

    let end = doc.end::<NodeKind>(parent);
    doc.insert(parent, end, child2);
    let last = doc.last_child(parent).unwrap();
    assert_ne!(last, child2);
    assert_eq!(doc.kind(last), doc.kind(child2));

    let second = doc.begin::<NodeKind>(parent).next(&doc);
    doc.insert(parent, second, child3);
    assert_eq!(element_names(&doc, parent), ["child1", "child3", "child2"]);

    // The sources are untouched and still detached.
    for source in [child1, child2, child3] {
        assert_eq!(doc.parent(source), None);
    }
    doc.check_consistency();
}

#[test]
fn test_push_front_copies() {
    let mut doc = Document::new("parent");
    let parent = doc.root();
    let sources: Vec<NodeId> = ["child1", "child2", "child3"]
        .into_iter()
        .map(|name| doc.create_element(name))
        .collect();

    for &source in &sources {
        doc.push_front(parent, source);
    }
    assert_eq!(element_names(&doc, parent), ["child3", "child2", "child1"]);
    for id in child_ids(&doc, parent) {
        assert!(!sources.contains(&id));
    }
    doc.check_consistency();
}

#[test]
fn test_push_back_copies() {
    let mut doc = Document::new("parent");
    let parent = doc.root();
    let sources: Vec<NodeId> = ["child1", "child2", "child3"]
        .into_iter()
        .map(|name| doc.create_element(name))
        .collect();

    for &source in &sources {
        doc.push_back(parent, source);
    }
    assert_eq!(element_names(&doc, parent), ["child1", "child2", "child3"]);
    for id in child_ids(&doc, parent) {
        assert!(!sources.contains(&id));
    }
    doc.check_consistency();
}

#[test]
fn test_copy_is_deep_and_independent() {
    let mut doc = Document::parse_str("<r><a k='v'><b>text</b></a></r>").unwrap();
    let r = doc.root();
    let a = doc.first_child(r).unwrap();
    let copy = doc.push_back(r, a).node().unwrap();

    let b_copy = doc.first_child(copy).unwrap();
    let t_copy = doc.first_child(b_copy).unwrap();
    doc.get_mut::<Text>(t_copy).unwrap().data = "changed".to_string();
    doc.get_mut::<Element>(copy).unwrap().name = "a2".to_string();

    assert_eq!(doc.text_content(a), "text");
    assert_eq!(doc.get::<Element>(a).unwrap().name, "a");
    assert_eq!(doc.text_content(copy), "changed");
    doc.check_consistency();
}

// ---------------------------------------------------------------------------
// Move insertion: same identity, source container forgets the node
// ---------------------------------------------------------------------------

#[test]
fn test_move_between_parents() {
    let mut doc = Document::parse_str("<r><from><x/><y/></from><to/></r>").unwrap();
    let r = doc.root();
    let from = doc.first_child(r).unwrap();
    let to = doc.last_child(r).unwrap();
    let x = doc.first_child(from).unwrap();

    let moved = doc.push_back_move(to, x);
    assert_eq!(moved.node(), Some(x));
    assert_eq!(doc.parent(x), Some(to));
    assert_eq!(element_names(&doc, from), ["y"]);
    assert_eq!(doc.size(from), 1);
    assert_eq!(child_ids(&doc, to), [x]);
    doc.check_consistency();
}

#[test]
fn test_move_within_parent() {
    let mut doc = Document::parse_str("<r><a/><b/><c/></r>").unwrap();
    let r = doc.root();
    let c = doc.last_child(r).unwrap();
    doc.push_front_move(r, c);
    assert_eq!(element_names(&doc, r), ["c", "a", "b"]);
    let a = doc.begin::<Element>(r).next(&doc).node().unwrap();
    let end = doc.end::<NodeKind>(r);
    doc.insert_move(r, end, a);
    assert_eq!(element_names(&doc, r), ["c", "b", "a"]);
    doc.check_consistency();
}

#[test]
fn test_move_between_documents_via_import() {
    let src = Document::parse_str("<src><item>1</item></src>").unwrap();
    let item = src.first_child(src.root()).unwrap();

    let mut dst = Document::new("dst");
    let imported = dst.import(&src, item);
    let root = dst.root();
    dst.push_back_move(root, imported);

    assert_eq!(dst.text_content(root), "1");
    assert_eq!(src.text_content(src.root()), "1");
    dst.check_consistency();
    src.check_consistency();
}

// ---------------------------------------------------------------------------
// Typed traversal
// ---------------------------------------------------------------------------

#[test]
fn test_typed_handles_skip_other_kinds() {
    let doc = Document::parse_str("<r>t<!--c--><a/>u<b/><!--d--></r>").unwrap();
    let r = doc.root();

    let mut h = doc.begin::<Comment>(r);
    let mut comments = Vec::new();
    while !h.is_end() {
        comments.push(h.get(&doc).data.clone());
        h = h.next(&doc);
    }
    assert_eq!(comments, ["c", "d"]);

    let last_text = doc.end::<Text>(r).prev(&doc);
    assert_eq!(last_text.get(&doc).data, "u");
    assert_eq!(doc.children::<Element>(r).rev().count(), 2);
}

#[test]
fn test_erase_typed_range_keeps_other_kinds() {
    let mut doc = Document::parse_str("<r><a/>x<b/>y<c/></r>").unwrap();
    let r = doc.root();
    let first = doc.begin::<Element>(r);
    let last = doc.end::<Element>(r);
    let rest = doc.erase_range(r, first, last);
    assert!(rest.is_end());
    let texts: Vec<String> = doc.children::<Text>(r).map(|t| t.data.clone()).collect();
    assert_eq!(texts, ["x", "y"]);
    doc.check_consistency();
}

// ---------------------------------------------------------------------------
// Consistency under long mutation sequences
// ---------------------------------------------------------------------------

/// A small deterministic generator so the sequence is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as usize) % bound
    }
}

#[test]
fn test_consistency_after_random_mutations() {
    let mut doc = Document::new("r");
    let mut rng = Lcg(42);

    for step in 0..2_000 {
        let elements: Vec<NodeId> = std::iter::once(doc.root())
            .chain(
                doc.descendants(doc.root())
                    .filter(|&id| matches!(doc.kind(id), NodeKind::Element(_))),
            )
            .collect();
        let parent = elements[rng.next(elements.len())];
        let children = child_ids(&doc, parent);
        let pos = if children.is_empty() || rng.next(4) == 0 {
            doc.end::<NodeKind>(parent)
        } else {
            doc.position(children[rng.next(children.len())])
        };

        match rng.next(6) {
            0 | 1 => {
                doc.emplace(parent, pos, Element::new(format!("e{step}")));
            }
            2 => {
                doc.emplace(parent, pos, Text::new(format!("t{step}")));
            }
            3 => {
                if !pos.is_end() {
                    doc.erase(parent, pos);
                }
            }
            4 => {
                let source = elements[rng.next(elements.len())];
                if source != doc.root() && doc.descendants(source).count() < 50 {
                    doc.insert(parent, pos, source);
                }
            }
            _ => {
                let node = elements[rng.next(elements.len())];
                let is_ancestor = doc.ancestors(parent).any(|a| a == node);
                if node != doc.root() && !is_ancestor {
                    doc.insert_move(parent, pos, node);
                }
            }
        }
        doc.check_consistency();
    }
}
