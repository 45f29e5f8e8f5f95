//! Kind-filtered traversal over a node's children.
//!
//! Siblings of every kind share one chain. A [`Handle<T>`] is a position in
//! that chain which only ever rests on children of kind `T` (or on the end
//! marker): creating or advancing it skips over the rest. [`Children<T>`]
//! is the iterator form of the same idea.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use super::node::{CData, Comment, Element, NodeKind, ProcessingInstruction, Text};
use super::{Document, NodeId};

/// A node payload that traversal can stop on.
pub trait NodeType: 'static {
    /// Views `kind` as `Self`, if it is one.
    fn cast(kind: &NodeKind) -> Option<&Self>;
}

/// A concrete payload that may be edited in place.
///
/// `NodeKind` is not one; a node's kind is fixed once it is created.
pub trait NodePayload: NodeType {
    /// Views `kind` as `Self` mutably, if it is one.
    fn cast_mut(kind: &mut NodeKind) -> Option<&mut Self>;
}

impl NodeType for NodeKind {
    fn cast(kind: &NodeKind) -> Option<&Self> {
        Some(kind)
    }
}

macro_rules! node_type {
    ($($ty:ident),*) => {
        $(
            impl NodeType for $ty {
                fn cast(kind: &NodeKind) -> Option<&Self> {
                    match kind {
                        NodeKind::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }

            impl NodePayload for $ty {
                fn cast_mut(kind: &mut NodeKind) -> Option<&mut Self> {
                    match kind {
                        NodeKind::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

node_type!(Element, Text, CData, Comment, ProcessingInstruction);

/// A position among the children of `parent`, resting only on `T` nodes.
///
/// `node()` is `None` for the end marker. Two handles are equal when they
/// rest on the same node, or are both end markers.
pub struct Handle<T: ?Sized = NodeKind> {
    parent: NodeId,
    node: Option<NodeId>,
    kind: PhantomData<fn() -> T>,
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Handle<T> {}

impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("parent", &self.parent)
            .field("node", &self.node)
            .finish()
    }
}

impl<T: NodeType + ?Sized> Handle<T> {
    pub(crate) fn raw(parent: NodeId, node: Option<NodeId>) -> Self {
        Self {
            parent,
            node,
            kind: PhantomData,
        }
    }

    /// The first `T` at or after `from` (the end marker if there is none).
    pub(crate) fn snap_forward(doc: &Document, parent: NodeId, mut from: Option<NodeId>) -> Self {
        while let Some(id) = from {
            if T::cast(doc.kind(id)).is_some() {
                break;
            }
            from = doc.next_sibling(id);
        }
        Self::raw(parent, from)
    }

    /// The last `T` at or before `from`.
    pub(crate) fn snap_back(doc: &Document, parent: NodeId, mut from: Option<NodeId>) -> Self {
        while let Some(id) = from {
            if T::cast(doc.kind(id)).is_some() {
                break;
            }
            from = doc.prev_sibling(id);
        }
        Self::raw(parent, from)
    }

    /// The node whose children this handle walks.
    #[must_use]
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// The node this handle rests on, or `None` at the end marker.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Returns `true` for the end marker.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Returns the node this handle rests on.
    ///
    /// # Panics
    ///
    /// Panics at the end marker.
    #[must_use]
    pub fn get<'a>(&self, doc: &'a Document) -> &'a T {
        let Some(id) = self.node else {
            panic!("dereferenced the end handle");
        };
        match T::cast(doc.kind(id)) {
            Some(value) => value,
            None => panic!("handle rests on a node of another kind"),
        }
    }

    /// Advances to the next `T`.
    ///
    /// # Panics
    ///
    /// Panics at the end marker.
    #[must_use]
    pub fn next(self, doc: &Document) -> Self {
        let Some(id) = self.node else {
            panic!("advanced past the end handle");
        };
        Self::snap_forward(doc, self.parent, doc.next_sibling(id))
    }

    /// Steps back to the previous `T`. From the end marker this is the last `T`.
    ///
    /// # Panics
    ///
    /// Panics if there is no previous `T`.
    #[must_use]
    pub fn prev(self, doc: &Document) -> Self {
        let from = match self.node {
            Some(id) => doc.prev_sibling(id),
            None => doc.last_child(self.parent),
        };
        let handle = Self::snap_back(doc, self.parent, from);
        assert!(!handle.is_end(), "stepped back before the first child");
        handle
    }

    /// Forgets the kind filter.
    #[must_use]
    pub fn untyped(self) -> Handle {
        Handle::raw(self.parent, self.node)
    }
}

impl<T: NodePayload> Handle<T> {
    /// Returns the node this handle rests on, mutably.
    ///
    /// # Panics
    ///
    /// Panics at the end marker.
    pub fn get_mut<'a>(&self, doc: &'a mut Document) -> &'a mut T {
        let Some(id) = self.node else {
            panic!("dereferenced the end handle");
        };
        match doc.get_mut::<T>(id) {
            Some(value) => value,
            None => panic!("handle rests on a node of another kind"),
        }
    }
}

/// A typed reference to a child, yielded by [`Children`].
#[derive(Debug)]
pub struct NodeRef<'a, T: ?Sized> {
    id: NodeId,
    value: &'a T,
}

impl<T: ?Sized> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for NodeRef<'_, T> {}

impl<'a, T: ?Sized> NodeRef<'a, T> {
    /// The node's id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The payload, with the document's lifetime.
    #[must_use]
    pub fn value(&self) -> &'a T {
        self.value
    }
}

impl<T: ?Sized> Deref for NodeRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value
    }
}

/// Double-ended iterator over the children of a node that are of kind `T`.
pub struct Children<'a, T: ?Sized = NodeKind> {
    doc: &'a Document,
    front: Option<NodeId>,
    back: Option<NodeId>,
    kind: PhantomData<fn() -> T>,
}

impl<'a, T: NodeType + ?Sized> Children<'a, T> {
    pub(crate) fn new(doc: &'a Document, parent: NodeId) -> Self {
        let front = Handle::<T>::snap_forward(doc, parent, doc.first_child(parent)).node;
        let back = Handle::<T>::snap_back(doc, parent, doc.last_child(parent)).node;
        Self {
            doc,
            front,
            back,
            kind: PhantomData,
        }
    }

    fn item(&self, id: NodeId) -> Option<NodeRef<'a, T>> {
        T::cast(self.doc.kind(id)).map(|value| NodeRef { id, value })
    }
}

impl<'a, T: NodeType + ?Sized> Iterator for Children<'a, T> {
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.front?;
        if Some(current) == self.back {
            self.front = None;
            self.back = None;
        } else {
            let parent = self.doc.parent(current)?;
            self.front =
                Handle::<T>::snap_forward(self.doc, parent, self.doc.next_sibling(current)).node;
        }
        self.item(current)
    }
}

impl<T: NodeType + ?Sized> DoubleEndedIterator for Children<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let current = self.back?;
        if Some(current) == self.front {
            self.front = None;
            self.back = None;
        } else {
            let parent = self.doc.parent(current)?;
            self.back =
                Handle::<T>::snap_back(self.doc, parent, self.doc.prev_sibling(current)).node;
        }
        self.item(current)
    }
}

impl Document {
    /// The first child of kind `T`, or the end marker.
    #[must_use]
    pub fn begin<T: NodeType + ?Sized>(&self, parent: NodeId) -> Handle<T> {
        Handle::snap_forward(self, parent, self.first_child(parent))
    }

    /// The end marker of `parent`'s children.
    #[must_use]
    pub fn end<T: NodeType + ?Sized>(&self, parent: NodeId) -> Handle<T> {
        Handle::raw(parent, None)
    }

    /// The position of an attached node.
    ///
    /// # Panics
    ///
    /// Panics if `node` has no parent.
    #[must_use]
    pub fn position(&self, node: NodeId) -> Handle {
        let Some(parent) = self.parent(node) else {
            panic!("node {node:?} is not attached");
        };
        Handle::raw(parent, Some(node))
    }

    /// Iterates over the children of `parent` that are of kind `T`.
    ///
    /// ```
    /// use xmlgrove::Document;
    /// use xmlgrove::tree::{Element, Text};
    ///
    /// let doc = Document::parse_str("<r>a<b/>c<d/></r>").unwrap();
    /// let names: Vec<_> = doc.children::<Element>(doc.root()).map(|e| e.name.clone()).collect();
    /// assert_eq!(names, ["b", "d"]);
    /// let texts: Vec<_> = doc.children::<Text>(doc.root()).rev().map(|t| t.data.clone()).collect();
    /// assert_eq!(texts, ["c", "a"]);
    /// ```
    #[must_use]
    pub fn children<T: NodeType + ?Sized>(&self, parent: NodeId) -> Children<'_, T> {
        Children::new(self, parent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// `<r>t1<a/><!--c-->t2<b/></r>`
    fn mixed() -> (Document, [NodeId; 5]) {
        let mut doc = Document::new("r");
        let r = doc.root();
        let t1 = doc.emplace_back(r, Text::new("t1")).node().unwrap();
        let a = doc.emplace_back(r, Element::new("a")).node().unwrap();
        let c = doc.emplace_back(r, Comment::new("c")).node().unwrap();
        let t2 = doc.emplace_back(r, Text::new("t2")).node().unwrap();
        let b = doc.emplace_back(r, Element::new("b")).node().unwrap();
        (doc, [t1, a, c, t2, b])
    }

    #[test]
    fn test_begin_snaps_forward() {
        let (doc, [t1, a, _, _, _]) = mixed();
        assert_eq!(doc.begin::<NodeKind>(doc.root()).node(), Some(t1));
        assert_eq!(doc.begin::<Element>(doc.root()).node(), Some(a));
        assert!(doc.begin::<CData>(doc.root()).is_end());
    }

    #[test]
    fn test_handle_walk() {
        let (doc, [_, a, _, _, b]) = mixed();
        let h = doc.begin::<Element>(doc.root());
        assert_eq!(h.get(&doc).name, "a");
        let h = h.next(&doc);
        assert_eq!(h.node(), Some(b));
        let end = h.next(&doc);
        assert_eq!(end, doc.end::<Element>(doc.root()));
        assert_eq!(end.prev(&doc).node(), Some(b));
        assert_eq!(end.prev(&doc).prev(&doc).node(), Some(a));
    }

    #[test]
    fn test_handle_equality_is_by_node() {
        let (doc, [t1, ..]) = mixed();
        let typed = doc.begin::<Text>(doc.root());
        assert_eq!(typed.untyped(), doc.position(t1));
        assert_eq!(doc.end::<Text>(doc.root()), Handle::<Text>::raw(t1, None));
    }

    #[test]
    fn test_children_filters_by_kind() {
        let (doc, _) = mixed();
        let texts: Vec<String> = doc
            .children::<Text>(doc.root())
            .map(|t| t.data.clone())
            .collect();
        assert_eq!(texts, vec!["t1", "t2"]);
        assert_eq!(doc.children::<NodeKind>(doc.root()).count(), 5);
        assert_eq!(doc.children::<Comment>(doc.root()).count(), 1);
        assert_eq!(doc.children::<CData>(doc.root()).count(), 0);
    }

    #[test]
    fn test_children_double_ended() {
        let (doc, [_, a, _, _, b]) = mixed();
        let mut it = doc.children::<Element>(doc.root());
        assert_eq!(it.next_back().map(|e| e.id()), Some(b));
        assert_eq!(it.next().map(|e| e.id()), Some(a));
        assert!(it.next().is_none());
        assert!(it.next_back().is_none());
    }

    #[test]
    fn test_get_mut_through_handle() {
        let (mut doc, _) = mixed();
        let h = doc.begin::<Text>(doc.root());
        h.get_mut(&mut doc).data.push('!');
        assert_eq!(h.get(&doc).data, "t1!");
    }

    #[test]
    #[should_panic(expected = "dereferenced the end handle")]
    fn test_deref_end_panics() {
        let (doc, _) = mixed();
        let _ = doc.end::<Element>(doc.root()).get(&doc);
    }

    #[test]
    #[should_panic(expected = "stepped back before the first child")]
    fn test_prev_before_first_panics() {
        let (doc, _) = mixed();
        let _ = doc.begin::<Element>(doc.root()).prev(&doc);
    }
}
