//! Arena-based XML document tree.
//!
//! All nodes live in a `Vec` owned by the [`Document`] and are referenced by
//! [`NodeId`], a newtype over `NonZeroU32`. Each slot holds a [`NodeData`]
//! that composes two capabilities:
//!
//! - the *child* role: parent, previous and next sibling links
//!   ([`SiblingLinks`]), meaningful once the node is attached;
//! - the *parent* role: first and last child plus a child count
//!   ([`ChildList`]), present only for kinds that own children (the document
//!   node and elements).
//!
//! For every parent `P`, walking `first` via `next` reaches `last` after
//! `size - 1` steps, walking back via `prev` does the same in reverse, and
//! every node visited has `parent == P`. [`Document::check_consistency`]
//! verifies this.
//!
//! Erasing a node frees its slot for good: ids are never reused, so a stale
//! `NodeId` panics on access rather than silently naming another node.
//! Misuse of positions (a handle that belongs to another parent, moving a
//! node into its own subtree) is a programmer error and panics as well.

mod node;
mod traverse;

pub use node::{CData, Comment, Element, NodeKind, ProcessingInstruction, Text};
pub use traverse::{Children, Handle, NodePayload, NodeRef, NodeType};

use std::num::NonZeroU32;

use crate::parser::{DocType, Encoding, Standalone, Version};

/// A typed index into the document's node arena.
///
/// `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    fn from_index(index: usize) -> Self {
        match u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .and_then(NonZeroU32::new)
        {
            Some(raw) => Self(raw),
            None => panic!("node arena exhausted: slot {index} has no NodeId"),
        }
    }

    fn as_index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Converts this `NodeId` to its raw, non-zero `u32`.
    #[must_use]
    pub fn into_raw(self) -> u32 {
        self.0.get()
    }
}

/// The child role: where a node sits under its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiblingLinks {
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

/// The parent role: the ends of a node's child chain and its length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildList {
    pub first: Option<NodeId>,
    pub last: Option<NodeId>,
    pub size: usize,
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    kind: NodeKind,
    link: SiblingLinks,
    children: Option<ChildList>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        let children = kind.can_have_children().then(ChildList::default);
        Self {
            kind,
            link: SiblingLinks::default(),
            children,
        }
    }

    /// What kind of node this is and its payload.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The node's parent and sibling links.
    #[must_use]
    pub fn link(&self) -> &SiblingLinks {
        &self.link
    }

    /// The node's child list, if its kind owns children.
    #[must_use]
    pub fn children(&self) -> Option<&ChildList> {
        self.children.as_ref()
    }
}

/// An XML document.
///
/// A document always has a root element: it is created with one and the
/// root can be edited, but neither erased nor moved. Other children of the
/// document node (comments, processing instructions) may come before or
/// after it.
///
/// `Clone` is a deep copy; node ids stay valid in the copy.
///
/// # Examples
///
/// ```
/// use xmlgrove::Document;
///
/// let doc = Document::new("root");
/// assert_eq!(doc.root_element().name(), "root");
/// assert_eq!(doc.size(doc.document_node()), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<NodeData>>,
    document: NodeId,
    root: NodeId,
    /// Version from the XML declaration.
    pub version: Option<Version>,
    /// Encoding from the XML declaration.
    pub encoding: Option<Encoding>,
    /// Standalone flag from the XML declaration.
    pub standalone: Option<Standalone>,
    /// The document type declaration, if any.
    pub doctype: Option<DocType>,
}

impl Document {
    /// Creates a document whose root element has the given name.
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_root(Element::new(root_name))
    }

    /// Creates a document with the given root element.
    #[must_use]
    pub fn with_root(root: Element) -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(Some(NodeData::new(NodeKind::Document)));
        let document = NodeId::from_index(0);
        let mut doc = Self {
            nodes,
            document,
            root: document,
            version: None,
            encoding: None,
            standalone: None,
            doctype: None,
        };
        let root = doc.alloc(NodeKind::Element(root));
        doc.link_before(document, None, root);
        doc.root = root;
        doc
    }

    /// Creates a document whose root element is a deep copy of `element`
    /// in `other`.
    ///
    /// # Panics
    ///
    /// Panics if `element` is not an element of `other`.
    #[must_use]
    pub fn from_subtree(other: &Document, element: NodeId) -> Self {
        let Some(root) = other.get::<Element>(element) else {
            panic!("from_subtree needs an element, got {:?}", other.kind(element));
        };
        let mut doc = Self::with_root(root.clone());
        let root = doc.root;
        let mut child = other.first_child(element);
        while let Some(id) = child {
            let copy = doc.import(other, id);
            doc.link_before(root, None, copy);
            child = other.next_sibling(id);
        }
        doc
    }

    /// The document node.
    #[must_use]
    pub fn document_node(&self) -> NodeId {
        self.document
    }

    /// The root element's id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root element.
    #[must_use]
    pub fn root_element(&self) -> &Element {
        match &self.node(self.root).kind {
            NodeKind::Element(e) => e,
            _ => unreachable!("root is always an element"),
        }
    }

    /// The root element, mutably.
    pub fn root_element_mut(&mut self) -> &mut Element {
        let root = self.root;
        match &mut self.node_mut(root).kind {
            NodeKind::Element(e) => e,
            _ => unreachable!("root is always an element"),
        }
    }

    // --- Access ---

    /// Returns the slot for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was erased.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        match self.nodes.get(id.as_index()) {
            Some(Some(data)) => data,
            _ => panic!("stale NodeId {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        match self.nodes.get_mut(id.as_index()) {
            Some(Some(data)) => data,
            _ => panic!("stale NodeId {id:?}"),
        }
    }

    /// Returns `true` if `id` names a live node of this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.as_index()), Some(Some(_)))
    }

    /// The kind and payload of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// The payload of a node, if it is a `T`.
    #[must_use]
    pub fn get<T: NodeType + ?Sized>(&self, id: NodeId) -> Option<&T> {
        T::cast(self.kind(id))
    }

    /// The payload of a node, mutably, if it is a `T`.
    ///
    /// Only concrete payloads can be borrowed this way, so the kind of a
    /// node never changes after creation:
    ///
    /// ```compile_fail
    /// use xmlgrove::tree::NodeKind;
    /// use xmlgrove::{Document, Text};
    ///
    /// let mut doc = Document::new("root");
    /// let root = doc.root();
    /// *doc.get_mut::<NodeKind>(root).unwrap() = NodeKind::Text(Text::new("x"));
    /// ```
    pub fn get_mut<T: NodePayload>(&mut self, id: NodeId) -> Option<&mut T> {
        T::cast_mut(&mut self.node_mut(id).kind)
    }

    /// Number of live nodes, including the document node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// The concatenated text of a node and its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in std::iter::once(id).chain(self.descendants(id)) {
            match self.kind(node) {
                NodeKind::Text(Text { data }) | NodeKind::CData(CData { data }) => {
                    out.push_str(data);
                }
                _ => {}
            }
        }
        out
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).link.parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.and_then(|c| c.first)
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.and_then(|c| c.last)
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).link.next
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).link.prev
    }

    /// Number of direct children.
    #[must_use]
    pub fn size(&self, parent: NodeId) -> usize {
        self.node(parent).children.map_or(0, |c| c.size)
    }

    /// Returns `true` if the node has no children.
    #[must_use]
    pub fn is_empty(&self, parent: NodeId) -> bool {
        self.size(parent) == 0
    }

    /// The first child, if any.
    #[must_use]
    pub fn front(&self, parent: NodeId) -> Option<NodeId> {
        self.first_child(parent)
    }

    /// The last child, if any.
    #[must_use]
    pub fn back(&self, parent: NodeId) -> Option<NodeId> {
        self.last_child(parent)
    }

    /// Returns an iterator over a node and its ancestors (walking up to the
    /// document node).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first,
    /// document order), not including the node itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    // --- Creation ---

    /// Allocates a detached node.
    ///
    /// # Panics
    ///
    /// Panics for [`NodeKind::Document`]; a document has exactly one.
    pub fn create(&mut self, kind: impl Into<NodeKind>) -> NodeId {
        let kind = kind.into();
        assert!(
            !matches!(kind, NodeKind::Document),
            "cannot create a second document node"
        );
        self.alloc(kind)
    }

    /// Allocates a detached element.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(name)))
    }

    /// Allocates a detached text node.
    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(Text::new(data)))
    }

    /// Deep-copies a node of `other` into this document, detached.
    ///
    /// # Panics
    ///
    /// Panics if `node` is `other`'s document node.
    pub fn import(&mut self, other: &Document, node: NodeId) -> NodeId {
        self.copy_from(other, node)
    }

    // --- Insertion ---

    /// Inserts a deep copy of `source` before `pos` and returns the copy's
    /// position. `source` may live anywhere in this document, including
    /// under `parent`; it is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not a position among `parent`'s children, or if
    /// the copy cannot be placed there (see [`insert_move`](Self::insert_move)).
    pub fn insert<T: NodeType + ?Sized>(&mut self, parent: NodeId, pos: Handle<T>, source: NodeId) -> Handle {
        self.check_position(parent, pos);
        let copy = self.copy_from_self(source);
        self.link_before(parent, pos.node(), copy);
        Handle::raw(parent, Some(copy))
    }

    /// Moves `node` before `pos`, keeping its identity. It is first unlinked
    /// from wherever it was.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not a position among `parent`'s children, if
    /// `node` is the document node or the root element, if `node` is
    /// `parent` or one of its ancestors, or if `parent` cannot own children.
    pub fn insert_move<T: NodeType + ?Sized>(&mut self, parent: NodeId, pos: Handle<T>, node: NodeId) -> Handle {
        self.check_position(parent, pos);
        assert!(node != self.root, "cannot move the root element");
        assert!(node != self.document, "cannot move the document node");
        assert!(
            !self.ancestors(parent).any(|a| a == node),
            "cannot move a node into its own subtree"
        );
        if pos.node() == Some(node) {
            return Handle::raw(parent, Some(node));
        }
        self.unlink(node);
        self.link_before(parent, pos.node(), node);
        Handle::raw(parent, Some(node))
    }

    /// Inserts `count` deep copies of `source` before `pos`. Returns the
    /// position of the first copy, or `pos` if `count` is zero.
    pub fn insert_n<T: NodeType + ?Sized>(
        &mut self,
        parent: NodeId,
        pos: Handle<T>,
        count: usize,
        source: NodeId,
    ) -> Handle {
        let mut first = pos.untyped();
        for i in 0..count {
            let h = self.insert(parent, pos, source);
            if i == 0 {
                first = h;
            }
        }
        first
    }

    /// Inserts deep copies of each of `sources`, in order, before `pos`.
    /// Returns the position of the first copy, or `pos` if there were none.
    pub fn insert_range<T: NodeType + ?Sized>(
        &mut self,
        parent: NodeId,
        pos: Handle<T>,
        sources: impl IntoIterator<Item = NodeId>,
    ) -> Handle {
        let mut first = None;
        for source in sources {
            let h = self.insert(parent, pos, source);
            first.get_or_insert(h);
        }
        first.unwrap_or_else(|| pos.untyped())
    }

    /// Creates a node for each of `kinds` and inserts them, in order, before
    /// `pos`. Returns the position of the first one, or `pos` if there were none.
    pub fn insert_list<T: NodeType + ?Sized, K: Into<NodeKind>>(
        &mut self,
        parent: NodeId,
        pos: Handle<T>,
        kinds: impl IntoIterator<Item = K>,
    ) -> Handle {
        let mut first = None;
        for kind in kinds {
            let h = self.emplace(parent, pos, kind);
            first.get_or_insert(h);
        }
        first.unwrap_or_else(|| pos.untyped())
    }

    /// Creates a node from `kind` and inserts it before `pos`.
    pub fn emplace<T: NodeType + ?Sized>(
        &mut self,
        parent: NodeId,
        pos: Handle<T>,
        kind: impl Into<NodeKind>,
    ) -> Handle {
        self.check_position(parent, pos);
        let id = self.create(kind);
        self.link_before(parent, pos.node(), id);
        Handle::raw(parent, Some(id))
    }

    /// Creates a node from `kind` as the first child of `parent`.
    pub fn emplace_front(&mut self, parent: NodeId, kind: impl Into<NodeKind>) -> Handle {
        let pos = self.begin::<NodeKind>(parent);
        self.emplace(parent, pos, kind)
    }

    /// Creates a node from `kind` as the last child of `parent`.
    pub fn emplace_back(&mut self, parent: NodeId, kind: impl Into<NodeKind>) -> Handle {
        let pos = self.end::<NodeKind>(parent);
        self.emplace(parent, pos, kind)
    }

    /// Inserts a deep copy of `source` as the first child of `parent`.
    pub fn push_front(&mut self, parent: NodeId, source: NodeId) -> Handle {
        let pos = self.begin::<NodeKind>(parent);
        self.insert(parent, pos, source)
    }

    /// Inserts a deep copy of `source` as the last child of `parent`.
    pub fn push_back(&mut self, parent: NodeId, source: NodeId) -> Handle {
        let pos = self.end::<NodeKind>(parent);
        self.insert(parent, pos, source)
    }

    /// Moves `node` to be the first child of `parent`.
    pub fn push_front_move(&mut self, parent: NodeId, node: NodeId) -> Handle {
        let pos = self.begin::<NodeKind>(parent);
        self.insert_move(parent, pos, node)
    }

    /// Moves `node` to be the last child of `parent`.
    pub fn push_back_move(&mut self, parent: NodeId, node: NodeId) -> Handle {
        let pos = self.end::<NodeKind>(parent);
        self.insert_move(parent, pos, node)
    }

    // --- Removal ---

    /// Unlinks and destroys the node at `pos` with its subtree. Returns the
    /// next `T` after it. Erasing at the end marker does nothing.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is not a position among `parent`'s children, or if it
    /// rests on the root element.
    pub fn erase<T: NodeType + ?Sized>(&mut self, parent: NodeId, pos: Handle<T>) -> Handle<T> {
        self.check_position(parent, pos);
        let Some(node) = pos.node() else {
            return pos;
        };
        assert!(node != self.root, "cannot erase the root element");
        let next = self.next_sibling(node);
        self.unlink(node);
        self.destroy(node);
        Handle::snap_forward(self, parent, next)
    }

    /// Erases every `T` from `first` up to (not including) `last`.
    ///
    /// # Panics
    ///
    /// Panics if either position is not among `parent`'s children, or if
    /// `last` does not come at or after `first`. Nothing is erased then.
    pub fn erase_range<T: NodeType + ?Sized>(
        &mut self,
        parent: NodeId,
        mut first: Handle<T>,
        last: Handle<T>,
    ) -> Handle<T> {
        self.check_position(parent, first);
        self.check_position(parent, last);
        let mut scan = first;
        while scan != last {
            assert!(!scan.is_end(), "range end {:?} does not follow its start", last.node());
            scan = scan.next(self);
        }
        while first != last {
            first = self.erase(parent, first);
        }
        first
    }

    /// Erases the first child.
    ///
    /// # Panics
    ///
    /// Panics if `parent` has no children.
    pub fn pop_front(&mut self, parent: NodeId) {
        assert!(!self.is_empty(parent), "pop_front on a node without children");
        let pos = self.begin::<NodeKind>(parent);
        self.erase(parent, pos);
    }

    /// Erases the last child.
    ///
    /// # Panics
    ///
    /// Panics if `parent` has no children.
    pub fn pop_back(&mut self, parent: NodeId) {
        assert!(!self.is_empty(parent), "pop_back on a node without children");
        let pos = self.end::<NodeKind>(parent).prev(self);
        self.erase(parent, pos);
    }

    /// Erases all children of `parent`.
    ///
    /// # Panics
    ///
    /// Panics for the document node, which always holds the root element.
    pub fn clear(&mut self, parent: NodeId) {
        let first = self.begin::<NodeKind>(parent);
        let last = self.end::<NodeKind>(parent);
        self.erase_range(parent, first, last);
    }

    /// Detaches a node from its parent without destroying it.
    ///
    /// # Panics
    ///
    /// Panics for the root element.
    pub fn detach(&mut self, node: NodeId) {
        assert!(node != self.root, "cannot detach the root element");
        self.unlink(node);
    }

    /// Detaches a node if needed and destroys it with its subtree.
    ///
    /// # Panics
    ///
    /// Panics for the root element and the document node.
    pub fn remove(&mut self, node: NodeId) {
        assert!(node != self.root, "cannot remove the root element");
        assert!(node != self.document, "cannot remove the document node");
        self.unlink(node);
        self.destroy(node);
    }

    // --- Consistency ---

    /// Verifies the link invariants of every live node.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found.
    pub fn check_consistency(&self) {
        for (index, slot) in self.nodes.iter().enumerate() {
            let Some(data) = slot else { continue };
            let parent = NodeId::from_index(index);
            let Some(list) = data.children else {
                continue;
            };

            let mut count = 0;
            let mut prev = None;
            let mut cursor = list.first;
            while let Some(child) = cursor {
                let link = self.node(child).link;
                assert_eq!(link.parent, Some(parent), "{child:?} has the wrong parent");
                assert_eq!(link.prev, prev, "{child:?} has a broken prev link");
                count += 1;
                assert!(count <= list.size, "{parent:?} has more children than its size");
                prev = Some(child);
                cursor = link.next;
            }
            assert_eq!(prev, list.last, "{parent:?} last child is not at the end of the chain");
            assert_eq!(count, list.size, "{parent:?} size does not match its children");
        }

        let elements: Vec<NodeId> = self
            .children::<Element>(self.document)
            .map(|e| e.id())
            .collect();
        assert_eq!(elements, [self.root], "document must hold exactly the root element");
    }

    // --- Internals ---

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(Some(NodeData::new(kind)));
        NodeId::from_index(index)
    }

    fn check_position<T: NodeType + ?Sized>(&self, parent: NodeId, pos: Handle<T>) {
        assert!(
            pos.parent() == parent,
            "position belongs to {:?}, not {parent:?}",
            pos.parent()
        );
        if let Some(node) = pos.node() {
            assert!(
                self.parent(node) == Some(parent),
                "position {node:?} is not a child of {parent:?}"
            );
        }
    }

    /// Creates a node and links it as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, kind: impl Into<NodeKind>) -> NodeId {
        let id = self.create(kind);
        self.link_before(parent, None, id);
        id
    }

    /// Links a detached node into `parent` before `before` (at the end when `None`).
    pub(crate) fn link_before(&mut self, parent: NodeId, before: Option<NodeId>, child: NodeId) {
        debug_assert!(self.parent(child).is_none(), "child is still attached");
        let Some(mut list) = self.node(parent).children else {
            panic!("{:?} cannot have children", self.kind(parent));
        };
        if parent == self.document && matches!(self.kind(child), NodeKind::Element(_)) {
            assert!(
                self.root == self.document,
                "the document already has a root element"
            );
        }
        if matches!(self.kind(parent), NodeKind::Document)
            && matches!(self.kind(child), NodeKind::Text(_) | NodeKind::CData(_))
        {
            panic!("the document node cannot hold character data");
        }

        let prev = match before {
            Some(next) => self.prev_sibling(next),
            None => list.last,
        };
        {
            let link = &mut self.node_mut(child).link;
            link.parent = Some(parent);
            link.prev = prev;
            link.next = before;
        }
        match prev {
            Some(p) => self.node_mut(p).link.next = Some(child),
            None => list.first = Some(child),
        }
        match before {
            Some(n) => self.node_mut(n).link.prev = Some(child),
            None => list.last = Some(child),
        }
        list.size += 1;
        self.node_mut(parent).children = Some(list);
    }

    /// Unlinks a node from its parent, if it has one.
    fn unlink(&mut self, id: NodeId) {
        let SiblingLinks { parent, prev, next } = self.node(id).link;
        let Some(parent) = parent else {
            return;
        };
        let Some(mut list) = self.node(parent).children else {
            return;
        };
        match prev {
            Some(p) => self.node_mut(p).link.next = next,
            None => list.first = next,
        }
        match next {
            Some(n) => self.node_mut(n).link.prev = prev,
            None => list.last = prev,
        }
        list.size -= 1;
        self.node_mut(parent).children = Some(list);
        self.node_mut(id).link = SiblingLinks::default();
    }

    /// Frees a detached node and everything below it.
    pub(crate) fn destroy(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let mut child = self.first_child(node);
            while let Some(c) = child {
                stack.push(c);
                child = self.next_sibling(c);
            }
            self.nodes[node.as_index()] = None;
        }
    }

    fn copy_from_self(&mut self, source: NodeId) -> NodeId {
        assert!(source != self.document, "cannot copy the document node");
        let copy = self.alloc(self.kind(source).clone());
        let mut stack = vec![(source, copy)];
        while let Some((from, to)) = stack.pop() {
            let mut child = self.first_child(from);
            while let Some(c) = child {
                let new = self.alloc(self.kind(c).clone());
                self.link_before(to, None, new);
                stack.push((c, new));
                child = self.next_sibling(c);
            }
        }
        copy
    }

    fn copy_from(&mut self, other: &Document, source: NodeId) -> NodeId {
        assert!(
            !matches!(other.kind(source), NodeKind::Document),
            "cannot copy the document node"
        );
        let copy = self.alloc(other.kind(source).clone());
        let mut stack = vec![(source, copy)];
        while let Some((from, to)) = stack.pop() {
            let mut child = other.first_child(from);
            while let Some(c) = child {
                let new = self.alloc(other.kind(c).clone());
                self.link_before(to, None, new);
                stack.push((c, new));
                child = other.next_sibling(c);
            }
        }
        copy
    }
}

// --- Iterators ---

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        let mut node = current;
        loop {
            if node == self.root {
                self.next = None;
                break;
            }
            if let Some(sibling) = self.doc.next_sibling(node) {
                self.next = Some(sibling);
                break;
            }
            match self.doc.parent(node) {
                Some(parent) => node = parent,
                None => {
                    self.next = None;
                    break;
                }
            }
        }
        Some(current)
    }
}
