//! Arena-based document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the `Document` and
//! are referenced by `NodeId`, a newtype over `NonZeroU32`. Navigation links
//! (parent, first\_child, last\_child, next\_sibling, prev\_sibling) are arena
//! indices, so the tree has no reference cycles and no per-node ownership.
//!
//! A node's position in its parent's child list is the single source of
//! truth for order. Every mutation below rewires the sibling links of all
//! affected neighbours in the same call, so navigation never observes a
//! half-updated tree.
//!
//! Reading goes through `&Document`, mutation through `&mut Document`.

mod node;

pub use node::{
    AttrValue, Attribute, Attributes, NavigableString, NodeKind, PageElement, StringKind, Tag,
};

use std::num::NonZeroU32;

use crate::builder::rules::{MarkupRules, HTML_RULES};
use crate::encoding::DetectionSource;
use crate::error::{ParseDiagnostic, TreeError};

/// A typed index into the document's node arena.
///
/// `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node. The document node and detached nodes have none.
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// A parsed (or hand-built) HTML/XML document.
///
/// # Examples
///
/// ```
/// use soupkit::parse_html;
///
/// let doc = parse_html("<p class='x'>Hello</p>");
/// let p = doc.tag(doc.root(), "p").unwrap();
/// assert_eq!(doc.name(p), Some("p"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    root: NodeId,
    rules: &'static MarkupRules,
    pub(crate) original_encoding: Option<String>,
    pub(crate) declared_encoding: Option<String>,
    pub(crate) encoding_source: Option<DetectionSource>,
    pub(crate) backend: String,
    /// Problems recovered from while building the tree.
    pub(crate) diagnostics: Vec<ParseDiagnostic>,
}

impl Document {
    /// Creates an empty document governed by `rules`.
    #[must_use]
    pub fn new(rules: &'static MarkupRules) -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        // Index 1: the document node
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            rules,
            original_encoding: None,
            declared_encoding: None,
            encoding_source: None,
            backend: String::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Returns the document node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The markup rules this document was built with.
    #[must_use]
    pub fn rules(&self) -> &'static MarkupRules {
        self.rules
    }

    /// The encoding the input bytes were decoded with. `None` when the
    /// document was built from text.
    #[must_use]
    pub fn original_encoding(&self) -> Option<&str> {
        self.original_encoding.as_deref()
    }

    /// The encoding the document declared for itself, if any, whether or not
    /// it was usable.
    #[must_use]
    pub fn declared_encoding(&self) -> Option<&str> {
        self.declared_encoding.as_deref()
    }

    /// Which detection step chose [`original_encoding`](Self::original_encoding).
    #[must_use]
    pub fn encoding_source(&self) -> Option<DetectionSource> {
        self.encoding_source
    }

    /// Name of the backend that tokenized the input.
    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Recovered markup problems, in the order they were met.
    #[must_use]
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the node as a [`PageElement`]. The document node has none.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<PageElement<'_>> {
        match &self.node(id).kind {
            NodeKind::Tag(tag) => Some(PageElement::Tag(tag)),
            NodeKind::String(string) => Some(PageElement::String(string)),
            NodeKind::Document => None,
        }
    }

    #[must_use]
    pub fn as_tag(&self, id: NodeId) -> Option<&Tag> {
        match &self.node(id).kind {
            NodeKind::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_string(&self, id: NodeId) -> Option<&NavigableString> {
        match &self.node(id).kind {
            NodeKind::String(string) => Some(string),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_tag(&self, id: NodeId) -> bool {
        self.as_tag(id).is_some()
    }

    /// Returns the tag name, or `None` for strings and the document node.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.as_tag(id).map(|tag| tag.name.as_str())
    }

    /// Looks up an attribute on a tag.
    ///
    /// The name is case-folded first when the document's rules fold case,
    /// so `attribute(id, "CLASS")` finds `class` in HTML.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
        let tag = self.as_tag(id)?;
        tag.attributes.get(&self.rules.fold(name))
    }

    /// Returns `true` if the tag carries `name`, folded like [`attribute`](Self::attribute).
    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.as_tag(id)
            .is_some_and(|tag| tag.attributes.contains(&self.rules.fold(name)))
    }

    // --- Links ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns an iterator over the direct children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns `true` if `ancestor` is `id` or lies on `id`'s parent chain.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Returns the total number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1 // subtract placeholder at index 0
    }

    // --- Node creation ---

    /// Allocates a detached node in the arena.
    pub(crate) fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Creates a detached tag. The name is case-folded per the document rules.
    pub fn create_tag(&mut self, name: &str) -> NodeId {
        let name = self.rules.fold(name).into_owned();
        self.create_node(NodeKind::Tag(Tag::new(name)))
    }

    /// Creates a detached string of the given kind.
    pub fn create_string(&mut self, content: impl Into<String>, kind: StringKind) -> NodeId {
        self.create_node(NodeKind::String(NavigableString::new(content, kind)))
    }

    // --- Unchecked link surgery, shared by the builder and the checked API ---

    /// Appends a detached child to the end of a parent's child list.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Links a detached `new_child` immediately before the attached `reference`.
    fn link_before(&mut self, parent: NodeId, reference: NodeId, new_child: NodeId) {
        self.node_mut(new_child).parent = Some(parent);

        if let Some(prev) = self.node(reference).prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }

        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
    }

    /// Detaches a node from its parent. The node stays allocated.
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    // --- Checked mutation ---

    /// Validates that `child` may be placed under `parent`.
    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if child == self.root {
            return Err(TreeError::RootImmovable);
        }
        match &self.node(parent).kind {
            NodeKind::String(_) => return Err(TreeError::NotAContainer),
            NodeKind::Tag(tag) if self.rules.is_void(&tag.name) => {
                return Err(TreeError::NotAContainer);
            }
            _ => {}
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::WouldCycle);
        }
        Ok(())
    }

    /// Inserts `child` at position `index` in `parent`'s child list.
    ///
    /// An attached `child` is moved: it is extracted first, then inserted.
    /// `index` may equal the number of children, which appends.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), TreeError> {
        self.check_insertable(parent, child)?;
        let moving_within = self.parent(child) == Some(parent);
        let len = self.children(parent).count() - usize::from(moving_within);
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        self.detach(child);
        match self.children(parent).nth(index) {
            Some(reference) => self.link_before(parent, reference, child),
            None => self.append_child(parent, child),
        }
        Ok(())
    }

    /// Appends `child` as the last child of `parent`, moving it if attached.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_insertable(parent, child)?;
        self.detach(child);
        self.append_child(parent, child);
        Ok(())
    }

    /// Inserts `new_node` as the sibling immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, new_node: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(reference).ok_or(TreeError::Detached)?;
        if new_node == reference {
            return Ok(());
        }
        self.check_insertable(parent, new_node)?;
        self.detach(new_node);
        self.link_before(parent, reference, new_node);
        Ok(())
    }

    /// Inserts `new_node` as the sibling immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new_node: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(reference).ok_or(TreeError::Detached)?;
        if new_node == reference {
            return Ok(());
        }
        self.check_insertable(parent, new_node)?;
        self.detach(new_node);
        match self.node(reference).next_sibling {
            Some(next) => self.link_before(parent, next, new_node),
            None => self.append_child(parent, new_node),
        }
        Ok(())
    }

    /// Removes a node (and its subtree) from the tree and returns it.
    ///
    /// The node stays valid and can be re-inserted. Extracting an already
    /// detached node is a no-op.
    pub fn extract(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmovable);
        }
        self.detach(id);
        Ok(id)
    }

    /// Puts `replacement` where `id` was, and returns the extracted `id`.
    pub fn replace_with(&mut self, id: NodeId, replacement: NodeId) -> Result<NodeId, TreeError> {
        if id == self.root {
            return Err(TreeError::RootImmovable);
        }
        if id == replacement {
            return Ok(id);
        }
        self.insert_before(id, replacement)?;
        self.detach(id);
        Ok(id)
    }

    /// Replaces `id` with `wrapper` and appends `id` inside it.
    ///
    /// Returns the wrapper.
    pub fn wrap(&mut self, id: NodeId, wrapper: NodeId) -> Result<NodeId, TreeError> {
        if !self.is_tag(wrapper) {
            return Err(TreeError::NotATag);
        }
        if self.name(wrapper).is_some_and(|name| self.rules.is_void(name)) {
            return Err(TreeError::NotAContainer);
        }
        self.replace_with(id, wrapper)?;
        self.append(wrapper, id)?;
        Ok(wrapper)
    }

    /// Replaces a tag with its own children, and returns the extracted tag.
    pub fn unwrap(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        if !self.is_tag(id) {
            return Err(TreeError::NotATag);
        }
        let parent = self.parent(id).ok_or(TreeError::Detached)?;
        while let Some(child) = self.first_child(id) {
            self.detach(child);
            self.link_before(parent, id, child);
        }
        self.detach(id);
        Ok(id)
    }

    /// Detaches every child of `id`.
    pub fn clear(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    /// Sets an attribute on a tag, replacing any previous value in place.
    ///
    /// The name is case-folded when the document's rules fold case. A
    /// single value given for a multi-valued attribute is split on ASCII
    /// whitespace, as the builder does; a `Multi` value is stored as given.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), TreeError> {
        let name = self.rules.fold(name).into_owned();
        let rules = self.rules;
        match &mut self.node_mut(id).kind {
            NodeKind::Tag(tag) => {
                let value = match value.into() {
                    AttrValue::Single(value) if rules.is_multi_valued(&tag.name, &name) => {
                        AttrValue::Multi(value.split_ascii_whitespace().map(str::to_string).collect())
                    }
                    value => value,
                };
                tag.attributes.insert(name, value);
                Ok(())
            }
            _ => Err(TreeError::NotATag),
        }
    }

    /// Removes an attribute from a tag, returning its previous value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<AttrValue>, TreeError> {
        let name = self.rules.fold(name).into_owned();
        match &mut self.node_mut(id).kind {
            NodeKind::Tag(tag) => Ok(tag.attributes.remove(&name)),
            _ => Err(TreeError::NotATag),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(&HTML_RULES)
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}
