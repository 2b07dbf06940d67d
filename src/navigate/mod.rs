//! Read-only traversal.
//!
//! Every iterator here follows the tree's links from a starting node and
//! stops at the first missing link, so it always terminates. Iterators
//! borrow the document, which keeps the tree unchanged while they run.

use crate::tree::{Document, NodeId, NodeKind};

/// Which siblings a sibling step may land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiblingFilter {
    /// Tags and strings.
    #[default]
    Any,
    /// Skip strings.
    TagsOnly,
}

impl SiblingFilter {
    fn accepts(self, doc: &Document, id: NodeId) -> bool {
        match self {
            Self::Any => true,
            Self::TagsOnly => doc.is_tag(id),
        }
    }
}

impl Document {
    // --- Ancestors and descendants ---

    /// Ancestors of `id`, nearest first. Ends with the document node if `id`
    /// is attached.
    pub fn parents(&self, id: NodeId) -> Parents<'_> {
        Parents {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Every node below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// The node after `id` in pre-order, without leaving `root`'s subtree.
    fn following_within(&self, id: NodeId, root: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(id) {
            return Some(child);
        }
        let mut current = id;
        loop {
            if current == root {
                return None;
            }
            if let Some(sibling) = self.node(current).next_sibling {
                return Some(sibling);
            }
            current = self.parent(current)?;
        }
    }

    fn last_descendant_or_self(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(last) = self.last_child(current) {
            current = last;
        }
        current
    }

    // --- Siblings ---

    pub fn next_sibling(&self, id: NodeId, filter: SiblingFilter) -> Option<NodeId> {
        self.next_siblings(id, filter).next()
    }

    pub fn previous_sibling(&self, id: NodeId, filter: SiblingFilter) -> Option<NodeId> {
        self.previous_siblings(id, filter).next()
    }

    /// Following siblings of `id`, nearest first.
    pub fn next_siblings(&self, id: NodeId, filter: SiblingFilter) -> Siblings<'_> {
        Siblings {
            doc: self,
            next: self.node(id).next_sibling,
            forward: true,
            filter,
        }
    }

    /// Preceding siblings of `id`, nearest first.
    pub fn previous_siblings(&self, id: NodeId, filter: SiblingFilter) -> Siblings<'_> {
        Siblings {
            doc: self,
            next: self.node(id).prev_sibling,
            forward: false,
            filter,
        }
    }

    // --- Document order ---

    /// The node parsed right after `id`: its first child, else the next
    /// sibling of it or of its nearest ancestor that has one.
    pub fn next_node(&self, id: NodeId) -> Option<NodeId> {
        self.following_within(id, self.root())
    }

    /// The node parsed right before `id`. The document node itself is never
    /// returned.
    pub fn previous_node(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).prev_sibling {
            Some(prev) => Some(self.last_descendant_or_self(prev)),
            None => self.parent(id).filter(|&p| p != self.root()),
        }
    }

    /// The next tag in document order.
    pub fn next_element(&self, id: NodeId) -> Option<NodeId> {
        self.next_elements(id).next()
    }

    /// The previous tag in document order.
    pub fn previous_element(&self, id: NodeId) -> Option<NodeId> {
        self.previous_elements(id).next()
    }

    /// Every node after `id` in document order.
    pub fn next_nodes(&self, id: NodeId) -> DocumentOrder<'_> {
        DocumentOrder {
            doc: self,
            next: self.next_node(id),
            forward: true,
        }
    }

    /// Every node before `id`, nearest first.
    pub fn previous_nodes(&self, id: NodeId) -> DocumentOrder<'_> {
        DocumentOrder {
            doc: self,
            next: self.previous_node(id),
            forward: false,
        }
    }

    /// Tags after `id` in document order.
    pub fn next_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.next_nodes(id).filter(|&n| self.is_tag(n))
    }

    /// Tags before `id`, nearest first.
    pub fn previous_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.previous_nodes(id).filter(|&n| self.is_tag(n))
    }

    // --- Shorthands ---

    /// The first tag named `name` below `id`, like `soup.body.p`.
    ///
    /// # Examples
    ///
    /// ```
    /// use soupkit::parse_html;
    ///
    /// let doc = parse_html("<div><p>one</p><p>two</p></div>");
    /// let p = doc.tag(doc.root(), "P").unwrap();
    /// assert_eq!(doc.string(p), Some("one"));
    /// ```
    pub fn tag(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let name = self.rules().fold(name);
        self.descendants(id).find(|&n| self.name(n) == Some(&*name))
    }

    /// The single string inside `id`.
    ///
    /// For a string node, its content. For a tag with exactly one child,
    /// that child's string, recursively. `None` for anything else.
    pub fn string(&self, id: NodeId) -> Option<&str> {
        let mut current = id;
        loop {
            match &self.node(current).kind {
                NodeKind::String(s) => return Some(&s.content),
                NodeKind::Tag(_) | NodeKind::Document => {
                    let only = self.first_child(current)?;
                    if self.node(only).next_sibling.is_some() {
                        return None;
                    }
                    current = only;
                }
            }
        }
    }

    /// Text and CDATA content at or below `id`, in document order. Comments,
    /// doctypes and other markup strings are skipped.
    pub fn strings(&self, id: NodeId) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|n| self.as_string(n))
            .filter(|s| s.is_textual())
            .map(|s| s.content.as_str())
    }

    /// [`strings`](Self::strings) with surrounding whitespace removed and
    /// blank strings dropped.
    pub fn stripped_strings(&self, id: NodeId) -> impl Iterator<Item = &str> + '_ {
        self.strings(id).map(str::trim).filter(|s| !s.is_empty())
    }

    /// All text below `id`, joined with `separator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use soupkit::parse_html;
    ///
    /// let doc = parse_html("<p>Hello <b>world</b> </p>");
    /// assert_eq!(doc.get_text(doc.root(), "|", false), "Hello |world| ");
    /// assert_eq!(doc.get_text(doc.root(), " ", true), "Hello world");
    /// ```
    pub fn get_text(&self, id: NodeId, separator: &str, strip: bool) -> String {
        let parts: Vec<&str> = if strip {
            self.stripped_strings(id).collect()
        } else {
            self.strings(id).collect()
        };
        parts.join(separator)
    }

    /// All text below `id`, concatenated.
    pub fn text_content(&self, id: NodeId) -> String {
        self.get_text(id, "", false)
    }
}

/// Iterator returned by [`Document::parents`].
pub struct Parents<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Parents<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.following_within(current, self.root);
        Some(current)
    }
}

/// Iterator returned by [`Document::next_siblings`] and
/// [`Document::previous_siblings`].
pub struct Siblings<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
    forward: bool,
    filter: SiblingFilter,
}

impl Iterator for Siblings<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.next?;
            let node = self.doc.node(current);
            self.next = if self.forward {
                node.next_sibling
            } else {
                node.prev_sibling
            };
            if self.filter.accepts(self.doc, current) {
                return Some(current);
            }
        }
    }
}

/// Iterator returned by [`Document::next_nodes`] and
/// [`Document::previous_nodes`].
pub struct DocumentOrder<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
    forward: bool,
}

impl Iterator for DocumentOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if self.forward {
            self.doc.next_node(current)
        } else {
            self.doc.previous_node(current)
        };
        Some(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parse_html;
    use pretty_assertions::assert_eq;

    fn label(doc: &Document, id: NodeId) -> String {
        match doc.name(id) {
            Some(name) => name.to_string(),
            None => doc.string(id).unwrap_or_default().to_string(),
        }
    }

    fn labels(doc: &Document, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| label(doc, id)).collect()
    }

    #[test]
    fn test_descendants_pre_order() {
        let doc = parse_html("<a><b>1</b><c><d>2</d></c></a><e/>");
        assert_eq!(
            labels(&doc, doc.descendants(doc.root())),
            vec!["a", "b", "1", "c", "d", "2", "e"]
        );
        let a = doc.first_child(doc.root()).unwrap();
        let c = doc.tag(a, "c").unwrap();
        assert_eq!(labels(&doc, doc.descendants(c)), vec!["d", "2"]);
    }

    #[test]
    fn test_parents_exclude_self() {
        let doc = parse_html("<a><b><c>x</c></b></a>");
        let c = doc.tag(doc.root(), "c").unwrap();
        let chain: Vec<NodeId> = doc.parents(c).collect();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[2], doc.root());
        assert_eq!(doc.name(chain[0]), Some("b"));
    }

    #[test]
    fn test_siblings_with_filter() {
        let doc = parse_html("<p><i>1</i> text <b>2</b></p>");
        let i = doc.tag(doc.root(), "i").unwrap();
        let next = doc.next_sibling(i, SiblingFilter::Any).unwrap();
        assert_eq!(doc.string(next), Some(" text "));
        let b = doc.next_sibling(i, SiblingFilter::TagsOnly).unwrap();
        assert_eq!(doc.name(b), Some("b"));
        assert_eq!(doc.previous_sibling(b, SiblingFilter::TagsOnly), Some(i));
        assert_eq!(labels(&doc, doc.previous_siblings(b, SiblingFilter::Any)), vec![" text ", "i"]);
        assert_eq!(doc.next_sibling(b, SiblingFilter::Any), None);
    }

    #[test]
    fn test_document_order_steps() {
        let doc = parse_html("<a><b>1</b></a><c>2</c>");
        let one = doc.descendants(doc.root()).nth(2).unwrap();
        assert_eq!(doc.string(one), Some("1"));
        let c = doc.next_node(one).unwrap();
        assert_eq!(doc.name(c), Some("c"));
        assert_eq!(doc.previous_node(c), Some(one));

        let a = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.previous_node(a), None);
        assert_eq!(labels(&doc, doc.next_elements(a)), vec!["b", "c"]);
        assert_eq!(labels(&doc, doc.previous_elements(c)), vec!["b", "a"]);
        assert_eq!(doc.next_element(one), Some(c));
        assert_eq!(doc.previous_element(one).and_then(|b| doc.name(b)), Some("b"));
    }

    #[test]
    fn test_string_rules() {
        let doc = parse_html("<p><b>only</b></p><div>a<i>b</i></div><span></span>");
        let p = doc.tag(doc.root(), "p").unwrap();
        assert_eq!(doc.string(p), Some("only"));
        assert_eq!(doc.string(doc.tag(doc.root(), "div").unwrap()), None);
        assert_eq!(doc.string(doc.tag(doc.root(), "span").unwrap()), None);
    }

    #[test]
    fn test_strings_skip_comments() {
        let doc = parse_html("<p> a <!--c--><b>b </b><![CDATA[d]]></p>");
        assert_eq!(doc.strings(doc.root()).collect::<Vec<_>>(), vec![" a ", "b ", "d"]);
        assert_eq!(doc.stripped_strings(doc.root()).collect::<Vec<_>>(), vec!["a", "b", "d"]);
        assert_eq!(doc.text_content(doc.root()), " a b d");
    }

    #[test]
    fn test_detached_node_navigation() {
        let mut doc = parse_html("<a><b>x</b></a>");
        let b = doc.tag(doc.root(), "b").unwrap();
        doc.extract(b).unwrap();
        assert_eq!(doc.parents(b).count(), 0);
        assert_eq!(labels(&doc, doc.next_nodes(b)), vec!["x"]);
        assert_eq!(doc.tag(doc.root(), "b"), None);
    }
}
