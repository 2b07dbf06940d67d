//! Searching the tree.
//!
//! A [`Query`] combines an optional name [`Filter`], attribute filters, an
//! optional text filter, and an optional node predicate. The `find*` methods
//! on [`Document`] walk one of the navigator's iterators and return matching
//! node ids in that iterator's order:
//!
//! | method | walks |
//! |---|---|
//! | [`find_all`](Document::find_all) | descendants, or children when not recursive |
//! | [`find_parents`](Document::find_parents) | ancestors |
//! | [`find_next_siblings`](Document::find_next_siblings) | following siblings |
//! | [`find_previous_siblings`](Document::find_previous_siblings) | preceding siblings |
//! | [`find_all_next`](Document::find_all_next) | every later node |
//! | [`find_all_previous`](Document::find_all_previous) | every earlier node |
//!
//! Each has a single-result counterpart. A `limit` of `None` or `Some(0)`
//! means no limit.

mod filter;

pub use filter::Filter;

use std::fmt;
use std::sync::Arc;

use crate::error::FilterError;
use crate::navigate::SiblingFilter;
use crate::tree::{Document, NodeId, NodeKind};

type NodePredicate = Arc<dyn Fn(&Document, NodeId) -> bool + Send + Sync>;

/// What to look for.
///
/// An empty query matches every tag. A query with only a text filter
/// matches strings (of any kind) by their content. Otherwise a query
/// matches tags, and a text filter is applied to the tag's
/// [`string`](Document::string).
///
/// # Examples
///
/// ```
/// use soupkit::{parse_html, Filter, Query};
///
/// let doc = parse_html("<a class='nav big' href='/'>Home</a><a href='/x'>X</a>");
/// let query = Query::name("a").class("big");
/// let found = doc.find_all(doc.root(), &query, true, None);
/// assert_eq!(found.len(), 1);
///
/// let text = Query::new().text(Filter::exact("X"));
/// assert!(doc.find(doc.root(), &text).is_some());
/// ```
#[derive(Clone, Default)]
pub struct Query {
    name: Option<Filter>,
    attrs: Vec<(String, Filter)>,
    text: Option<Filter>,
    predicate: Option<NodePredicate>,
}

impl Query {
    /// A query matching every tag.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query for tags whose name matches `name`.
    pub fn name(name: impl Into<Filter>) -> Self {
        Self::new().named(name)
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<Filter>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Requires attribute `name` to match `filter`. Repeatable; all must match.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, filter: impl Into<Filter>) -> Self {
        self.attrs.push((name.into(), filter.into()));
        self
    }

    /// Shorthand for `attr("class", filter)`.
    #[must_use]
    pub fn class(self, filter: impl Into<Filter>) -> Self {
        self.attr("class", filter)
    }

    #[must_use]
    pub fn id(self, filter: impl Into<Filter>) -> Self {
        self.attr("id", filter)
    }

    #[must_use]
    pub fn text(mut self, filter: impl Into<Filter>) -> Self {
        self.text = Some(filter.into());
        self
    }

    /// Adds a test over the whole node, run after every other filter passed.
    #[must_use]
    pub fn filter(mut self, predicate: impl Fn(&Document, NodeId) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Returns `true` if the query only constrains string content.
    pub fn is_text_only(&self) -> bool {
        self.name.is_none() && self.attrs.is_empty() && self.text.is_some()
    }

    /// Tests a single node.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let structural = match &doc.node(id).kind {
            NodeKind::String(s) => {
                self.is_text_only() && self.text.as_ref().is_some_and(|f| f.matches_str(&s.content))
            }
            NodeKind::Tag(tag) if !self.is_text_only() => {
                self.name
                    .as_ref()
                    .map_or(true, |f| f.matches_name(&tag.name, doc.rules()))
                    && self
                        .attrs
                        .iter()
                        .all(|(name, f)| match f {
                            Filter::Present(present) => doc.has_attribute(id, name) == *present,
                            _ => f.matches_value(doc.attribute(id, name)),
                        })
                    && self.text.as_ref().map_or(true, |f| {
                        doc.string(id).is_some_and(|content| f.matches_str(content))
                    })
            }
            _ => false,
        };
        structural && self.predicate.as_ref().map_or(true, |p| p(doc, id))
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("name", &self.name)
            .field("attrs", &self.attrs)
            .field("text", &self.text)
            .field("predicate", &self.predicate.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Compiles a selector language into a [`Query`].
///
/// The crate ships no selector engine; implement this trait to plug one in
/// and run it with [`Document::select`].
pub trait SelectorCompiler {
    fn compile(&self, selector: &str) -> Result<Query, FilterError>;
}

fn collect(
    candidates: impl Iterator<Item = NodeId>,
    doc: &Document,
    query: &Query,
    limit: Option<usize>,
) -> Vec<NodeId> {
    let matching = candidates.filter(|&id| query.matches(doc, id));
    match limit {
        Some(limit) if limit > 0 => matching.take(limit).collect(),
        _ => matching.collect(),
    }
}

impl Document {
    /// Finds matching nodes below `from`, in document order.
    ///
    /// With `recursive` false only direct children are considered.
    pub fn find_all(&self, from: NodeId, query: &Query, recursive: bool, limit: Option<usize>) -> Vec<NodeId> {
        if recursive {
            collect(self.descendants(from), self, query, limit)
        } else {
            collect(self.children(from), self, query, limit)
        }
    }

    /// The first match below `from`, in document order.
    pub fn find(&self, from: NodeId, query: &Query) -> Option<NodeId> {
        self.descendants(from).find(|&id| query.matches(self, id))
    }

    pub fn find_parents(&self, id: NodeId, query: &Query, limit: Option<usize>) -> Vec<NodeId> {
        collect(self.parents(id), self, query, limit)
    }

    /// The nearest ancestor matching `query`.
    pub fn find_parent(&self, id: NodeId, query: &Query) -> Option<NodeId> {
        self.parents(id).find(|&p| query.matches(self, p))
    }

    pub fn find_next_siblings(&self, id: NodeId, query: &Query, limit: Option<usize>) -> Vec<NodeId> {
        collect(self.next_siblings(id, SiblingFilter::Any), self, query, limit)
    }

    pub fn find_next_sibling(&self, id: NodeId, query: &Query) -> Option<NodeId> {
        self.next_siblings(id, SiblingFilter::Any)
            .find(|&s| query.matches(self, s))
    }

    pub fn find_previous_siblings(&self, id: NodeId, query: &Query, limit: Option<usize>) -> Vec<NodeId> {
        collect(self.previous_siblings(id, SiblingFilter::Any), self, query, limit)
    }

    pub fn find_previous_sibling(&self, id: NodeId, query: &Query) -> Option<NodeId> {
        self.previous_siblings(id, SiblingFilter::Any)
            .find(|&s| query.matches(self, s))
    }

    /// Matches among every node after `id` in document order, including
    /// nodes outside `id`'s subtree.
    pub fn find_all_next(&self, id: NodeId, query: &Query, limit: Option<usize>) -> Vec<NodeId> {
        collect(self.next_nodes(id), self, query, limit)
    }

    pub fn find_next(&self, id: NodeId, query: &Query) -> Option<NodeId> {
        self.next_nodes(id).find(|&n| query.matches(self, n))
    }

    /// Matches among every node before `id`, nearest first.
    pub fn find_all_previous(&self, id: NodeId, query: &Query, limit: Option<usize>) -> Vec<NodeId> {
        collect(self.previous_nodes(id), self, query, limit)
    }

    pub fn find_previous(&self, id: NodeId, query: &Query) -> Option<NodeId> {
        self.previous_nodes(id).find(|&n| query.matches(self, n))
    }

    /// Compiles `selector` and returns its matches below `from`.
    pub fn select(
        &self,
        from: NodeId,
        compiler: &dyn SelectorCompiler,
        selector: &str,
    ) -> Result<Vec<NodeId>, FilterError> {
        let query = compiler.compile(selector)?;
        Ok(self.find_all(from, &query, true, None))
    }

    pub fn select_one(
        &self,
        from: NodeId,
        compiler: &dyn SelectorCompiler,
        selector: &str,
    ) -> Result<Option<NodeId>, FilterError> {
        let query = compiler.compile(selector)?;
        Ok(self.find(from, &query))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{parse_html, parse_xml};
    use pretty_assertions::assert_eq;

    const HTML: &str = "<div id='main'><p class='a b'>one</p><p class='b'>two <b>bold</b></p>\
                        <!--note--><span>three</span></div><p>four</p>";

    fn names(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| match doc.name(id) {
                Some(name) => name.to_string(),
                None => doc.as_string(id).map(|s| s.content.clone()).unwrap_or_default(),
            })
            .collect()
    }

    #[test]
    fn test_find_all_by_name_in_document_order() {
        let doc = parse_html(HTML);
        let found = doc.find_all(doc.root(), &Query::name("p"), true, None);
        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(doc.string(found[2]), Some("four"));
    }

    #[test]
    fn test_empty_query_matches_all_tags() {
        let doc = parse_html(HTML);
        let found = doc.find_all(doc.root(), &Query::new(), true, None);
        assert_eq!(names(&doc, &found), vec!["div", "p", "p", "b", "span", "p"]);
    }

    #[test]
    fn test_non_recursive_returns_children_only() {
        let doc = parse_html(HTML);
        let div = doc.find(doc.root(), &Query::name("div")).unwrap();
        let found = doc.find_all(div, &Query::new(), false, None);
        assert_eq!(names(&doc, &found), vec!["p", "p", "span"]);
        assert!(found.iter().all(|&c| doc.parent(c) == Some(div)));
    }

    #[test]
    fn test_limit_one_equals_find() {
        let doc = parse_html(HTML);
        let query = Query::new().class("b");
        let limited = doc.find_all(doc.root(), &query, true, Some(1));
        assert_eq!(limited, vec![doc.find(doc.root(), &query).unwrap()]);
        assert_eq!(doc.find_all(doc.root(), &query, true, Some(0)).len(), 2);
    }

    #[test]
    fn test_multi_valued_class_match() {
        let doc = parse_html("<p class='x y'></p>");
        assert!(doc.find(doc.root(), &Query::new().class("y")).is_some());
        assert!(doc.find(doc.root(), &Query::new().class("x y")).is_none());
    }

    #[test]
    fn test_class_set_after_parsing_matches_like_parsed() {
        let mut doc = parse_html("<p>text</p>");
        let p = doc.tag(doc.root(), "p").unwrap();
        doc.set_attribute(p, "class", "x y").unwrap();

        let reparsed = parse_html(&doc.decode());
        for doc in [&doc, &reparsed] {
            assert!(doc.find(doc.root(), &Query::new().class("x")).is_some());
            assert!(doc.find(doc.root(), &Query::new().class("x y")).is_none());
        }
    }

    #[test]
    fn test_presence_filter_folds_attribute_name() {
        let doc = parse_html("<input DISABLED><input>");
        let found = doc.find_all(doc.root(), &Query::new().attr("Disabled", true), true, None);
        assert_eq!(found.len(), 1);
        assert!(doc.has_attribute(found[0], "disabled"));
        assert_eq!(doc.find_all(doc.root(), &Query::new().attr("disabled", false), true, None).len(), 1);
    }

    #[test]
    fn test_attribute_presence_and_absence() {
        let doc = parse_html(HTML);
        let with_class = doc.find_all(doc.root(), &Query::name("p").class(true), true, None);
        assert_eq!(with_class.len(), 2);
        let without = doc.find_all(doc.root(), &Query::name("p").class(false), true, None);
        assert_eq!(doc.string(without[0]), Some("four"));
    }

    #[test]
    fn test_text_only_query_matches_strings() {
        let doc = parse_html(HTML);
        let query = Query::new().text(Filter::pattern("^t").unwrap());
        let found = doc.find_all(doc.root(), &query, true, None);
        assert_eq!(names(&doc, &found), vec!["two ", "three"]);

        let comment = doc.find(doc.root(), &Query::new().text("note")).unwrap();
        assert!(doc.as_string(comment).is_some());
    }

    #[test]
    fn test_name_and_text_uses_tag_string() {
        let doc = parse_html(HTML);
        let found = doc.find_all(doc.root(), &Query::name("p").text("one"), true, None);
        assert_eq!(found.len(), 1);
        // The second <p> has mixed content, so it has no single string.
        assert!(doc.find(doc.root(), &Query::name("p").text(Filter::pattern("two").unwrap())).is_none());
    }

    #[test]
    fn test_node_predicate_runs_last() {
        let doc = parse_html(HTML);
        let query = Query::name("p").filter(|doc, id| doc.children(id).count() > 1);
        let found = doc.find_all(doc.root(), &query, true, None);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_no_match() {
        let doc = parse_html(HTML);
        assert!(doc.find_all(doc.root(), &Query::name("table"), true, None).is_empty());
        assert_eq!(doc.find(doc.root(), &Query::name("table")), None);
    }

    #[test]
    fn test_name_case_rule_per_document() {
        let html = parse_html("<P>x</P>");
        assert!(html.find(html.root(), &Query::name("P")).is_some());
        let xml = parse_xml("<P>x</P>");
        assert!(xml.find(xml.root(), &Query::name("p")).is_none());
        assert!(xml.find(xml.root(), &Query::name("P")).is_some());
    }

    #[test]
    fn test_find_parents_and_siblings() {
        let doc = parse_html(HTML);
        let bold = doc.find(doc.root(), &Query::name("b")).unwrap();
        assert_eq!(names(&doc, &doc.find_parents(bold, &Query::new(), None)), vec!["p", "div"]);
        assert_eq!(doc.name(doc.find_parent(bold, &Query::new().id("main")).unwrap()), Some("div"));

        let first = doc.find(doc.root(), &Query::name("p")).unwrap();
        assert_eq!(
            names(&doc, &doc.find_next_siblings(first, &Query::new(), None)),
            vec!["p", "span"]
        );
        let span = doc.find_next_sibling(first, &Query::name("span")).unwrap();
        assert_eq!(doc.find_previous_sibling(span, &Query::new().class("a")), Some(first));
        assert_eq!(doc.find_previous_siblings(span, &Query::new(), Some(1)).len(), 1);
    }

    #[test]
    fn test_find_next_and_previous() {
        let doc = parse_html(HTML);
        let bold = doc.find(doc.root(), &Query::name("b")).unwrap();
        assert_eq!(
            names(&doc, &doc.find_all_next(bold, &Query::name("p"), None)),
            vec!["p"]
        );
        let span = doc.find_next(bold, &Query::new()).unwrap();
        assert_eq!(doc.name(span), Some("span"));
        assert_eq!(
            names(&doc, &doc.find_all_previous(span, &Query::name("p"), None)),
            vec!["p", "p"]
        );
        let one = doc.find_previous(bold, &Query::new().text("one")).unwrap();
        assert_eq!(doc.as_string(one).map(|s| s.content.as_str()), Some("one"));
    }

    struct TagNameSelector;

    impl SelectorCompiler for TagNameSelector {
        fn compile(&self, selector: &str) -> Result<Query, FilterError> {
            if selector.chars().all(|c| c.is_ascii_alphanumeric()) && !selector.is_empty() {
                Ok(Query::name(selector))
            } else {
                Err(FilterError::InvalidSelector {
                    selector: selector.to_string(),
                    message: "only tag names are supported".to_string(),
                })
            }
        }
    }

    #[test]
    fn test_select_through_compiler() {
        let doc = parse_html(HTML);
        assert_eq!(doc.select(doc.root(), &TagNameSelector, "p").unwrap().len(), 3);
        assert!(doc.select_one(doc.root(), &TagNameSelector, "span").unwrap().is_some());
        assert!(doc.select(doc.root(), &TagNameSelector, "div > p").is_err());
    }
}
