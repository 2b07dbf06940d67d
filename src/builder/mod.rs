//! Tree construction from tokenizer events.
//!
//! A tokenizer reports what it sees through the [`TreeSink`] trait; it does
//! not know about documents or nesting rules. [`TreeBuilder`] is the sink
//! that turns that event stream into a well-formed [`Document`], even when
//! the markup is not:
//!
//! - start tags are nested under the innermost open tag, after first
//!   applying the rules table's optional-end-tag rules
//! - void elements and self-closing start tags never stay open
//! - an end tag closes everything down to its nearest open match, and is
//!   ignored when there is no match
//! - tags still open at end of input are closed innermost first
//!
//! Recovered problems are recorded as [`ParseDiagnostic`]s on the document
//! and logged at debug level. Construction itself never fails.

pub mod registry;
pub mod rules;

use log::debug;

use crate::error::{DiagnosticKind, ParseDiagnostic};
use crate::search::Query;
use crate::tree::{AttrValue, Attributes, Document, NavigableString, NodeId, NodeKind, StringKind, Tag};
use rules::MarkupRules;

/// Receiver of markup events, in document order.
///
/// Names and attribute names arrive exactly as written in the source;
/// case folding is the receiver's business. Attribute values and text have
/// entity and character references already resolved.
pub trait TreeSink {
    /// `<name attr=value ...>` or, with `self_closing`, `<name ... />`.
    fn start_tag(&mut self, name: &str, attributes: Vec<(String, String)>, self_closing: bool);

    /// `</name>`
    fn end_tag(&mut self, name: &str);

    /// Character data. May be called several times for one run of text.
    fn text(&mut self, content: &str);

    fn comment(&mut self, _content: &str) {}

    fn cdata(&mut self, _content: &str) {}

    /// `<!...>` markup that is not a comment, CDATA section, or doctype.
    fn declaration(&mut self, _content: &str) {}

    /// The doctype body, e.g. `html` for `<!DOCTYPE html>`.
    fn doctype(&mut self, _content: &str) {}

    /// Everything between `<?` and the closing delimiter.
    fn processing_instruction(&mut self, _content: &str) {}

    /// Markup the tokenizer could not make sense of.
    fn bad_markup(&mut self, _message: &str) {}
}

/// An entry on the open-element stack.
#[derive(Debug)]
struct OpenTag {
    /// `None` when the tag was filtered out by a `parse_only` query; its
    /// children are still considered.
    node: Option<NodeId>,
    name: String,
}

/// A [`TreeSink`] that builds a [`Document`].
///
/// # Examples
///
/// ```
/// use soupkit::builder::rules::HTML_RULES;
/// use soupkit::builder::{TreeBuilder, TreeSink};
///
/// let mut builder = TreeBuilder::new(&HTML_RULES);
/// builder.start_tag("A", Vec::new(), false);
/// builder.start_tag("b", Vec::new(), false);
/// builder.text("text");
/// let doc = builder.finish();
///
/// let a = doc.first_child(doc.root()).unwrap();
/// assert_eq!(doc.name(a), Some("a"));
/// ```
pub struct TreeBuilder<'q> {
    doc: Document,
    rules: &'static MarkupRules,
    open: Vec<OpenTag>,
    pending_text: String,
    parse_only: Option<&'q Query>,
    /// Number of entries in `open` that are real, attached tags.
    kept_depth: usize,
}

impl<'q> TreeBuilder<'q> {
    /// Creates a builder for an empty document governed by `rules`.
    #[must_use]
    pub fn new(rules: &'static MarkupRules) -> Self {
        Self {
            doc: Document::new(rules),
            rules,
            open: Vec::new(),
            pending_text: String::new(),
            parse_only: None,
            kept_depth: 0,
        }
    }

    /// Only keep tags matching `query` (and their contents), plus
    /// top-level strings matching a text-only query.
    #[must_use]
    pub fn parse_only(mut self, query: Option<&'q Query>) -> Self {
        self.parse_only = query;
        self
    }

    /// Flushes pending text, closes every open tag, and returns the document.
    #[must_use]
    pub fn finish(mut self) -> Document {
        self.flush_text();
        while let Some(entry) = self.open.pop() {
            if entry.node.is_some() {
                self.kept_depth -= 1;
            }
            self.record(
                DiagnosticKind::UnclosedTag,
                format!("<{}> closed at end of input", entry.name),
            );
        }
        self.doc
    }

    fn current_parent(&self) -> NodeId {
        self.open
            .iter()
            .rev()
            .find_map(|entry| entry.node)
            .unwrap_or_else(|| self.doc.root())
    }

    fn inside_kept(&self) -> bool {
        self.parse_only.is_none() || self.kept_depth > 0
    }

    fn record(&mut self, kind: DiagnosticKind, message: String) {
        debug!("{kind}: {message}");
        self.doc.diagnostics.push(ParseDiagnostic::new(kind, message));
    }

    /// Pops open entries from `index` upwards.
    fn pop_to(&mut self, index: usize) {
        for entry in self.open.drain(index..) {
            if entry.node.is_some() {
                self.kept_depth -= 1;
            }
        }
    }

    fn apply_implicit_close(&mut self, name: &str) {
        let Some(rule) = self.rules.implicit_close(name) else {
            return;
        };
        let mut target = None;
        for (index, entry) in self.open.iter().enumerate().rev() {
            if rule.closes.contains(&entry.name.as_str()) {
                target = Some(index);
                break;
            }
            if rule.barriers.contains(&entry.name.as_str()) {
                break;
            }
        }
        if let Some(index) = target {
            let closed: Vec<String> = self.open[index..].iter().map(|e| e.name.clone()).collect();
            for open_name in closed {
                self.record(
                    DiagnosticKind::ImplicitClose,
                    format!("<{name}> implicitly closes <{open_name}>"),
                );
            }
            self.pop_to(index);
        }
    }

    fn build_attributes(&self, tag: &str, raw: Vec<(String, String)>) -> Attributes {
        let mut attributes = Attributes::default();
        for (name, value) in raw {
            let name = self.rules.fold(&name).into_owned();
            let value = if self.rules.is_multi_valued(tag, &name) {
                AttrValue::Multi(value.split_ascii_whitespace().map(str::to_string).collect())
            } else {
                AttrValue::Single(value)
            };
            attributes.insert(name, value);
        }
        attributes
    }

    fn in_preserved_whitespace(&self) -> bool {
        self.open
            .iter()
            .any(|entry| self.rules.preserves_whitespace(&entry.name))
    }

    /// Appends a leaf string under the current parent, honouring `parse_only`.
    fn append_string(&mut self, content: String, kind: StringKind) {
        let id = self
            .doc
            .create_node(NodeKind::String(NavigableString::new(content, kind)));
        let keep = match self.parse_only {
            Some(query) if !self.inside_kept() => {
                query.is_text_only() && query.matches(&self.doc, id)
            }
            _ => true,
        };
        if keep {
            let parent = self.current_parent();
            self.doc.append_child(parent, id);
        }
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let mut text = std::mem::take(&mut self.pending_text);
        if self.rules.collapse_whitespace
            && text.chars().all(char::is_whitespace)
            && !self.in_preserved_whitespace()
        {
            text = if text.contains('\n') { "\n" } else { " " }.to_string();
        }
        self.append_string(text, StringKind::Text);
    }
}

impl TreeSink for TreeBuilder<'_> {
    fn start_tag(&mut self, name: &str, attributes: Vec<(String, String)>, self_closing: bool) {
        self.flush_text();
        let name = self.rules.fold(name).into_owned();
        self.apply_implicit_close(&name);

        let attributes = self.build_attributes(&name, attributes);
        let id = self.doc.create_node(NodeKind::Tag(Tag {
            name: name.clone(),
            attributes,
        }));
        let keep = match self.parse_only {
            Some(query) if !self.inside_kept() => query.matches(&self.doc, id),
            _ => true,
        };
        if keep {
            let parent = self.current_parent();
            self.doc.append_child(parent, id);
        }

        if self.rules.is_void(&name) || self_closing {
            return;
        }
        if keep {
            self.kept_depth += 1;
        }
        self.open.push(OpenTag {
            node: keep.then_some(id),
            name,
        });
    }

    fn end_tag(&mut self, name: &str) {
        let name = self.rules.fold(name);
        let Some(index) = self.open.iter().rposition(|entry| entry.name == name) else {
            self.record(
                DiagnosticKind::StrayEndTag,
                format!("</{name}> has no open tag and was ignored"),
            );
            return;
        };
        self.flush_text();
        let misnested: Vec<String> = self.open[index + 1..]
            .iter()
            .map(|e| e.name.clone())
            .collect();
        for open_name in misnested {
            self.record(
                DiagnosticKind::MisnestedEndTag,
                format!("</{name}> closes unclosed <{open_name}>"),
            );
        }
        self.pop_to(index);
    }

    fn text(&mut self, content: &str) {
        self.pending_text.push_str(content);
    }

    fn comment(&mut self, content: &str) {
        self.flush_text();
        self.append_string(content.to_string(), StringKind::Comment);
    }

    fn cdata(&mut self, content: &str) {
        self.flush_text();
        self.append_string(content.to_string(), StringKind::CData);
    }

    fn declaration(&mut self, content: &str) {
        self.flush_text();
        self.append_string(content.to_string(), StringKind::Declaration);
    }

    fn doctype(&mut self, content: &str) {
        self.flush_text();
        self.append_string(content.to_string(), StringKind::Doctype);
    }

    fn processing_instruction(&mut self, content: &str) {
        self.flush_text();
        self.append_string(content.to_string(), StringKind::ProcessingInstruction);
    }

    fn bad_markup(&mut self, message: &str) {
        self.record(DiagnosticKind::BadMarkup, message.to_string());
    }
}
