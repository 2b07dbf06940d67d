//! Recovery from broken markup.
//!
//! None of these inputs may fail to parse; each test pins down the tree the
//! builder settles on and the diagnostics it records.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use soupkit::error::DiagnosticKind;
use soupkit::{parse_html, parse_xml, Document, NodeId};

fn kinds(doc: &Document) -> Vec<DiagnosticKind> {
    doc.diagnostics().iter().map(|d| d.kind).collect()
}

fn only_child(doc: &Document, id: NodeId) -> NodeId {
    let children: Vec<NodeId> = doc.children(id).collect();
    assert_eq!(children.len(), 1, "expected a single child");
    children[0]
}

#[test]
fn test_unclosed_tags_close_at_end_of_input() {
    let doc = parse_html("<a><b>text");
    let a = only_child(&doc, doc.root());
    let b = only_child(&doc, a);
    let text = only_child(&doc, b);
    assert_eq!(doc.name(a), Some("a"));
    assert_eq!(doc.name(b), Some("b"));
    assert_eq!(doc.string(text), Some("text"));
    assert_eq!(
        kinds(&doc),
        vec![DiagnosticKind::UnclosedTag, DiagnosticKind::UnclosedTag]
    );
}

#[test]
fn test_stray_end_tag_is_ignored() {
    let doc = parse_html("<a></b>text</a>");
    let a = only_child(&doc, doc.root());
    let text = only_child(&doc, a);
    assert_eq!(doc.string(text), Some("text"));
    assert_eq!(kinds(&doc), vec![DiagnosticKind::StrayEndTag]);
    assert_eq!(doc.decode(), "<a>text</a>");
}

#[test]
fn test_misnested_formatting_tags() {
    let doc = parse_html("<b><i>x</b>y");
    assert_eq!(doc.decode(), "<b><i>x</i></b>y");
    assert_eq!(kinds(&doc), vec![DiagnosticKind::MisnestedEndTag]);
}

#[test]
fn test_optional_end_tags() {
    let doc = parse_html("<p>one<p>two");
    assert_eq!(doc.decode(), "<p>one</p><p>two</p>");

    let doc = parse_html("<table><tr><td>1<td>2<tr><td>3</table>");
    assert_eq!(
        doc.decode(),
        "<table><tr><td>1</td><td>2</td></tr><tr><td>3</td></tr></table>"
    );

    let doc = parse_html("<dl><dt>term<dd>definition<dt>next</dl>");
    assert_eq!(
        doc.decode(),
        "<dl><dt>term</dt><dd>definition</dd><dt>next</dt></dl>"
    );
}

#[test]
fn test_paragraph_does_not_close_across_div() {
    let doc = parse_html("<p>outer<div><p>inner</div>");
    assert_eq!(doc.decode(), "<p>outer<div><p>inner</p></div></p>");
}

#[test]
fn test_close_tag_for_void_element() {
    let doc = parse_html("<p>a<br></br>b</p>");
    assert_eq!(doc.decode(), "<p>a<br/>b</p>");
    assert_eq!(kinds(&doc), vec![DiagnosticKind::StrayEndTag]);
}

#[test]
fn test_bare_ampersand_and_less_than() {
    let doc = parse_html("<p>AT&T &lt; 3 < 4 &bogus; &copy</p>");
    let p = doc.tag(doc.root(), "p").unwrap();
    assert_eq!(doc.string(p), Some("AT&T < 3 < 4 &bogus; \u{a9}"));
    assert_eq!(doc.decode(), "<p>AT&amp;T &lt; 3 &lt; 4 &amp;bogus; \u{a9}</p>");
}

#[test]
fn test_unterminated_comment() {
    let doc = parse_html("<p>a<!-- never closed");
    let p = doc.tag(doc.root(), "p").unwrap();
    assert_eq!(doc.children(p).count(), 2);
    assert_eq!(doc.get_text(p, "", false), "a");
    assert!(kinds(&doc).contains(&DiagnosticKind::BadMarkup));
}

#[test]
fn test_unterminated_start_tag() {
    let doc = parse_html("<div><span class=\"x\"");
    let span = doc.tag(doc.root(), "span").unwrap();
    assert_eq!(doc.attribute(span, "class").unwrap().joined(), "x");
}

#[test]
fn test_malformed_end_tag_is_skipped() {
    let doc = parse_html("<p>a</ >b</p>");
    let p = doc.tag(doc.root(), "p").unwrap();
    assert_eq!(doc.get_text(p, "", false), "ab");
    assert!(kinds(&doc).contains(&DiagnosticKind::BadMarkup));
}

#[test]
fn test_xml_never_closes_implicitly() {
    let doc = parse_xml("<list><li>one<li>two</list>");
    let list = doc.tag(doc.root(), "list").unwrap();
    let first = only_child(&doc, list);
    assert_eq!(doc.name(first), Some("li"));
    assert_eq!(doc.decode(), "<list><li>one<li>two</li></li></list>");
    assert_eq!(
        kinds(&doc),
        vec![DiagnosticKind::MisnestedEndTag, DiagnosticKind::MisnestedEndTag]
    );
}

#[test]
fn test_xml_unknown_entity_kept_literally() {
    let doc = parse_xml("<r>&nbsp;&amp;</r>");
    let r = doc.tag(doc.root(), "r").unwrap();
    assert_eq!(doc.string(r), Some("&nbsp;&"));
}

#[test]
fn test_empty_and_garbage_input() {
    for input in ["", "<", "</", "<>", "<<<>>>", "&", "<!", "<?", "<![CDATA["] {
        let doc = parse_html(input);
        // Reparsing the output settles on the same markup.
        let again = parse_html(&doc.decode());
        assert_eq!(again.decode(), doc.decode(), "input {input:?}");
    }
}
