//! Writing trees back out as markup.
//!
//! Compact output adds no whitespace of its own, so a well-formed document
//! serializes back to markup that parses into the same tree. Pretty output
//! puts each tag and string on its own line, indented by depth.
//!
//! Escaping follows the markup rules of the document: text escapes `&`,
//! `<` and `>`; attribute values also escape the quote character in use.
//! Content of raw-text elements (`<script>`, `<style>`), comments, CDATA
//! sections, doctypes, declarations and processing instructions is written
//! verbatim inside its delimiters.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};

use crate::encoding::{substitute_declaration_encoding, substitute_meta_attribute};
use crate::error::EncodeError;
use crate::tree::{Document, NodeId, NodeKind, StringKind, Tag};

/// Options controlling serialization.
///
/// # Examples
///
/// ```
/// use soupkit::{parse_html, FormatOptions};
///
/// let doc = parse_html("<ul><li>one</li></ul>");
/// let text = doc.to_text(doc.root(), &FormatOptions::default().pretty(true).indent_unit("  "));
/// assert_eq!(text, "<ul>\n  <li>\n    one\n  </li>\n</ul>\n");
/// ```
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// One construct per line, indented. Defaults to `false`.
    pub pretty: bool,
    /// Indentation per nesting level in pretty mode. Defaults to one space.
    pub indent_unit: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent_unit: " ".to_string(),
        }
    }
}

impl FormatOptions {
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn indent_unit(mut self, unit: &str) -> Self {
        self.indent_unit = unit.to_string();
        self
    }
}

impl Document {
    /// Serializes `id` and everything below it.
    pub fn to_text(&self, id: NodeId, options: &FormatOptions) -> String {
        Serializer::new(self, options, None).render(id)
    }

    /// The whole document as compact markup.
    pub fn decode(&self) -> String {
        self.to_text(self.root(), &FormatOptions::default())
    }

    /// The whole document as pretty markup with one-space indentation.
    pub fn prettify(&self) -> String {
        self.to_text(self.root(), &FormatOptions::default().pretty(true))
    }

    /// The whole document as compact markup in the encoding named by
    /// `label`. Encoding declarations in the output name that encoding.
    /// Characters the encoding cannot represent become numeric character
    /// references.
    ///
    /// # Examples
    ///
    /// ```
    /// use soupkit::parse_html;
    ///
    /// let doc = parse_html("<meta charset='utf-8'><p>caf\u{e9} \u{263a}</p>");
    /// let bytes = doc.encode("latin-1").unwrap();
    /// assert_eq!(bytes, b"<meta charset=\"latin-1\"/><p>caf\xe9 &#9786;</p>");
    /// ```
    pub fn encode(&self, label: &str) -> Result<Vec<u8>, EncodeError> {
        let label = label.trim();
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| EncodeError::UnknownEncoding(label.to_string()))?;
        let text = Serializer::new(self, &FormatOptions::default(), Some(label)).render(self.root());
        Ok(encode_text(&text, encoding))
    }
}

fn encode_text(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    // encoding_rs writes UTF-8 when asked for UTF-16, so those are done here.
    if encoding == UTF_16LE {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    } else if encoding == UTF_16BE {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    } else {
        let (bytes, _, _) = encoding.encode(text);
        bytes.into_owned()
    }
}

struct Serializer<'a> {
    doc: &'a Document,
    options: &'a FormatOptions,
    /// Encoding name to write into declarations, when re-encoding.
    substitute: Option<&'a str>,
    out: String,
}

impl<'a> Serializer<'a> {
    fn new(doc: &'a Document, options: &'a FormatOptions, substitute: Option<&'a str>) -> Self {
        Self {
            doc,
            options,
            substitute,
            out: String::new(),
        }
    }

    fn render(mut self, id: NodeId) -> String {
        if self.options.pretty {
            self.write_pretty(id, 0);
        } else {
            self.write_compact(id);
        }
        self.out
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.options.indent_unit);
        }
    }

    fn is_raw_text_parent(&self, id: NodeId) -> bool {
        self.doc
            .parent(id)
            .and_then(|p| self.doc.name(p))
            .is_some_and(|name| self.doc.rules().is_raw_text(name))
    }

    /// `true` if the tag has no closing tag in output.
    fn closes_itself(&self, id: NodeId, tag: &Tag) -> bool {
        let rules = self.doc.rules();
        rules.is_void(&tag.name) || (rules.self_closing_empty && self.doc.first_child(id).is_none())
    }

    fn write_compact(&mut self, id: NodeId) {
        let doc = self.doc;
        match &doc.node(id).kind {
            NodeKind::Document => {
                for child in doc.children(id) {
                    self.write_compact(child);
                }
            }
            NodeKind::Tag(tag) => {
                self.write_start_tag(id, tag);
                if self.closes_itself(id, tag) {
                    return;
                }
                for child in doc.children(id) {
                    self.write_compact(child);
                }
                self.write_end_tag(tag);
            }
            NodeKind::String(s) => {
                if s.kind == StringKind::Text {
                    if self.is_raw_text_parent(id) {
                        self.out.push_str(&s.content);
                    } else {
                        write_escaped_text(&mut self.out, &s.content);
                    }
                } else {
                    self.write_markup_string(s.kind, &s.content);
                }
            }
        }
    }

    fn write_pretty(&mut self, id: NodeId, depth: usize) {
        let doc = self.doc;
        match &doc.node(id).kind {
            NodeKind::Document => {
                for child in doc.children(id) {
                    self.write_pretty(child, depth);
                }
            }
            NodeKind::Tag(tag) => {
                let rules = doc.rules();
                self.indent(depth);
                if rules.preserves_whitespace(&tag.name) || rules.is_raw_text(&tag.name) {
                    self.write_compact(id);
                    self.out.push('\n');
                    return;
                }
                self.write_start_tag(id, tag);
                self.out.push('\n');
                if self.closes_itself(id, tag) {
                    return;
                }
                for child in doc.children(id) {
                    self.write_pretty(child, depth + 1);
                }
                self.indent(depth);
                self.write_end_tag(tag);
                self.out.push('\n');
            }
            NodeKind::String(s) => {
                if s.kind == StringKind::Text {
                    let text = s.content.trim();
                    if text.is_empty() {
                        return;
                    }
                    self.indent(depth);
                    write_escaped_text(&mut self.out, text);
                } else {
                    self.indent(depth);
                    self.write_markup_string(s.kind, &s.content);
                }
                self.out.push('\n');
            }
        }
    }

    fn write_start_tag(&mut self, id: NodeId, tag: &Tag) {
        self.out.push('<');
        self.out.push_str(&tag.name);
        let is_meta = tag.name.eq_ignore_ascii_case("meta");
        for attr in &tag.attributes {
            let joined = attr.value.joined();
            let substituted = self
                .substitute
                .filter(|_| is_meta)
                .and_then(|encoding| {
                    substitute_meta_attribute(&attr.name.to_ascii_lowercase(), &joined, encoding)
                });
            let value = substituted.as_deref().unwrap_or(&*joined);

            self.out.push(' ');
            self.out.push_str(&attr.name);
            if value.contains('"') && !value.contains('\'') {
                self.out.push_str("='");
                write_escaped_attr(&mut self.out, value, '\'');
                self.out.push('\'');
            } else {
                self.out.push_str("=\"");
                write_escaped_attr(&mut self.out, value, '"');
                self.out.push('"');
            }
        }
        if self.closes_itself(id, tag) {
            self.out.push_str("/>");
        } else {
            self.out.push('>');
        }
    }

    fn write_end_tag(&mut self, tag: &Tag) {
        self.out.push_str("</");
        self.out.push_str(&tag.name);
        self.out.push('>');
    }

    fn write_markup_string(&mut self, kind: StringKind, content: &str) {
        let (open, close) = match kind {
            StringKind::Text => ("", ""),
            StringKind::Comment => ("<!--", "-->"),
            StringKind::CData => ("<![CDATA[", "]]>"),
            StringKind::Declaration => ("<!", ">"),
            StringKind::Doctype => ("<!DOCTYPE ", ">"),
            StringKind::ProcessingInstruction => ("<?", self.doc.rules().pi_terminator),
        };
        let substituted = match kind {
            StringKind::ProcessingInstruction => self
                .substitute
                .and_then(|encoding| substitute_declaration_encoding(content, encoding)),
            _ => None,
        };
        self.out.push_str(open);
        self.out.push_str(substituted.as_deref().unwrap_or(content));
        self.out.push_str(close);
    }
}

fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value written between `quote` characters.
fn write_escaped_attr(out: &mut String, text: &str, quote: char) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote == '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
