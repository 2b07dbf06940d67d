//! Parse entry points.
//!
//! Wires the pipeline together: bytes are decoded by the
//! [`encoding`](crate::encoding) detector, the decoded text is tokenized by
//! the backend chosen from a [`BackendRegistry`], and the events are built
//! into a [`Document`] by the [`TreeBuilder`].
//!
//! Choosing a backend is the only step that can fail, and it happens before
//! any input is read.

use log::debug;

use crate::builder::registry::{default_registry, BackendRegistry};
use crate::builder::rules::{MarkupRules, HTML_RULES, XML_RULES};
use crate::builder::TreeBuilder;
use crate::encoding::{detect, rewrite_declarations, same_encoding};
use crate::error::BuildError;
use crate::search::Query;
use crate::tokenizer::{HtmlTokenizer, Tokenizer, XmlTokenizer};
use crate::tree::Document;

/// Parser input: raw bytes to be decoded, or text that already is.
#[derive(Debug, Clone, Copy)]
pub enum Markup<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
}

impl<'a> From<&'a str> for Markup<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for Markup<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a [u8]> for Markup<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Markup<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Markup<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::Bytes(bytes)
    }
}

/// Options for [`Document::parse`].
///
/// ```
/// use soupkit::{ParseOptions, Query};
///
/// let opts = ParseOptions::default()
///     .feature("xml")
///     .from_encoding("latin-1")
///     .parse_only(Query::name("item"));
/// assert_eq!(opts.features, vec!["xml".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Features the backend must provide, e.g. `["xml"]`. Empty selects the
    /// registry's first backend.
    pub features: Vec<String>,
    /// Encoding to decode byte input with, bypassing detection.
    pub from_encoding: Option<String>,
    /// Build only the parts of the document matching this query.
    pub parse_only: Option<Query>,
}

impl ParseOptions {
    /// Adds a required backend feature.
    #[must_use]
    pub fn feature(mut self, feature: &str) -> Self {
        self.features.push(feature.to_string());
        self
    }

    /// Replaces the required backend features.
    #[must_use]
    pub fn features<S: Into<String>>(mut self, features: impl IntoIterator<Item = S>) -> Self {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn from_encoding(mut self, label: &str) -> Self {
        self.from_encoding = Some(label.to_string());
        self
    }

    #[must_use]
    pub fn parse_only(mut self, query: Query) -> Self {
        self.parse_only = Some(query);
        self
    }
}

impl Document {
    /// Parses `input` with a backend from the default registry.
    ///
    /// # Examples
    ///
    /// ```
    /// use soupkit::{Document, ParseOptions};
    ///
    /// let doc = Document::parse("<Item/>", &ParseOptions::default().feature("xml")).unwrap();
    /// assert_eq!(doc.backend(), "xml");
    /// assert_eq!(doc.name(doc.first_child(doc.root()).unwrap()), Some("Item"));
    /// ```
    pub fn parse<'a>(input: impl Into<Markup<'a>>, options: &ParseOptions) -> Result<Self, BuildError> {
        Self::parse_with(default_registry(), input, options)
    }

    /// Parses `input` with a backend from `registry`.
    pub fn parse_with<'a>(
        registry: &BackendRegistry,
        input: impl Into<Markup<'a>>,
        options: &ParseOptions,
    ) -> Result<Self, BuildError> {
        let backend = registry.lookup(&options.features)?;
        Ok(build(
            &backend.name,
            backend.tokenizer.as_ref(),
            backend.rules,
            input.into(),
            options,
        ))
    }
}

/// Parses HTML with the bundled HTML backend.
pub fn parse_html<'a>(input: impl Into<Markup<'a>>) -> Document {
    build(
        "html.parser",
        &HtmlTokenizer,
        &HTML_RULES,
        input.into(),
        &ParseOptions::default(),
    )
}

/// Parses XML with the bundled XML backend.
pub fn parse_xml<'a>(input: impl Into<Markup<'a>>) -> Document {
    build("xml", &XmlTokenizer, &XML_RULES, input.into(), &ParseOptions::default())
}

fn build(
    backend: &str,
    tokenizer: &dyn Tokenizer,
    rules: &'static MarkupRules,
    input: Markup<'_>,
    options: &ParseOptions,
) -> Document {
    let construct = |text: &str| {
        let mut builder = TreeBuilder::new(rules).parse_only(options.parse_only.as_ref());
        tokenizer.tokenize(text, rules, &mut builder);
        let mut doc = builder.finish();
        doc.backend = backend.to_string();
        doc
    };

    match input {
        Markup::Text(text) => construct(text),
        Markup::Bytes(bytes) => {
            let decoded = detect(bytes, options.from_encoding.as_deref());
            debug!(
                "decoded {} bytes as {} ({:?})",
                bytes.len(),
                decoded.encoding,
                decoded.source
            );
            let mut doc = construct(&decoded.text);
            if let Some(declared) = &decoded.declared {
                if !same_encoding(declared, &decoded.encoding) {
                    debug!("rewriting declared encoding {declared} to {}", decoded.encoding);
                    rewrite_declarations(&mut doc, &decoded.encoding);
                }
            }
            doc.original_encoding = Some(decoded.encoding);
            doc.declared_encoding = decoded.declared;
            doc.encoding_source = Some(decoded.source);
            doc
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::DetectionSource;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_backend_is_html() {
        let doc = Document::parse("<P>x</P>", &ParseOptions::default()).unwrap();
        assert_eq!(doc.backend(), "html.parser");
        assert_eq!(doc.rules().name, "html");
        assert_eq!(doc.decode(), "<p>x</p>");
    }

    #[test]
    fn test_unavailable_backend() {
        let err = Document::parse("<p/>", &ParseOptions::default().feature("html5")).unwrap_err();
        assert_eq!(
            err,
            BuildError::BackendUnavailable {
                features: vec!["html5".to_string()]
            }
        );
    }

    #[test]
    fn test_text_input_has_no_encoding() {
        let doc = parse_html("<p>x</p>");
        assert_eq!(doc.original_encoding(), None);
        assert_eq!(doc.encoding_source(), None);
    }

    #[test]
    fn test_bytes_record_encoding_metadata() {
        let doc = parse_html(b"<meta charset='utf-8'><p>\xc3\xa9</p>");
        assert_eq!(doc.original_encoding(), Some("UTF-8"));
        assert_eq!(doc.declared_encoding(), Some("utf-8"));
        assert_eq!(doc.encoding_source(), Some(DetectionSource::Declaration));
        assert_eq!(doc.decode(), "<meta charset=\"utf-8\"/><p>\u{e9}</p>");
    }

    #[test]
    fn test_declaration_rewritten_to_encoding_used() {
        let doc = parse_xml(b"<?xml version='1.0' encoding='utf-8'?><r>caf\xe9</r>");
        assert_eq!(doc.original_encoding(), Some("windows-1252"));
        assert_eq!(doc.declared_encoding(), Some("utf-8"));
        assert_eq!(
            doc.decode(),
            "<?xml version='1.0' encoding='windows-1252'?><r>caf\u{e9}</r>"
        );
    }

    #[test]
    fn test_from_encoding_override() {
        let opts = ParseOptions::default().from_encoding("windows-1251");
        let doc = Document::parse(b"<p>\xcf</p>", &opts).unwrap();
        assert_eq!(doc.original_encoding(), Some("windows-1251"));
        assert_eq!(doc.encoding_source(), Some(DetectionSource::Override));
        assert_eq!(doc.decode(), "<p>\u{41f}</p>");
    }

    #[test]
    fn test_parse_only_option() {
        let opts = ParseOptions::default().parse_only(Query::name("a"));
        let doc = Document::parse("<p>x <a href='/'>link</a></p><a>two</a>", &opts).unwrap();
        assert_eq!(doc.decode(), "<a href=\"/\">link</a><a>two</a>");
    }

    #[test]
    fn test_custom_registry() {
        use crate::builder::registry::Backend;
        use std::sync::Arc;

        let registry = BackendRegistry::new().with_backend(Backend::new(
            "strict-xml",
            &["xml"],
            &XML_RULES,
            Arc::new(XmlTokenizer),
        ));
        let doc = Document::parse_with(&registry, "<a/>", &ParseOptions::default()).unwrap();
        assert_eq!(doc.backend(), "strict-xml");
        assert!(Document::parse_with(&registry, "<a/>", &ParseOptions::default().feature("html")).is_err());
    }
}
