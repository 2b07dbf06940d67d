//! Tokenizer backends.
//!
//! A tokenizer turns decoded markup into a stream of [`TreeSink`] events and
//! knows nothing about tree shape. Two backends are bundled:
//!
//! - [`HtmlTokenizer`]: lenient HTML with the full HTML 4 entity table and
//!   raw-text handling for `<script>` and `<style>`
//! - [`XmlTokenizer`]: tolerant XML with the five predefined entities
//!
//! Other tokenizers plug in by implementing [`Tokenizer`] and registering
//! with a [`BackendRegistry`](crate::builder::registry::BackendRegistry).

mod entities;
pub mod html;
pub(crate) mod lexer;
mod scanner;
pub mod xml;

pub use html::HtmlTokenizer;
pub use xml::XmlTokenizer;

use crate::builder::rules::MarkupRules;
use crate::builder::TreeSink;

/// A source of markup events.
///
/// Implementations must consume the whole input and must not fail: markup
/// they cannot make sense of is reported through
/// [`TreeSink::bad_markup`] and skipped.
pub trait Tokenizer: Send + Sync {
    /// Reports the events of `input` to `sink`, in document order.
    ///
    /// `rules` is the table the document will be built with, for backends
    /// whose lexing depends on element names (raw-text elements).
    fn tokenize(&self, input: &str, rules: &MarkupRules, sink: &mut dyn TreeSink);
}
