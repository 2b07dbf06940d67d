//! Troubleshooting helpers.
//!
//! [`diagnose`] runs a document through every registered backend and shows
//! what each one built, which is usually the quickest way to see why a
//! search finds nothing. [`trace_events`] shows the raw event stream a
//! backend produces, before any tree building.

use std::fmt::Write as _;

use crate::builder::registry::{default_registry, BackendRegistry};
use crate::builder::TreeSink;
use crate::error::BuildError;
use crate::parser::{Markup, ParseOptions};
use crate::tree::Document;

/// Feature names worth checking for when troubleshooting.
const COMMON_FEATURES: &[&str] = &["html.parser", "html5lib", "lxml", "xml"];

/// A [`TreeSink`] that records each event as one line of text.
///
/// # Examples
///
/// ```
/// use soupkit::builder::rules::HTML_RULES;
/// use soupkit::diagnose::EventRecorder;
/// use soupkit::tokenizer::{HtmlTokenizer, Tokenizer};
///
/// let mut recorder = EventRecorder::default();
/// HtmlTokenizer.tokenize("<b class=x>hi</b>", &HTML_RULES, &mut recorder);
/// assert_eq!(
///     recorder.into_events(),
///     vec!["start b class=\"x\"", "text \"hi\"", "end b"]
/// );
/// ```
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<String>,
}

impl EventRecorder {
    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn into_events(self) -> Vec<String> {
        self.events
    }
}

impl TreeSink for EventRecorder {
    fn start_tag(&mut self, name: &str, attributes: Vec<(String, String)>, self_closing: bool) {
        let mut event = format!("{} {name}", if self_closing { "empty" } else { "start" });
        for (attr, value) in attributes {
            let _ = write!(event, " {attr}=\"{value}\"");
        }
        self.events.push(event);
    }

    fn end_tag(&mut self, name: &str) {
        self.events.push(format!("end {name}"));
    }

    fn text(&mut self, content: &str) {
        self.events.push(format!("text {content:?}"));
    }

    fn comment(&mut self, content: &str) {
        self.events.push(format!("comment {content:?}"));
    }

    fn cdata(&mut self, content: &str) {
        self.events.push(format!("cdata {content:?}"));
    }

    fn declaration(&mut self, content: &str) {
        self.events.push(format!("declaration {content:?}"));
    }

    fn doctype(&mut self, content: &str) {
        self.events.push(format!("doctype {content:?}"));
    }

    fn processing_instruction(&mut self, content: &str) {
        self.events.push(format!("pi {content:?}"));
    }

    fn bad_markup(&mut self, message: &str) {
        self.events.push(format!("bad markup: {message}"));
    }
}

/// Parses `data` with every backend in the default registry and reports
/// each result, prettified.
pub fn diagnose<'a>(data: impl Into<Markup<'a>>) -> String {
    diagnose_with(default_registry(), data)
}

/// [`diagnose`] over the backends of `registry`.
pub fn diagnose_with<'a>(registry: &BackendRegistry, data: impl Into<Markup<'a>>) -> String {
    let data = data.into();
    let mut report = String::new();

    for feature in COMMON_FEATURES {
        if registry.lookup(&[feature]).is_err() {
            let _ = writeln!(report, "No backend provides {feature:?}.");
        }
    }

    for backend in registry.backends() {
        let _ = writeln!(report, "Trying to parse your markup with {}", backend.name);
        let options = ParseOptions::default().features(backend.features.iter().cloned());
        match Document::parse_with(registry, data, &options) {
            Ok(doc) => {
                let _ = writeln!(report, "Here's what {} did with the markup:", doc.backend());
                report.push_str(&doc.prettify());
                for diagnostic in doc.diagnostics() {
                    let _ = writeln!(report, "  recovered: {diagnostic}");
                }
            }
            Err(err) => {
                let _ = writeln!(report, "{} could not parse the markup: {err}", backend.name);
            }
        }
        report.push_str(&"-".repeat(80));
        report.push('\n');
    }
    report
}

/// The raw events the backend providing `feature` reports for `data`.
pub fn trace_events(feature: &str, data: &str) -> Result<Vec<String>, BuildError> {
    let backend = default_registry().lookup(&[feature])?;
    let mut recorder = EventRecorder::default();
    backend.tokenizer.tokenize(data, backend.rules, &mut recorder);
    Ok(recorder.into_events())
}
