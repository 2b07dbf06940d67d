//! Tolerant XML tokenizer.
//!
//! Reads XML the way a recovering parser would: names keep their case and
//! prefixes, only the five predefined entities are resolved, and markup
//! errors are reported to the sink instead of stopping the scan. The XML
//! declaration is passed through as a processing instruction.

use crate::builder::rules::MarkupRules;
use crate::builder::TreeSink;

use super::lexer::{xml_entity, Lexer};
use super::Tokenizer;

/// The bundled XML backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlTokenizer;

impl Tokenizer for XmlTokenizer {
    fn tokenize(&self, input: &str, rules: &MarkupRules, sink: &mut dyn TreeSink) {
        let mut lexer = Lexer::new(input, sink, xml_entity);
        while !lexer.input.at_end() {
            if lexer.input.looking_at(b"<!--") {
                lexer.comment();
            } else if lexer.input.looking_at(b"<![CDATA[") {
                lexer.cdata();
            } else if lexer.input.looking_at(b"<!") {
                lexer.declaration();
            } else if lexer.input.looking_at(b"<?") {
                lexer.processing_instruction(rules.pi_terminator);
            } else if lexer.input.looking_at(b"</") {
                lexer.input.advance(2);
                lexer.end_tag();
            } else if lexer.at_markup_start() {
                lexer.input.advance(1);
                lexer.start_tag();
            } else {
                lexer.text_run();
            }
        }
        lexer.flush_text();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::rules::XML_RULES;
    use crate::diagnose::EventRecorder;
    use pretty_assertions::assert_eq;

    fn events(input: &str) -> Vec<String> {
        let mut recorder = EventRecorder::default();
        XmlTokenizer.tokenize(input, &XML_RULES, &mut recorder);
        recorder.into_events()
    }

    #[test]
    fn test_declaration_and_elements() {
        assert_eq!(
            events("<?xml version=\"1.0\"?><Root a='1'><svg:rect/></Root>"),
            vec![
                "pi \"xml version=\\\"1.0\\\"\"",
                "start Root a=\"1\"",
                "empty svg:rect",
                "end Root"
            ]
        );
    }

    #[test]
    fn test_only_predefined_entities() {
        assert_eq!(
            events("<a>&lt;&eacute;&#233;</a>"),
            vec!["start a", "text \"<&eacute;\u{e9}\"", "end a"]
        );
    }

    #[test]
    fn test_doctype_with_internal_subset() {
        assert_eq!(
            events("<!DOCTYPE note [<!ENTITY x \"y\">]><note/>"),
            vec!["doctype \"note [<!ENTITY x \\\"y\\\">]\"", "empty note"]
        );
    }

    #[test]
    fn test_cdata() {
        assert_eq!(
            events("<a><![CDATA[<not markup>]]></a>"),
            vec!["start a", "cdata \"<not markup>\"", "end a"]
        );
    }
}
