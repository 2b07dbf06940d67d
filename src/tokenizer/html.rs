//! Error-tolerant HTML tokenizer.
//!
//! Handles the patterns real-world HTML is full of:
//!
//! - Unquoted attribute values (`<div class=main>`)
//! - Boolean attributes without values (`<input disabled>`)
//! - Bare `&` characters and legacy references without `;`
//! - A literal `<` that does not start a tag
//! - Raw-text elements (`<script>`, `<style>`) whose content is not markup
//!
//! Names are reported as written; the tree builder folds their case.

use crate::builder::rules::MarkupRules;
use crate::builder::TreeSink;

use super::entities::lookup_entity;
use super::lexer::Lexer;
use super::Tokenizer;

/// The bundled HTML backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlTokenizer;

impl Tokenizer for HtmlTokenizer {
    fn tokenize(&self, input: &str, rules: &MarkupRules, sink: &mut dyn TreeSink) {
        let mut lexer = Lexer::new(input, sink, lookup_entity);
        while !lexer.input.at_end() {
            if lexer.input.looking_at(b"<!--") {
                lexer.comment();
            } else if lexer.input.looking_at(b"<![CDATA[") {
                lexer.cdata();
            } else if lexer.input.looking_at(b"</") {
                end_tag(&mut lexer);
            } else if lexer.input.looking_at(b"<!") {
                lexer.declaration();
            } else if lexer.input.looking_at(b"<?") {
                lexer.processing_instruction(rules.pi_terminator);
            } else if lexer.at_markup_start() {
                lexer.input.advance(1); // consume '<'
                let (name, self_closing) = lexer.start_tag();
                let name = rules.fold(name);
                if !self_closing && rules.is_raw_text(&name) {
                    raw_text(&mut lexer, &name);
                }
            } else {
                lexer.text_run();
            }
        }
        lexer.flush_text();
    }
}

fn end_tag(lexer: &mut Lexer<'_, '_>) {
    if lexer.input.peek_at(2).is_some_and(|b| b.is_ascii_alphabetic()) {
        lexer.input.advance(2); // consume '</'
        lexer.end_tag();
    } else {
        // </> or </ 3>: not an end tag
        lexer.bad_markup("malformed end tag");
        lexer.input.skip_to_gt();
    }
}

/// Reads script/style content verbatim up to the matching end tag.
fn raw_text(lexer: &mut Lexer<'_, '_>, tag: &str) {
    let end_tag = format!("</{tag}");
    let start = lexer.input.pos();
    while !lexer.input.at_end() && !at_raw_text_end(lexer, end_tag.as_bytes()) {
        lexer.input.next_char();
    }
    let content = lexer.input.slice(start, lexer.input.pos());
    if !content.is_empty() {
        lexer.push_raw_text(content);
    }
    if lexer.input.at_end() {
        return;
    }
    lexer.input.advance(2);
    lexer.end_tag();
}

/// `true` at `</tag` followed by whitespace, `/`, `>` or the end of input.
fn at_raw_text_end(lexer: &Lexer<'_, '_>, end_tag: &[u8]) -> bool {
    lexer.input.looking_at_ci(end_tag)
        && lexer
            .input
            .peek_at(end_tag.len())
            .map_or(true, |b| b.is_ascii_whitespace() || b == b'/' || b == b'>')
}
