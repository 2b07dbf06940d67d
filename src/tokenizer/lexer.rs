//! Markup lexing primitives shared by the HTML and XML backends.
//!
//! Both dialects agree on what a tag, an attribute, a comment, or a
//! character reference looks like; they differ in which named references
//! exist and in how the top-level content loop treats special elements.
//! [`Lexer`] holds the shared part and reports events to a [`TreeSink`].

use crate::builder::TreeSink;

use super::scanner::Scanner;

/// Resolves a named character reference (without `&` and `;`).
pub(crate) type EntityLookup = fn(&str) -> Option<char>;

/// The five references predefined by XML.
pub(crate) fn xml_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

pub(crate) struct Lexer<'a, 's> {
    pub(crate) input: Scanner<'a>,
    sink: &'s mut dyn TreeSink,
    entities: EntityLookup,
    /// Text not yet reported to the sink.
    text: String,
}

impl<'a, 's> Lexer<'a, 's> {
    pub fn new(input: &'a str, sink: &'s mut dyn TreeSink, entities: EntityLookup) -> Self {
        Self {
            input: Scanner::new(input),
            sink,
            entities,
            text: String::new(),
        }
    }

    pub fn sink(&mut self) -> &mut dyn TreeSink {
        self.flush_text();
        &mut *self.sink
    }

    pub fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.sink.text(&self.text);
            self.text.clear();
        }
    }

    /// Reports a problem without flushing, so text on both sides of the
    /// bad markup stays one run.
    pub fn bad_markup(&mut self, message: &str) {
        self.sink.bad_markup(message);
    }

    /// Returns `true` if the `<` at the cursor starts markup rather than
    /// being a literal less-than sign.
    pub fn at_markup_start(&self) -> bool {
        self.input.peek() == Some(b'<')
            && self
                .input
                .peek_at(1)
                .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
    }

    /// Consumes character data up to the next markup, resolving references.
    pub fn text_run(&mut self) {
        // A '<' that does not start markup is literal text.
        if self.input.peek() == Some(b'<') {
            self.input.advance(1);
            self.text.push('<');
        }
        while !self.input.at_end() && self.input.peek() != Some(b'<') {
            if self.input.peek() == Some(b'&') {
                let mut buf = std::mem::take(&mut self.text);
                self.parse_reference(&mut buf, false);
                self.text = buf;
            } else if let Some(ch) = self.input.next_char() {
                self.text.push(ch);
            }
        }
    }

    /// Appends literal text without reference resolution.
    pub fn push_raw_text(&mut self, content: &str) {
        self.text.push_str(content);
    }

    // --- Names and attributes ---

    /// Parses a tag or attribute name made of letters, digits, and `-_:.`.
    pub fn parse_name(&mut self) -> &'a str {
        self.input
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
    }

    /// Parses a start tag after its `<`. Returns the raw name and whether the
    /// tag was written self-closing. The event is reported to the sink.
    pub fn start_tag(&mut self) -> (&'a str, bool) {
        let name = self.parse_name();
        let attributes = self.parse_attributes();
        self.input.skip_whitespace();

        let self_closing = self.input.peek() == Some(b'/');
        if self_closing {
            self.input.advance(1);
        }

        if self.input.peek() == Some(b'>') {
            self.input.advance(1);
        } else if !self.input.at_end() {
            self.bad_markup(&format!("expected '>' after tag <{name}>"));
            self.input.skip_to_gt();
        }

        self.sink().start_tag(name, attributes, self_closing);
        (name, self_closing)
    }

    /// Parses an end tag after its `</`.
    pub fn end_tag(&mut self) {
        let name = self.parse_name();
        self.input.skip_whitespace();
        if self.input.peek() == Some(b'>') {
            self.input.advance(1);
        } else if !self.input.at_end() {
            self.bad_markup(&format!("expected '>' after end tag </{name}>"));
            self.input.skip_to_gt();
        }
        if name.is_empty() {
            self.bad_markup("end tag without a name");
            return;
        }
        self.sink().end_tag(name);
    }

    fn parse_attributes(&mut self) -> Vec<(String, String)> {
        let mut attributes = Vec::new();

        loop {
            self.input.skip_whitespace();

            if self.input.at_end()
                || self.input.peek() == Some(b'>')
                || self.input.looking_at(b"/>")
            {
                break;
            }

            let name = self.parse_attr_name();
            if name.is_empty() {
                // Skip the bad character and continue
                if let Some(ch) = self.input.next_char() {
                    if ch != '/' {
                        self.bad_markup(&format!("unexpected {ch:?} in tag"));
                    }
                }
                continue;
            }

            self.input.skip_whitespace();
            let value = if self.input.peek() == Some(b'=') {
                self.input.advance(1);
                self.input.skip_whitespace();
                self.parse_attr_value()
            } else {
                String::new()
            };

            attributes.push((name.to_string(), value));
        }

        attributes
    }

    fn parse_attr_name(&mut self) -> &'a str {
        let start = self.input.pos();
        while let Some(b) = self.input.peek() {
            if matches!(
                b,
                b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'=' | b'>' | b'/' | b'<' | b'"' | b'\''
            ) {
                break;
            }
            self.input.next_char();
        }
        self.input.slice(start, self.input.pos())
    }

    /// Parses a quoted or unquoted attribute value.
    fn parse_attr_value(&mut self) -> String {
        let mut value = String::new();
        match self.input.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.input.advance(1);
                while let Some(b) = self.input.peek() {
                    if b == quote {
                        self.input.advance(1);
                        break;
                    }
                    if b == b'&' {
                        self.parse_reference(&mut value, true);
                    } else if let Some(ch) = self.input.next_char() {
                        value.push(ch);
                    }
                }
            }
            _ => {
                while let Some(b) = self.input.peek() {
                    if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'>') {
                        break;
                    }
                    if b == b'/' && self.input.peek_at(1) == Some(b'>') {
                        break;
                    }
                    if b == b'&' {
                        self.parse_reference(&mut value, true);
                    } else if let Some(ch) = self.input.next_char() {
                        value.push(ch);
                    }
                }
            }
        }
        value
    }

    // --- Character references ---

    /// Parses a character or entity reference at `&`, appending its
    /// replacement to `out`. Anything that doesn't form a reference leaves
    /// a literal `&`.
    pub fn parse_reference(&mut self, out: &mut String, in_attribute: bool) {
        let saved = self.input.save_position();
        self.input.advance(1); // consume '&'

        if self.input.peek() == Some(b'#') {
            self.input.advance(1);
            let hex = matches!(self.input.peek(), Some(b'x' | b'X'));
            if hex {
                self.input.advance(1);
            }
            let digits = if hex {
                self.input.take_while(|b| b.is_ascii_hexdigit())
            } else {
                self.input.take_while(|b| b.is_ascii_digit())
            };
            if !digits.is_empty() {
                if self.input.peek() == Some(b';') {
                    self.input.advance(1);
                }
                let radix = if hex { 16 } else { 10 };
                let ch = u32::from_str_radix(digits, radix)
                    .ok()
                    .filter(|&value| value != 0)
                    .and_then(char::from_u32)
                    .unwrap_or('\u{FFFD}');
                out.push(ch);
                return;
            }
            // Invalid, backtrack
            self.input.restore_position(saved);
            self.input.advance(1);
            out.push('&');
            return;
        }

        let name = self.input.take_while(|b| b.is_ascii_alphanumeric());
        if !name.is_empty() {
            if self.input.peek() == Some(b';') {
                self.input.advance(1);
                if let Some(ch) = (self.entities)(name) {
                    out.push(ch);
                } else {
                    // Unknown entity is kept as written
                    out.push('&');
                    out.push_str(name);
                    out.push(';');
                }
                return;
            }
            // Legacy references without ';', except where an attribute
            // value would read like a query string.
            let next = self.input.peek();
            let ambiguous = in_attribute && next.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'=');
            if !ambiguous {
                if let Some(ch) = (self.entities)(name) {
                    out.push(ch);
                    return;
                }
            }
        }

        // Not a valid reference: backtrack and return a bare &
        self.input.restore_position(saved);
        self.input.advance(1);
        out.push('&');
    }

    // --- Comments, CDATA, processing instructions ---

    /// Parses a comment at `<!--`.
    pub fn comment(&mut self) {
        self.input.advance(4);
        // Abrupt closings: <!--> and <!--->
        if self.input.peek() == Some(b'>') {
            self.input.advance(1);
            self.sink().comment("");
            return;
        }
        if self.input.looking_at(b"->") {
            self.input.advance(2);
            self.sink().comment("");
            return;
        }
        match self.input.take_until("-->") {
            Ok(content) => self.sink().comment(content),
            Err(content) => {
                self.bad_markup("unterminated comment");
                self.sink().comment(content);
            }
        }
    }

    /// Parses a CDATA section at `<![CDATA[`.
    pub fn cdata(&mut self) {
        self.input.advance(9);
        match self.input.take_until("]]>") {
            Ok(content) => self.sink().cdata(content),
            Err(content) => {
                self.bad_markup("unterminated CDATA section");
                self.sink().cdata(content);
            }
        }
    }

    /// Parses a processing instruction at `<?`, up to and excluding
    /// `terminator`.
    pub fn processing_instruction(&mut self, terminator: &str) {
        self.input.advance(2);
        match self.input.take_until(terminator) {
            Ok(content) => self.sink().processing_instruction(content),
            Err(content) => {
                self.bad_markup("unterminated processing instruction");
                self.sink().processing_instruction(content);
            }
        }
    }

    /// Parses `<!...>` markup that is neither a comment nor CDATA.
    /// Doctypes are recognised case-insensitively; brackets of an internal
    /// subset are balanced so a `>` inside them does not end the doctype.
    pub fn declaration(&mut self) {
        self.input.advance(2);
        let start = self.input.pos();
        let mut depth = 0usize;
        while let Some(b) = self.input.peek() {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => break,
                _ => {}
            }
            self.input.next_char();
        }
        let content = self.input.slice(start, self.input.pos());
        if self.input.at_end() {
            self.bad_markup("unterminated declaration");
        } else {
            self.input.advance(1);
        }

        let doctype = content
            .get(..7)
            .filter(|keyword| keyword.eq_ignore_ascii_case("doctype"))
            .and_then(|_| content.get(7..));
        match doctype {
            Some(body) => self.sink().doctype(body.trim()),
            None => self.sink().declaration(content),
        }
    }
}
