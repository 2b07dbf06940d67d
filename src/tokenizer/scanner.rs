//! Shared low-level input handling for the tokenizers.
//!
//! [`Scanner`] wraps the decoded text and a byte cursor, and offers the
//! peeking, lookahead, and skipping primitives both backends are built from.
//! The cursor only ever stops on character boundaries, so every slice it
//! hands out is valid `str`.

/// A saved cursor position, for backtracking.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SavedPosition(usize);

/// Cursor over decoded markup.
pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the text between two positions previously reported by `pos`.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    pub fn save_position(&self) -> SavedPosition {
        SavedPosition(self.pos)
    }

    pub fn restore_position(&mut self, saved: SavedPosition) {
        self.pos = saved.0;
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    // -- Advance operations --

    /// Advances past `count` ASCII bytes.
    pub fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.input.len());
    }

    /// Consumes and returns the next character, normalizing `\r\n` and a
    /// lone `\r` to `\n`.
    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.pos += 1;
            }
            return Some('\n');
        }
        Some(ch)
    }

    // -- Lookahead --

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(s)
    }

    /// Case-insensitive (ASCII) variant of [`looking_at`](Self::looking_at).
    pub fn looking_at_ci(&self, expected: &[u8]) -> bool {
        let bytes = self.input.as_bytes();
        if self.pos + expected.len() > bytes.len() {
            return false;
        }
        bytes[self.pos..self.pos + expected.len()].eq_ignore_ascii_case(expected)
    }

    /// Finds the next occurrence of `needle` at or after the cursor.
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.input[self.pos..].find(needle).map(|i| self.pos + i)
    }

    // -- Whitespace --

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0C') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.pos > start
    }

    // -- Take / skip --

    /// Consumes ASCII bytes while `pred` holds and returns them.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii() && pred(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    /// Consumes everything up to `delimiter` and the delimiter itself,
    /// returning the text before it. If the delimiter never appears, the
    /// rest of the input is consumed and returned as the error.
    pub fn take_until(&mut self, delimiter: &str) -> Result<&'a str, &'a str> {
        let start = self.pos;
        if let Some(end) = self.find(delimiter) {
            self.pos = end + delimiter.len();
            Ok(&self.input[start..end])
        } else {
            self.pos = self.input.len();
            Err(&self.input[start..])
        }
    }

    /// Skips forward to and past the next `>` character.
    pub fn skip_to_gt(&mut self) {
        match self.find(">") {
            Some(end) => self.pos = end + 1,
            None => self.pos = self.input.len(),
        }
    }
}
