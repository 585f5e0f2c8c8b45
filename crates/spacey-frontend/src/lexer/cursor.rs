//! Backtracking cursor over source text.
//!
//! The cursor is the only lexer state. Matchers advance it on success; when a
//! multi-step match fails, the caller rewinds to a [`Checkpoint`].

use std::str::Chars;

use crate::error::{Result, SyntaxError};

use super::chars::{is_line_terminator, is_whitespace};

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pos: usize,
    line_break: bool,
}

impl Checkpoint {
    /// Byte offset of the saved position.
    pub fn offset(self) -> usize {
        self.pos
    }
}

/// Position in the source plus the state of the last whitespace run.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    line_break: bool,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line_break: false,
        }
    }

    /// The whole source text.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Text from the current position to the end.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Text between `start` and the current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.pos]
    }

    /// Whether the last whitespace run contained a line terminator.
    pub fn line_break(&self) -> bool {
        self.line_break
    }

    /// Returns true once all input is consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Saves the current position.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            line_break: self.line_break,
        }
    }

    /// Rewinds to a saved position.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.line_break = checkpoint.line_break;
    }

    fn chars(&self) -> Chars<'a> {
        self.rest().chars()
    }

    /// Next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.chars().next()
    }

    /// Character `n` positions ahead without consuming anything.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars().nth(n)
    }

    /// Consumes and returns the next character.
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consumes `ch` if it is next.
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes the next character if it satisfies `pred`.
    pub fn eat_if(&mut self, pred: impl FnOnce(char) -> bool) -> Option<char> {
        match self.peek() {
            Some(ch) if pred(ch) => {
                self.pos += ch.len_utf8();
                Some(ch)
            }
            _ => None,
        }
    }

    /// Consumes `text` if the remaining input starts with it.
    pub fn eat_str(&mut self, text: &str) -> bool {
        if self.rest().starts_with(text) {
            self.pos += text.len();
            true
        } else {
            false
        }
    }

    /// Consumes one line terminator sequence, treating `<CR><LF>` as one.
    pub fn eat_line_terminator_sequence(&mut self) -> bool {
        match self.peek() {
            Some('\r') => {
                self.pos += 1;
                self.eat('\n');
                true
            }
            Some(ch) if is_line_terminator(ch) => {
                self.pos += ch.len_utf8();
                true
            }
            _ => false,
        }
    }

    /// Consumes a run of whitespace, line terminators and comments.
    ///
    /// Resets the line-break flag first and sets it if the run contains a
    /// line terminator, including one inside a comment.
    pub fn skip_whitespace(&mut self) -> Result<()> {
        self.line_break = false;
        loop {
            let Some(ch) = self.peek() else {
                return Ok(());
            };

            if is_line_terminator(ch) {
                self.line_break = true;
                self.pos += ch.len_utf8();
            } else if is_whitespace(ch) {
                self.pos += ch.len_utf8();
            } else if self.rest().starts_with("//") {
                self.skip_line_comment();
            } else if self.rest().starts_with("/*") {
                self.skip_block_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Consumes `StrWhiteSpaceChar`s: whitespace and line terminators, never
    /// comments.
    pub fn skip_str_whitespace(&mut self) {
        while self.eat_if(|c| is_whitespace(c) || is_line_terminator(c)).is_some() {}
    }

    fn skip_line_comment(&mut self) {
        self.pos += 2;
        while let Some(ch) = self.peek() {
            if is_line_terminator(ch) {
                self.eat_line_terminator_sequence();
                self.line_break = true;
                return;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 2;
        loop {
            if self.eat_str("*/") {
                return Ok(());
            }
            match self.bump() {
                Some(ch) if is_line_terminator(ch) => self.line_break = true,
                Some(_) => {}
                None => return Err(self.error_at(start, "Unterminated comment")),
            }
        }
    }

    /// Builds a syntax error at the current position.
    pub fn error(&self, message: impl Into<String>) -> SyntaxError {
        self.error_at(self.pos, message)
    }

    /// Builds a syntax error at `offset`.
    pub fn error_at(&self, offset: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.source, offset, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_restore() {
        let mut cursor = Cursor::new("abc");
        let cp = cursor.checkpoint();
        assert!(cursor.eat('a'));
        assert!(cursor.eat_str("bc"));
        assert!(cursor.is_eof());
        cursor.restore(cp);
        assert_eq!(cursor.pos(), 0);
        assert_eq!(cursor.peek(), Some('a'));
    }

    #[test]
    fn test_skip_whitespace_sets_line_break() {
        let mut cursor = Cursor::new(" \t\u{00A0}x\n y");
        cursor.skip_whitespace().unwrap();
        assert!(!cursor.line_break());
        assert_eq!(cursor.bump(), Some('x'));
        cursor.skip_whitespace().unwrap();
        assert!(cursor.line_break());
        assert_eq!(cursor.peek(), Some('y'));
    }

    #[test]
    fn test_comments() {
        let mut cursor = Cursor::new("/* a */ // b\nx");
        cursor.skip_whitespace().unwrap();
        assert!(cursor.line_break());
        assert_eq!(cursor.peek(), Some('x'));

        let mut cursor = Cursor::new("/* a\n */x");
        cursor.skip_whitespace().unwrap();
        assert!(cursor.line_break());
        assert_eq!(cursor.peek(), Some('x'));
    }

    #[test]
    fn test_unterminated_comment_is_error() {
        let mut cursor = Cursor::new("  /* never closed");
        let err = cursor.skip_whitespace().unwrap_err();
        assert_eq!(err.offset, 2);
        assert_eq!(err.message, "Unterminated comment");
    }

    #[test]
    fn test_str_whitespace_keeps_comments() {
        let mut cursor = Cursor::new(" \n\t// x");
        cursor.skip_str_whitespace();
        assert_eq!(cursor.peek(), Some('/'));
        assert!(!cursor.line_break());
    }

    #[test]
    fn test_line_terminator_sequence() {
        let mut cursor = Cursor::new("\r\n\u{2028}x");
        assert!(cursor.eat_line_terminator_sequence());
        assert_eq!(cursor.pos(), 2);
        assert!(cursor.eat_line_terminator_sequence());
        assert!(!cursor.eat_line_terminator_sequence());
        assert_eq!(cursor.peek(), Some('x'));
    }
}
