//! Regular-expression literal scanning.
//!
//! The body is validated only far enough to find its end: escapes and
//! character classes are passed through untouched for the regex engine.
//!
//! ```text
//! /ab+c/gi        body "ab+c", flags "gi"
//! /[/]/           body "[/]", `/` inside a class does not terminate
//! /a\/b/          body "a\/b", escapes are opaque
//! /*x/            error, a body may not start with `*`
//! ```

use crate::error::Result;

use super::Cursor;
use super::chars::is_line_terminator;

/// What ends a regular-expression body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEnd {
    /// A `/` delimiter, as inside a script.
    Slash,
    /// The end of input, for a body given on its own.
    EndOfInput,
}

impl<'a> Cursor<'a> {
    /// Scans a `RegularExpressionBody` up to its terminator.
    ///
    /// With [`BodyEnd::Slash`] the closing `/` is consumed but not included.
    /// With [`BodyEnd::EndOfInput`] a bare `/` is ordinary body text.
    pub fn scan_regex_body(&mut self, end: BodyEnd) -> Result<String> {
        let start = self.pos();
        let mut body = String::new();

        loop {
            match self.peek() {
                None if end == BodyEnd::EndOfInput => break,
                None => return Err(self.error_at(start, "Unterminated regular expression")),
                Some(ch) if is_line_terminator(ch) => {
                    return Err(self.error("Unterminated regular expression"));
                }
                Some('/') if end == BodyEnd::Slash => {
                    self.bump();
                    break;
                }
                Some('\\') => self.scan_regex_escape(&mut body)?,
                Some('[') => self.scan_regex_class(&mut body)?,
                Some(ch) => {
                    self.bump();
                    body.push(ch);
                }
            }
        }

        if body.is_empty() {
            return Err(self.error_at(start, "Empty regular expression"));
        }
        if body.starts_with('*') {
            return Err(self.error_at(start, "Regular expression may not start with '*'"));
        }
        Ok(body)
    }

    /// Scans `RegularExpressionFlags`.
    pub fn scan_regex_flags(&mut self) -> Result<String> {
        let mut flags = String::new();
        while let Some(ch) = self.scan_identifier_part()? {
            flags.push(ch);
        }
        Ok(flags)
    }

    fn scan_regex_escape(&mut self, body: &mut String) -> Result<()> {
        self.bump();
        body.push('\\');
        match self.peek() {
            Some(ch) if !is_line_terminator(ch) => {
                self.bump();
                body.push(ch);
                Ok(())
            }
            _ => Err(self.error("Unterminated regular expression")),
        }
    }

    fn scan_regex_class(&mut self, body: &mut String) -> Result<()> {
        self.bump();
        body.push('[');
        loop {
            match self.peek() {
                Some(']') => {
                    self.bump();
                    body.push(']');
                    return Ok(());
                }
                Some('\\') => self.scan_regex_escape(body)?,
                Some(ch) if !is_line_terminator(ch) => {
                    self.bump();
                    body.push(ch);
                }
                _ => return Err(self.error("Unterminated character class")),
            }
        }
    }
}
