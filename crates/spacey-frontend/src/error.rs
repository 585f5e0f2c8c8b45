// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the frontend.

use thiserror::Error;

/// Number of characters shown on each side of the failure point.
const CONTEXT_SIZE: usize = 30;

/// A fatal parse failure.
///
/// Parsing is all-or-nothing: once a production has committed and a required
/// constituent is missing, this error propagates out of the whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SyntaxError: {message} at char {offset}")]
pub struct SyntaxError {
    /// Byte offset of the failure in the source text.
    pub offset: usize,
    /// Short human-readable description.
    pub message: String,
    /// Source excerpt around the failure, marked as `left|^|right`.
    pub context: String,
}

impl SyntaxError {
    /// Creates an error at `offset` in `source`.
    pub fn new(source: &str, offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
            context: excerpt(source, offset),
        }
    }

    /// Recomputes the 1-based line and column of the failure.
    ///
    /// Every line terminator sequence (`\n`, `\r\n`, `\r`, U+2028, U+2029)
    /// starts a new line. Columns count characters, not bytes.
    pub fn line_column(&self, source: &str) -> (usize, usize) {
        let end = floor_char_boundary(source, self.offset);
        let mut line = 1;
        let mut column = 1;
        let mut chars = source[..end].chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    line += 1;
                    column = 1;
                }
                '\n' | '\u{2028}' | '\u{2029}' => {
                    line += 1;
                    column = 1;
                }
                _ => column += 1,
            }
        }

        (line, column)
    }
}

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, SyntaxError>;

fn excerpt(source: &str, offset: usize) -> String {
    let offset = floor_char_boundary(source, offset);
    let (before, after) = source.split_at(offset);

    let left: String = {
        let mut tail: Vec<char> = before.chars().rev().take(CONTEXT_SIZE).collect();
        tail.reverse();
        tail.into_iter().collect()
    };
    let right: String = after.chars().take(CONTEXT_SIZE).collect();

    format!("{left}|^|{right}")
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offset() {
        let err = SyntaxError::new("var ;", 4, "Parse failure");
        assert_eq!(err.to_string(), "SyntaxError: Parse failure at char 4");
    }

    #[test]
    fn test_context_marks_failure_point() {
        let err = SyntaxError::new("a + * b", 4, "Parse failure");
        assert_eq!(err.context, "a + |^|* b");
    }

    #[test]
    fn test_line_column() {
        let source = "var a;\r\nvar b;\nvar = 1;";
        let offset = source.rfind('=').unwrap();
        let err = SyntaxError::new(source, offset, "Parse failure");
        assert_eq!(err.line_column(source), (3, 5));
    }

    #[test]
    fn test_offset_past_end_is_clamped() {
        let err = SyntaxError::new("ab", 10, "Unexpected end of input");
        assert_eq!(err.context, "ab|^|");
        assert_eq!(err.line_column("ab"), (1, 3));
    }
}
