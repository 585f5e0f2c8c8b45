//! Literal scanning.
//!
//! Scanners in this module are methods on [`Cursor`]. They start at the
//! current position and never consume trailing whitespace; the parser's
//! terminal rules do that.
//!
//! ## Numeric Literals
//!
//! ```text
//! 42          -> Int(42)
//! 4294967295  -> Int(u32::MAX)
//! 4294967296  -> Double (u32 overflow)
//! 3.14  .5    -> Double
//! 1e10        -> Double
//! 0x1F        -> Int(31), Double past u32
//! 010         -> Int(8), legacy octal, rejected in strict code
//! ```
//!
//! Integers are parsed as `u32` first and fall back to `f64` on overflow, so
//! boundary values keep their integer representation.
//!
//! Method: [`Cursor::scan_numeric_literal`]
//!
//! ### String Numeric Literals
//!
//! [`Cursor::scan_str_numeric_literal`] implements the `ToNumber` grammar
//! applied to strings. It accepts a sign, `Infinity`, leading zeros (never
//! octal) and hex digits. The caller decides between `+0` for empty input
//! and `NaN` for trailing garbage.
//!
//! ## String Literals
//!
//! Method: [`Cursor::scan_string_literal`]
//!
//! | Escape | Meaning |
//! |--------|---------|
//! | `\b` `\t` `\n` `\v` `\f` `\r` | Control characters |
//! | `\xHH` | Code unit from two hex digits |
//! | `\uHHHH` | Code point from four hex digits |
//! | `\0` | NUL (the only octal escape allowed in strict code) |
//! | `\ooo` | Legacy octal escape, non-strict only |
//! | `\` + line terminator | Line continuation, elided |
//! | `\` + other | The character itself |
//!
//! A `\uHHHH` naming a lone surrogate decodes to U+00A0.
//!
//! ## Identifiers
//!
//! Method: [`Cursor::scan_identifier_name`]. `\uHHHH` escapes are decoded.
//! Reserved-word checks belong to the parser since they depend on
//! strictness.

use crate::error::Result;

use super::Cursor;
use super::chars::{is_id_part, is_id_start, is_line_terminator};

/// Substitute for escapes that do not name a valid `char`.
const REPLACEMENT: char = '\u{00A0}';

/// The value of a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    /// Fits in an unsigned 32-bit integer.
    Int(u32),
    /// Anything else, including `NaN` and the infinities.
    Double(f64),
}

impl NumericValue {
    /// Value as a double.
    pub fn as_f64(self) -> f64 {
        match self {
            NumericValue::Int(v) => f64::from(v),
            NumericValue::Double(v) => v,
        }
    }

    /// Returns true for `NaN`.
    pub fn is_nan(self) -> bool {
        matches!(self, NumericValue::Double(v) if v.is_nan())
    }
}

impl std::fmt::Display for NumericValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericValue::Int(v) => write!(f, "{v}"),
            NumericValue::Double(v) if v.is_nan() => write!(f, "NaN"),
            NumericValue::Double(v) if v.is_infinite() => {
                write!(f, "{}Infinity", if *v < 0.0 { "-" } else { "" })
            }
            NumericValue::Double(v) => write!(f, "{v:?}"),
        }
    }
}

impl<'a> Cursor<'a> {
    /// Scans a `NumericLiteral`.
    ///
    /// Returns `Ok(None)` if the input does not start with a number. Once a
    /// digit has been seen, a malformed literal is a syntax error.
    pub fn scan_numeric_literal(&mut self, strict: bool) -> Result<Option<NumericValue>> {
        let start = self.pos();
        match (self.peek(), self.peek_nth(1)) {
            (Some('0'), Some('x' | 'X')) => {
                self.bump();
                self.bump();
                self.scan_hex_digits()
                    .map(Some)
                    .ok_or_else(|| self.error_at(start, "Invalid hexadecimal literal"))
            }
            (Some(ch), next)
                if ch.is_ascii_digit() || (ch == '.' && next.is_some_and(|n| n.is_ascii_digit())) =>
            {
                let text = self.scan_decimal_text();
                if is_legacy_octal(text) {
                    if strict {
                        return Err(
                            self.error_at(start, "Octal literals are not allowed in strict mode")
                        );
                    }
                    if let Some(value) = parse_octal(text) {
                        return Ok(Some(value));
                    }
                }
                parse_decimal(text)
                    .map(Some)
                    .ok_or_else(|| self.error_at(start, "Invalid numeric literal"))
            }
            _ => Ok(None),
        }
    }

    /// Scans a `StrNumericLiteral` for string-to-number conversion.
    ///
    /// Restores the cursor and returns `None` if nothing numeric is found.
    pub fn scan_str_numeric_literal(&mut self) -> Option<NumericValue> {
        let start = self.checkpoint();
        let value = match self.peek()? {
            sign @ ('+' | '-') => {
                self.bump();
                if self.eat_str("Infinity") {
                    let infinity = if sign == '-' {
                        f64::NEG_INFINITY
                    } else {
                        f64::INFINITY
                    };
                    Some(NumericValue::Double(infinity))
                } else {
                    self.restore(start);
                    self.scan_str_decimal()
                }
            }
            '0' if matches!(self.peek_nth(1), Some('x' | 'X')) => {
                self.bump();
                self.bump();
                self.scan_hex_digits()
            }
            '0' => {
                // Leading zeros never make an octal here; keep one if
                // nothing or a fraction follows.
                let mut last_zero = self.checkpoint();
                while self.peek() == Some('0') {
                    last_zero = self.checkpoint();
                    self.bump();
                }
                if self.is_eof() || self.peek() == Some('.') {
                    self.restore(last_zero);
                }
                self.scan_str_decimal()
            }
            '1'..='9' | '.' => self.scan_str_decimal(),
            _ if self.eat_str("Infinity") => Some(NumericValue::Double(f64::INFINITY)),
            _ => None,
        };

        if value.is_none() {
            self.restore(start);
        }
        value
    }

    fn scan_str_decimal(&mut self) -> Option<NumericValue> {
        let start = self.checkpoint();
        let value = parse_decimal(self.scan_decimal_text());
        if value.is_none() {
            self.restore(start);
        }
        value
    }

    /// Consumes the longest run that looks like a signed decimal number.
    fn scan_decimal_text(&mut self) -> &'a str {
        let start = self.pos();
        self.eat_if(|c| c == '+' || c == '-');

        let mut has_fraction = false;
        let mut has_exponent = false;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    self.bump();
                }
                Some('.') if !has_fraction && !has_exponent => {
                    self.bump();
                    has_fraction = true;
                }
                Some('e' | 'E') if !has_exponent && self.exponent_follows() => {
                    self.bump();
                    self.eat_if(|c| c == '+' || c == '-');
                    has_exponent = true;
                }
                _ => break,
            }
        }
        self.slice_from(start)
    }

    fn exponent_follows(&self) -> bool {
        match self.peek_nth(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('+' | '-') => self.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn scan_hex_digits(&mut self) -> Option<NumericValue> {
        let start = self.pos();
        while self.eat_if(|c| c.is_ascii_hexdigit()).is_some() {}
        let digits = self.slice_from(start);
        if digits.is_empty() {
            return None;
        }

        Some(match u32::from_str_radix(digits, 16) {
            Ok(v) => NumericValue::Int(v),
            Err(_) => NumericValue::Double(fold_digits(digits, 16)),
        })
    }

    /// Scans a `StringLiteral` and returns its cooked value.
    pub fn scan_string_literal(&mut self, strict: bool) -> Result<Option<String>> {
        let start = self.pos();
        let Some(quote) = self.eat_if(|c| c == '"' || c == '\'') else {
            return Ok(None);
        };

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at(start, "Unterminated string literal")),
                Some(ch) if is_line_terminator(ch) => {
                    return Err(self.error("Unterminated string literal"));
                }
                Some(ch) if ch == quote => {
                    self.bump();
                    return Ok(Some(value));
                }
                Some('\\') => {
                    self.bump();
                    self.scan_escape_sequence(strict, &mut value)?;
                }
                Some(ch) => {
                    self.bump();
                    value.push(ch);
                }
            }
        }
    }

    fn scan_escape_sequence(&mut self, strict: bool, out: &mut String) -> Result<()> {
        if self.eat_line_terminator_sequence() {
            return Ok(());
        }
        let Some(ch) = self.peek() else {
            return Err(self.error("Unterminated string literal"));
        };

        let simple = match ch {
            'b' => Some('\u{0008}'),
            't' => Some('\t'),
            'n' => Some('\n'),
            'v' => Some('\u{000B}'),
            'f' => Some('\u{000C}'),
            'r' => Some('\r'),
            _ => None,
        };
        if let Some(simple) = simple {
            self.bump();
            out.push(simple);
            return Ok(());
        }

        match ch {
            'x' | 'u' => {
                let start = self.pos();
                self.bump();
                let len = if ch == 'x' { 2 } else { 4 };
                let code = self
                    .scan_hex_escape(len)
                    .ok_or_else(|| self.error_at(start, "Invalid escape sequence"))?;
                out.push(char::from_u32(code).unwrap_or(REPLACEMENT));
            }
            '0'..='7' => self.scan_octal_escape(strict, out)?,
            _ => {
                self.bump();
                out.push(ch);
            }
        }
        Ok(())
    }

    fn scan_octal_escape(&mut self, strict: bool, out: &mut String) -> Result<()> {
        let start = self.pos();
        let next_is_digit = |cursor: &Self| cursor.peek().is_some_and(|c| c.is_ascii_digit());

        if strict {
            if self.eat('0') && !next_is_digit(self) {
                out.push('\0');
                return Ok(());
            }
            return Err(self.error_at(start, "Octal escape sequences are not allowed in strict mode"));
        }

        let first = self.peek().unwrap_or('0');
        let max_len = if first <= '3' { 3 } else { 2 };
        let mut code = 0u32;
        let mut len = 0;
        while len < max_len {
            match self.eat_if(|c| matches!(c, '0'..='7')) {
                Some(digit) => {
                    code = code * 8 + (digit as u32 - '0' as u32);
                    len += 1;
                }
                None => break,
            }
        }

        if len < max_len && next_is_digit(self) {
            return Err(self.error_at(start, "Invalid octal escape sequence"));
        }
        out.push(char::from_u32(code).unwrap_or(REPLACEMENT));
        Ok(())
    }

    /// Reads exactly `len` hex digits, restoring the cursor on failure.
    fn scan_hex_escape(&mut self, len: usize) -> Option<u32> {
        let start = self.checkpoint();
        let mut code = 0u32;
        for _ in 0..len {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    self.bump();
                    code = code * 16 + digit;
                }
                None => {
                    self.restore(start);
                    return None;
                }
            }
        }
        Some(code)
    }

    /// Scans an `IdentifierName`, decoding `\uHHHH` escapes.
    pub fn scan_identifier_name(&mut self) -> Result<Option<String>> {
        let Some(first) = self.scan_identifier_char(is_id_start)? else {
            return Ok(None);
        };
        let mut name = String::from(first);
        while let Some(ch) = self.scan_identifier_char(is_id_part)? {
            name.push(ch);
        }
        Ok(Some(name))
    }

    /// Scans one `IdentifierPart`.
    pub fn scan_identifier_part(&mut self) -> Result<Option<char>> {
        self.scan_identifier_char(is_id_part)
    }

    /// Returns true if an `IdentifierPart` starts here.
    pub fn at_identifier_part(&self) -> bool {
        self.peek().is_some_and(|c| c == '\\' || is_id_part(c))
    }

    fn scan_identifier_char(&mut self, accept: fn(char) -> bool) -> Result<Option<char>> {
        match self.peek() {
            Some('\\') => {
                let start = self.pos();
                self.bump();
                if !self.eat('u') {
                    return Err(self.error_at(start, "Invalid escape in identifier"));
                }
                let code = self
                    .scan_hex_escape(4)
                    .ok_or_else(|| self.error_at(start, "Invalid escape in identifier"))?;
                Ok(Some(char::from_u32(code).unwrap_or(REPLACEMENT)))
            }
            Some(ch) if accept(ch) => {
                self.bump();
                Ok(Some(ch))
            }
            _ => Ok(None),
        }
    }
}

fn is_legacy_octal(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() > 1 && bytes[0] == b'0' && bytes[1].is_ascii_digit()
}

/// Parses an all-octal-digit literal such as `0755`.
///
/// Returns `None` if a digit is 8 or 9, in which case the text is decimal.
fn parse_octal(text: &str) -> Option<NumericValue> {
    if !text.bytes().all(|b| matches!(b, b'0'..=b'7')) {
        return None;
    }
    Some(match u32::from_str_radix(text, 8) {
        Ok(v) => NumericValue::Int(v),
        Err(_) => NumericValue::Double(fold_digits(text, 8)),
    })
}

fn parse_decimal(text: &str) -> Option<NumericValue> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(v) = text.parse::<u32>() {
            return Some(NumericValue::Int(v));
        }
    }
    text.parse::<f64>().ok().map(NumericValue::Double)
}

fn fold_digits(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d))
}
