//! Terminal rules: punctuators, keywords, identifiers, literals and
//! automatic semicolon insertion.
//!
//! Every terminal skips the whitespace after its match, so the cursor always
//! rests on the first character of the next construct.

use crate::error::Result;
use crate::ir::NodeId;
use crate::lexer::BodyEnd;
use crate::lexer::chars::is_reserved_word;

use super::{Parser, Rule};

impl Parser<'_> {
    /// Matches the single character `ch`.
    pub(super) fn punct(&mut self, ch: char) -> Result<bool> {
        if !self.cursor.eat(ch) {
            return Ok(false);
        }
        self.cursor.skip_whitespace()?;
        Ok(true)
    }

    /// Requires `ch`.
    pub(super) fn expect(&mut self, ch: char) -> Result<()> {
        if self.punct(ch)? {
            Ok(())
        } else {
            Err(self.error(format!("Expected `{ch}`")))
        }
    }

    /// Matches the character sequence `text`.
    pub(super) fn chars(&mut self, text: &str) -> Result<bool> {
        if !self.cursor.eat_str(text) {
            return Ok(false);
        }
        self.cursor.skip_whitespace()?;
        Ok(true)
    }

    /// Matches `text` unless the character right after it is one of
    /// `without`, so `+` does not match the start of `+=` or `++`.
    pub(super) fn chars_without(&mut self, text: &str, without: &str) -> Result<bool> {
        let start = self.cursor.checkpoint();
        if !self.cursor.eat_str(text) {
            return Ok(false);
        }
        if self.cursor.peek().is_some_and(|c| without.contains(c)) {
            self.cursor.restore(start);
            return Ok(false);
        }
        self.cursor.skip_whitespace()?;
        Ok(true)
    }

    /// Matches `keyword` as a whole word.
    pub(super) fn keyword(&mut self, keyword: &str) -> Result<bool> {
        let start = self.cursor.checkpoint();
        if !self.cursor.eat_str(keyword) {
            return Ok(false);
        }
        if self.cursor.at_identifier_part() {
            self.cursor.restore(start);
            return Ok(false);
        }
        self.cursor.skip_whitespace()?;
        Ok(true)
    }

    /// The `in` operator, when the current context allows it.
    pub(super) fn operator_in(&mut self) -> Result<bool> {
        if !self.in_operator_allowed {
            return Ok(false);
        }
        self.keyword("in")
    }

    /// A statement terminator: a real `;`, or one inserted before a line
    /// break, a `}` or the end of input.
    ///
    /// An inserted semicolon consumes nothing.
    pub(super) fn semicolon(&mut self) -> Result<bool> {
        if self.cursor.line_break() || self.cursor.is_eof() || self.cursor.peek() == Some('}') {
            return Ok(true);
        }
        self.punct(';')
    }

    /// Requires a statement terminator.
    pub(super) fn expect_semicolon(&mut self) -> Result<()> {
        if self.semicolon()? {
            Ok(())
        } else {
            Err(self.error("Expected `;`"))
        }
    }

    /// A `;` written in the source. `for` heads and empty statements need one.
    pub(super) fn real_semicolon(&mut self) -> Result<bool> {
        self.punct(';')
    }

    /// An `Identifier`: an identifier name that is not a reserved word in
    /// the current strictness. Returns the cooked name and its offset.
    pub(super) fn identifier(&mut self) -> Rule<(String, usize)> {
        let start = self.cursor.checkpoint();
        let Some(name) = self.cursor.scan_identifier_name()? else {
            return Ok(None);
        };
        if is_reserved_word(&name, self.is_strict()) {
            self.cursor.restore(start);
            return Ok(None);
        }
        self.cursor.skip_whitespace()?;
        Ok(Some((name, start.offset())))
    }

    /// An `IdentifierName`, reserved words included, as used after `.` and
    /// in property names.
    pub(super) fn identifier_name(&mut self) -> Rule<(String, usize)> {
        let offset = self.cursor.pos();
        let Some(name) = self.cursor.scan_identifier_name()? else {
            return Ok(None);
        };
        self.cursor.skip_whitespace()?;
        Ok(Some((name, offset)))
    }

    /// Exactly `"use strict"` or `'use strict'`.
    pub(super) fn use_strict(&mut self) -> Result<bool> {
        Ok(self.chars("\"use strict\"")? || self.chars("'use strict'")?)
    }

    pub(super) fn this_literal(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("this")? {
            return Ok(None);
        }
        let scope = self.scope;
        Ok(Some(self.factory.this(scope, offset)))
    }

    pub(super) fn null_literal(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("null")? {
            return Ok(None);
        }
        Ok(Some(self.factory.null(offset)))
    }

    pub(super) fn boolean_literal(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let value = if self.keyword("true")? {
            true
        } else if self.keyword("false")? {
            false
        } else {
            return Ok(None);
        };
        Ok(Some(self.factory.boolean(value, offset)))
    }

    pub(super) fn numeric_literal(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let strict = self.is_strict();
        let Some(value) = self.cursor.scan_numeric_literal(strict)? else {
            return Ok(None);
        };
        self.cursor.skip_whitespace()?;
        Ok(Some(self.factory.number(value, offset)))
    }

    pub(super) fn string_literal(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let strict = self.is_strict();
        let Some(value) = self.cursor.scan_string_literal(strict)? else {
            return Ok(None);
        };
        self.cursor.skip_whitespace()?;
        Ok(Some(self.factory.string(value, offset)))
    }

    /// `/body/flags`. Only reached where an expression may start, so a `/`
    /// here can never be division.
    pub(super) fn regex_literal(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.cursor.eat('/') {
            return Ok(None);
        }
        let pattern = self.cursor.scan_regex_body(BodyEnd::Slash)?;
        let flags = self.cursor.scan_regex_flags()?;
        self.cursor.skip_whitespace()?;
        Ok(Some(self.factory.regex(pattern, flags, offset)))
    }

    /// A property name: identifier name, string or number, as a string.
    pub(super) fn property_name(&mut self) -> Rule<String> {
        if let Some((name, _)) = self.identifier_name()? {
            return Ok(Some(name));
        }
        let strict = self.is_strict();
        if let Some(value) = self.cursor.scan_string_literal(strict)? {
            self.cursor.skip_whitespace()?;
            return Ok(Some(value));
        }
        if let Some(value) = self.cursor.scan_numeric_literal(strict)? {
            self.cursor.skip_whitespace()?;
            return Ok(Some(value.to_string()));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_needs_word_boundary() {
        let mut parser = Parser::new("format");
        assert!(!parser.keyword("for").unwrap());
        assert_eq!(parser.cursor.pos(), 0);

        let mut parser = Parser::new("for (");
        assert!(parser.keyword("for").unwrap());
        assert_eq!(parser.cursor.peek(), Some('('));
    }

    #[test]
    fn test_chars_without() {
        let mut parser = Parser::new("+= 1");
        assert!(!parser.chars_without("+", "=+").unwrap());
        assert_eq!(parser.cursor.pos(), 0);

        let mut parser = Parser::new("+ 1");
        assert!(parser.chars_without("+", "=+").unwrap());
        assert_eq!(parser.cursor.peek(), Some('1'));
    }

    #[test]
    fn test_inserted_semicolon() {
        let mut parser = Parser::new("a\nb");
        assert!(parser.identifier().unwrap().is_some());
        assert!(parser.semicolon().unwrap());
        assert_eq!(parser.cursor.peek(), Some('b'));

        let mut parser = Parser::new("a b");
        assert!(parser.identifier().unwrap().is_some());
        assert!(!parser.semicolon().unwrap());

        let mut parser = Parser::new("}");
        assert!(parser.semicolon().unwrap());
        assert!(!parser.real_semicolon().unwrap());
    }

    #[test]
    fn test_reserved_words_are_not_identifiers() {
        let mut parser = Parser::new("while");
        assert_eq!(parser.identifier().unwrap(), None);
        assert_eq!(parser.cursor.pos(), 0);

        let mut parser = Parser::new("let");
        assert_eq!(parser.identifier().unwrap(), Some(("let".to_string(), 0)));

        let mut parser = Parser::new("while");
        assert_eq!(parser.identifier_name().unwrap(), Some(("while".to_string(), 0)));
    }

    #[test]
    fn test_property_names() {
        let mut parser = Parser::new("'a b' 0x10 default");
        assert_eq!(parser.property_name().unwrap().as_deref(), Some("a b"));
        assert_eq!(parser.property_name().unwrap().as_deref(), Some("16"));
        assert_eq!(parser.property_name().unwrap().as_deref(), Some("default"));
        assert_eq!(parser.property_name().unwrap(), None);
    }

    #[test]
    fn test_operator_in_respects_context() {
        let mut parser = Parser::new("in");
        parser.in_operator_allowed = false;
        assert!(!parser.operator_in().unwrap());
        parser.in_operator_allowed = true;
        assert!(parser.operator_in().unwrap());
    }
}
