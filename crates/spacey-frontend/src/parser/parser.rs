//! Parser state, programs and functions.

use tracing::trace;

use crate::error::{Result, SyntaxError};
use crate::ir::{Factory, NodeId, Program};
use crate::lexer::{BodyEnd, Cursor, NumericValue};
use crate::scope::{ScopeId, ScopeKind, SymbolId};

/// Outcome of a grammar rule: `Ok(None)` means "no match, cursor unchanged".
pub type Rule<T> = Result<Option<T>>;

/// Message of a required rule that did not match.
pub(super) const PARSE_FAILURE: &str = "Parse failure";

/// A single-use parser over one source text.
///
/// Each entry point consumes the parser, so every parse starts from fresh
/// state and independent parses share nothing.
pub struct Parser<'a> {
    pub(super) cursor: Cursor<'a>,
    pub(super) factory: Factory,
    /// Innermost open scope.
    pub(super) scope: ScopeId,
    /// Cleared while parsing the head of a `for` statement.
    pub(super) in_operator_allowed: bool,
    /// Set once a `new` without arguments has been matched in the current
    /// member chain; outer `new`s may then no longer take arguments.
    pub(super) unary_new: bool,
}

impl<'a> Parser<'a> {
    /// Creates a parser positioned at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        let mut factory = Factory::new();
        let scope = factory.scopes_mut().create_scope(None, ScopeKind::Program);
        Self {
            cursor: Cursor::new(source),
            factory,
            scope,
            in_operator_allowed: true,
            unary_new: false,
        }
    }

    /// Parses the whole input as a `Program`.
    ///
    /// ```text
    /// Program        : SourceElements EOF
    /// SourceElements : Directive* Statement*
    /// ```
    pub fn parse_script(mut self) -> Result<Program> {
        let program = self.scope;
        self.cursor.skip_whitespace()?;
        let body = self.parse_source_elements()?;
        if !self.cursor.is_eof() {
            return Err(self.error(PARSE_FAILURE));
        }
        Ok(self.factory.program(program, body))
    }

    /// Parses the input as a `StringNumericLiteral`, the way string to number
    /// conversion does.
    ///
    /// Never fails: input with no numeric prefix is `+0`, a numeric prefix
    /// followed by anything but whitespace is `NaN`.
    pub fn parse_number(mut self) -> NumericValue {
        self.cursor.skip_str_whitespace();
        let value = self.cursor.scan_str_numeric_literal();
        self.cursor.skip_str_whitespace();
        if !self.cursor.is_eof() {
            return NumericValue::Double(f64::NAN);
        }
        value.unwrap_or(NumericValue::Int(0))
    }

    /// Validates the input as a regular-expression body.
    pub fn parse_regular_expression(mut self) -> Result<String> {
        self.cursor.scan_regex_body(BodyEnd::EndOfInput)
    }

    // Rule plumbing.

    /// Runs `rule` and turns "no match" into a syntax error.
    pub(super) fn require<T>(&mut self, rule: impl FnOnce(&mut Self) -> Rule<T>) -> Result<T> {
        match rule(self)? {
            Some(value) => Ok(value),
            None => Err(self.error(PARSE_FAILURE)),
        }
    }

    /// Runs `rule` with the `in` operator enabled or disabled.
    pub(super) fn with_in<T>(&mut self, allowed: bool, rule: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.in_operator_allowed, allowed);
        let result = rule(self);
        self.in_operator_allowed = saved;
        result
    }

    pub(super) fn error(&self, message: impl Into<String>) -> SyntaxError {
        self.cursor.error(message)
    }

    // Scopes.

    pub(super) fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let scope = self.factory.scopes_mut().create_scope(Some(self.scope), kind);
        trace!(scope = scope.index(), ?kind, "enter scope");
        self.scope = scope;
        scope
    }

    pub(super) fn pop_scope(&mut self) {
        let closed = self.scope;
        if let Some(parent) = self.factory.scopes().scope(closed).parent {
            self.scope = parent;
        }
        trace!(scope = closed.index(), "leave scope");
    }

    pub(super) fn is_strict(&self) -> bool {
        self.factory.scopes().scope(self.scope).flags.is_strict
    }

    /// Symbol for a binding occurrence of `name` in the current scope.
    pub(super) fn declare(&mut self, name: &str) -> SymbolId {
        let scope = self.scope;
        self.factory.scopes_mut().get_or_add_symbol(scope, name)
    }

    // Programs and functions.

    /// Directives followed by statements, as a block.
    ///
    /// Function declarations are ordinary statements here, so they are also
    /// accepted inside blocks.
    pub(super) fn parse_source_elements(&mut self) -> Result<NodeId> {
        let offset = self.cursor.pos();
        let mut statements = Vec::new();
        while let Some(directive) = self.parse_directive()? {
            statements.push(directive);
        }
        while let Some(statement) = self.parse_statement()? {
            statements.push(statement);
        }
        Ok(self.factory.block(statements, offset))
    }

    /// `"use strict";` or `'use strict';` at the start of a body.
    ///
    /// Only the exact text is a directive; escapes or line continuations
    /// inside the quotes make it an ordinary string.
    fn parse_directive(&mut self) -> Rule<NodeId> {
        let start = self.cursor.checkpoint();
        if !self.use_strict()? {
            return Ok(None);
        }
        if !self.semicolon()? {
            self.cursor.restore(start);
            return Ok(None);
        }

        let scope = self.scope;
        self.factory.scopes_mut().scope_mut(scope).flags.is_strict = true;
        trace!(scope = scope.index(), "strict mode");
        let directive = self.factory.string("use strict".to_string(), start.offset());
        Ok(Some(self.factory.expression_statement(directive)))
    }

    /// ```text
    /// FunctionDeclaration : 'function' Identifier '(' FormalParameterList ')' '{' SourceElements '}'
    /// ```
    ///
    /// The name is bound in the enclosing scope.
    pub(super) fn parse_function_declaration(&mut self) -> Rule<NodeId> {
        let start = self.cursor.checkpoint();
        if !self.keyword("function")? {
            return Ok(None);
        }
        let Some((name, _)) = self.identifier()? else {
            self.cursor.restore(start);
            return Ok(None);
        };

        let outer = self.scope;
        let symbol = self.declare(&name);
        let inner = self.push_scope(ScopeKind::FunctionDeclaration);
        let (parameters, body) = self.parse_function_rest()?;
        self.pop_scope();

        let function = self
            .factory
            .function_declaration(outer, symbol, parameters, body, inner, start.offset());
        Ok(Some(function))
    }

    /// ```text
    /// FunctionExpression : 'function' Identifier? '(' FormalParameterList ')' '{' SourceElements '}'
    /// ```
    ///
    /// The optional name is bound in the function's own scope.
    pub(super) fn parse_function_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("function")? {
            return Ok(None);
        }

        let outer = self.scope;
        let inner = self.push_scope(ScopeKind::Function);
        let name = match self.identifier()? {
            Some((name, _)) => Some(self.declare(&name)),
            None => None,
        };
        let (parameters, body) = self.parse_function_rest()?;
        self.pop_scope();

        let function = self
            .factory
            .function_expression(Some(outer), name, parameters, body, inner, offset);
        Ok(Some(function))
    }

    /// Parameters and body, parsed in the already-open function scope.
    pub(super) fn parse_function_rest(&mut self) -> Result<(Vec<SymbolId>, NodeId)> {
        self.expect('(')?;
        let parameters = self.parse_formal_parameters()?;
        self.expect(')')?;
        self.expect('{')?;
        let body = self.with_in(true, Self::parse_source_elements)?;
        self.expect('}')?;
        Ok((parameters, body))
    }

    /// `(Identifier (',' Identifier)*)?`, a trailing comma tolerated.
    fn parse_formal_parameters(&mut self) -> Result<Vec<SymbolId>> {
        let mut parameters = Vec::new();
        while let Some((name, _)) = self.identifier()? {
            parameters.push(self.declare(&name));
            if !self.punct(',')? {
                break;
            }
        }
        Ok(parameters)
    }
}
