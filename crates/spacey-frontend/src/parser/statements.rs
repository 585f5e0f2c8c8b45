//! Statement rules.
//!
//! ```text
//! Statement : FunctionDeclaration | Block | EmptyStatement | VariableStatement
//!           | IfStatement | IterationStatement | ContinueStatement
//!           | BreakStatement | ReturnStatement | WithStatement
//!           | SwitchStatement | ThrowStatement | TryStatement
//!           | DebuggerStatement | LabelledStatement | ExpressionStatement
//! ```
//!
//! Alternatives are tried in that order; the first that matches wins.

use tracing::trace;

use crate::error::Result;
use crate::ir::factory::{ForInTarget, SwitchClause};
use crate::ir::{Catch, Declaration, NodeId, NodeKind};
use crate::scope::ScopeKind;

use super::parser::PARSE_FAILURE;
use super::{Parser, Rule};

impl<'a> Parser<'a> {
    pub(super) fn parse_statement(&mut self) -> Rule<NodeId> {
        let alternatives: [fn(&mut Self) -> Rule<NodeId>; 16] = [
            Self::parse_function_declaration,
            Self::parse_block,
            Self::parse_empty_statement,
            Self::parse_variable_statement,
            Self::parse_if_statement,
            Self::parse_for_statement,
            Self::parse_while_statement,
            Self::parse_do_while_statement,
            Self::parse_continue_statement,
            Self::parse_break_statement,
            Self::parse_return_statement,
            Self::parse_with_statement,
            Self::parse_switch_statement,
            Self::parse_throw_statement,
            Self::parse_try_statement,
            Self::parse_debugger_statement,
        ];
        for rule in alternatives {
            if let Some(statement) = rule(self)? {
                return Ok(Some(statement));
            }
        }
        self.parse_expression_statement()
    }

    /// Statements up to the first one that does not parse, as a block.
    fn parse_statement_list(&mut self) -> Result<NodeId> {
        let offset = self.cursor.pos();
        let mut statements = Vec::new();
        while let Some(statement) = self.parse_statement()? {
            statements.push(statement);
        }
        Ok(self.factory.block(statements, offset))
    }

    /// `{ StatementList }`
    pub(super) fn parse_block(&mut self) -> Rule<NodeId> {
        if !self.punct('{')? {
            return Ok(None);
        }
        let block = self.parse_statement_list()?;
        self.expect('}')?;
        Ok(Some(block))
    }

    fn parse_empty_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.real_semicolon()? {
            return Ok(None);
        }
        Ok(Some(self.factory.empty(offset)))
    }

    /// `var VariableDeclarationList ;`
    fn parse_variable_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("var")? {
            return Ok(None);
        }
        let declarations = self.require(Self::parse_variable_declaration_list)?;
        self.expect_semicolon()?;
        Ok(Some(self.factory.variable_declaration(declarations, offset)))
    }

    fn parse_variable_declaration_list(&mut self) -> Rule<Vec<Declaration>> {
        let mut declarations = Vec::new();
        while let Some(declaration) = self.parse_variable_declaration()? {
            declarations.push(declaration);
            if !self.punct(',')? {
                break;
            }
        }
        if declarations.is_empty() {
            return Ok(None);
        }
        Ok(Some(declarations))
    }

    /// `Identifier Initialiser?`
    fn parse_variable_declaration(&mut self) -> Rule<Declaration> {
        let Some((name, _)) = self.identifier()? else {
            return Ok(None);
        };
        let symbol = self.declare(&name);
        let initializer = if self.chars_without("=", "=")? {
            Some(self.require(Self::parse_assignment_expression)?)
        } else {
            None
        };
        Ok(Some(self.factory.declaration(symbol, initializer)))
    }

    /// `if ( Expression ) Statement (else Statement)?`
    fn parse_if_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("if")? {
            return Ok(None);
        }
        let condition = self.parse_condition()?;
        let then = self.require(Self::parse_statement)?;
        let otherwise = if self.keyword("else")? {
            Some(self.require(Self::parse_statement)?)
        } else {
            None
        };
        Ok(Some(self.factory.if_statement(condition, then, otherwise, offset)))
    }

    /// `( Expression )` after `if`, `while`, `with` and `switch`.
    fn parse_condition(&mut self) -> Result<NodeId> {
        self.expect('(')?;
        let expression = self.require(Self::parse_expression)?;
        self.expect(')')?;
        Ok(expression)
    }

    /// `do Statement while ( Expression ) ;`
    fn parse_do_while_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("do")? {
            return Ok(None);
        }
        let body = self.require(Self::parse_statement)?;
        if !self.keyword("while")? {
            return Err(self.error("Expected `while`"));
        }
        let condition = self.parse_condition()?;
        self.expect_semicolon()?;
        let scope = self.scope;
        Ok(Some(self.factory.do_while(scope, body, condition, offset)))
    }

    /// `while ( Expression ) Statement`
    fn parse_while_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("while")? {
            return Ok(None);
        }
        let condition = self.parse_condition()?;
        let body = self.require(Self::parse_statement)?;
        let scope = self.scope;
        Ok(Some(self.factory.while_statement(scope, condition, body, offset)))
    }

    /// The four `for` forms:
    ///
    /// ```text
    /// for ( ExpressionNoIn? ; Expression? ; Expression? ) Statement
    /// for ( var VariableDeclarationListNoIn ; Expression? ; Expression? ) Statement
    /// for ( LeftHandSideExpression in Expression ) Statement
    /// for ( var VariableDeclarationNoIn in Expression ) Statement
    /// ```
    fn parse_for_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("for")? {
            return Ok(None);
        }
        self.expect('(')?;

        let declaration_offset = self.cursor.pos();
        if self.keyword("var")? {
            let declarations = self.with_in(false, |p| p.require(Self::parse_variable_declaration_list))?;
            let declaration = self.factory.variable_declaration(declarations, declaration_offset);
            if self.real_semicolon()? {
                return self.parse_for_rest(Some(declaration), offset).map(Some);
            }
            return self.parse_for_in_rest(ForInTarget::Declaration(declaration), offset).map(Some);
        }

        let initialization = self.with_in(false, Self::parse_expression)?;
        if self.real_semicolon()? {
            let initialization = initialization.map(|e| self.factory.expression_statement(e));
            return self.parse_for_rest(initialization, offset).map(Some);
        }
        match initialization {
            Some(target) if self.factory.is_left_hand_side(target) => {
                self.parse_for_in_rest(ForInTarget::Expression(target), offset).map(Some)
            }
            _ => Err(self.error(PARSE_FAILURE)),
        }
    }

    /// `Expression? ; Expression? ) Statement`, after the first `;`.
    fn parse_for_rest(&mut self, initialization: Option<NodeId>, offset: usize) -> Result<NodeId> {
        let condition = self.parse_expression()?;
        if !self.real_semicolon()? {
            return Err(self.error("Expected `;`"));
        }
        let increment = self.parse_expression()?;
        self.expect(')')?;
        let body = self.require(Self::parse_statement)?;
        let scope = self.scope;
        Ok(self
            .factory
            .for_statement(scope, initialization, condition, increment, body, offset))
    }

    /// `in Expression ) Statement`, after the loop target.
    fn parse_for_in_rest(&mut self, target: ForInTarget, offset: usize) -> Result<NodeId> {
        if !self.operator_in()? {
            return Err(self.error("Expected `in`"));
        }
        let expression = self.require(Self::parse_expression)?;
        self.expect(')')?;
        let body = self.require(Self::parse_statement)?;
        let scope = self.scope;
        Ok(self.factory.for_in(scope, target, expression, body, offset))
    }

    /// The optional label of `continue` and `break`, which must be on the
    /// same line as the keyword.
    fn parse_jump_label(&mut self) -> Result<Option<String>> {
        if self.cursor.line_break() {
            return Ok(None);
        }
        Ok(self.identifier()?.map(|(name, _)| name))
    }

    fn parse_continue_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("continue")? {
            return Ok(None);
        }
        let label = self.parse_jump_label()?;
        self.expect_semicolon()?;
        Ok(Some(self.factory.continue_statement(label, offset)))
    }

    fn parse_break_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("break")? {
            return Ok(None);
        }
        let label = self.parse_jump_label()?;
        self.expect_semicolon()?;
        Ok(Some(self.factory.break_statement(label, offset)))
    }

    /// `return Expression? ;`, the expression on the same line.
    fn parse_return_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("return")? {
            return Ok(None);
        }
        let value = if self.cursor.line_break() {
            None
        } else {
            self.parse_expression()?
        };
        self.expect_semicolon()?;
        let scope = self.scope;
        Ok(Some(self.factory.return_statement(scope, value, offset)))
    }

    fn parse_with_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("with")? {
            return Ok(None);
        }
        let object = self.parse_condition()?;
        let body = self.require(Self::parse_statement)?;
        Ok(Some(self.factory.with_statement(object, body, offset)))
    }

    /// `switch ( Expression ) { CaseClause* DefaultClause? CaseClause* }`
    fn parse_switch_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("switch")? {
            return Ok(None);
        }
        let expression = self.parse_condition()?;
        self.expect('{')?;

        let mut clauses = Vec::new();
        loop {
            let test = if self.keyword("case")? {
                Some(self.require(Self::parse_expression)?)
            } else if self.keyword("default")? {
                None
            } else {
                break;
            };
            self.expect(':')?;
            let body = self.parse_statement_list()?;
            clauses.push(SwitchClause { test, body });
        }

        self.expect('}')?;
        Ok(Some(self.factory.switch_statement(expression, clauses, offset)))
    }

    /// `throw Expression ;`, the expression on the same line.
    fn parse_throw_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("throw")? {
            return Ok(None);
        }
        if self.cursor.line_break() {
            return Err(self.error("Illegal newline after throw"));
        }
        let value = self.require(Self::parse_expression)?;
        self.expect_semicolon()?;
        Ok(Some(self.factory.throw_statement(value, offset)))
    }

    /// `try Block Catch? Finally?`, at least one of the two.
    fn parse_try_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("try")? {
            return Ok(None);
        }
        let body = self.require(Self::parse_block)?;
        let catch = self.parse_catch()?;
        let finally = if self.keyword("finally")? {
            Some(self.require(Self::parse_block)?)
        } else if catch.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        } else {
            None
        };
        Ok(Some(self.factory.try_statement(body, catch, finally, offset)))
    }

    /// `catch ( Identifier ) Block`, parsed in a scope of its own.
    fn parse_catch(&mut self) -> Result<Option<Catch>> {
        if !self.keyword("catch")? {
            return Ok(None);
        }
        let scope = self.push_scope(ScopeKind::Block);
        self.expect('(')?;
        let (name, _) = self.require(Self::identifier)?;
        let symbol = self.declare(&name);
        self.expect(')')?;
        let body = self.require(Self::parse_block)?;
        self.pop_scope();
        Ok(Some(self.factory.catch_clause(scope, symbol, body)))
    }

    fn parse_debugger_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("debugger")? {
            return Ok(None);
        }
        self.expect_semicolon()?;
        Ok(Some(self.factory.debugger(offset)))
    }

    /// An expression statement, or a labelled statement when the expression
    /// is a lone identifier followed by `:`.
    fn parse_expression_statement(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let Some(expression) = self.parse_expression()? else {
            return Ok(None);
        };

        if self.punct(':')? {
            let NodeKind::ReadIdentifier(symbol) = *self.factory.graph().kind(expression) else {
                return Err(self.error(PARSE_FAILURE));
            };
            let name = self.factory.scopes().symbol(symbol).name.clone();
            trace!(label = %name, "labelled statement");
            let body = self.require(Self::parse_statement)?;
            return Ok(Some(self.factory.label(name, body, offset)));
        }

        if !self.semicolon()? {
            return Err(self.error("Missing semicolon after ExpressionStatement"));
        }
        Ok(Some(self.factory.expression_statement(expression)))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SyntaxError;
    use crate::ir::{NodeKind, Program};
    use crate::parser::Parser;
    use crate::scope::SymbolKind;

    fn parse_ok(source: &str) -> Program {
        match Parser::new(source).parse_script() {
            Ok(program) => program,
            Err(err) => panic!("{source:?} failed: {err}"),
        }
    }

    fn parse_err(source: &str) -> SyntaxError {
        match Parser::new(source).parse_script() {
            Ok(_) => panic!("{source:?} parsed"),
            Err(err) => err,
        }
    }

    /// Kinds of the program's top-level statements.
    fn statements(program: &Program) -> Vec<&NodeKind> {
        let NodeKind::Block(body) = program.graph.kind(program.body(program.root)) else {
            panic!("program body is not a block");
        };
        body.iter().map(|&s| program.graph.kind(s)).collect()
    }

    #[test]
    fn test_every_statement_form() {
        let sources = [
            "{ a; b; }",
            ";",
            "var a, b = 1, c;",
            "if (a) b; else c;",
            "if (a) { b }",
            "do a++; while (a < 10);",
            "while (a) a--;",
            "for (;;) break;",
            "for (var i = 0; i < 10; i++) ;",
            "for (i = 0, j = 1; i < j; i++, j--) ;",
            "for (var k in o) ;",
            "for (k in o) ;",
            "for (o.k in p) ;",
            "a: for (;;) continue a;",
            "function f() { return; }",
            "function f() { return a + b; }",
            "with (o) a;",
            "switch (x) { case 1: case 2: a; break; default: b; }",
            "switch (x) {}",
            "throw new Error('x');",
            "try { a } catch (e) { b }",
            "try { a } finally { b }",
            "try { a } catch (e) { b } finally { c }",
            "debugger;",
        ];
        for source in sources {
            parse_ok(source);
        }
    }

    #[test]
    fn test_asi_on_line_breaks() {
        let program = parse_ok("a = 1\nb = 2\n");
        assert_eq!(statements(&program).len(), 2);

        let program = parse_ok("{ a } b");
        assert_eq!(statements(&program).len(), 2);
    }

    #[test]
    fn test_missing_semicolon_message() {
        let err = parse_err("a b");
        assert_eq!(err.message, "Missing semicolon after ExpressionStatement");
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_return_value_on_next_line_is_separate() {
        let program = parse_ok("function f() { return\n1; }");
        let body = program.body(program.root_function().sub_functions[0]);
        let NodeKind::Block(items) = program.graph.kind(body) else {
            panic!("function body is not a block");
        };
        assert!(matches!(program.graph.kind(items[0]), NodeKind::Return(None)));
        assert!(matches!(program.graph.kind(items[1]), NodeKind::ExpressionStatement(_)));
    }

    #[test]
    fn test_break_label_on_next_line_is_separate() {
        let program = parse_ok("a: while (x) { break\na; }");
        let text = crate::ir::dump::dump(&program);
        assert!(text.contains("Break\n"), "{text}");
        assert!(!text.contains("Break a"), "{text}");
    }

    #[test]
    fn test_throw_needs_same_line_expression() {
        let err = parse_err("throw\nnew Error();");
        assert_eq!(err.message, "Illegal newline after throw");
    }

    #[test]
    fn test_try_needs_catch_or_finally() {
        let err = parse_err("try { a }");
        assert_eq!(err.message, "Missing catch or finally after try");
    }

    #[test]
    fn test_label_must_be_identifier() {
        parse_err("a.b: c;");
        parse_err("'a': c;");
    }

    #[test]
    fn test_labelled_statement() {
        let program = parse_ok("outer: for (;;) { break outer; }");
        assert!(matches!(statements(&program)[0], NodeKind::Label { name, .. } if name == "outer"));
    }

    #[test]
    fn test_var_hoists_out_of_blocks() {
        let program = parse_ok("function f() { if (a) { var x = 1; } return x; }");
        let scope = program.functions[0].scope;
        let x = program.scopes.get_symbol(scope, "x").unwrap();
        assert_eq!(program.scopes.symbol(x).kind, SymbolKind::Local);
    }

    #[test]
    fn test_catch_variable_is_scoped() {
        let program = parse_ok("try { a } catch (e) { e }");
        let root_scope = program.root_function().scope;
        assert!(program.scopes.get_symbol(root_scope, "e").is_none());
        let NodeKind::Try {
            catch: Some(catch), ..
        } = statements(&program)[0]
        else {
            panic!("expected try with catch");
        };
        assert_eq!(program.scopes.symbol(catch.symbol).name, "e");
        assert_eq!(program.scopes.symbol(catch.symbol).kind, SymbolKind::Local);
    }

    #[test]
    fn test_for_head_rejects_non_reference_target() {
        parse_err("for (a + b in c) ;");
        parse_err("for (a b) ;");
    }

    #[test]
    fn test_for_in_inside_parens_of_head() {
        parse_ok("for (var i = (a in b); i; ) ;");
        parse_ok("for (x = [a in b]; x; ) ;");
    }

    #[test]
    fn test_loops_mark_scope() {
        let program = parse_ok("while (a) ;");
        let scope = program.root_function().scope;
        assert!(program.scopes.scope(scope).flags.has_loop);
    }

    #[test]
    fn test_function_statement_in_block() {
        let program = parse_ok("if (a) { function f() {} }");
        assert_eq!(program.functions.len(), 2);
    }

    #[test]
    fn test_switch_clauses() {
        let program = parse_ok("switch (x) { case 1: a; default: b; case 2: }");
        let NodeKind::Switch { clauses, .. } = statements(&program)[0] else {
            panic!("expected switch");
        };
        assert_eq!(clauses.len(), 3);
        let kinds: Vec<bool> = clauses
            .iter()
            .map(|&c| matches!(program.graph.kind(c), NodeKind::CaseClause { comparison: Some(_), .. }))
            .collect();
        assert_eq!(kinds, vec![true, false, true]);
    }

    #[test]
    fn test_do_while_requires_while() {
        let err = parse_err("do a; until (b);");
        assert_eq!(err.message, "Expected `while`");
    }
}
