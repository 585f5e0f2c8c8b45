//! Expression rules, from primary expressions up to the comma operator.
//!
//! Each precedence level is a function that parses the next tighter level
//! and folds operators of its own level left to right. Operators that are a
//! prefix of a longer one are matched with an exclusion list, so `+` never
//! eats the start of `+=` or `++`.

use crate::error::Result;
use crate::ir::{AssignmentOperator, BinaryOp, LogicalOp, NodeId, Property, UnaryOp};
use crate::scope::ScopeKind;

use super::{Parser, Rule};

/// How a binary operator is spelled.
#[derive(Debug, Clone, Copy)]
enum Operator {
    /// Exactly these characters.
    Chars(&'static str),
    /// These characters, not followed by any of the second set.
    Without(&'static str, &'static str),
    /// A keyword operator.
    Keyword(&'static str),
    /// `in`, unless disabled by the context.
    In,
}

type Level = &'static [(Operator, BinaryOp)];

const MULTIPLICATIVE: Level = &[
    (Operator::Without("*", "="), BinaryOp::Multiply),
    (Operator::Without("/", "="), BinaryOp::Divide),
    (Operator::Without("%", "="), BinaryOp::Remainder),
];

const ADDITIVE: Level = &[
    (Operator::Without("+", "=+"), BinaryOp::Addition),
    (Operator::Without("-", "=-"), BinaryOp::Subtraction),
];

const SHIFT: Level = &[
    (Operator::Without(">>>", "="), BinaryOp::UnsignedRightShift),
    (Operator::Without(">>", "=>"), BinaryOp::RightShift),
    (Operator::Without("<<", "=<"), BinaryOp::LeftShift),
];

const RELATIONAL: Level = &[
    (Operator::Chars("<="), BinaryOp::LesserOrEqual),
    (Operator::Chars(">="), BinaryOp::GreaterOrEqual),
    (Operator::Without("<", "<"), BinaryOp::Lesser),
    (Operator::Without(">", ">"), BinaryOp::Greater),
    (Operator::Keyword("instanceof"), BinaryOp::InstanceOf),
    (Operator::In, BinaryOp::In),
];

const EQUALITY: Level = &[
    (Operator::Chars("==="), BinaryOp::Same),
    (Operator::Chars("!=="), BinaryOp::NotSame),
    (Operator::Chars("=="), BinaryOp::Equal),
    (Operator::Chars("!="), BinaryOp::NotEqual),
];

const BITWISE_AND: Level = &[(Operator::Without("&", "&="), BinaryOp::BitwiseAnd)];
const BITWISE_XOR: Level = &[(Operator::Without("^", "="), BinaryOp::BitwiseXor)];
const BITWISE_OR: Level = &[(Operator::Without("|", "|="), BinaryOp::BitwiseOr)];

/// Compound assignments, longest spelling first.
const COMPOUND_ASSIGNMENTS: [(&str, AssignmentOperator); 11] = [
    (">>>=", AssignmentOperator::UnsignedRightShift),
    ("<<=", AssignmentOperator::LeftShift),
    (">>=", AssignmentOperator::RightShift),
    ("*=", AssignmentOperator::Multiply),
    ("/=", AssignmentOperator::Divide),
    ("%=", AssignmentOperator::Remainder),
    ("+=", AssignmentOperator::Addition),
    ("-=", AssignmentOperator::Subtraction),
    ("&=", AssignmentOperator::BitwiseAnd),
    ("^=", AssignmentOperator::BitwiseXor),
    ("|=", AssignmentOperator::BitwiseOr),
];

const UNARY_KEYWORDS: [(&str, UnaryOp); 3] = [
    ("delete", UnaryOp::Delete),
    ("void", UnaryOp::Void),
    ("typeof", UnaryOp::Typeof),
];

const UNARY_PUNCTUATORS: [(char, UnaryOp); 4] = [
    ('+', UnaryOp::Positive),
    ('-', UnaryOp::Negative),
    ('~', UnaryOp::BitwiseNot),
    ('!', UnaryOp::LogicalNot),
];

impl<'a> Parser<'a> {
    // Primary expressions.

    fn parse_primary_expression(&mut self) -> Rule<NodeId> {
        let alternatives: [fn(&mut Self) -> Rule<NodeId>; 10] = [
            Self::this_literal,
            Self::null_literal,
            Self::boolean_literal,
            Self::numeric_literal,
            Self::string_literal,
            Self::regex_literal,
            Self::parse_identifier_reference,
            Self::parse_array_literal,
            Self::parse_object_literal,
            Self::parse_paren_expression,
        ];
        for rule in alternatives {
            if let Some(expression) = rule(self)? {
                return Ok(Some(expression));
            }
        }
        Ok(None)
    }

    fn parse_identifier_reference(&mut self) -> Rule<NodeId> {
        let Some((name, offset)) = self.identifier()? else {
            return Ok(None);
        };
        let scope = self.scope;
        Ok(Some(self.factory.identifier(scope, &name, offset)))
    }

    /// `[ ElementList ]`. Elisions are kept as holes; one trailing comma
    /// does not add a hole.
    fn parse_array_literal(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.punct('[')? {
            return Ok(None);
        }

        let mut items = Vec::new();
        self.with_in(true, |p| -> Result<()> {
            loop {
                if p.punct(']')? {
                    return Ok(());
                }
                if p.punct(',')? {
                    items.push(None);
                    continue;
                }
                items.push(Some(p.require(Self::parse_assignment_expression)?));
                if !p.punct(',')? {
                    return p.expect(']');
                }
            }
        })?;
        Ok(Some(self.factory.array(items, offset)))
    }

    /// `{ PropertyAssignment (, PropertyAssignment)* ,? }`
    fn parse_object_literal(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.punct('{')? {
            return Ok(None);
        }

        let mut properties = Vec::new();
        self.with_in(true, |p| -> Result<()> {
            while let Some(property) = p.parse_property_assignment()? {
                properties.push(property);
                if !p.punct(',')? {
                    break;
                }
            }
            Ok(())
        })?;
        self.expect('}')?;
        Ok(Some(self.factory.object(properties, offset)))
    }

    fn parse_property_assignment(&mut self) -> Rule<Property> {
        if let Some(getter) = self.parse_getter()? {
            return Ok(Some(getter));
        }
        if let Some(setter) = self.parse_setter()? {
            return Ok(Some(setter));
        }
        let Some(name) = self.property_name()? else {
            return Ok(None);
        };
        self.expect(':')?;
        let value = self.require(Self::parse_assignment_expression)?;
        Ok(Some(self.factory.property(name, value)))
    }

    /// `get PropertyName ( ) { FunctionBody }`
    fn parse_getter(&mut self) -> Rule<Property> {
        let start = self.cursor.checkpoint();
        if !self.keyword("get")? {
            return Ok(None);
        }
        let Some(name) = self.property_name()? else {
            self.cursor.restore(start);
            return Ok(None);
        };

        let outer = self.scope;
        let inner = self.push_scope(ScopeKind::Function);
        self.expect('(')?;
        self.expect(')')?;
        let body = self.parse_function_body()?;
        self.pop_scope();
        Ok(Some(self.factory.getter(outer, name, body, inner, start.offset())))
    }

    /// `set PropertyName ( Identifier ) { FunctionBody }`
    fn parse_setter(&mut self) -> Rule<Property> {
        let start = self.cursor.checkpoint();
        if !self.keyword("set")? {
            return Ok(None);
        }
        let Some(name) = self.property_name()? else {
            self.cursor.restore(start);
            return Ok(None);
        };

        let outer = self.scope;
        let inner = self.push_scope(ScopeKind::Function);
        self.expect('(')?;
        let (parameter, _) = self.require(Self::identifier)?;
        let parameter = self.declare(&parameter);
        self.expect(')')?;
        let body = self.parse_function_body()?;
        self.pop_scope();
        Ok(Some(self.factory.setter(outer, name, parameter, body, inner, start.offset())))
    }

    fn parse_function_body(&mut self) -> Result<NodeId> {
        self.expect('{')?;
        let body = self.with_in(true, Self::parse_source_elements)?;
        self.expect('}')?;
        Ok(body)
    }

    /// `( Expression )`, kept as a node so `(a) = b` still assigns.
    fn parse_paren_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.punct('(')? {
            return Ok(None);
        }
        let expression = self.with_in(true, |p| p.require(Self::parse_expression))?;
        self.expect(')')?;
        Ok(Some(self.factory.paren(expression, offset)))
    }

    // Member, new and call expressions.

    fn parse_member_expression_internal(&mut self) -> Rule<NodeId> {
        if let Some(primary) = self.parse_primary_expression()? {
            return Ok(Some(primary));
        }
        if let Some(function) = self.parse_function_expression()? {
            return Ok(Some(function));
        }
        self.parse_new_member_expression()
    }

    /// `new MemberExpression Arguments?`
    ///
    /// Once a `new` in the chain has gone without arguments, the enclosing
    /// `new`s go without as well, so `new new X` builds two argument-less
    /// constructions and the following call expression does not call the
    /// result.
    fn parse_new_member_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        if !self.keyword("new")? {
            return Ok(None);
        }
        let callee = self.require(Self::parse_member_expression)?;
        let arguments = if self.unary_new {
            Vec::new()
        } else {
            match self.parse_arguments()? {
                Some(arguments) => arguments,
                None => {
                    self.unary_new = true;
                    Vec::new()
                }
            }
        };
        let scope = self.scope;
        Ok(Some(self.factory.new_expression(scope, callee, arguments, offset)))
    }

    /// A member expression followed by any number of `[index]` and `.name`
    /// accesses.
    fn parse_member_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let Some(mut expression) = self.parse_member_expression_internal()? else {
            return Ok(None);
        };
        while let Some(indexer) = self.parse_indexer(expression, offset)? {
            expression = indexer;
        }
        Ok(Some(expression))
    }

    /// `[ Expression ]` or `. IdentifierName` applied to `container`.
    fn parse_indexer(&mut self, container: NodeId, offset: usize) -> Rule<NodeId> {
        if self.punct('[')? {
            let index = self.with_in(true, |p| p.require(Self::parse_expression))?;
            self.expect(']')?;
            return Ok(Some(self.factory.indexer(container, index, offset)));
        }
        if self.punct('.')? {
            let (name, name_offset) = self.require(Self::identifier_name)?;
            let index = self.factory.string(name, name_offset);
            return Ok(Some(self.factory.indexer(container, index, offset)));
        }
        Ok(None)
    }

    /// `( (AssignmentExpression (, AssignmentExpression)*)? )`
    fn parse_arguments(&mut self) -> Rule<Vec<NodeId>> {
        if !self.punct('(')? {
            return Ok(None);
        }
        let arguments = self.with_in(true, |p| -> Result<Vec<NodeId>> {
            let mut arguments = Vec::new();
            while let Some(argument) = p.parse_assignment_expression()? {
                arguments.push(argument);
                if !p.punct(',')? {
                    break;
                }
            }
            Ok(arguments)
        })?;
        self.expect(')')?;
        Ok(Some(arguments))
    }

    /// A member expression followed by calls and accesses in any order.
    fn parse_call_expression(&mut self) -> Rule<NodeId> {
        debug_assert!(!self.unary_new, "call expressions never nest inside a bare `new`");
        let offset = self.cursor.pos();
        let member = match self.parse_member_expression() {
            Ok(Some(member)) => member,
            other => {
                self.unary_new = false;
                return other;
            }
        };
        if self.unary_new {
            self.unary_new = false;
            return Ok(Some(member));
        }

        let scope = self.scope;
        let mut expression = member;
        loop {
            if let Some(arguments) = self.parse_arguments()? {
                expression = self.factory.call(scope, expression, arguments, offset);
            } else if let Some(indexer) = self.parse_indexer(expression, offset)? {
                expression = indexer;
            } else {
                return Ok(Some(expression));
            }
        }
    }

    // Operators.

    /// `LeftHandSideExpression (++ | --)?`, the operator on the same line.
    fn parse_postfix_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let Some(expression) = self.parse_call_expression()? else {
            return Ok(None);
        };
        if self.cursor.line_break() {
            return Ok(Some(expression));
        }
        if self.chars("++")? {
            return Ok(Some(self.factory.postfix_update(true, expression, offset)));
        }
        if self.chars("--")? {
            return Ok(Some(self.factory.postfix_update(false, expression, offset)));
        }
        Ok(Some(expression))
    }

    fn parse_unary_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        for (keyword, op) in UNARY_KEYWORDS {
            if self.keyword(keyword)? {
                let operand = self.require(Self::parse_unary_expression)?;
                return Ok(Some(self.factory.unary(op, operand, offset)));
            }
        }
        for (text, increment) in [("++", true), ("--", false)] {
            if self.chars(text)? {
                let operand = self.require(Self::parse_unary_expression)?;
                return Ok(Some(self.factory.prefix_update(increment, operand, offset)));
            }
        }
        for (ch, op) in UNARY_PUNCTUATORS {
            if self.punct(ch)? {
                let operand = self.require(Self::parse_unary_expression)?;
                return Ok(Some(self.factory.unary(op, operand, offset)));
            }
        }
        self.parse_postfix_expression()
    }

    fn eat_operator(&mut self, operator: Operator) -> Result<bool> {
        match operator {
            Operator::Chars(text) => self.chars(text),
            Operator::Without(text, without) => self.chars_without(text, without),
            Operator::Keyword(keyword) => self.keyword(keyword),
            Operator::In => self.operator_in(),
        }
    }

    /// Folds the operators of one precedence level over operands of the
    /// next tighter level, left to right.
    fn parse_binary_level(&mut self, operand: fn(&mut Self) -> Rule<NodeId>, level: Level) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let Some(mut left) = operand(self)? else {
            return Ok(None);
        };
        'fold: loop {
            for &(operator, op) in level {
                if self.eat_operator(operator)? {
                    let right = self.require(operand)?;
                    left = self.factory.binary(op, left, right, Some(offset));
                    continue 'fold;
                }
            }
            return Ok(Some(left));
        }
    }

    fn parse_multiplicative_expression(&mut self) -> Rule<NodeId> {
        self.parse_binary_level(Self::parse_unary_expression, MULTIPLICATIVE)
    }

    fn parse_additive_expression(&mut self) -> Rule<NodeId> {
        self.parse_binary_level(Self::parse_multiplicative_expression, ADDITIVE)
    }

    fn parse_shift_expression(&mut self) -> Rule<NodeId> {
        self.parse_binary_level(Self::parse_additive_expression, SHIFT)
    }

    fn parse_relational_expression(&mut self) -> Rule<NodeId> {
        self.parse_binary_level(Self::parse_shift_expression, RELATIONAL)
    }

    fn parse_equality_expression(&mut self) -> Rule<NodeId> {
        self.parse_binary_level(Self::parse_relational_expression, EQUALITY)
    }

    fn parse_bitwise_and_expression(&mut self) -> Rule<NodeId> {
        self.parse_binary_level(Self::parse_equality_expression, BITWISE_AND)
    }

    fn parse_bitwise_xor_expression(&mut self) -> Rule<NodeId> {
        self.parse_binary_level(Self::parse_bitwise_and_expression, BITWISE_XOR)
    }

    fn parse_bitwise_or_expression(&mut self) -> Rule<NodeId> {
        self.parse_binary_level(Self::parse_bitwise_xor_expression, BITWISE_OR)
    }

    fn parse_logical_level(
        &mut self,
        operand: fn(&mut Self) -> Rule<NodeId>,
        text: &str,
        op: LogicalOp,
    ) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let Some(mut left) = operand(self)? else {
            return Ok(None);
        };
        while self.chars(text)? {
            let right = self.require(operand)?;
            left = self.factory.logical(op, left, right, offset);
        }
        Ok(Some(left))
    }

    fn parse_logical_and_expression(&mut self) -> Rule<NodeId> {
        self.parse_logical_level(Self::parse_bitwise_or_expression, "&&", LogicalOp::And)
    }

    fn parse_logical_or_expression(&mut self) -> Rule<NodeId> {
        self.parse_logical_level(Self::parse_logical_and_expression, "||", LogicalOp::Or)
    }

    /// `LogicalOrExpression (? AssignmentExpression : AssignmentExpression)?`
    fn parse_conditional_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let Some(condition) = self.parse_logical_or_expression()? else {
            return Ok(None);
        };
        if !self.punct('?')? {
            return Ok(Some(condition));
        }
        let then = self.with_in(true, |p| p.require(Self::parse_assignment_expression))?;
        self.expect(':')?;
        let otherwise = self.require(Self::parse_assignment_expression)?;
        Ok(Some(self.factory.ternary(condition, then, otherwise, offset)))
    }

    fn assignment_operator(&mut self) -> Result<Option<AssignmentOperator>> {
        for (text, op) in COMPOUND_ASSIGNMENTS {
            if self.chars(text)? {
                return Ok(Some(op));
            }
        }
        if self.chars_without("=", "=")? {
            return Ok(Some(AssignmentOperator::Assign));
        }
        Ok(None)
    }

    /// A conditional expression, or an assignment to it when it is a
    /// left-hand-side expression followed by an assignment operator.
    /// Assignment is right associative.
    pub(super) fn parse_assignment_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let Some(left) = self.parse_conditional_expression()? else {
            return Ok(None);
        };
        if !self.factory.is_left_hand_side(left) {
            return Ok(Some(left));
        }
        let Some(op) = self.assignment_operator()? else {
            return Ok(Some(left));
        };
        let right = self.require(Self::parse_assignment_expression)?;
        Ok(Some(self.factory.assignment(op, left, right, offset)))
    }

    /// `AssignmentExpression (, AssignmentExpression)*`
    pub(super) fn parse_expression(&mut self) -> Rule<NodeId> {
        let offset = self.cursor.pos();
        let Some(first) = self.parse_assignment_expression()? else {
            return Ok(None);
        };
        if !self.punct(',')? {
            return Ok(Some(first));
        }
        let mut expressions = vec![first];
        loop {
            expressions.push(self.require(Self::parse_assignment_expression)?);
            if !self.punct(',')? {
                break;
            }
        }
        Ok(Some(self.factory.comma(expressions, Some(offset))))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SyntaxError;
    use crate::ir::{BinaryOp, Conversion, Graph, LogicalOp, NodeId, NodeKind, Program, PropertyKind, UnaryOp};
    use crate::lexer::NumericValue;
    use crate::ir::verify::verify;
    use crate::parser::Parser;

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

    /// The expression of the single expression statement in `source`.
    fn expression(source: &str) -> (Program, NodeId) {
        let program = parse_ok(source);
        let NodeKind::Block(body) = program.graph.kind(program.body(program.root)) else {
            panic!("program body is not a block");
        };
        assert_eq!(body.len(), 1, "{source:?}");
        let NodeKind::ExpressionStatement(expression) = *program.graph.kind(body[0]) else {
            panic!("{source:?} is not an expression statement");
        };
        (program, expression)
    }

    /// Looks through conversions and guarded casts.
    fn strip(graph: &Graph, mut id: NodeId) -> NodeId {
        loop {
            match *graph.kind(id) {
                NodeKind::Convert { operand, .. } | NodeKind::GuardedCast(operand) => id = operand,
                _ => return id,
            }
        }
    }

    fn binary_op(source: &str) -> BinaryOp {
        let (program, id) = expression(source);
        match *program.graph.kind(strip(&program.graph, id)) {
            NodeKind::Binary { op, .. } => op,
            ref other => panic!("{source:?} gave {other:?}"),
        }
    }

    #[test]
    fn test_binary_operators() {
        let cases = [
            ("a * b", BinaryOp::Multiply),
            ("a / b", BinaryOp::Divide),
            ("a % b", BinaryOp::Remainder),
            ("a + b", BinaryOp::Addition),
            ("a - b", BinaryOp::Subtraction),
            ("a << b", BinaryOp::LeftShift),
            ("a >> b", BinaryOp::RightShift),
            ("a >>> b", BinaryOp::UnsignedRightShift),
            ("a < b", BinaryOp::Lesser),
            ("a > b", BinaryOp::Greater),
            ("a <= b", BinaryOp::LesserOrEqual),
            ("a >= b", BinaryOp::GreaterOrEqual),
            ("a instanceof b", BinaryOp::InstanceOf),
            ("a in b", BinaryOp::In),
            ("a == b", BinaryOp::Equal),
            ("a != b", BinaryOp::NotEqual),
            ("a === b", BinaryOp::Same),
            ("a !== b", BinaryOp::NotSame),
            ("a & b", BinaryOp::BitwiseAnd),
            ("a ^ b", BinaryOp::BitwiseXor),
            ("a | b", BinaryOp::BitwiseOr),
        ];
        for (source, op) in cases {
            assert_eq!(binary_op(source), op, "{source}");
        }
    }

    #[test]
    fn test_precedence() {
        let (program, id) = expression("a + b * c");
        let NodeKind::Binary { op, right, .. } = *program.graph.kind(id) else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Addition);
        let right = strip(&program.graph, right);
        assert!(matches!(program.graph.kind(right), NodeKind::Binary { op: BinaryOp::Multiply, .. }));
    }

    #[test]
    fn test_left_associativity() {
        let (program, id) = expression("a - b - c");
        let NodeKind::Binary { left, .. } = *program.graph.kind(id) else {
            panic!("expected binary");
        };
        let left = strip(&program.graph, left);
        assert!(matches!(program.graph.kind(left), NodeKind::Binary { op: BinaryOp::Subtraction, .. }));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let (program, id) = expression("a = b = c");
        let NodeKind::WriteIdentifier { value, .. } = *program.graph.kind(id) else {
            panic!("expected write");
        };
        assert!(matches!(program.graph.kind(value), NodeKind::WriteIdentifier { .. }));
    }

    #[test]
    fn test_compound_assignment_operators() {
        for source in [
            "a *= 1", "a /= 1", "a %= 1", "a += 1", "a -= 1", "a <<= 1", "a >>= 1", "a >>>= 1", "a &= 1",
            "a ^= 1", "a |= 1",
        ] {
            let (program, id) = expression(source);
            assert!(
                matches!(program.graph.kind(id), NodeKind::WriteIdentifier { .. }),
                "{source}"
            );
        }
    }

    #[test]
    fn test_operators_do_not_swallow_longer_ones() {
        let (program, id) = expression("a = b >>= c");
        let NodeKind::WriteIdentifier { value, .. } = *program.graph.kind(id) else {
            panic!("expected write");
        };
        assert!(matches!(program.graph.kind(value), NodeKind::WriteIdentifier { .. }));

        let (program, id) = expression("a+++b");
        let NodeKind::Binary { op, .. } = *program.graph.kind(strip(&program.graph, id)) else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Addition);
    }

    #[test]
    fn test_assignment_to_non_reference_becomes_reference_error() {
        let (program, id) = expression("1 = 2");
        let NodeKind::Comma(items) = program.graph.kind(id) else {
            panic!("expected comma");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(program.graph.kind(items[2]), NodeKind::InternalCall { .. }));
    }

    #[test]
    fn test_non_lhs_is_not_assigned() {
        let err = parse_err("a + b = c;");
        assert_eq!(err.message, "Missing semicolon after ExpressionStatement");
    }

    #[test]
    fn test_logical_operators() {
        let (program, id) = expression("a || b && c");
        let NodeKind::Logical { op, .. } = *program.graph.kind(id) else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::Or);
    }

    #[test]
    fn test_conditional() {
        let (program, id) = expression("a ? b : c");
        let NodeKind::Ternary { condition, .. } = *program.graph.kind(id) else {
            panic!("expected ternary");
        };
        assert!(matches!(
            program.graph.kind(condition),
            NodeKind::Convert {
                conversion: Conversion::ToBoolean,
                ..
            }
        ));
        parse_err("a ? b;");
    }

    #[test]
    fn test_unary_operators() {
        for (source, expected) in [
            ("delete a.b", UnaryOp::Delete),
            ("void 0", UnaryOp::Void),
            ("typeof a", UnaryOp::Typeof),
            ("-a", UnaryOp::Negative),
            ("~a", UnaryOp::BitwiseNot),
            ("!a", UnaryOp::LogicalNot),
        ] {
            let (program, id) = expression(source);
            assert!(
                matches!(program.graph.kind(id), NodeKind::Unary { op, .. } if *op == expected),
                "{source}"
            );
        }
    }

    #[test]
    fn test_update_expressions() {
        for source in ["++a", "--a", "a++", "a--", "++a.b", "a[0]--"] {
            let (program, id) = expression(source);
            assert!(!matches!(program.graph.kind(id), NodeKind::ReadIdentifier(_)), "{source}");
        }
    }

    #[test]
    fn test_postfix_operator_needs_same_line() {
        let program = parse_ok("a\n++b");
        let NodeKind::Block(body) = program.graph.kind(program.body(program.root)) else {
            panic!("program body is not a block");
        };
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_comma() {
        let (program, id) = expression("a, b, c");
        assert!(matches!(program.graph.kind(id), NodeKind::Comma(items) if items.len() == 3));
    }

    #[test]
    fn test_paren_grouping() {
        let (program, id) = expression("(a + b) * c");
        let NodeKind::Binary { op, left, .. } = *program.graph.kind(id) else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Multiply);
        let left = strip(&program.graph, left);
        assert!(matches!(program.graph.kind(left), NodeKind::Paren(_) | NodeKind::Binary { .. }));
    }

    #[test]
    fn test_parenthesized_assignment_targets() {
        for source in ["(a) = 1", "((a)) = 1", "(((a))) += 1"] {
            let (program, id) = expression(source);
            assert!(
                matches!(program.graph.kind(id), NodeKind::WriteIdentifier { .. }),
                "{source}: {:?}",
                program.graph.kind(id)
            );
        }

        let (program, id) = expression("((o.x)) = 1");
        assert!(matches!(program.graph.kind(id), NodeKind::WriteProperty { .. }));

        for source in ["(a)++", "++(a)", "((a))--", "(o.x)++", "(o[k])--"] {
            let (program, id) = expression(source);
            let NodeKind::Comma(items) = program.graph.kind(id) else {
                panic!("{source}: expected comma");
            };
            assert!(
                matches!(
                    program.graph.kind(items[0]),
                    NodeKind::WriteIdentifier { .. } | NodeKind::WriteProperty { .. } | NodeKind::WriteIndexer { .. }
                ),
                "{source}"
            );
            assert_eq!(verify(&program), Vec::new(), "{source}");
        }
    }

    #[test]
    fn test_parenthesized_eval_is_direct() {
        let (program, id) = expression("((eval))(s)");
        assert!(matches!(program.graph.kind(id), NodeKind::Call { is_direct_eval: true, .. }));
    }

    #[test]
    fn test_member_and_calls() {
        let (program, id) = expression("a.b[c](d)(e).f");
        assert!(matches!(program.graph.kind(id), NodeKind::ReadProperty { .. }));

        let (program, id) = expression("o.m(1, 2)");
        let NodeKind::Call {
            this_arg, arguments, ..
        } = program.graph.kind(id)
        else {
            panic!("expected call");
        };
        assert!(this_arg.is_some());
        assert_eq!(arguments.len(), 2);
    }

    #[test]
    fn test_keyword_property_names_after_dot() {
        let (program, id) = expression("a.default.for");
        assert!(matches!(program.graph.kind(id), NodeKind::ReadProperty { .. }));
    }

    #[test]
    fn test_new_without_arguments() {
        let (program, id) = expression("new X");
        assert!(matches!(program.graph.kind(id), NodeKind::New { arguments, .. } if arguments.is_empty()));

        let (program, id) = expression("new X(1)");
        assert!(matches!(program.graph.kind(id), NodeKind::New { arguments, .. } if arguments.len() == 1));

        let (program, id) = expression("new X.Y(1).z");
        assert!(matches!(program.graph.kind(id), NodeKind::ReadProperty { .. }));
    }

    #[test]
    fn test_new_new() {
        let (program, id) = expression("new new X()()");
        let NodeKind::New { callee, arguments, .. } = program.graph.kind(id) else {
            panic!("expected new");
        };
        assert!(arguments.is_empty());
        let callee = strip(&program.graph, *callee);
        assert!(matches!(program.graph.kind(callee), NodeKind::New { .. }));

        let (program, id) = expression("new X()()");
        assert!(matches!(program.graph.kind(id), NodeKind::Call { .. }));

        // A bare `new` inside an index or argument never leaks to the outer call.
        for source in ["new X[new Y]", "f(new X)(new Y)", "new new X", "(new X)()"] {
            expression(source);
        }
    }

    #[test]
    fn test_literals() {
        let (program, id) = expression("010");
        assert!(matches!(program.graph.kind(id), NodeKind::Number(NumericValue::Int(8))));

        let (program, id) = expression("'a\\tb'");
        assert!(matches!(program.graph.kind(id), NodeKind::String(s) if s == "a\tb"));

        let (program, id) = expression("/a[/]b/gi");
        assert!(
            matches!(program.graph.kind(id), NodeKind::Regex { pattern, flags } if pattern == "a[/]b" && flags == "gi")
        );

        for (source, expected) in [("this", "This"), ("null", "Null"), ("true", "Boolean")] {
            let (program, id) = expression(source);
            assert!(format!("{:?}", program.graph.kind(id)).starts_with(expected), "{source}");
        }
    }

    #[test]
    fn test_division_is_not_regex() {
        assert_eq!(binary_op("a / b / c"), BinaryOp::Divide);
    }

    #[test]
    fn test_array_literals() {
        for (source, len, holes) in [
            ("[]", 0, 0),
            ("[1]", 1, 0),
            ("[1,]", 1, 0),
            ("[,]", 1, 1),
            ("[1,,2]", 3, 1),
            ("[,,]", 2, 2),
        ] {
            let (program, id) = expression(source);
            let NodeKind::Array(items) = program.graph.kind(id) else {
                panic!("{source} is not an array");
            };
            assert_eq!(items.len(), len, "{source}");
            assert_eq!(items.iter().filter(|i| i.is_none()).count(), holes, "{source}");
        }
        parse_err("[1 2];");
    }

    #[test]
    fn test_object_literals() {
        let (program, id) = expression("({ a: 1, 'b': 2, 3: c, get d() { return 1; }, set d(v) {}, })");
        let NodeKind::Paren(object) = *program.graph.kind(id) else {
            panic!("expected paren");
        };
        let NodeKind::Object(properties) = program.graph.kind(object) else {
            panic!("expected object");
        };
        let names: Vec<(&str, PropertyKind)> = properties.iter().map(|p| (p.name.as_str(), p.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("a", PropertyKind::Data),
                ("b", PropertyKind::Data),
                ("3", PropertyKind::Data),
                ("d", PropertyKind::Getter),
                ("d", PropertyKind::Setter),
            ]
        );
        assert_eq!(program.functions.len(), 3);
    }

    #[test]
    fn test_get_and_set_as_plain_names() {
        let (program, id) = expression("({ get: 1, set: 2 })");
        let NodeKind::Paren(object) = *program.graph.kind(id) else {
            panic!("expected paren");
        };
        assert!(matches!(program.graph.kind(object), NodeKind::Object(p) if p.len() == 2));
    }

    #[test]
    fn test_reserved_word_is_not_an_identifier() {
        parse_err("var if = 1;");
        parse_err("class;");
        parse_ok("var yield = 1;");
        parse_err("'use strict'; var yield = 1;");
    }

    #[test]
    fn test_function_expressions() {
        let (program, id) = expression("(function (a, b) { return a + b; })");
        let NodeKind::Paren(function) = *program.graph.kind(id) else {
            panic!("expected paren");
        };
        assert!(matches!(program.graph.kind(function), NodeKind::Function { .. }));
        assert_eq!(program.functions[0].parameters.len(), 2);
    }

    #[test]
    fn test_in_operator_disabled_only_in_for_head() {
        parse_ok("for (var i = 0 in o) ;");
        parse_ok("for (x in y in z) ;");
        parse_ok("a = b in c;");
    }
}
