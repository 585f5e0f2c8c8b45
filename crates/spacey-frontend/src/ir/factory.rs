//! Builds IR nodes from matched syntax.
//!
//! The factory owns the node arena, the scope table and the function
//! metadata of one parse. Every node it creates is attached to its children
//! through [`Graph::add_user`], so the single-user rule holds at all times.
//!
//! ## Implicit conversions
//!
//! | Construct | Operand conversion |
//! |-----------|--------------------|
//! | `*` `+` `-` `===` `!==` | guarded cast |
//! | `/` `%` | `ToDouble` |
//! | `<<` `>>` | `ToInt32` left, `ToUInt32` right |
//! | `>>>` | `ToUInt32` |
//! | `&` `\|` `^` `~` | `ToInt32` |
//! | `!`, conditions | `ToBoolean` |
//! | indexer container | `ToObject` |
//! | callee | `ToFunction` |
//!
//! Conversions are idempotent: converting a node that already is the same
//! conversion returns it unchanged. A guarded cast is only placed on reads,
//! calls and indexers, whose type is known only at runtime.

use tracing::trace;

use crate::lexer::NumericValue;
use crate::scope::{ScopeId, ScopeKind, ScopeTable, SymbolId, SymbolKind};

use super::{
    BinaryOp, Catch, Conversion, Declaration, FunctionId, FunctionMetadata, Graph, Intrinsic,
    Invocation, LogicalOp, NodeId, NodeKind, Program, Property, PropertyKind, UnaryOp, UseOutcome,
};

/// Name that makes a call a direct eval.
const EVAL: &str = "eval";

/// Assignment operators, `=` and the compound forms.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    Assign,
    Multiply,
    Divide,
    Remainder,
    Addition,
    Subtraction,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies.
    pub fn binary(self) -> Option<BinaryOp> {
        Some(match self {
            AssignmentOperator::Assign => return None,
            AssignmentOperator::Multiply => BinaryOp::Multiply,
            AssignmentOperator::Divide => BinaryOp::Divide,
            AssignmentOperator::Remainder => BinaryOp::Remainder,
            AssignmentOperator::Addition => BinaryOp::Addition,
            AssignmentOperator::Subtraction => BinaryOp::Subtraction,
            AssignmentOperator::LeftShift => BinaryOp::LeftShift,
            AssignmentOperator::RightShift => BinaryOp::RightShift,
            AssignmentOperator::UnsignedRightShift => BinaryOp::UnsignedRightShift,
            AssignmentOperator::BitwiseAnd => BinaryOp::BitwiseAnd,
            AssignmentOperator::BitwiseXor => BinaryOp::BitwiseXor,
            AssignmentOperator::BitwiseOr => BinaryOp::BitwiseOr,
        })
    }
}

/// Left side of a `for-in` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForInTarget {
    /// `for (var x in ...)`: the declaration statement.
    Declaration(NodeId),
    /// `for (lhs in ...)`: the left-hand-side expression.
    Expression(NodeId),
}

/// Clause of a `switch` statement as parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchClause {
    /// The `case` expression, `None` for `default`.
    pub test: Option<NodeId>,
    /// Block of the clause's statements.
    pub body: NodeId,
}

/// Node builder for one parse.
#[derive(Debug, Default)]
pub struct Factory {
    graph: Graph,
    scopes: ScopeTable,
    functions: Vec<FunctionMetadata>,
}

impl Factory {
    /// Creates a factory with empty arenas.
    pub fn new() -> Self {
        Self::default()
    }

    /// The node arena.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The scope table.
    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    /// The scope table, mutably.
    pub fn scopes_mut(&mut self) -> &mut ScopeTable {
        &mut self.scopes
    }

    /// Allocates a node and records it as the user of each child.
    fn make(&mut self, kind: NodeKind, offset: Option<usize>) -> NodeId {
        let id = self.graph.add(kind, offset);
        for child in self.graph.children(id) {
            match self.graph.add_user(child, id) {
                UseOutcome::Direct => {}
                UseOutcome::Temporary(temporary) => self.graph.replace(id, child, temporary),
            }
        }
        id
    }

    fn offset(&self, id: NodeId) -> Option<usize> {
        self.graph.node(id).offset
    }

    /// Returns true for nodes produced by the left-hand-side grammar level.
    pub fn is_left_hand_side(&self, id: NodeId) -> bool {
        matches!(
            self.graph.kind(id),
            NodeKind::ReadIdentifier(_)
                | NodeKind::ReadIndexer { .. }
                | NodeKind::ReadProperty { .. }
                | NodeKind::Paren(_)
                | NodeKind::Call { .. }
                | NodeKind::New { .. }
                | NodeKind::Function { .. }
                | NodeKind::This
                | NodeKind::Null
                | NodeKind::Boolean(_)
                | NodeKind::Number(_)
                | NodeKind::String(_)
                | NodeKind::Regex { .. }
                | NodeKind::Array(_)
                | NodeKind::Object(_)
        )
    }

    /// Looks through any nesting of parens and guarded casts.
    fn equivalent(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Paren(inner) | NodeKind::GuardedCast(inner) = *self.graph.kind(id) {
            id = inner;
        }
        id
    }

    /// Looks through any nesting of parens.
    ///
    /// Use edges are left alone: giving the content a second user goes
    /// through a temporary like any other reuse.
    fn peel_parens(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Paren(inner) = *self.graph.kind(id) {
            id = inner;
        }
        id
    }

    // Statements.

    /// `{ statements }`.
    pub fn block(&mut self, statements: Vec<NodeId>, offset: usize) -> NodeId {
        self.make(NodeKind::Block(statements), Some(offset))
    }

    /// `;`.
    pub fn empty(&mut self, offset: usize) -> NodeId {
        self.make(NodeKind::Empty, Some(offset))
    }

    /// `debugger;`, which has no effect here.
    pub fn debugger(&mut self, offset: usize) -> NodeId {
        self.empty(offset)
    }

    /// An expression evaluated for effect.
    pub fn expression_statement(&mut self, expression: NodeId) -> NodeId {
        let offset = self.offset(expression);
        self.make(NodeKind::ExpressionStatement(expression), offset)
    }

    /// One `var` binding. The symbol is hoisted to the function scope.
    pub fn declaration(&mut self, symbol: SymbolId, initializer: Option<NodeId>) -> Declaration {
        self.scopes.declare_hoisted_local(symbol);
        let initializer = initializer.map(|value| {
            let offset = self.offset(value);
            self.write_identifier(symbol, value, offset)
        });
        Declaration {
            symbol,
            initializer,
        }
    }

    /// `var declarations;`.
    pub fn variable_declaration(&mut self, declarations: Vec<Declaration>, offset: usize) -> NodeId {
        self.make(NodeKind::VariableDeclaration(declarations), Some(offset))
    }

    /// `if (condition) then else otherwise`.
    pub fn if_statement(
        &mut self,
        condition: NodeId,
        then: NodeId,
        otherwise: Option<NodeId>,
        offset: usize,
    ) -> NodeId {
        let condition = self.to_boolean(condition);
        self.make(
            NodeKind::If {
                condition,
                then,
                otherwise,
            },
            Some(offset),
        )
    }

    /// `do body while (condition)`.
    pub fn do_while(&mut self, scope: ScopeId, body: NodeId, condition: NodeId, offset: usize) -> NodeId {
        self.scopes.scope_mut(scope).flags.has_loop = true;
        let condition = self.to_boolean(condition);
        self.make(NodeKind::DoWhile { body, condition }, Some(offset))
    }

    /// `while (condition) body`.
    pub fn while_statement(&mut self, scope: ScopeId, condition: NodeId, body: NodeId, offset: usize) -> NodeId {
        self.scopes.scope_mut(scope).flags.has_loop = true;
        let condition = self.to_boolean(condition);
        self.make(NodeKind::While { condition, body }, Some(offset))
    }

    /// `for (initialization; condition; increment) body`.
    pub fn for_statement(
        &mut self,
        scope: ScopeId,
        initialization: Option<NodeId>,
        condition: Option<NodeId>,
        increment: Option<NodeId>,
        body: NodeId,
        offset: usize,
    ) -> NodeId {
        self.scopes.scope_mut(scope).flags.has_loop = true;
        let condition = condition.map(|c| self.to_boolean(c));
        self.make(
            NodeKind::For {
                initialization,
                condition,
                increment,
                body,
            },
            Some(offset),
        )
    }

    /// `for (target in expression) body`, lowered onto a property-name
    /// enumerator.
    ///
    /// The loop condition advances the enumerator and the body is prefixed
    /// with an assignment of the current name to the target.
    pub fn for_in(
        &mut self,
        scope: ScopeId,
        target: ForInTarget,
        expression: NodeId,
        body: NodeId,
        offset: usize,
    ) -> NodeId {
        self.scopes.scope_mut(scope).flags.has_loop = true;
        let at = Some(offset);

        let container = self.to_object(expression);
        let iterator = self.make(
            NodeKind::InternalNew {
                intrinsic: Intrinsic::PropertyNameEnumerator,
                arguments: vec![container],
            },
            at,
        );
        let iterator_initialization = self.expression_statement(iterator);

        let move_next = self.make(
            NodeKind::InternalCall {
                intrinsic: Intrinsic::EnumeratorMoveNext,
                arguments: vec![iterator],
            },
            at,
        );
        let condition = self.to_boolean(move_next);

        let current = self.make(
            NodeKind::InternalCall {
                intrinsic: Intrinsic::EnumeratorCurrent,
                arguments: vec![iterator],
            },
            at,
        );
        let current = self.to_string(current);

        let (initialization, assignment) = match target {
            ForInTarget::Declaration(statement) => {
                let symbol = match self.graph.kind(statement) {
                    NodeKind::VariableDeclaration(declarations) if !declarations.is_empty() => {
                        declarations[0].symbol
                    }
                    other => panic!("for-in declaration is {other:?}"),
                };
                (Some(statement), self.write_identifier(symbol, current, at))
            }
            ForInTarget::Expression(target) => {
                let assignment = match self.write_reference(target, current, at) {
                    Some(write) => write,
                    None => self.reference_error(target, current, at),
                };
                (None, assignment)
            }
        };

        let assignment = self.expression_statement(assignment);
        let extended_body = self.block(vec![assignment, body], offset);
        self.make(
            NodeKind::ForIn {
                initialization,
                iterator_initialization,
                condition,
                body: extended_body,
            },
            at,
        )
    }

    /// `continue label;`.
    pub fn continue_statement(&mut self, label: Option<String>, offset: usize) -> NodeId {
        self.make(NodeKind::Continue(label), Some(offset))
    }

    /// `break label;`.
    pub fn break_statement(&mut self, label: Option<String>, offset: usize) -> NodeId {
        self.make(NodeKind::Break(label), Some(offset))
    }

    /// `return value;`, registered on `scope`.
    pub fn return_statement(&mut self, scope: ScopeId, value: Option<NodeId>, offset: usize) -> NodeId {
        let id = self.make(NodeKind::Return(value), Some(offset));
        self.scopes.scope_mut(scope).returns.push(id);
        id
    }

    /// `with (object) body`.
    pub fn with_statement(&mut self, object: NodeId, body: NodeId, offset: usize) -> NodeId {
        self.make(NodeKind::With { object, body }, Some(offset))
    }

    /// `switch (expression) { clauses }`.
    ///
    /// Each `case` compares strictly against the discriminant, which is
    /// shared through a temporary.
    pub fn switch_statement(&mut self, expression: NodeId, clauses: Vec<SwitchClause>, offset: usize) -> NodeId {
        let clauses = clauses
            .into_iter()
            .map(|clause| {
                let comparison = clause
                    .test
                    .map(|test| self.binary(BinaryOp::Same, expression, test, self.offset(test)));
                let at = self.offset(clause.body);
                self.make(
                    NodeKind::CaseClause {
                        comparison,
                        body: clause.body,
                    },
                    at,
                )
            })
            .collect();
        self.make(
            NodeKind::Switch {
                expression,
                clauses,
            },
            Some(offset),
        )
    }

    /// `label: body`.
    pub fn label(&mut self, name: String, body: NodeId, offset: usize) -> NodeId {
        self.make(NodeKind::Label { name, body }, Some(offset))
    }

    /// `throw value;`.
    pub fn throw_statement(&mut self, value: NodeId, offset: usize) -> NodeId {
        self.make(NodeKind::Throw(value), Some(offset))
    }

    /// The `catch (symbol) body` of a try statement.
    ///
    /// The exception variable is local to the catch scope and never hoisted.
    pub fn catch_clause(&mut self, scope: ScopeId, symbol: SymbolId, body: NodeId) -> Catch {
        assert_eq!(
            self.scopes.symbol(symbol).scope,
            scope,
            "catch variable must belong to the catch scope"
        );
        self.scopes.symbol_mut(symbol).kind = SymbolKind::Local;
        Catch {
            scope,
            symbol,
            body,
        }
    }

    /// `try body catch finally`.
    pub fn try_statement(
        &mut self,
        body: NodeId,
        catch: Option<Catch>,
        finally: Option<NodeId>,
        offset: usize,
    ) -> NodeId {
        self.make(
            NodeKind::Try {
                body,
                catch,
                finally,
            },
            Some(offset),
        )
    }

    // Primary expressions.

    /// `this`.
    pub fn this(&mut self, scope: ScopeId, offset: usize) -> NodeId {
        self.scopes.scope_mut(scope).flags.has_this_symbol = true;
        self.make(NodeKind::This, Some(offset))
    }

    /// `null`.
    pub fn null(&mut self, offset: usize) -> NodeId {
        self.make(NodeKind::Null, Some(offset))
    }

    /// `true` or `false`.
    pub fn boolean(&mut self, value: bool, offset: usize) -> NodeId {
        self.make(NodeKind::Boolean(value), Some(offset))
    }

    /// A numeric literal.
    pub fn number(&mut self, value: NumericValue, offset: usize) -> NodeId {
        self.make(NodeKind::Number(value), Some(offset))
    }

    /// A string literal.
    pub fn string(&mut self, value: String, offset: usize) -> NodeId {
        self.make(NodeKind::String(value), Some(offset))
    }

    /// A regular-expression literal.
    pub fn regex(&mut self, pattern: String, flags: String, offset: usize) -> NodeId {
        self.make(NodeKind::Regex { pattern, flags }, Some(offset))
    }

    /// An array literal; `None` items are holes.
    pub fn array(&mut self, items: Vec<Option<NodeId>>, offset: usize) -> NodeId {
        self.make(NodeKind::Array(items), Some(offset))
    }

    /// `name: value` in an object literal.
    pub fn property(&mut self, name: String, value: NodeId) -> Property {
        Property {
            name,
            kind: PropertyKind::Data,
            value,
        }
    }

    /// `get name() { body }`.
    pub fn getter(&mut self, scope: ScopeId, name: String, body: NodeId, inner: ScopeId, offset: usize) -> Property {
        let symbol = self.scopes.get_or_add_symbol(inner, &name);
        let function = self.function_expression(Some(scope), Some(symbol), Vec::new(), body, inner, offset);
        Property {
            name,
            kind: PropertyKind::Getter,
            value: function,
        }
    }

    /// `set name(parameter) { body }`.
    pub fn setter(
        &mut self,
        scope: ScopeId,
        name: String,
        parameter: SymbolId,
        body: NodeId,
        inner: ScopeId,
        offset: usize,
    ) -> Property {
        let symbol = self.scopes.get_or_add_symbol(inner, &name);
        let function =
            self.function_expression(Some(scope), Some(symbol), vec![parameter], body, inner, offset);
        Property {
            name,
            kind: PropertyKind::Setter,
            value: function,
        }
    }

    /// An object literal.
    pub fn object(&mut self, properties: Vec<Property>, offset: usize) -> NodeId {
        self.make(NodeKind::Object(properties), Some(offset))
    }

    /// `( expression )`.
    pub fn paren(&mut self, expression: NodeId, offset: usize) -> NodeId {
        self.make(NodeKind::Paren(expression), Some(offset))
    }

    /// A reference to `name`, resolved against `scope`.
    pub fn identifier(&mut self, scope: ScopeId, name: &str, offset: usize) -> NodeId {
        let symbol = self.scopes.get_or_add_symbol(scope, name);
        self.make(NodeKind::ReadIdentifier(symbol), Some(offset))
    }

    /// `container[index]` or `container.name`.
    ///
    /// A string key that does not read as an integer becomes a property
    /// read, since integer strings index arrays.
    pub fn indexer(&mut self, container: NodeId, index: NodeId, offset: usize) -> NodeId {
        let container = self.to_object(container);
        let is_property = match self.graph.kind(index) {
            NodeKind::String(key) => key.parse::<i32>().is_err(),
            _ => false,
        };
        let kind = if is_property {
            NodeKind::ReadProperty { container, index }
        } else {
            NodeKind::ReadIndexer { container, index }
        };
        self.make(kind, Some(offset))
    }

    // Conversions.

    fn guarded_cast(&mut self, expression: NodeId) -> NodeId {
        let expression = self.peel_parens(expression);
        match self.graph.kind(expression) {
            NodeKind::ReadIdentifier(_)
            | NodeKind::Call { .. }
            | NodeKind::ReadIndexer { .. }
            | NodeKind::ReadProperty { .. } => {
                let offset = self.offset(expression);
                self.make(NodeKind::GuardedCast(expression), offset)
            }
            _ => expression,
        }
    }

    fn convert(&mut self, conversion: Conversion, expression: NodeId, guarded: bool) -> NodeId {
        if matches!(self.graph.kind(expression), NodeKind::Convert { conversion: c, .. } if *c == conversion)
        {
            return expression;
        }
        let operand = if guarded {
            self.guarded_cast(expression)
        } else {
            expression
        };
        let offset = self.offset(operand);
        self.make(NodeKind::Convert { conversion, operand }, offset)
    }

    /// `ToBoolean(expression)`.
    pub fn to_boolean(&mut self, expression: NodeId) -> NodeId {
        self.convert(Conversion::ToBoolean, expression, true)
    }

    /// `ToNumber(expression)`.
    pub fn to_number(&mut self, expression: NodeId) -> NodeId {
        self.convert(Conversion::ToNumber, expression, true)
    }

    /// `ToDouble(expression)`.
    pub fn to_double(&mut self, expression: NodeId) -> NodeId {
        self.convert(Conversion::ToDouble, expression, true)
    }

    /// `ToInt32(expression)`.
    pub fn to_int32(&mut self, expression: NodeId) -> NodeId {
        self.convert(Conversion::ToInt32, expression, false)
    }

    /// `ToUInt32(expression)`.
    pub fn to_uint32(&mut self, expression: NodeId) -> NodeId {
        self.convert(Conversion::ToUInt32, expression, true)
    }

    /// `ToString(expression)`.
    pub fn to_string(&mut self, expression: NodeId) -> NodeId {
        self.convert(Conversion::ToString, expression, true)
    }

    /// `ToObject(expression)`.
    pub fn to_object(&mut self, expression: NodeId) -> NodeId {
        self.convert(Conversion::ToObject, expression, true)
    }

    /// `ToFunction(expression)`.
    pub fn to_function(&mut self, expression: NodeId) -> NodeId {
        self.convert(Conversion::ToFunction, expression, true)
    }

    // Operators.

    /// A prefix operator other than `++` and `--`.
    pub fn unary(&mut self, op: UnaryOp, operand: NodeId, offset: usize) -> NodeId {
        let operand = match op {
            UnaryOp::BitwiseNot => self.to_int32(operand),
            UnaryOp::LogicalNot => self.to_boolean(operand),
            UnaryOp::Delete | UnaryOp::Void | UnaryOp::Typeof | UnaryOp::Positive | UnaryOp::Negative => {
                operand
            }
        };
        self.make(NodeKind::Unary { op, operand }, Some(offset))
    }

    /// A binary operator with its operand conversions.
    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId, offset: Option<usize>) -> NodeId {
        let (left, right) = match op {
            BinaryOp::Multiply
            | BinaryOp::Addition
            | BinaryOp::Subtraction
            | BinaryOp::Same
            | BinaryOp::NotSame => {
                let left = self.guarded_cast(left);
                (left, self.guarded_cast(right))
            }
            BinaryOp::Divide | BinaryOp::Remainder => {
                let left = self.to_double(left);
                (left, self.to_double(right))
            }
            BinaryOp::LeftShift | BinaryOp::RightShift => {
                let left = self.to_int32(left);
                (left, self.to_uint32(right))
            }
            BinaryOp::UnsignedRightShift => {
                let left = self.to_uint32(left);
                (left, self.to_uint32(right))
            }
            BinaryOp::BitwiseAnd | BinaryOp::BitwiseOr | BinaryOp::BitwiseXor => {
                let left = self.to_int32(left);
                (left, self.to_int32(right))
            }
            BinaryOp::Lesser
            | BinaryOp::Greater
            | BinaryOp::LesserOrEqual
            | BinaryOp::GreaterOrEqual
            | BinaryOp::InstanceOf
            | BinaryOp::In
            | BinaryOp::Equal
            | BinaryOp::NotEqual => (left, right),
        };
        self.make(NodeKind::Binary { op, left, right }, offset)
    }

    /// `left && right` or `left || right` as a ternary over `left`.
    pub fn logical(&mut self, op: LogicalOp, left: NodeId, right: NodeId, offset: usize) -> NodeId {
        let implementation = match op {
            LogicalOp::And => self.ternary(left, right, left, offset),
            LogicalOp::Or => self.ternary(left, left, right, offset),
        };
        self.make(
            NodeKind::Logical {
                op,
                left,
                right,
                implementation,
            },
            Some(offset),
        )
    }

    /// `condition ? then : otherwise`.
    pub fn ternary(&mut self, condition: NodeId, then: NodeId, otherwise: NodeId, offset: usize) -> NodeId {
        let condition = self.to_boolean(condition);
        self.make(
            NodeKind::Ternary {
                condition,
                then,
                otherwise,
            },
            Some(offset),
        )
    }

    /// `a, b, c`.
    pub fn comma(&mut self, expressions: Vec<NodeId>, offset: Option<usize>) -> NodeId {
        self.make(NodeKind::Comma(expressions), offset)
    }

    /// `left op= right`, rewritten as a plain write of `left op right`.
    ///
    /// A target that is not a reference becomes a runtime `ReferenceError`.
    pub fn assignment(&mut self, op: AssignmentOperator, left: NodeId, right: NodeId, offset: usize) -> NodeId {
        let at = Some(offset);
        if !self.is_reference(left) {
            return self.reference_error(left, right, at);
        }

        let value = match op.binary() {
            None => right,
            Some(binary) => self.binary(binary, left, right, at),
        };
        match self.write_reference(left, value, at) {
            Some(write) => write,
            None => self.reference_error(left, value, at),
        }
    }

    /// `++x` or `--x`.
    pub fn prefix_update(&mut self, increment: bool, operand: NodeId, offset: usize) -> NodeId {
        let update = self.update(increment, operand, offset).0;
        self.comma(vec![update], Some(offset))
    }

    /// `x++` or `x--`, yielding the old numeric value.
    pub fn postfix_update(&mut self, increment: bool, operand: NodeId, offset: usize) -> NodeId {
        let (update, old_value) = self.update(increment, operand, offset);
        self.comma(vec![update, old_value], Some(offset))
    }

    fn update(&mut self, increment: bool, operand: NodeId, offset: usize) -> (NodeId, NodeId) {
        let old_value = self.to_number(operand);
        let one = self.make(NodeKind::Number(NumericValue::Int(1)), Some(offset));
        let op = if increment {
            BinaryOp::Addition
        } else {
            BinaryOp::Subtraction
        };
        let new_value = self.binary(op, old_value, one, Some(offset));
        let update = self.assignment(AssignmentOperator::Assign, operand, new_value, offset);
        (update, old_value)
    }

    fn is_reference(&self, id: NodeId) -> bool {
        matches!(
            self.graph.kind(self.equivalent(id)),
            NodeKind::ReadIdentifier(_) | NodeKind::ReadIndexer { .. } | NodeKind::ReadProperty { .. }
        )
    }

    /// Builds the write form of a read reference.
    fn write_reference(&mut self, target: NodeId, value: NodeId, offset: Option<usize>) -> Option<NodeId> {
        let target = self.peel_parens(target);
        match *self.graph.kind(target) {
            NodeKind::ReadIdentifier(symbol) => Some(self.write_identifier(symbol, value, offset)),
            NodeKind::ReadIndexer { container, index } | NodeKind::ReadProperty { container, index } => {
                if self.graph.node(target).user.is_none() {
                    // The read is discarded; its operands move to the write.
                    self.graph.remove_user(container, target);
                    self.graph.remove_user(index, target);
                }
                Some(self.write_indexer(container, index, value, offset))
            }
            _ => None,
        }
    }

    fn write_identifier(&mut self, symbol: SymbolId, value: NodeId, offset: Option<usize>) -> NodeId {
        let value = self.guarded_cast(value);
        self.make(NodeKind::WriteIdentifier { symbol, value }, offset)
    }

    fn write_indexer(&mut self, container: NodeId, index: NodeId, value: NodeId, offset: Option<usize>) -> NodeId {
        let container = self.to_object(container);
        let kind = if matches!(self.graph.kind(index), NodeKind::String(_)) {
            NodeKind::WriteProperty {
                container,
                index,
                value,
            }
        } else {
            NodeKind::WriteIndexer {
                container,
                index,
                value,
            }
        };
        self.make(kind, offset)
    }

    fn reference_error(&mut self, left: NodeId, right: NodeId, offset: Option<usize>) -> NodeId {
        let error = self.make(
            NodeKind::InternalCall {
                intrinsic: Intrinsic::ReferenceError,
                arguments: Vec::new(),
            },
            offset,
        );
        self.comma(vec![left, right, error], offset)
    }

    // Invocations.

    /// `callee(arguments)`.
    ///
    /// A method call passes its container as `this`; a call of the bare
    /// identifier `eval` is a direct eval and marks `scope`.
    pub fn call(&mut self, scope: ScopeId, callee: NodeId, arguments: Vec<NodeId>, offset: usize) -> NodeId {
        self.scopes.scope_mut(scope).flags.has_call = true;
        let callee = self.to_function(callee);
        let operand = match *self.graph.kind(callee) {
            NodeKind::Convert { operand, .. } => operand,
            _ => callee,
        };

        let mut this_arg = None;
        let mut is_direct_eval = false;
        match *self.graph.kind(self.equivalent(operand)) {
            NodeKind::ReadIndexer { container, .. } | NodeKind::ReadProperty { container, .. } => {
                this_arg = Some(container);
            }
            NodeKind::ReadIdentifier(symbol) if self.scopes.symbol(symbol).name == EVAL => {
                is_direct_eval = true;
                self.scopes.scope_mut(scope).flags.has_eval = true;
            }
            _ => {}
        }

        let id = self.make(
            NodeKind::Call {
                callee,
                this_arg,
                arguments,
                is_direct_eval,
                invocation: Invocation::default(),
            },
            Some(offset),
        );
        self.scopes.scope_mut(scope).invocations.push(id);
        id
    }

    /// `new callee(arguments)`.
    pub fn new_expression(&mut self, scope: ScopeId, callee: NodeId, arguments: Vec<NodeId>, offset: usize) -> NodeId {
        self.scopes.scope_mut(scope).flags.has_call = true;
        let callee = self.to_function(callee);
        let id = self.make(
            NodeKind::New {
                callee,
                arguments,
                invocation: Invocation::default(),
            },
            Some(offset),
        );
        self.scopes.scope_mut(scope).invocations.push(id);
        id
    }

    // Functions.

    /// A function whose body was parsed in `inner`.
    ///
    /// Parameters become locals of `inner` with their declaration index. A
    /// declaration's name is hoisted into the enclosing scope; an
    /// expression's name is local to `inner`. The new function is recorded
    /// as a sub-function of the nearest enclosing function scope.
    pub fn function_expression(
        &mut self,
        scope: Option<ScopeId>,
        name: Option<SymbolId>,
        parameters: Vec<SymbolId>,
        body: NodeId,
        inner: ScopeId,
        offset: usize,
    ) -> NodeId {
        for (index, &parameter) in parameters.iter().enumerate() {
            let symbol = self.scopes.symbol_mut(parameter);
            assert_eq!(symbol.scope, inner, "parameter {} is not declared in its function", symbol.name);
            symbol.kind = SymbolKind::Local;
            symbol.parameter_index = Some(index);
        }

        match self.scopes.scope(inner).kind {
            ScopeKind::FunctionDeclaration => {
                let name = name.unwrap_or_else(|| panic!("function declaration in {inner:?} has no name"));
                self.scopes.declare_hoisted_local(name);
            }
            ScopeKind::Program => assert!(name.is_none(), "program cannot have a name"),
            ScopeKind::Function => {
                if let Some(name) = name {
                    self.scopes.symbol_mut(name).kind = SymbolKind::Local;
                }
            }
            ScopeKind::Block => panic!("function body parsed in block scope {inner:?}"),
        }

        let function = FunctionId(self.functions.len());
        let node = self.make(NodeKind::Function { function, body }, Some(offset));

        let sub_functions = self.scopes.scope(inner).sub_functions.clone();
        for &sub in &sub_functions {
            self.functions[sub.0].parent = Some(function);
        }
        self.functions.push(FunctionMetadata {
            node,
            scope: inner,
            name,
            parameters,
            parent: None,
            sub_functions,
        });
        self.scopes.scope_mut(inner).function = Some(function);

        if let Some(scope) = scope {
            let owner = self.scopes.function_scope_of(scope);
            self.scopes.scope_mut(owner).sub_functions.push(function);
        }
        trace!(function = function.0, scope = inner.index(), "built function");
        node
    }

    /// `function name(parameters) { body }` as a statement.
    pub fn function_declaration(
        &mut self,
        scope: ScopeId,
        name: SymbolId,
        parameters: Vec<SymbolId>,
        body: NodeId,
        inner: ScopeId,
        offset: usize,
    ) -> NodeId {
        let function = self.function_expression(Some(scope), Some(name), parameters, body, inner, offset);
        let assignment = self.write_identifier(name, function, Some(offset));
        self.make(
            NodeKind::FunctionDeclaration {
                function,
                assignment,
            },
            Some(offset),
        )
    }

    /// Finishes a parse: wraps `body` as the program's function and
    /// resolves free symbols.
    pub fn program(mut self, scope: ScopeId, body: NodeId) -> Program {
        assert!(self.scopes.scope(scope).is_program(), "{scope:?} is not a program scope");
        let offset = self.offset(body).unwrap_or(0);
        self.function_expression(None, None, Vec::new(), body, scope, offset);
        let root = FunctionId(self.functions.len() - 1);
        self.scopes.resolve_free_symbols();
        Program {
            graph: self.graph,
            scopes: self.scopes,
            functions: self.functions,
            root,
        }
    }
}
