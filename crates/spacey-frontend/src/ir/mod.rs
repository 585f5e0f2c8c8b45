//! Intermediate representation produced by the parser.
//!
//! Every node of a parse lives in one [`Graph`] arena and is addressed by a
//! [`NodeId`]. Node kinds form the closed [`NodeKind`] sum type, so a pass is
//! a `match` over it rather than a class hierarchy.
//!
//! ## Single-user rule
//!
//! An expression has at most one user. When an expression that already has a
//! user gains a second one, [`Graph::add_user`] interposes a
//! `WriteTemporary` between the expression and its first user and reports
//! [`UseOutcome::Temporary`]; the new user must then refer to the temporary
//! instead. A temporary is the only node allowed to have several users.
//!
//! ## Structure
//!
//! - `mod.rs` - `Graph`, `Node`, `NodeKind` and the edge-editing operations
//! - `factory.rs` - builds nodes from matched syntax, inserting conversions
//! - `visitor.rs` - traversal contract for downstream passes
//! - `dump.rs` - indented textual rendering
//! - `verify.rs` - single-user invariant checker

pub mod dump;
pub mod factory;
pub mod verify;
pub mod visitor;

use tracing::trace;

use crate::lexer::NumericValue;
use crate::scope::{ScopeId, ScopeTable, SymbolId};

pub use factory::{AssignmentOperator, Factory};

/// Handle to a [`Node`] in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a [`FunctionMetadata`] in a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(usize);

impl FunctionId {
    /// Position of the function in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Static type of an expression's value.
///
/// Always [`ValueType::Unknown`] after parsing; type inference fills it in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueType {
    /// Not yet inferred.
    #[default]
    Unknown,
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// A boolean.
    Boolean,
    /// A single UTF-16 code unit.
    Char,
    /// A signed 32-bit integer.
    Int,
    /// An unsigned 32-bit integer.
    UInt,
    /// A double.
    Double,
    /// Any number.
    Number,
    /// A string.
    String,
    /// An object.
    Object,
    /// A function object.
    Function,
    /// An array object.
    Array,
    /// Anything, checked at runtime.
    Dynamic,
}

/// Implicit type conversions from ECMA-262 section 9.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    ToPrimitive,
    ToBoolean,
    ToNumber,
    ToDouble,
    ToInteger,
    ToInt32,
    ToUInt32,
    ToUInt16,
    ToString,
    ToObject,
    ToFunction,
}

/// Unary operators.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Delete,
    Void,
    Typeof,
    Positive,
    Negative,
    BitwiseNot,
    LogicalNot,
}

/// Binary operators other than the logical ones.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Remainder,
    Addition,
    Subtraction,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    Lesser,
    Greater,
    LesserOrEqual,
    GreaterOrEqual,
    InstanceOf,
    In,
    Equal,
    NotEqual,
    Same,
    NotSame,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

impl BinaryOp {
    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Addition => "+",
            BinaryOp::Subtraction => "-",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::UnsignedRightShift => ">>>",
            BinaryOp::Lesser => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LesserOrEqual => "<=",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::InstanceOf => "instanceof",
            BinaryOp::In => "in",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Same => "===",
            BinaryOp::NotSame => "!==",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
        }
    }
}

/// Short-circuit operators.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Runtime helpers the IR calls into directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// Constructs a property-name enumerator over an object.
    PropertyNameEnumerator,
    /// Advances an enumerator, yielding whether a name is available.
    EnumeratorMoveNext,
    /// The enumerator's current property name.
    EnumeratorCurrent,
    /// Throws a `ReferenceError`.
    ReferenceError,
}

/// Kind of an object-literal property.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Data,
    Getter,
    Setter,
}

/// One property of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name as a string.
    pub name: String,
    /// Data value or accessor.
    pub kind: PropertyKind,
    /// The value expression, or the accessor's function node.
    pub value: NodeId,
}

/// Annotation slots on calls and `new` read by a profiler or JIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    /// Profile slot, `-1` until assigned.
    pub profile_index: i32,
    /// Statically known callee.
    pub target_function: Option<FunctionId>,
}

impl Default for Invocation {
    fn default() -> Self {
        Self {
            profile_index: -1,
            target_function: None,
        }
    }
}

/// One binding of a `var` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Declared symbol, as referenced in its own scope.
    pub symbol: SymbolId,
    /// `WriteIdentifier` node for the initializer.
    pub initializer: Option<NodeId>,
}

/// The `catch` part of a `try` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    /// Block scope binding the exception.
    pub scope: ScopeId,
    /// The exception variable, local to `scope`.
    pub symbol: SymbolId,
    /// Handler body.
    pub body: NodeId,
}

/// Every node kind in the graph.
///
/// Fields holding a [`NodeId`] are owning edges unless documented as mirrors.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Literals and primaries.
    /// Numeric literal.
    Number(NumericValue),
    /// String literal, cooked.
    String(String),
    /// `true` or `false`.
    Boolean(bool),
    /// `null`.
    Null,
    /// Regular-expression literal.
    Regex {
        /// Pattern text.
        pattern: String,
        /// Flag letters.
        flags: String,
    },
    /// `this`.
    This,
    /// Array literal. `None` entries are holes.
    Array(Vec<Option<NodeId>>),
    /// Object literal.
    Object(Vec<Property>),
    /// A function expression, getter, setter or declaration body.
    Function {
        /// Metadata of the function.
        function: FunctionId,
        /// Body block.
        body: NodeId,
    },

    // References.
    /// Reads a variable.
    ReadIdentifier(SymbolId),
    /// Writes a variable, yielding the value.
    WriteIdentifier {
        /// Target symbol.
        symbol: SymbolId,
        /// Written value.
        value: NodeId,
    },
    /// `container[index]` with a computed index.
    ReadIndexer {
        /// Object operand.
        container: NodeId,
        /// Key operand.
        index: NodeId,
    },
    /// `container.name`, or a string key that is not an integer.
    ReadProperty {
        /// Object operand.
        container: NodeId,
        /// String key.
        index: NodeId,
    },
    /// `container[index] = value`.
    WriteIndexer {
        /// Object operand.
        container: NodeId,
        /// Key operand.
        index: NodeId,
        /// Written value.
        value: NodeId,
    },
    /// `container.name = value`.
    WriteProperty {
        /// Object operand.
        container: NodeId,
        /// String key.
        index: NodeId,
        /// Written value.
        value: NodeId,
    },

    // Operators.
    /// Parenthesized expression.
    Paren(NodeId),
    /// Marks an operand whose type is only known at runtime.
    GuardedCast(NodeId),
    /// Implicit conversion.
    Convert {
        /// Target type.
        conversion: Conversion,
        /// Converted value.
        operand: NodeId,
    },
    /// Unary operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: NodeId,
    },
    /// Binary operator.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
    /// `&&` or `||`, implemented by a ternary.
    Logical {
        /// Operator.
        op: LogicalOp,
        /// Mirror of the left operand as written; not an owning edge.
        left: NodeId,
        /// Mirror of the right operand as written; not an owning edge.
        right: NodeId,
        /// The equivalent `Ternary`.
        implementation: NodeId,
    },
    /// `condition ? then : otherwise`.
    Ternary {
        /// `ToBoolean` of the test.
        condition: NodeId,
        /// Value when true.
        then: NodeId,
        /// Value when false.
        otherwise: NodeId,
    },
    /// Comma operator; yields the last value.
    Comma(Vec<NodeId>),
    /// Function call.
    Call {
        /// `ToFunction` of the callee.
        callee: NodeId,
        /// Receiver of a method call.
        this_arg: Option<NodeId>,
        /// Arguments in order.
        arguments: Vec<NodeId>,
        /// Callee is the bare identifier `eval`.
        is_direct_eval: bool,
        /// Profiler annotations.
        invocation: Invocation,
    },
    /// `new callee(arguments)`.
    New {
        /// `ToFunction` of the constructor.
        callee: NodeId,
        /// Arguments in order.
        arguments: Vec<NodeId>,
        /// Profiler annotations.
        invocation: Invocation,
    },
    /// Call of a runtime helper.
    InternalCall {
        /// Helper.
        intrinsic: Intrinsic,
        /// Arguments in order.
        arguments: Vec<NodeId>,
    },
    /// Construction of a runtime helper object.
    InternalNew {
        /// Helper.
        intrinsic: Intrinsic,
        /// Arguments in order.
        arguments: Vec<NodeId>,
    },
    /// Evaluates `value` once and shares the result among several users.
    WriteTemporary {
        /// The shared expression.
        value: NodeId,
        /// Every user, first one first.
        users: Vec<NodeId>,
    },

    // Statements.
    /// `{ ... }`.
    Block(Vec<NodeId>),
    /// `;` and `debugger;`.
    Empty,
    /// An expression evaluated for effect.
    ExpressionStatement(NodeId),
    /// `var a = 1, b;`.
    VariableDeclaration(Vec<Declaration>),
    /// `if`.
    If {
        /// `ToBoolean` of the test.
        condition: NodeId,
        /// Taken branch.
        then: NodeId,
        /// `else` branch.
        otherwise: Option<NodeId>,
    },
    /// `do body while (condition)`.
    DoWhile {
        /// Loop body.
        body: NodeId,
        /// `ToBoolean` of the test.
        condition: NodeId,
    },
    /// `while (condition) body`.
    While {
        /// `ToBoolean` of the test.
        condition: NodeId,
        /// Loop body.
        body: NodeId,
    },
    /// Three-clause `for`.
    For {
        /// Statement run once before the loop.
        initialization: Option<NodeId>,
        /// `ToBoolean` of the test.
        condition: Option<NodeId>,
        /// Expression run after each iteration.
        increment: Option<NodeId>,
        /// Loop body.
        body: NodeId,
    },
    /// Lowered `for (x in object)`.
    ForIn {
        /// The `var` declaration of the loop variable, if any.
        initialization: Option<NodeId>,
        /// Statement creating the property-name enumerator.
        iterator_initialization: NodeId,
        /// `ToBoolean` of the enumerator's move-next call.
        condition: NodeId,
        /// Block assigning the current name, then the original body.
        body: NodeId,
    },
    /// `continue label;`.
    Continue(Option<String>),
    /// `break label;`.
    Break(Option<String>),
    /// `return value;`.
    Return(Option<NodeId>),
    /// `with (object) body`.
    With {
        /// Scope object.
        object: NodeId,
        /// Body.
        body: NodeId,
    },
    /// `switch`.
    Switch {
        /// Discriminant.
        expression: NodeId,
        /// `CaseClause` nodes in source order.
        clauses: Vec<NodeId>,
    },
    /// `case` or `default` clause.
    CaseClause {
        /// `Same` comparison against the discriminant; `None` for `default`.
        comparison: Option<NodeId>,
        /// Clause statements.
        body: NodeId,
    },
    /// `label: body`.
    Label {
        /// Label name.
        name: String,
        /// Labelled statement.
        body: NodeId,
    },
    /// `throw value;`.
    Throw(NodeId),
    /// `try`.
    Try {
        /// Protected block.
        body: NodeId,
        /// Handler.
        catch: Option<Catch>,
        /// Finalizer block.
        finally: Option<NodeId>,
    },
    /// `function name() {}` treated as `var name = function() {}`.
    FunctionDeclaration {
        /// Mirror of the `Function` node; owned by `assignment`.
        function: NodeId,
        /// `WriteIdentifier` binding the name.
        assignment: NodeId,
    },
}

impl NodeKind {
    /// Returns true for statement kinds.
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block(_)
                | NodeKind::Empty
                | NodeKind::ExpressionStatement(_)
                | NodeKind::VariableDeclaration(_)
                | NodeKind::If { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::While { .. }
                | NodeKind::For { .. }
                | NodeKind::ForIn { .. }
                | NodeKind::Continue(_)
                | NodeKind::Break(_)
                | NodeKind::Return(_)
                | NodeKind::With { .. }
                | NodeKind::Switch { .. }
                | NodeKind::CaseClause { .. }
                | NodeKind::Label { .. }
                | NodeKind::Throw(_)
                | NodeKind::Try { .. }
                | NodeKind::FunctionDeclaration { .. }
        )
    }

    /// Owning child edges in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Number(_)
            | NodeKind::String(_)
            | NodeKind::Boolean(_)
            | NodeKind::Null
            | NodeKind::Regex { .. }
            | NodeKind::This
            | NodeKind::ReadIdentifier(_)
            | NodeKind::Empty
            | NodeKind::Continue(_)
            | NodeKind::Break(_) => {}
            NodeKind::Array(items) => out.extend(items.iter().flatten()),
            NodeKind::Object(properties) => out.extend(properties.iter().map(|p| p.value)),
            NodeKind::Function { body, .. } => out.push(*body),
            NodeKind::WriteIdentifier { value, .. } => out.push(*value),
            NodeKind::ReadIndexer { container, index }
            | NodeKind::ReadProperty { container, index } => out.extend([*container, *index]),
            NodeKind::WriteIndexer {
                container,
                index,
                value,
            }
            | NodeKind::WriteProperty {
                container,
                index,
                value,
            } => out.extend([*container, *index, *value]),
            NodeKind::Paren(e)
            | NodeKind::GuardedCast(e)
            | NodeKind::Convert { operand: e, .. }
            | NodeKind::Unary { operand: e, .. }
            | NodeKind::Logical {
                implementation: e, ..
            }
            | NodeKind::WriteTemporary { value: e, .. }
            | NodeKind::ExpressionStatement(e)
            | NodeKind::Throw(e)
            | NodeKind::Label { body: e, .. }
            | NodeKind::FunctionDeclaration { assignment: e, .. } => out.push(*e),
            NodeKind::Binary { left, right, .. } => out.extend([*left, *right]),
            NodeKind::Ternary {
                condition,
                then,
                otherwise,
            } => out.extend([*condition, *then, *otherwise]),
            NodeKind::Comma(items) | NodeKind::Block(items) => out.extend(items),
            NodeKind::Call {
                callee,
                this_arg,
                arguments,
                ..
            } => {
                out.push(*callee);
                out.extend(this_arg);
                out.extend(arguments);
            }
            NodeKind::New {
                callee, arguments, ..
            } => {
                out.push(*callee);
                out.extend(arguments);
            }
            NodeKind::InternalCall { arguments, .. } | NodeKind::InternalNew { arguments, .. } => {
                out.extend(arguments)
            }
            NodeKind::VariableDeclaration(declarations) => {
                out.extend(declarations.iter().filter_map(|d| d.initializer))
            }
            NodeKind::If {
                condition,
                then,
                otherwise,
            } => {
                out.extend([*condition, *then]);
                out.extend(otherwise);
            }
            NodeKind::DoWhile { body, condition } => out.extend([*body, *condition]),
            NodeKind::While { condition, body } | NodeKind::With { object: condition, body } => {
                out.extend([*condition, *body])
            }
            NodeKind::For {
                initialization,
                condition,
                increment,
                body,
            } => {
                out.extend(initialization);
                out.extend(condition);
                out.extend(increment);
                out.push(*body);
            }
            NodeKind::ForIn {
                initialization,
                iterator_initialization,
                condition,
                body,
            } => {
                out.extend(initialization);
                out.extend([*iterator_initialization, *condition, *body]);
            }
            NodeKind::Return(value) => out.extend(value),
            NodeKind::Switch {
                expression,
                clauses,
            } => {
                out.push(*expression);
                out.extend(clauses);
            }
            NodeKind::CaseClause { comparison, body } => {
                out.extend(comparison);
                out.push(*body);
            }
            NodeKind::Try {
                body,
                catch,
                finally,
            } => {
                out.push(*body);
                out.extend(catch.as_ref().map(|c| c.body));
                out.extend(finally);
            }
        }
        out
    }

    /// Mutable owning child edges, in the same order as [`NodeKind::children`].
    fn child_slots_mut(&mut self) -> Vec<&mut NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Number(_)
            | NodeKind::String(_)
            | NodeKind::Boolean(_)
            | NodeKind::Null
            | NodeKind::Regex { .. }
            | NodeKind::This
            | NodeKind::ReadIdentifier(_)
            | NodeKind::Empty
            | NodeKind::Continue(_)
            | NodeKind::Break(_) => {}
            NodeKind::Array(items) => out.extend(items.iter_mut().flatten()),
            NodeKind::Object(properties) => out.extend(properties.iter_mut().map(|p| &mut p.value)),
            NodeKind::Function { body, .. } => out.push(body),
            NodeKind::WriteIdentifier { value, .. } => out.push(value),
            NodeKind::ReadIndexer { container, index }
            | NodeKind::ReadProperty { container, index } => {
                out.push(container);
                out.push(index);
            }
            NodeKind::WriteIndexer {
                container,
                index,
                value,
            }
            | NodeKind::WriteProperty {
                container,
                index,
                value,
            } => {
                out.push(container);
                out.push(index);
                out.push(value);
            }
            NodeKind::Paren(e)
            | NodeKind::GuardedCast(e)
            | NodeKind::Convert { operand: e, .. }
            | NodeKind::Unary { operand: e, .. }
            | NodeKind::Logical {
                implementation: e, ..
            }
            | NodeKind::WriteTemporary { value: e, .. }
            | NodeKind::ExpressionStatement(e)
            | NodeKind::Throw(e)
            | NodeKind::Label { body: e, .. }
            | NodeKind::FunctionDeclaration { assignment: e, .. } => out.push(e),
            NodeKind::Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Ternary {
                condition,
                then,
                otherwise,
            } => {
                out.push(condition);
                out.push(then);
                out.push(otherwise);
            }
            NodeKind::Comma(items) | NodeKind::Block(items) => out.extend(items.iter_mut()),
            NodeKind::Call {
                callee,
                this_arg,
                arguments,
                ..
            } => {
                out.push(callee);
                out.extend(this_arg.as_mut());
                out.extend(arguments.iter_mut());
            }
            NodeKind::New {
                callee, arguments, ..
            } => {
                out.push(callee);
                out.extend(arguments.iter_mut());
            }
            NodeKind::InternalCall { arguments, .. } | NodeKind::InternalNew { arguments, .. } => {
                out.extend(arguments.iter_mut())
            }
            NodeKind::VariableDeclaration(declarations) => {
                out.extend(declarations.iter_mut().filter_map(|d| d.initializer.as_mut()))
            }
            NodeKind::If {
                condition,
                then,
                otherwise,
            } => {
                out.push(condition);
                out.push(then);
                out.extend(otherwise.as_mut());
            }
            NodeKind::DoWhile { body, condition } => {
                out.push(body);
                out.push(condition);
            }
            NodeKind::While { condition, body } | NodeKind::With { object: condition, body } => {
                out.push(condition);
                out.push(body);
            }
            NodeKind::For {
                initialization,
                condition,
                increment,
                body,
            } => {
                out.extend(initialization.as_mut());
                out.extend(condition.as_mut());
                out.extend(increment.as_mut());
                out.push(body);
            }
            NodeKind::ForIn {
                initialization,
                iterator_initialization,
                condition,
                body,
            } => {
                out.extend(initialization.as_mut());
                out.push(iterator_initialization);
                out.push(condition);
                out.push(body);
            }
            NodeKind::Return(value) => out.extend(value.as_mut()),
            NodeKind::Switch {
                expression,
                clauses,
            } => {
                out.push(expression);
                out.extend(clauses.iter_mut());
            }
            NodeKind::CaseClause { comparison, body } => {
                out.extend(comparison.as_mut());
                out.push(body);
            }
            NodeKind::Try {
                body,
                catch,
                finally,
            } => {
                out.push(body);
                out.extend(catch.as_mut().map(|c| &mut c.body));
                out.extend(finally.as_mut());
            }
        }
        out
    }
}

/// A graph element.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// What the node is.
    pub kind: NodeKind,
    /// Byte offset of the construct in the source.
    pub offset: Option<usize>,
    /// The sole consumer; the first one for a `WriteTemporary`.
    pub user: Option<NodeId>,
    /// Scratch marker for graph algorithms.
    pub pass_number: u32,
    /// Static value type.
    pub value_type: ValueType,
}

/// Result of attaching a user to an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseOutcome {
    /// The user may refer to the expression itself.
    Direct,
    /// The expression was already used; the user must refer to this
    /// `WriteTemporary` instead.
    Temporary(NodeId),
}

/// Arena holding every node of one parse.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node without touching any use edges.
    pub fn add(&mut self, kind: NodeKind, offset: Option<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            offset,
            user: None,
            pass_number: 0,
            value_type: ValueType::Unknown,
        });
        id
    }

    /// Returns the node behind `id`.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the node behind `id` mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Shorthand for `node(id).kind`.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Number of nodes allocated, including discarded ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node was allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Owning child edges of `id`.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0].kind.children()
    }

    /// Records `user` as a consumer of `value`.
    ///
    /// The first user is recorded directly. A second user of an expression
    /// interposes a `WriteTemporary` between the expression and its first
    /// user, rewiring that user's edge, and returns it so the caller can
    /// point the new user at the temporary.
    ///
    /// # Panics
    ///
    /// Panics if `value` is a statement that already has a user.
    pub fn add_user(&mut self, value: NodeId, user: NodeId) -> UseOutcome {
        let Some(current) = self.nodes[value.0].user else {
            self.nodes[value.0].user = Some(user);
            return UseOutcome::Direct;
        };

        assert!(
            !self.nodes[value.0].kind.is_statement(),
            "statement {value:?} already used by {current:?}, cannot add {user:?}"
        );

        if let NodeKind::WriteTemporary { users, .. } = &mut self.nodes[value.0].kind {
            users.push(user);
            return UseOutcome::Direct;
        }

        let temporary = if matches!(self.nodes[current.0].kind, NodeKind::WriteTemporary { .. }) {
            current
        } else {
            let offset = self.nodes[value.0].offset;
            let temporary = self.add(
                NodeKind::WriteTemporary {
                    value,
                    users: vec![current],
                },
                offset,
            );
            self.nodes[value.0].user = Some(temporary);
            self.replace(current, value, temporary);
            self.nodes[temporary.0].user = Some(current);
            trace!(
                value = value.0,
                temporary = temporary.0,
                first_user = current.0,
                "interposed write temporary"
            );
            temporary
        };

        if let NodeKind::WriteTemporary { users, .. } = &mut self.nodes[temporary.0].kind {
            users.push(user);
        }
        UseOutcome::Temporary(temporary)
    }

    /// Detaches `user` from `value`.
    ///
    /// # Panics
    ///
    /// Panics if `user` does not use `value`.
    pub fn remove_user(&mut self, value: NodeId, user: NodeId) {
        let node = &mut self.nodes[value.0];
        if let NodeKind::WriteTemporary { users, .. } = &mut node.kind {
            let position = users.iter().position(|u| *u == user);
            let Some(position) = position else {
                panic!("{user:?} is not a user of temporary {value:?}");
            };
            users.remove(position);
            node.user = users.first().copied();
            return;
        }

        assert_eq!(
            node.user,
            Some(user),
            "{user:?} is not the user of {value:?}"
        );
        node.user = None;
    }

    /// Replaces the first owning edge of `user` pointing at `old` with `new`.
    ///
    /// # Panics
    ///
    /// Panics if `user` has no such edge.
    pub fn replace(&mut self, user: NodeId, old: NodeId, new: NodeId) {
        let replaced = self.nodes[user.0]
            .kind
            .child_slots_mut()
            .into_iter()
            .find(|slot| **slot == old)
            .map(|slot| *slot = new)
            .is_some();
        assert!(replaced, "cannot find {old:?} in {user:?}");
    }
}

/// Everything the parser knows about one function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionMetadata {
    /// The `Function` node.
    pub node: NodeId,
    /// The function's own scope.
    pub scope: ScopeId,
    /// Name symbol, if named.
    pub name: Option<SymbolId>,
    /// Formal parameters in declaration order.
    pub parameters: Vec<SymbolId>,
    /// Enclosing function, `None` for the program.
    pub parent: Option<FunctionId>,
    /// Functions defined directly inside this one.
    pub sub_functions: Vec<FunctionId>,
}

/// A parsed script.
#[derive(Debug, Clone)]
pub struct Program {
    /// Node arena.
    pub graph: Graph,
    /// Scope and symbol arena.
    pub scopes: ScopeTable,
    /// Metadata of every function, the program's own first-class function
    /// included.
    pub functions: Vec<FunctionMetadata>,
    /// The program's function.
    pub root: FunctionId,
}

impl Program {
    /// Metadata of `id`.
    pub fn function(&self, id: FunctionId) -> &FunctionMetadata {
        &self.functions[id.0]
    }

    /// Metadata of the top-level function.
    pub fn root_function(&self) -> &FunctionMetadata {
        self.function(self.root)
    }

    /// Body block of `id`.
    pub fn body(&self, id: FunctionId) -> NodeId {
        match self.graph.kind(self.functions[id.0].node) {
            NodeKind::Function { body, .. } => *body,
            other => panic!("function node of {id:?} is {other:?}"),
        }
    }

    /// Iterates function metadata in creation order.
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &FunctionMetadata)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i), f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_leaf() -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let leaf = graph.add(NodeKind::This, Some(0));
        (graph, leaf)
    }

    fn attach(graph: &mut Graph, user: NodeId) {
        for child in graph.children(user) {
            if let UseOutcome::Temporary(temporary) = graph.add_user(child, user) {
                graph.replace(user, child, temporary);
            }
        }
    }

    #[test]
    fn test_first_user_is_direct() {
        let (mut graph, leaf) = graph_with_leaf();
        let user = graph.add(NodeKind::Paren(leaf), None);
        assert_eq!(graph.add_user(leaf, user), UseOutcome::Direct);
        assert_eq!(graph.node(leaf).user, Some(user));
    }

    #[test]
    fn test_second_user_interposes_temporary() {
        let (mut graph, leaf) = graph_with_leaf();
        let first = graph.add(NodeKind::Paren(leaf), None);
        attach(&mut graph, first);
        let second = graph.add(NodeKind::ExpressionStatement(leaf), None);
        attach(&mut graph, second);

        let NodeKind::Paren(temporary) = *graph.kind(first) else {
            panic!("expected paren");
        };
        assert!(matches!(
            graph.kind(temporary),
            NodeKind::WriteTemporary { value, users } if *value == leaf && users == &[first, second]
        ));
        assert_eq!(graph.node(leaf).user, Some(temporary));
        assert_eq!(graph.node(temporary).user, Some(first));
        assert_eq!(graph.children(second), vec![temporary]);
    }

    #[test]
    fn test_third_user_reuses_temporary() {
        let (mut graph, leaf) = graph_with_leaf();
        let users: Vec<NodeId> = (0..3)
            .map(|_| {
                let user = graph.add(NodeKind::GuardedCast(leaf), None);
                attach(&mut graph, user);
                user
            })
            .collect();

        let temporaries: Vec<NodeId> = users.iter().map(|u| graph.children(*u)[0]).collect();
        assert!(temporaries.iter().all(|t| *t == temporaries[0]));
        let NodeKind::WriteTemporary { users: recorded, .. } = graph.kind(temporaries[0]) else {
            panic!("expected temporary");
        };
        assert_eq!(recorded, &users);
    }

    #[test]
    fn test_same_child_twice_in_one_user() {
        let (mut graph, leaf) = graph_with_leaf();
        let binary = graph.add(
            NodeKind::Binary {
                op: BinaryOp::Addition,
                left: leaf,
                right: leaf,
            },
            None,
        );
        attach(&mut graph, binary);
        let children = graph.children(binary);
        assert_eq!(children[0], children[1]);
        assert!(matches!(graph.kind(children[0]), NodeKind::WriteTemporary { .. }));
    }

    #[test]
    fn test_remove_user() {
        let (mut graph, leaf) = graph_with_leaf();
        let user = graph.add(NodeKind::Paren(leaf), None);
        attach(&mut graph, user);
        graph.remove_user(leaf, user);
        assert_eq!(graph.node(leaf).user, None);
    }

    #[test]
    #[should_panic(expected = "cannot find")]
    fn test_replace_missing_child_panics() {
        let (mut graph, leaf) = graph_with_leaf();
        let other = graph.add(NodeKind::Null, None);
        let user = graph.add(NodeKind::Paren(leaf), None);
        graph.replace(user, other, leaf);
    }

    #[test]
    #[should_panic(expected = "already used")]
    fn test_statement_cannot_have_two_users() {
        let mut graph = Graph::new();
        let statement = graph.add(NodeKind::Empty, None);
        let a = graph.add(NodeKind::Block(vec![statement]), None);
        let b = graph.add(NodeKind::Block(vec![statement]), None);
        graph.add_user(statement, a);
        graph.add_user(statement, b);
    }

    #[test]
    fn test_children_order() {
        let mut graph = Graph::new();
        let callee = graph.add(NodeKind::This, None);
        let this_arg = graph.add(NodeKind::Null, None);
        let arg = graph.add(NodeKind::Boolean(true), None);
        let call = graph.add(
            NodeKind::Call {
                callee,
                this_arg: Some(this_arg),
                arguments: vec![arg],
                is_direct_eval: false,
                invocation: Invocation::default(),
            },
            None,
        );
        assert_eq!(graph.children(call), vec![callee, this_arg, arg]);
        assert_eq!(Invocation::default().profile_index, -1);
    }
}
