//! Indented textual rendering of the IR.
//!
//! One line per node, children indented two spaces under their user. A
//! temporary is expanded where the walk first reaches it; later edges into
//! it print as `Temporary %N`, where `N` is the node index.
//!
//! ```text
//! Program #0
//!   Block
//!     ExpressionStatement
//!       WriteIdentifier a:Global
//!         Number 1
//! ```

use super::visitor::{self, Flow, Visitor};
use super::{Graph, NodeId, NodeKind, Program, PropertyKind};
use crate::scope::SymbolId;

/// Renders the whole program.
pub fn dump(program: &Program) -> String {
    dump_node(program, program.root_function().node)
}

/// Renders the subgraph rooted at `root`.
pub fn dump_node(program: &Program, root: NodeId) -> String {
    let mut dumper = Dumper {
        program,
        depth: 0,
        out: String::new(),
    };
    visitor::walk(&program.graph, root, &mut dumper);
    dumper.out
}

struct Dumper<'a> {
    program: &'a Program,
    depth: usize,
    out: String,
}

impl Dumper<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn symbol(&self, symbol: SymbolId) -> String {
        let symbol = self.program.scopes.symbol(symbol);
        format!("{}:{:?}", symbol.name, symbol.kind)
    }

    fn label(&self, node: NodeId) -> String {
        let program = self.program;
        match program.graph.kind(node) {
            NodeKind::Number(value) => format!("Number {value}"),
            NodeKind::String(value) => format!("String {value:?}"),
            NodeKind::Boolean(value) => format!("Boolean {value}"),
            NodeKind::Null => "Null".to_string(),
            NodeKind::Regex { pattern, flags } => format!("Regex /{pattern}/{flags}"),
            NodeKind::This => "This".to_string(),
            NodeKind::Array(items) => {
                let holes = items.iter().filter(|item| item.is_none()).count();
                if holes == 0 {
                    format!("Array len={}", items.len())
                } else {
                    format!("Array len={} holes={holes}", items.len())
                }
            }
            NodeKind::Object(properties) => {
                let names: Vec<String> = properties
                    .iter()
                    .map(|p| match p.kind {
                        PropertyKind::Data => p.name.clone(),
                        PropertyKind::Getter => format!("get {}", p.name),
                        PropertyKind::Setter => format!("set {}", p.name),
                    })
                    .collect();
                format!("Object [{}]", names.join(", "))
            }
            NodeKind::Function { function, .. } => {
                if *function == program.root {
                    return format!("Program #{}", function.index());
                }
                let metadata = program.function(*function);
                let name = metadata
                    .name
                    .map(|n| program.scopes.symbol(n).name.clone())
                    .unwrap_or_default();
                let parameters: Vec<&str> = metadata
                    .parameters
                    .iter()
                    .map(|p| program.scopes.symbol(*p).name.as_str())
                    .collect();
                format!("Function #{} {name}({})", function.index(), parameters.join(", "))
            }
            NodeKind::ReadIdentifier(symbol) => format!("ReadIdentifier {}", self.symbol(*symbol)),
            NodeKind::WriteIdentifier { symbol, .. } => {
                format!("WriteIdentifier {}", self.symbol(*symbol))
            }
            NodeKind::ReadIndexer { .. } => "ReadIndexer".to_string(),
            NodeKind::ReadProperty { .. } => "ReadProperty".to_string(),
            NodeKind::WriteIndexer { .. } => "WriteIndexer".to_string(),
            NodeKind::WriteProperty { .. } => "WriteProperty".to_string(),
            NodeKind::Paren(_) => "Paren".to_string(),
            NodeKind::GuardedCast(_) => "GuardedCast".to_string(),
            NodeKind::Convert { conversion, .. } => format!("Convert {conversion:?}"),
            NodeKind::Unary { op, .. } => format!("Unary {op:?}"),
            NodeKind::Binary { op, .. } => format!("Binary {}", op.symbol()),
            NodeKind::Logical { op, .. } => match op {
                super::LogicalOp::And => "Logical &&".to_string(),
                super::LogicalOp::Or => "Logical ||".to_string(),
            },
            NodeKind::Ternary { .. } => "Ternary".to_string(),
            NodeKind::Comma(_) => "Comma".to_string(),
            NodeKind::Call {
                this_arg,
                is_direct_eval,
                ..
            } => match (this_arg.is_some(), *is_direct_eval) {
                (_, true) => "Call eval".to_string(),
                (true, false) => "Call method".to_string(),
                (false, false) => "Call".to_string(),
            },
            NodeKind::New { .. } => "New".to_string(),
            NodeKind::InternalCall { intrinsic, .. } => format!("InternalCall {intrinsic:?}"),
            NodeKind::InternalNew { intrinsic, .. } => format!("InternalNew {intrinsic:?}"),
            NodeKind::WriteTemporary { .. } => format!("WriteTemporary %{}", node.index()),
            NodeKind::Block(_) => "Block".to_string(),
            NodeKind::Empty => "Empty".to_string(),
            NodeKind::ExpressionStatement(_) => "ExpressionStatement".to_string(),
            NodeKind::VariableDeclaration(declarations) => {
                let names: Vec<String> = declarations.iter().map(|d| self.symbol(d.symbol)).collect();
                format!("VariableDeclaration {}", names.join(", "))
            }
            NodeKind::If { .. } => "If".to_string(),
            NodeKind::DoWhile { .. } => "DoWhile".to_string(),
            NodeKind::While { .. } => "While".to_string(),
            NodeKind::For { .. } => "For".to_string(),
            NodeKind::ForIn { .. } => "ForIn".to_string(),
            NodeKind::Continue(label) => labelled("Continue", label.as_deref()),
            NodeKind::Break(label) => labelled("Break", label.as_deref()),
            NodeKind::Return(_) => "Return".to_string(),
            NodeKind::With { .. } => "With".to_string(),
            NodeKind::Switch { .. } => "Switch".to_string(),
            NodeKind::CaseClause {
                comparison: Some(_),
                ..
            } => "Case".to_string(),
            NodeKind::CaseClause { comparison: None, .. } => "Default".to_string(),
            NodeKind::Label { name, .. } => format!("Label {name}"),
            NodeKind::Throw(_) => "Throw".to_string(),
            NodeKind::Try { catch, .. } => match catch {
                Some(catch) => format!("Try catch({})", self.symbol(catch.symbol)),
                None => "Try".to_string(),
            },
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration".to_string(),
        }
    }
}

fn labelled(keyword: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{keyword} {label}"),
        None => keyword.to_string(),
    }
}

impl Visitor for Dumper<'_> {
    fn enter(&mut self, _: &Graph, node: NodeId, _: Option<NodeId>) -> Flow {
        let label = self.label(node);
        self.line(&label);
        self.depth += 1;
        Flow::Continue
    }

    fn leave(&mut self, _: &Graph, _: NodeId, _: Option<NodeId>) {
        self.depth -= 1;
    }

    fn temporary_reference(&mut self, _: &Graph, temporary: NodeId, _: NodeId) {
        let text = format!("Temporary %{}", temporary.index());
        self.line(&text);
    }
}
