//! Traversal contract for passes over the IR.
//!
//! A pass implements [`Visitor`] and hands it to [`walk`], which visits owning
//! edges depth-first in evaluation order. Mirrors (`Logical` operands, the
//! `function` of a `FunctionDeclaration`) are not followed.
//!
//! A `WriteTemporary` is expanded the first time the walk reaches it. Every
//! later edge into the same temporary is reported through
//! [`Visitor::temporary_reference`] instead, so each node is entered exactly
//! once per walk.
//!
//! Rewriting passes collect ids first (see [`postorder`]) and then edit the
//! graph with [`Graph::replace`].

use rustc_hash::FxHashSet;

use super::{Graph, NodeId, NodeKind, Program};

/// What the walk does after [`Visitor::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Visit the node's children.
    #[default]
    Continue,
    /// Do not descend; [`Visitor::leave`] is still called.
    SkipChildren,
}

/// Callbacks invoked by [`walk`].
pub trait Visitor {
    /// Called before the children of `node`.
    fn enter(&mut self, graph: &Graph, node: NodeId, parent: Option<NodeId>) -> Flow {
        let _ = (graph, node, parent);
        Flow::Continue
    }

    /// Called after the children of `node`.
    fn leave(&mut self, graph: &Graph, node: NodeId, parent: Option<NodeId>) {
        let _ = (graph, node, parent);
    }

    /// Called for an edge into a temporary that was already expanded.
    fn temporary_reference(&mut self, graph: &Graph, temporary: NodeId, parent: NodeId) {
        let _ = (graph, temporary, parent);
    }
}

/// Walks the subgraph rooted at `root`.
pub fn walk<V: Visitor + ?Sized>(graph: &Graph, root: NodeId, visitor: &mut V) {
    let mut expanded = FxHashSet::default();
    walk_node(graph, root, None, visitor, &mut expanded);
}

/// Walks a whole program from its top-level function node.
pub fn walk_program<V: Visitor + ?Sized>(program: &Program, visitor: &mut V) {
    walk(&program.graph, program.root_function().node, visitor);
}

fn walk_node<V: Visitor + ?Sized>(
    graph: &Graph,
    node: NodeId,
    parent: Option<NodeId>,
    visitor: &mut V,
    expanded: &mut FxHashSet<NodeId>,
) {
    if matches!(graph.kind(node), NodeKind::WriteTemporary { .. }) && !expanded.insert(node) {
        if let Some(parent) = parent {
            visitor.temporary_reference(graph, node, parent);
        }
        return;
    }

    if visitor.enter(graph, node, parent) == Flow::Continue {
        for child in graph.children(node) {
            walk_node(graph, child, Some(node), visitor, expanded);
        }
    }
    visitor.leave(graph, node, parent);
}

/// Node ids of the subgraph at `root`, children before parents.
///
/// Temporaries appear once, at their first expansion.
pub fn postorder(graph: &Graph, root: NodeId) -> Vec<NodeId> {
    struct Collect(Vec<NodeId>);

    impl Visitor for Collect {
        fn leave(&mut self, _: &Graph, node: NodeId, _: Option<NodeId>) {
            self.0.push(node);
        }
    }

    let mut collect = Collect(Vec::new());
    walk(graph, root, &mut collect);
    collect.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, Factory};
    use crate::lexer::NumericValue;
    use crate::scope::ScopeKind;

    #[derive(Default)]
    struct Recorder {
        entered: Vec<NodeId>,
        references: Vec<(NodeId, NodeId)>,
    }

    impl Visitor for Recorder {
        fn enter(&mut self, _: &Graph, node: NodeId, _: Option<NodeId>) -> Flow {
            self.entered.push(node);
            Flow::Continue
        }

        fn temporary_reference(&mut self, _: &Graph, temporary: NodeId, parent: NodeId) {
            self.references.push((temporary, parent));
        }
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut factory = Factory::new();
        let one = factory.number(NumericValue::Int(1), 0);
        let two = factory.number(NumericValue::Int(2), 2);
        let sum = factory.binary(BinaryOp::Equal, one, two, Some(0));

        let mut recorder = Recorder::default();
        walk(factory.graph(), sum, &mut recorder);
        assert_eq!(recorder.entered, vec![sum, one, two]);
        assert_eq!(postorder(factory.graph(), sum), vec![one, two, sum]);
    }

    #[test]
    fn test_temporary_expanded_once() {
        let mut factory = Factory::new();
        let scope = factory.scopes_mut().create_scope(None, ScopeKind::Program);
        let a = factory.identifier(scope, "a", 0);
        let comma = factory.comma(vec![a, a], Some(0));

        let NodeKind::Comma(items) = factory.graph().kind(comma).clone() else {
            panic!("expected comma");
        };
        let temporary = items[0];
        assert_eq!(items[1], temporary);

        let mut recorder = Recorder::default();
        walk(factory.graph(), comma, &mut recorder);
        assert_eq!(recorder.entered, vec![comma, temporary, a]);
        assert_eq!(recorder.references, vec![(temporary, comma)]);
    }

    #[test]
    fn test_skip_children() {
        struct Shallow(usize);

        impl Visitor for Shallow {
            fn enter(&mut self, _: &Graph, _: NodeId, _: Option<NodeId>) -> Flow {
                self.0 += 1;
                Flow::SkipChildren
            }
        }

        let mut factory = Factory::new();
        let one = factory.number(NumericValue::Int(1), 0);
        let block_statement = factory.expression_statement(one);
        let block = factory.block(vec![block_statement], 0);

        let mut shallow = Shallow(0);
        walk(factory.graph(), block, &mut shallow);
        assert_eq!(shallow.0, 1);
    }

    #[test]
    fn test_rewrite_through_replace() {
        let mut factory = Factory::new();
        let one = factory.number(NumericValue::Int(1), 0);
        let statement = factory.expression_statement(one);
        let block = factory.block(vec![statement], 0);

        let mut graph = factory.graph().clone();
        let replacement = graph.add(NodeKind::Null, Some(0));
        for id in postorder(&graph, block) {
            if graph.children(id).contains(&one) {
                graph.replace(id, one, replacement);
            }
        }
        assert_eq!(graph.kind(statement), &NodeKind::ExpressionStatement(replacement));
    }
}
