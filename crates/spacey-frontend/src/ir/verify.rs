//! Single-user invariant checker.
//!
//! Walks a graph and reports every edge that disagrees with the recorded
//! users: a node other than a temporary reached through two edges, a node
//! whose `user` is not the parent it was reached from, and a temporary that
//! does not list a parent among its users.

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::visitor::{self, Flow, Visitor};
use super::{Graph, NodeId, NodeKind, Program};

/// One broken use edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// A node that is not a temporary has two users.
    #[error("node {node:?} is used by both {first:?} and {second:?}")]
    Shared {
        /// The shared node.
        node: NodeId,
        /// Parent it was first reached from.
        first: Option<NodeId>,
        /// Parent it was reached from again.
        second: Option<NodeId>,
    },
    /// The recorded user differs from the actual parent.
    #[error("node {node:?} records user {recorded:?} but is used by {parent:?}")]
    UserMismatch {
        /// The node.
        node: NodeId,
        /// Its `user` field.
        recorded: Option<NodeId>,
        /// The parent it was reached from.
        parent: Option<NodeId>,
    },
    /// A temporary is referenced by a node missing from its users.
    #[error("temporary {temporary:?} does not list user {parent:?}")]
    UnlistedUser {
        /// The temporary.
        temporary: NodeId,
        /// The unlisted parent.
        parent: NodeId,
    },
}

/// Checks every node reachable from the program's top-level function.
pub fn verify(program: &Program) -> Vec<Violation> {
    verify_node(&program.graph, program.root_function().node)
}

/// Checks the subgraph rooted at `root`.
pub fn verify_node(graph: &Graph, root: NodeId) -> Vec<Violation> {
    let mut checker = Checker::default();
    visitor::walk(graph, root, &mut checker);
    checker.violations
}

#[derive(Default)]
struct Checker {
    parents: FxHashMap<NodeId, Option<NodeId>>,
    violations: Vec<Violation>,
}

impl Checker {
    fn check_temporary(&mut self, graph: &Graph, temporary: NodeId, parent: NodeId) {
        let listed = match graph.kind(temporary) {
            NodeKind::WriteTemporary { users, .. } => users.contains(&parent),
            _ => true,
        };
        if !listed {
            self.violations.push(Violation::UnlistedUser { temporary, parent });
        }
    }
}

impl Visitor for Checker {
    fn enter(&mut self, graph: &Graph, node: NodeId, parent: Option<NodeId>) -> Flow {
        if matches!(graph.kind(node), NodeKind::WriteTemporary { .. }) {
            if let Some(parent) = parent {
                self.check_temporary(graph, node, parent);
            }
            return Flow::Continue;
        }

        if let Some(&first) = self.parents.get(&node) {
            self.violations.push(Violation::Shared {
                node,
                first,
                second: parent,
            });
            return Flow::SkipChildren;
        }
        self.parents.insert(node, parent);

        let recorded = graph.node(node).user;
        if recorded != parent {
            self.violations.push(Violation::UserMismatch {
                node,
                recorded,
                parent,
            });
        }
        Flow::Continue
    }

    fn temporary_reference(&mut self, graph: &Graph, temporary: NodeId, parent: NodeId) {
        self.check_temporary(graph, temporary, parent);
    }
}
