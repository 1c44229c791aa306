// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Arena ownership of AST nodes.
//!
//! The [`Arena`] owns every node of one compilation unit and is only ever
//! appended to; nodes are dropped together when the arena goes out of scope.
//! Child links are [`NodeId`]s, and each node's parent id is written exactly
//! once — by [`Arena::alloc`] at the moment the parent is constructed, which
//! is the only point where a node gains a parent. Because children are always
//! allocated before their parent, the parent slot of a freshly allocated node
//! is still [`NodeId::NONE`].

use crate::node::NodeKind;
use crate::{NodeId, Span};

/// An AST node: kind, source span, and non-owning parent back-link.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    parent: NodeId,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        (self.parent != NodeId::NONE).then_some(self.parent)
    }
}

/// Owns all AST nodes of one compilation unit.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node and claim its children.
    ///
    /// Writes `self` into the parent slot of every child of `kind`. A child
    /// that already has a parent, or a child span outside `span`, is a parser
    /// bug; both are checked in debug builds.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in children_of(&kind) {
            let node = &mut self.nodes[child.index()];
            debug_assert_eq!(node.parent, NodeId::NONE, "child adopted twice");
            debug_assert!(span.contains(node.span), "child span escapes parent span");
            node.parent = id;
        }
        self.nodes.push(Node { kind, span, parent: NodeId::NONE });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate all ids in allocation (parse) order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Whether the expression's storage can be written or addressed.
    ///
    /// Parentheses and no-op passthroughs are transparent; results of any
    /// computation are not assignable.
    pub fn is_lvalue(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Ident(_) | NodeKind::Index { .. } => true,
            NodeKind::Paren { inner } | NodeKind::Passthrough { inner, .. } => {
                self.is_lvalue(*inner)
            }
            _ => false,
        }
    }

    /// Strip passthrough and paren wrappers down to the operative node.
    pub fn unwrapped(&self, id: NodeId) -> NodeId {
        match self.kind(id) {
            NodeKind::Paren { inner } | NodeKind::Passthrough { inner, .. } => {
                self.unwrapped(*inner)
            }
            _ => id,
        }
    }
}

impl std::ops::Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

/// Child ids of a node kind, in source order.
fn children_of(kind: &NodeKind) -> Vec<NodeId> {
    match kind {
        NodeKind::Module { decls } => decls.clone(),
        NodeKind::Function { params, body, .. } => {
            params.iter().copied().chain([*body]).collect()
        }
        NodeKind::Param { .. }
        | NodeKind::Int(_)
        | NodeKind::Str(_)
        | NodeKind::Bool(_)
        | NodeKind::Ident(_) => Vec::new(),
        NodeKind::Block { stmts } => stmts.clone(),
        NodeKind::VarDecl { init, .. } => init.iter().copied().collect(),
        NodeKind::ConstDecl { init, .. } => vec![*init],
        NodeKind::ExprStmt { expr } => vec![*expr],
        NodeKind::Return { value } => value.iter().copied().collect(),
        NodeKind::If { arms, else_block } => arms
            .iter()
            .flat_map(|arm| [arm.cond, arm.body])
            .chain(else_block.iter().copied())
            .collect(),
        NodeKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
        NodeKind::Unary { operand, .. } => vec![*operand],
        NodeKind::Assign { target, value, .. } => vec![*target, *value],
        NodeKind::Paren { inner } | NodeKind::Passthrough { inner, .. } => vec![*inner],
        NodeKind::PostIncr { target } | NodeKind::PostDecr { target } => vec![*target],
        NodeKind::Call { callee, args } => {
            [*callee].into_iter().chain(args.iter().copied()).collect()
        }
        NodeKind::Index { base, index } => vec![*base, *index],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{BinOp, Level};

    #[test]
    fn parent_links_written_at_parent_construction() {
        let mut arena = Arena::new();
        let lhs = arena.alloc(NodeKind::Int(1), Span::new(0, 1));
        let rhs = arena.alloc(NodeKind::Int(2), Span::new(4, 5));
        assert_eq!(arena.parent(lhs), None);
        assert_eq!(arena.parent(rhs), None);

        let add = arena.alloc(
            NodeKind::Binary { op: BinOp::Add, lhs, rhs },
            Span::new(0, 5),
        );
        assert_eq!(arena.parent(lhs), Some(add));
        assert_eq!(arena.parent(rhs), Some(add));
        assert_eq!(arena.parent(add), None);
    }

    #[test]
    fn spans_contain_children() {
        let mut arena = Arena::new();
        let inner = arena.alloc(NodeKind::Int(7), Span::new(1, 2));
        let paren = arena.alloc(NodeKind::Paren { inner }, Span::new(0, 3));
        assert!(arena.span(paren).contains(arena.span(inner)));
    }

    #[test]
    fn lvalue_query_forwards_through_wrappers() {
        let mut arena = Arena::new();
        let ident = arena.alloc(NodeKind::Ident("x".into()), Span::new(1, 2));
        let paren = arena.alloc(NodeKind::Paren { inner: ident }, Span::new(0, 3));
        let pass = arena.alloc(
            NodeKind::Passthrough { level: Level::Additive, inner: paren },
            Span::new(0, 3),
        );
        assert!(arena.is_lvalue(ident));
        assert!(arena.is_lvalue(pass));

        let lit = arena.alloc(NodeKind::Int(3), Span::new(4, 5));
        let sum = arena.alloc(
            NodeKind::Binary { op: BinOp::Add, lhs: pass, rhs: lit },
            Span::new(0, 5),
        );
        assert!(!arena.is_lvalue(sum));
    }
}
