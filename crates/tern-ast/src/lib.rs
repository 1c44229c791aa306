// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Abstract Syntax Tree types for the Tern language.
//!
//! This crate defines the token and node types shared between the lexer,
//! parser, resolver, and code generator. All nodes live in an [`Arena`] that
//! owns them for the lifetime of one compilation unit; passes refer to nodes
//! by [`NodeId`] and attach their own results in side tables.

pub mod arena;
pub mod node;
pub mod span;
pub mod token;
pub mod types;

pub use arena::{Arena, Node};
pub use node::{BinOp, IfArm, Level, NodeKind, UnaryOp};
pub use span::{LineMap, Span};
pub use token::{Token, TokenKind};
pub use types::Type;

/// Unique identifier for AST nodes.
///
/// An index into the owning [`Arena`]. Ids are dense, stable, and assigned in
/// parse order (source left to right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for "no node": the module root's parent slot.
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}
