// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! AST node kinds.
//!
//! One closed enum covers every node the grammar chain produces. The parser's
//! binary levels emit either a [`NodeKind::Binary`] tagged with the operator
//! or a [`NodeKind::Passthrough`] tagged with the level that found no
//! operator; passthrough nodes forward every structural query to their child.

use crate::{NodeId, Type};

/// The kind of AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root of one compilation unit. Owns a symbol table during resolution.
    Module { decls: Vec<NodeId> },
    /// `def name(params): ret ... end`. Scope anchor for its parameters.
    Function { name: String, params: Vec<NodeId>, ret: Type, body: NodeId },
    Param { name: String, ty: Type },
    /// Statement sequence forming one lexical scope.
    Block { stmts: Vec<NodeId> },
    /// `var name [: ty] [= init]`
    VarDecl { name: String, ty: Option<Type>, init: Option<NodeId> },
    /// `const name [: ty] = init`; the initializer must constant-fold.
    ConstDecl { name: String, ty: Option<Type>, init: NodeId },
    ExprStmt { expr: NodeId },
    Return { value: Option<NodeId> },
    /// `if`/`unless` chain: one arm per condition, continued by `or if` /
    /// `or unless`, closed by an optional `else` block and `end`.
    If { arms: Vec<IfArm>, else_block: Option<NodeId> },

    // Expressions
    Int(i64),
    Str(String),
    Bool(bool),
    Ident(String),
    Binary { op: BinOp, lhs: NodeId, rhs: NodeId },
    Unary { op: UnaryOp, operand: NodeId },
    /// `target = value`, or compound `target op= value` when `op` is set.
    Assign { op: Option<BinOp>, target: NodeId, value: NodeId },
    /// Explicit parentheses, kept as their own node so diagnostics point at
    /// the full parenthesized range.
    Paren { inner: NodeId },
    /// A binary level that matched no operator at its tier.
    Passthrough { level: Level, inner: NodeId },
    PostIncr { target: NodeId },
    PostDecr { target: NodeId },
    Call { callee: NodeId, args: Vec<NodeId> },
    Index { base: NodeId, index: NodeId },
}

/// One `cond → block` arm of an `if` chain. `negated` marks `unless` arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfArm {
    pub cond: NodeId,
    pub negated: bool,
    pub body: NodeId,
}

/// Binary operator, as written in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    /// Operator symbol for diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }

    /// Operator name for diagnostics ("addition", "bitwise and", ...).
    pub fn name(self) -> &'static str {
        match self {
            BinOp::Add => "addition",
            BinOp::Sub => "subtraction",
            BinOp::Mul => "multiplication",
            BinOp::Div => "division",
            BinOp::Mod => "remainder",
            BinOp::Eq => "equality",
            BinOp::Ne => "inequality",
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => "comparison",
            BinOp::And => "logical and",
            BinOp::Or => "logical or",
            BinOp::BitAnd => "bitwise and",
            BinOp::BitOr => "bitwise or",
            BinOp::BitXor => "bitwise xor",
            BinOp::Shl => "left shift",
            BinOp::Shr => "right shift",
        }
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "not",
            UnaryOp::BitNot => "~",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "negation",
            UnaryOp::Pos => "unary plus",
            UnaryOp::Not => "logical not",
            UnaryOp::BitNot => "bitwise not",
        }
    }
}

/// One precedence tier of the expression grammar, loosest-binding first.
///
/// Each binary tier parses [`Level::next`] for its left operand and recurses
/// into itself for the right operand, which makes every binary operator
/// right-associative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Assign,
    LogicalOr,
    LogicalAnd,
    Comparison,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Postfix,
    Primary,
}

impl Level {
    /// The next-tighter tier in the chain.
    pub fn next(self) -> Level {
        match self {
            Level::Assign => Level::LogicalOr,
            Level::LogicalOr => Level::LogicalAnd,
            Level::LogicalAnd => Level::Comparison,
            Level::Comparison => Level::BitOr,
            Level::BitOr => Level::BitXor,
            Level::BitXor => Level::BitAnd,
            Level::BitAnd => Level::Shift,
            Level::Shift => Level::Additive,
            Level::Additive => Level::Multiplicative,
            Level::Multiplicative => Level::Unary,
            Level::Unary => Level::Postfix,
            Level::Postfix => Level::Primary,
            Level::Primary => Level::Primary,
        }
    }
}
