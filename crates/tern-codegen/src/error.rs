// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lowering errors.
//!
//! Every variant is a user-visible compile error; none of them escapes as a
//! panic. The lowerer records the error and hands a [`Poisoned`] marker
//! upward so sibling subtrees still get checked, but any recorded error
//! means no emitted output is valid.

use tern_ast::Span;
use thiserror::Error;

/// Which operand of a binary operator an error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

/// A type or constant-evaluation error found while lowering.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LowerError {
    #[error("the {side} operand of {op_name} ('{op_symbol}') must be {expected}, but it is {found}")]
    OperandType {
        op_name: &'static str,
        op_symbol: &'static str,
        expected: &'static str,
        side: Side,
        found: &'static str,
        span: Span,
    },

    #[error("operands of {op_name} ('{op_symbol}') must have the same type, found {lhs} and {rhs}")]
    OperandMismatch {
        op_name: &'static str,
        op_symbol: &'static str,
        lhs: &'static str,
        rhs: &'static str,
        span: Span,
    },

    #[error("the operand of {op_name} ('{op_symbol}') must be {expected}, but it is {found}")]
    UnaryOperandType {
        op_name: &'static str,
        op_symbol: &'static str,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },

    #[error("this cannot be evaluated at compile time: {what}")]
    NotConst { what: String, span: Span },

    #[error("division by zero in a constant expression")]
    DivisionByZero { span: Span },

    #[error("string index {index} is out of bounds for a string of length {len}")]
    IndexOutOfBounds { index: i64, len: usize, span: Span },

    #[error("only str values can be indexed, found {found}")]
    IndexBase { found: &'static str, span: Span },

    #[error("a string index must be int, found {found}")]
    IndexType { found: &'static str, span: Span },

    #[error("cannot assign to this expression")]
    NotAssignable { span: Span },

    #[error("cannot assign to constant '{name}'")]
    AssignToConst { name: String, span: Span },

    #[error("cannot assign {found} to '{name}' of type {expected}")]
    AssignType { name: String, expected: &'static str, found: &'static str, span: Span },

    #[error("{what} is not callable")]
    NotCallable { what: String, span: Span },

    #[error("'{name}' takes {expected} argument(s), found {found}")]
    ArityMismatch { name: String, expected: usize, found: usize, span: Span },

    #[error("argument {index} of '{name}' must be {expected}, found {found}")]
    ArgType {
        name: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },

    #[error("a function name cannot be used as a value")]
    FnAsValue { span: Span },

    #[error("'{name}' is declared {expected} but its initializer is {found}")]
    DeclType { name: String, expected: &'static str, found: &'static str, span: Span },

    #[error("this function returns {expected}, but the return value is {found}")]
    ReturnType { expected: &'static str, found: &'static str, span: Span },

    #[error("a condition must be bool, found {found}")]
    CondType { found: &'static str, span: Span },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::OperandType { span, .. }
            | LowerError::OperandMismatch { span, .. }
            | LowerError::UnaryOperandType { span, .. }
            | LowerError::NotConst { span, .. }
            | LowerError::DivisionByZero { span }
            | LowerError::IndexOutOfBounds { span, .. }
            | LowerError::IndexBase { span, .. }
            | LowerError::IndexType { span, .. }
            | LowerError::NotAssignable { span }
            | LowerError::AssignToConst { span, .. }
            | LowerError::AssignType { span, .. }
            | LowerError::NotCallable { span, .. }
            | LowerError::ArityMismatch { span, .. }
            | LowerError::ArgType { span, .. }
            | LowerError::FnAsValue { span }
            | LowerError::DeclType { span, .. }
            | LowerError::ReturnType { span, .. }
            | LowerError::CondType { span, .. } => *span,
        }
    }
}

/// Failure marker returned after an error was recorded. Carries no payload:
/// the diagnostic already lives in the lowerer's error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poisoned;

/// Shorthand for lowering steps that may poison their subtree.
pub type Lower<T> = Result<T, Poisoned>;
