// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The code-generation backend interface.
//!
//! The lowerer walks the resolved tree and drives a [`Backend`] through a
//! small instruction-like vocabulary. Backends choose their own value
//! representation; an emitter's `Value` might be a register name while an
//! interpreter's is the value itself. All type checking happens before a
//! backend method is called, so backends never see an ill-typed operation.

use tern_ast::{NodeId, Span};

use crate::error::LowerError;
use crate::fold;
use crate::ops::{TypedBinaryOp, TypedUnaryOp};
use crate::value::ConstValue;

/// A target for lowered code.
///
/// Declarations are identified by their declaring [`NodeId`], which the
/// resolver guarantees is unique per declaration; backends key their own
/// storage off it.
pub trait Backend {
    /// The backend's representation of one produced value.
    type Value: Clone;

    fn literal(&mut self, value: &ConstValue) -> Self::Value;
    fn binary(&mut self, op: TypedBinaryOp, lhs: Self::Value, rhs: Self::Value, span: Span)
        -> Self::Value;
    fn unary(&mut self, op: TypedUnaryOp, operand: Self::Value, span: Span) -> Self::Value;
    fn index(&mut self, base: Self::Value, index: Self::Value, span: Span) -> Self::Value;

    /// Read a variable or parameter.
    fn load(&mut self, decl: NodeId) -> Self::Value;
    /// Write a variable or parameter.
    fn store(&mut self, decl: NodeId, value: Self::Value);
    /// Write one byte of an indexable value.
    fn store_index(&mut self, base: Self::Value, index: Self::Value, value: Self::Value);

    /// Bring a `var` into scope, with its initial value if it has one.
    fn define_local(&mut self, decl: NodeId, init: Option<Self::Value>);
    /// Bring a fully folded `const` into scope.
    fn define_const(&mut self, decl: NodeId, value: &ConstValue);

    fn call(&mut self, callee: NodeId, args: Vec<Self::Value>, span: Span) -> Self::Value;
    fn ret(&mut self, value: Option<Self::Value>);

    fn begin_function(&mut self, decl: NodeId);
    fn end_function(&mut self);

    /// Open one arm of an `if` chain. `negated` marks `unless` arms: the
    /// body runs when the condition is false.
    fn begin_branch(&mut self, cond: Self::Value, negated: bool);
    /// Open the chain's final `else` block.
    fn begin_else(&mut self);
    /// Close the whole chain.
    fn end_chain(&mut self);

    /// Fold a binary operation over compile-time constants. The default is
    /// the reference semantics in [`fold`]; a backend whose runtime differs
    /// (saturating arithmetic, say) overrides this so both evaluation modes
    /// keep agreeing.
    fn fold_binary(
        &mut self,
        op: TypedBinaryOp,
        lhs: &ConstValue,
        rhs: &ConstValue,
        span: Span,
    ) -> Result<ConstValue, LowerError> {
        fold::binary(op, lhs, rhs, span)
    }

    /// Fold a unary operation over a compile-time constant.
    fn fold_unary(&mut self, op: TypedUnaryOp, operand: &ConstValue) -> ConstValue {
        fold::unary(op, operand)
    }
}
