// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type-directed operator selection.
//!
//! This is the single place where (operator, operand types) is mapped to a
//! concrete lowering. Both evaluation modes — runtime emission and constant
//! folding — go through the same two functions, so the modes cannot drift
//! apart in which combinations they accept.

use tern_ast::node::{BinOp, UnaryOp};
use tern_ast::{Span, Type};

use crate::error::{LowerError, Side};

/// A binary operation with its operand types already checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedBinaryOp {
    IntAdd,
    IntSub,
    IntMul,
    IntDiv,
    IntMod,
    IntAnd,
    IntOr,
    IntXor,
    IntShl,
    IntShr,
    IntEq,
    IntNe,
    IntLt,
    IntLe,
    IntGt,
    IntGe,
    BoolAnd,
    BoolOr,
    BoolEq,
    BoolNe,
    StrConcat,
    StrEq,
    StrNe,
}

impl TypedBinaryOp {
    /// The type the lowered operation produces.
    pub fn result_type(self) -> Type {
        use TypedBinaryOp::*;
        match self {
            IntAdd | IntSub | IntMul | IntDiv | IntMod | IntAnd | IntOr | IntXor | IntShl
            | IntShr => Type::Int,
            IntEq | IntNe | IntLt | IntLe | IntGt | IntGe | BoolAnd | BoolOr | BoolEq | BoolNe
            | StrEq | StrNe => Type::Bool,
            StrConcat => Type::Str,
        }
    }
}

/// A unary operation with its operand type already checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedUnaryOp {
    IntNeg,
    IntBitNot,
    BoolNot,
}

/// One operand as the selection functions see it: its static type and the
/// span to blame when it violates a constraint.
#[derive(Debug, Clone, Copy)]
pub struct Operand {
    pub ty: Type,
    pub span: Span,
}

/// Select the lowering for a binary operator over the given operand types.
pub fn select_binary(op: BinOp, lhs: Operand, rhs: Operand) -> Result<TypedBinaryOp, LowerError> {
    use BinOp::*;
    match op {
        And | Or => {
            require(op, Side::Left, lhs, Type::Bool)?;
            require(op, Side::Right, rhs, Type::Bool)?;
            Ok(if op == And { TypedBinaryOp::BoolAnd } else { TypedBinaryOp::BoolOr })
        }
        BitAnd | BitOr | BitXor | Shl | Shr => {
            require(op, Side::Left, lhs, Type::Int)?;
            require(op, Side::Right, rhs, Type::Int)?;
            Ok(match op {
                BitAnd => TypedBinaryOp::IntAnd,
                BitOr => TypedBinaryOp::IntOr,
                BitXor => TypedBinaryOp::IntXor,
                Shl => TypedBinaryOp::IntShl,
                _ => TypedBinaryOp::IntShr,
            })
        }
        Add => match (lhs.ty, rhs.ty) {
            (Type::Int, Type::Int) => Ok(TypedBinaryOp::IntAdd),
            (Type::Str, Type::Str) => Ok(TypedBinaryOp::StrConcat),
            (l, r) if l == r => Err(domain_error(op, "int or str", lhs)),
            _ => Err(mismatch(op, lhs, rhs)),
        },
        Sub | Mul | Div | Mod => {
            require(op, Side::Left, lhs, Type::Int)?;
            require(op, Side::Right, rhs, Type::Int)?;
            Ok(match op {
                Sub => TypedBinaryOp::IntSub,
                Mul => TypedBinaryOp::IntMul,
                Div => TypedBinaryOp::IntDiv,
                _ => TypedBinaryOp::IntMod,
            })
        }
        Eq | Ne => {
            let eq = op == Eq;
            match (lhs.ty, rhs.ty) {
                (Type::Int, Type::Int) => {
                    Ok(if eq { TypedBinaryOp::IntEq } else { TypedBinaryOp::IntNe })
                }
                (Type::Bool, Type::Bool) => {
                    Ok(if eq { TypedBinaryOp::BoolEq } else { TypedBinaryOp::BoolNe })
                }
                (Type::Str, Type::Str) => {
                    Ok(if eq { TypedBinaryOp::StrEq } else { TypedBinaryOp::StrNe })
                }
                (l, r) if l == r => Err(domain_error(op, "int, bool, or str", lhs)),
                _ => Err(mismatch(op, lhs, rhs)),
            }
        }
        Lt | Le | Gt | Ge => {
            require(op, Side::Left, lhs, Type::Int)?;
            require(op, Side::Right, rhs, Type::Int)?;
            Ok(match op {
                Lt => TypedBinaryOp::IntLt,
                Le => TypedBinaryOp::IntLe,
                Gt => TypedBinaryOp::IntGt,
                _ => TypedBinaryOp::IntGe,
            })
        }
    }
}

/// Select the lowering for a unary operator. `Ok(None)` means the operation
/// is the identity (unary `+` on int) and no code needs to be emitted.
pub fn select_unary(op: UnaryOp, operand: Operand) -> Result<Option<TypedUnaryOp>, LowerError> {
    let expected = match op {
        UnaryOp::Not => Type::Bool,
        UnaryOp::Neg | UnaryOp::Pos | UnaryOp::BitNot => Type::Int,
    };
    if operand.ty != expected {
        return Err(LowerError::UnaryOperandType {
            op_name: op.name(),
            op_symbol: op.symbol(),
            expected: expected.name(),
            found: operand.ty.name(),
            span: operand.span,
        });
    }
    Ok(match op {
        UnaryOp::Neg => Some(TypedUnaryOp::IntNeg),
        UnaryOp::Pos => None,
        UnaryOp::Not => Some(TypedUnaryOp::BoolNot),
        UnaryOp::BitNot => Some(TypedUnaryOp::IntBitNot),
    })
}

fn require(op: BinOp, side: Side, operand: Operand, expected: Type) -> Result<(), LowerError> {
    if operand.ty == expected {
        return Ok(());
    }
    Err(LowerError::OperandType {
        op_name: op.name(),
        op_symbol: op.symbol(),
        expected: expected.name(),
        side,
        found: operand.ty.name(),
        span: operand.span,
    })
}

fn domain_error(op: BinOp, expected: &'static str, lhs: Operand) -> LowerError {
    LowerError::OperandType {
        op_name: op.name(),
        op_symbol: op.symbol(),
        expected,
        side: Side::Left,
        found: lhs.ty.name(),
        span: lhs.span,
    }
}

fn mismatch(op: BinOp, lhs: Operand, rhs: Operand) -> LowerError {
    // No promotion rule exists between mismatched operand types; if the
    // language ever gains one, this is the function to teach it to.
    LowerError::OperandMismatch {
        op_name: op.name(),
        op_symbol: op.symbol(),
        lhs: lhs.ty.name(),
        rhs: rhs.ty.name(),
        span: lhs.span.to(rhs.span),
    }
}
