// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Reference constant folding.
//!
//! These are the default implementations behind
//! [`Backend::fold_binary`](crate::Backend::fold_binary) and
//! [`Backend::fold_unary`](crate::Backend::fold_unary). Integer arithmetic is
//! two's-complement wrapping; shift amounts are taken modulo 64, matching
//! what the reference runtime does, so the two evaluation modes agree.

use tern_ast::Span;

use crate::error::LowerError;
use crate::ops::{TypedBinaryOp, TypedUnaryOp};
use crate::value::ConstValue;

/// Fold one binary operation over two constants.
///
/// The typed op guarantees the constants' kinds; a mismatch here is a bug in
/// the caller, not a user error.
pub fn binary(
    op: TypedBinaryOp,
    lhs: &ConstValue,
    rhs: &ConstValue,
    span: Span,
) -> Result<ConstValue, LowerError> {
    use ConstValue::{Bool, Int, Str};
    use TypedBinaryOp::*;
    Ok(match (op, lhs, rhs) {
        (IntAdd, Int(a), Int(b)) => Int(a.wrapping_add(*b)),
        (IntSub, Int(a), Int(b)) => Int(a.wrapping_sub(*b)),
        (IntMul, Int(a), Int(b)) => Int(a.wrapping_mul(*b)),
        (IntDiv, Int(_), Int(0)) | (IntMod, Int(_), Int(0)) => {
            return Err(LowerError::DivisionByZero { span })
        }
        (IntDiv, Int(a), Int(b)) => Int(a.wrapping_div(*b)),
        (IntMod, Int(a), Int(b)) => Int(a.wrapping_rem(*b)),
        (IntAnd, Int(a), Int(b)) => Int(a & b),
        (IntOr, Int(a), Int(b)) => Int(a | b),
        (IntXor, Int(a), Int(b)) => Int(a ^ b),
        (IntShl, Int(a), Int(b)) => Int(a.wrapping_shl(*b as u32)),
        (IntShr, Int(a), Int(b)) => Int(a.wrapping_shr(*b as u32)),
        (IntEq, Int(a), Int(b)) => Bool(a == b),
        (IntNe, Int(a), Int(b)) => Bool(a != b),
        (IntLt, Int(a), Int(b)) => Bool(a < b),
        (IntLe, Int(a), Int(b)) => Bool(a <= b),
        (IntGt, Int(a), Int(b)) => Bool(a > b),
        (IntGe, Int(a), Int(b)) => Bool(a >= b),
        (BoolAnd, Bool(a), Bool(b)) => Bool(*a && *b),
        (BoolOr, Bool(a), Bool(b)) => Bool(*a || *b),
        (BoolEq, Bool(a), Bool(b)) => Bool(a == b),
        (BoolNe, Bool(a), Bool(b)) => Bool(a != b),
        (StrConcat, Str(a), Str(b)) => Str(format!("{}{}", a, b)),
        (StrEq, Str(a), Str(b)) => Bool(a == b),
        (StrNe, Str(a), Str(b)) => Bool(a != b),
        _ => unreachable!("typed op {:?} over {} and {}", op, lhs.type_name(), rhs.type_name()),
    })
}

/// Fold one unary operation over a constant.
pub fn unary(op: TypedUnaryOp, operand: &ConstValue) -> ConstValue {
    use ConstValue::{Bool, Int};
    match (op, operand) {
        (TypedUnaryOp::IntNeg, Int(v)) => Int(v.wrapping_neg()),
        (TypedUnaryOp::IntBitNot, Int(v)) => Int(!v),
        (TypedUnaryOp::BoolNot, Bool(b)) => Bool(!b),
        _ => unreachable!("typed op {:?} over {}", op, operand.type_name()),
    }
}

/// Index a constant string with a constant index, yielding the byte.
pub fn index(base: &str, index: i64, span: Span) -> Result<ConstValue, LowerError> {
    let len = base.len();
    if index < 0 || index as usize >= len {
        return Err(LowerError::IndexOutOfBounds { index, len, span });
    }
    Ok(ConstValue::Int(base.as_bytes()[index as usize] as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 1)
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let max = ConstValue::Int(i64::MAX);
        let one = ConstValue::Int(1);
        assert_eq!(binary(TypedBinaryOp::IntAdd, &max, &one, span()), Ok(ConstValue::Int(i64::MIN)));
        assert_eq!(
            unary(TypedUnaryOp::IntNeg, &ConstValue::Int(i64::MIN)),
            ConstValue::Int(i64::MIN)
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let zero = ConstValue::Int(0);
        let seven = ConstValue::Int(7);
        assert!(matches!(
            binary(TypedBinaryOp::IntDiv, &seven, &zero, span()),
            Err(LowerError::DivisionByZero { .. })
        ));
        assert!(matches!(
            binary(TypedBinaryOp::IntMod, &seven, &zero, span()),
            Err(LowerError::DivisionByZero { .. })
        ));
        assert_eq!(binary(TypedBinaryOp::IntDiv, &seven, &ConstValue::Int(2), span()), Ok(ConstValue::Int(3)));
    }

    #[test]
    fn shifts_take_the_amount_modulo_64() {
        let one = ConstValue::Int(1);
        assert_eq!(
            binary(TypedBinaryOp::IntShl, &one, &ConstValue::Int(65), span()),
            Ok(ConstValue::Int(2))
        );
    }

    #[test]
    fn string_operations() {
        let a = ConstValue::Str("ab".into());
        let b = ConstValue::Str("cd".into());
        assert_eq!(
            binary(TypedBinaryOp::StrConcat, &a, &b, span()),
            Ok(ConstValue::Str("abcd".into()))
        );
        assert_eq!(binary(TypedBinaryOp::StrEq, &a, &a.clone(), span()), Ok(ConstValue::Bool(true)));
        assert_eq!(index("abc", 1, span()), Ok(ConstValue::Int(b'b' as i64)));
        assert!(matches!(index("abc", 3, span()), Err(LowerError::IndexOutOfBounds { .. })));
        assert!(matches!(index("abc", -1, span()), Err(LowerError::IndexOutOfBounds { .. })));
    }
}
