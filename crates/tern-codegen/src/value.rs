// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compile-time constant values.

use tern_ast::Type;

/// A value that exists at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl ConstValue {
    /// The language type of this constant.
    pub fn ty(&self) -> Type {
        match self {
            ConstValue::Int(_) => Type::Int,
            ConstValue::Bool(_) => Type::Bool,
            ConstValue::Str(_) => Type::Str,
        }
    }

    /// Type name for error messages.
    pub fn type_name(&self) -> &'static str {
        self.ty().name()
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{}", v),
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}
