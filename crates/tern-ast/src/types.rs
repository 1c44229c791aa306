// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Value types of the Tern language.

/// The type an expression produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// 64-bit signed integer.
    Int,
    Bool,
    Str,
    /// Function return type only; no expression produces `void`.
    Void,
    /// Placeholder when resolution or typing already failed. Queries stay
    /// total on ill-formed trees; the recorded error gates emission.
    Unknown,
}

impl Type {
    /// Type name as spelled in source, for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Bool => "bool",
            Type::Str => "str",
            Type::Void => "void",
            Type::Unknown => "<unknown>",
        }
    }

    /// Parse a type annotation as written in source.
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "int" => Some(Type::Int),
            "bool" => Some(Type::Bool),
            "str" => Some(Type::Str),
            "void" => Some(Type::Void),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
