// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversions from phase error types to [`Diagnostic`].
//!
//! Code blocks are assigned per phase: `E00xx` lexing, `E01xx` parsing,
//! `E02xx` resolution, `E03xx` lowering.

use tern_codegen::LowerError;
use tern_lexer::LexError;
use tern_parser::ParseError;
use tern_resolve::ResolveError;

use crate::{Diagnostic, ToDiagnostic};

impl ToDiagnostic for LexError {
    fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            LexError::UnexpectedChar { span, .. } => {
                diag.with_code("E0001").with_primary(*span, "this character is not part of the language")
            }
            LexError::IntOutOfRange { span } => diag
                .with_code("E0002")
                .with_primary(*span, "does not fit in a 64-bit integer"),
            LexError::UnknownEscape { span, .. } => diag
                .with_code("E0003")
                .with_primary(*span, "unknown escape")
                .with_help("valid escapes are \\n, \\t, \\r, \\0, \\\\, and \\\""),
            LexError::UnterminatedString { span } => diag
                .with_code("E0004")
                .with_primary(*span, "string starts here and never closes"),
        }
    }
}

impl ToDiagnostic for ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
            .with_code("E0100")
            .with_primary(self.span, "here")
    }
}

impl ToDiagnostic for ResolveError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::Unknown { span, .. } => Diagnostic::error(self.to_string())
                .with_code("E0200")
                .with_primary(*span, "not found in this scope or any enclosing one"),
            ResolveError::Duplicate { span, first, .. } => Diagnostic::error(self.to_string())
                .with_code("E0201")
                .with_primary(*span, "declared again here")
                .with_secondary(*first, "first declared here")
                .with_note("later uses refer to the first declaration"),
        }
    }
}

impl ToDiagnostic for LowerError {
    fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            LowerError::OperandType { found, .. } => diag
                .with_code("E0300")
                .with_primary(self.span(), format!("this is {}", found)),
            LowerError::OperandMismatch { .. } => diag
                .with_code("E0301")
                .with_primary(self.span(), "operand types differ")
                .with_note("values are never converted implicitly"),
            LowerError::UnaryOperandType { found, .. } => diag
                .with_code("E0302")
                .with_primary(self.span(), format!("this is {}", found)),
            LowerError::NotConst { .. } => diag
                .with_code("E0310")
                .with_primary(self.span(), "not a constant")
                .with_help("only literals, `const` names, and operators over them can appear here"),
            LowerError::DivisionByZero { .. } => {
                diag.with_code("E0311").with_primary(self.span(), "the divisor is zero")
            }
            LowerError::IndexOutOfBounds { len, .. } => diag
                .with_code("E0312")
                .with_primary(self.span(), format!("valid indices are 0..{}", len)),
            LowerError::IndexBase { found, .. } => diag
                .with_code("E0313")
                .with_primary(self.span(), format!("this is {}", found)),
            LowerError::IndexType { found, .. } => diag
                .with_code("E0314")
                .with_primary(self.span(), format!("this is {}", found)),
            LowerError::NotAssignable { .. } => diag
                .with_code("E0320")
                .with_primary(self.span(), "this expression has no storage"),
            LowerError::AssignToConst { .. } => diag
                .with_code("E0321")
                .with_primary(self.span(), "declared with `const`")
                .with_help("declare it with `var` to allow assignment"),
            LowerError::AssignType { expected, .. } => diag
                .with_code("E0322")
                .with_primary(self.span(), format!("expected {}", expected)),
            LowerError::NotCallable { .. } => {
                diag.with_code("E0330").with_primary(self.span(), "not a function")
            }
            LowerError::ArityMismatch { expected, .. } => diag
                .with_code("E0331")
                .with_primary(self.span(), format!("expected {} argument(s)", expected)),
            LowerError::ArgType { expected, .. } => diag
                .with_code("E0332")
                .with_primary(self.span(), format!("expected {}", expected)),
            LowerError::FnAsValue { .. } => diag
                .with_code("E0333")
                .with_primary(self.span(), "functions can only be called"),
            LowerError::DeclType { expected, .. } => diag
                .with_code("E0340")
                .with_primary(self.span(), format!("expected {}", expected)),
            LowerError::ReturnType { expected, .. } => diag
                .with_code("E0341")
                .with_primary(self.span(), format!("this function returns {}", expected)),
            LowerError::CondType { found, .. } => diag
                .with_code("E0342")
                .with_primary(self.span(), format!("this is {}", found)),
        }
    }
}
