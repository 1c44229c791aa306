// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Name resolution for the Tern language.
//!
//! Builds one symbol table per scope anchor (`Block`, `Function`, `Module`),
//! resolves every identifier by walking parent links outward, and exposes the
//! symbol-dependent typed-expression queries (`is_const_expr`,
//! `result_type`). Duplicate names are rejected when declared, not when
//! resolved, so lookups never observe a second binding for a name.

mod resolver;
mod typing;

pub use resolver::{resolve, Resolved, ResolveError, SymbolTable};
