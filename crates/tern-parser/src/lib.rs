// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for the Tern language.
//!
//! Transforms a token stream into an arena-owned abstract syntax tree.

mod parser;

pub use parser::{ParseError, ParseResult, Parser, MAX_NESTING_DEPTH};
