// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for the Tern language.
//!
//! Produces the finalized token array the parser walks: every token carries a
//! byte span, the array ends in one `Eof` sentinel, and nothing is re-lexed
//! afterwards.

mod lexer;

pub use lexer::{LexError, LexResult, Lexer};
