// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Token definitions for the lexer.

use crate::Span;

/// A token produced by the lexer.
///
/// The parser consumes a finalized `&[Token]` ending in one [`TokenKind::Eof`]
/// sentinel; tokens are never mutated or re-lexed after that.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Str(String),
    Bool(bool),

    // Identifier
    Ident(String),

    // Keywords
    Def,
    Var,
    Const,
    Return,
    If,
    Unless,
    Else,
    End,
    And,
    Or,
    Not,
    Is,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    BangEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    LtLt,       // <<
    GtGt,       // >>
    PlusPlus,   // ++
    MinusMinus, // --
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PercentEq,  // %=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=
    LtLtEq,     // <<=
    GtGtEq,     // >>=

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Newline,
    Eof,
}

impl TokenKind {
    /// Human-readable name for error messages.
    pub fn display_name(&self) -> String {
        match self {
            TokenKind::Int(v) => format!("integer '{}'", v),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Bool(b) => format!("'{}'", b),
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::Def => "'def'".to_string(),
            TokenKind::Var => "'var'".to_string(),
            TokenKind::Const => "'const'".to_string(),
            TokenKind::Return => "'return'".to_string(),
            TokenKind::If => "'if'".to_string(),
            TokenKind::Unless => "'unless'".to_string(),
            TokenKind::Else => "'else'".to_string(),
            TokenKind::End => "'end'".to_string(),
            TokenKind::And => "'and'".to_string(),
            TokenKind::Or => "'or'".to_string(),
            TokenKind::Not => "'not'".to_string(),
            TokenKind::Is => "'is'".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::EqEq => "'=='".to_string(),
            TokenKind::BangEq => "'!='".to_string(),
            TokenKind::Lt => "'<'".to_string(),
            TokenKind::Gt => "'>'".to_string(),
            TokenKind::LtEq => "'<='".to_string(),
            TokenKind::GtEq => "'>='".to_string(),
            TokenKind::Amp => "'&'".to_string(),
            TokenKind::Pipe => "'|'".to_string(),
            TokenKind::Caret => "'^'".to_string(),
            TokenKind::Tilde => "'~'".to_string(),
            TokenKind::LtLt => "'<<'".to_string(),
            TokenKind::GtGt => "'>>'".to_string(),
            TokenKind::PlusPlus => "'++'".to_string(),
            TokenKind::MinusMinus => "'--'".to_string(),
            TokenKind::PlusEq => "'+='".to_string(),
            TokenKind::MinusEq => "'-='".to_string(),
            TokenKind::StarEq => "'*='".to_string(),
            TokenKind::SlashEq => "'/='".to_string(),
            TokenKind::PercentEq => "'%='".to_string(),
            TokenKind::AmpEq => "'&='".to_string(),
            TokenKind::PipeEq => "'|='".to_string(),
            TokenKind::CaretEq => "'^='".to_string(),
            TokenKind::LtLtEq => "'<<='".to_string(),
            TokenKind::GtGtEq => "'>>='".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}
