// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The lexer implementation using logos.

use logos::Logos;
use tern_ast::token::{Token, TokenKind};
use tern_ast::Span;
use thiserror::Error;

/// Raw token type for logos - literal values are decoded in a second pass.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Horizontal whitespace; newlines are tokens
#[logos(skip r"#[^\n]*")] // Line comments
enum RawToken {
    // === Keywords ===
    #[token("def")]
    Def,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("unless")]
    Unless,
    #[token("else")]
    Else,
    #[token("end")]
    End,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("is")]
    Is,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Operators (longest first where prefixes overlap) ===
    #[token("<<=")]
    LtLtEq,
    #[token(">>=")]
    GtGtEq,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("\n")]
    Newline,

    // === Literals ===
    #[regex(r"[0-9][0-9_]*")]
    Int,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    // === Identifier (after keywords) ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// A lexical error with its source position.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },
    #[error("integer literal too large")]
    IntOutOfRange { span: Span },
    #[error("unknown escape sequence '\\{ch}'")]
    UnknownEscape { ch: char, span: Span },
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. }
            | LexError::IntOutOfRange { span }
            | LexError::UnknownEscape { span, .. }
            | LexError::UnterminatedString { span } => *span,
        }
    }
}

/// Result of lexing: the token array plus any errors found.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The lexer for Tern source code.
pub struct Lexer<'a> {
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Tokenize the entire source, collecting errors rather than stopping.
    ///
    /// Always appends the `Eof` sentinel, even after errors, so the parser
    /// can rely on the array being non-empty and terminated.
    pub fn tokenize(&self) -> LexResult {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut raw = RawToken::lexer(self.source);

        while let Some(result) = raw.next() {
            let span = Span::new(raw.span().start, raw.span().end);
            match result {
                Ok(tok) => match convert(tok, raw.slice(), span) {
                    Ok(kind) => tokens.push(Token { kind, span }),
                    Err(e) => errors.push(e),
                },
                Err(()) => {
                    let ch = self.source[span.start..].chars().next().unwrap_or('?');
                    if ch == '"' {
                        errors.push(LexError::UnterminatedString { span });
                    } else {
                        errors.push(LexError::UnexpectedChar { ch, span });
                    }
                }
            }
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(self.source.len(), self.source.len()),
        });

        LexResult { tokens, errors }
    }
}

/// Convert a raw logos token to a `TokenKind`, decoding literal payloads.
fn convert(raw: RawToken, slice: &str, span: Span) -> Result<TokenKind, LexError> {
    Ok(match raw {
        RawToken::Def => TokenKind::Def,
        RawToken::Var => TokenKind::Var,
        RawToken::Const => TokenKind::Const,
        RawToken::Return => TokenKind::Return,
        RawToken::If => TokenKind::If,
        RawToken::Unless => TokenKind::Unless,
        RawToken::Else => TokenKind::Else,
        RawToken::End => TokenKind::End,
        RawToken::And => TokenKind::And,
        RawToken::Or => TokenKind::Or,
        RawToken::Not => TokenKind::Not,
        RawToken::Is => TokenKind::Is,
        RawToken::True => TokenKind::Bool(true),
        RawToken::False => TokenKind::Bool(false),

        RawToken::LtLtEq => TokenKind::LtLtEq,
        RawToken::GtGtEq => TokenKind::GtGtEq,
        RawToken::PlusPlus => TokenKind::PlusPlus,
        RawToken::MinusMinus => TokenKind::MinusMinus,
        RawToken::PlusEq => TokenKind::PlusEq,
        RawToken::MinusEq => TokenKind::MinusEq,
        RawToken::StarEq => TokenKind::StarEq,
        RawToken::SlashEq => TokenKind::SlashEq,
        RawToken::PercentEq => TokenKind::PercentEq,
        RawToken::AmpEq => TokenKind::AmpEq,
        RawToken::PipeEq => TokenKind::PipeEq,
        RawToken::CaretEq => TokenKind::CaretEq,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::BangEq => TokenKind::BangEq,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::LtLt => TokenKind::LtLt,
        RawToken::GtGt => TokenKind::GtGt,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Eq => TokenKind::Eq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Gt => TokenKind::Gt,
        RawToken::Amp => TokenKind::Amp,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::Caret => TokenKind::Caret,
        RawToken::Tilde => TokenKind::Tilde,

        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Newline => TokenKind::Newline,

        RawToken::Int => {
            let digits: String = slice.chars().filter(|&c| c != '_').collect();
            let value = digits
                .parse::<i64>()
                .map_err(|_| LexError::IntOutOfRange { span })?;
            TokenKind::Int(value)
        }
        RawToken::Str => TokenKind::Str(decode_string(slice, span)?),
        RawToken::Ident => TokenKind::Ident(slice.to_string()),
    })
}

/// Decode a quoted string literal, processing escape sequences.
fn decode_string(slice: &str, span: Span) -> Result<String, LexError> {
    let body = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some(ch) => return Err(LexError::UnknownEscape { ch, span }),
            None => unreachable!("regex guarantees escapes are followed by a character"),
        }
    }
    Ok(out)
}
