// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation: precedence-climbing recursive descent.
//!
//! The expression grammar is a chain of [`Level`]s, loosest-binding first.
//! Every binary tier goes through [`Parser::parse_binary`], which parses the
//! next-tighter tier for its left operand and then either consumes one of the
//! tier's operator tokens — recursing into the *same* tier for the right
//! operand, so all binary operators are right-associative — or wraps the left
//! operand in a no-op passthrough node for that tier.
//!
//! Parsing is fail-fast: the first structural error aborts the whole unit and
//! no partial nodes survive. Decisions need one token of lookahead, except
//! the logical-or tier which looks one token past `or` to keep `or if` /
//! `or unless` for the conditional-chain grammar.

use tern_ast::node::{BinOp, IfArm, Level, NodeKind, UnaryOp};
use tern_ast::token::{Token, TokenKind};
use tern_ast::{Arena, NodeId, Span, Type};
use thiserror::Error;

/// Maximum expression nesting depth before parsing is aborted.
///
/// Parsing and the later lowering walk are plain call-stack recursion, so
/// input nesting depth is a resource limit; this bound keeps both inside a
/// default thread stack.
pub const MAX_NESTING_DEPTH: usize = 128;

/// A parser error with location and friendly message.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        Self { span, message: message.into() }
    }

    fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        let message = match found {
            TokenKind::Eof => format!("Expected {}, but the input ended", expected),
            _ => format!("Expected {}, found {}", expected, found.display_name()),
        };
        Self { span, message }
    }
}

/// Result of parsing: the arena and module root, or the error that aborted.
#[derive(Debug)]
pub struct ParseResult {
    pub arena: Arena,
    pub module: Option<NodeId>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Returns true if parsing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The parser for Tern source code.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    arena: Arena,
    /// Current expression nesting depth, bounded by [`MAX_NESTING_DEPTH`].
    depth: usize,
}

impl Parser {
    /// Takes the finalized token array; the last token must be `Eof`.
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof));
        Self { tokens, pos: 0, arena: Arena::new(), depth: 0 }
    }

    /// Parse one compilation unit.
    pub fn parse(mut self) -> ParseResult {
        match self.parse_module() {
            Ok(module) => {
                ParseResult { arena: self.arena, module: Some(module), errors: Vec::new() }
            }
            // Fail-fast: discard everything built so far.
            Err(e) => ParseResult { arena: Arena::new(), module: None, errors: vec![e] },
        }
    }

    /// Parse a single expression (the whole input must be that expression).
    ///
    /// Exposed for tools that evaluate expressions outside a module, and for
    /// tests of individual grammar tiers.
    pub fn parse_expression(mut self) -> Result<(Arena, NodeId), ParseError> {
        self.skip_newlines();
        let expr = self.parse_expr()?;
        self.skip_newlines();
        if !self.at_end() {
            return Err(ParseError::expected(
                "end of input after expression",
                self.current_kind(),
                self.current().span,
            ));
        }
        Ok((self.arena, expr))
    }

    /// Whether the upcoming tokens could begin an expression.
    pub fn peeks_expression(&self) -> bool {
        self.peek_level(Level::Assign)
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        // The Eof sentinel is never consumed, so this cannot run off the end.
        &self.tokens[self.pos]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, n: usize) -> &TokenKind {
        self.tokens.get(self.pos + n).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos - 1]
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                &kind.display_name(),
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok((name, span))
            }
            other => Err(ParseError::expected("a name", other, self.current().span)),
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// At a token that closes the enclosing block without being consumed
    /// here: `end`, `else`, the `or` of `or if`/`or unless`, or `Eof`.
    fn at_block_end(&self) -> bool {
        match self.current_kind() {
            TokenKind::End | TokenKind::Else | TokenKind::Eof => true,
            TokenKind::Or => matches!(self.peek(1), TokenKind::If | TokenKind::Unless),
            _ => false,
        }
    }

    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Newline) {
            self.advance();
            self.skip_newlines();
            Ok(())
        } else if self.at_block_end() {
            Ok(())
        } else {
            Err(ParseError::expected(
                "newline after statement",
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    // =========================================================================
    // Declarations and Statements
    // =========================================================================

    fn parse_module(&mut self) -> Result<NodeId, ParseError> {
        let mut decls = Vec::new();
        self.skip_newlines();
        while !self.at_end() {
            decls.push(self.parse_stmt()?);
            self.expect_terminator()?;
            self.skip_newlines();
        }
        let end = self.current().span.end;
        Ok(self.arena.alloc(NodeKind::Module { decls }, Span::new(0, end)))
    }

    fn parse_stmt(&mut self) -> Result<NodeId, ParseError> {
        match self.current_kind() {
            TokenKind::Def => self.parse_func(),
            TokenKind::Var => self.parse_var(),
            TokenKind::Const => self.parse_const(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If | TokenKind::Unless => self.parse_if(),
            _ if self.peeks_expression() => {
                let expr = self.parse_expr()?;
                let span = self.arena.span(expr);
                Ok(self.arena.alloc(NodeKind::ExprStmt { expr }, span))
            }
            other => Err(ParseError::expected("a statement", other, self.current().span)),
        }
    }

    fn parse_func(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect(&TokenKind::Def)?.span;
        let (name, _) = self.expect_ident()?;

        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RParen) {
            let (pname, pspan) = self.expect_ident()?;
            self.expect(&TokenKind::Colon)?;
            let (ty, tspan) = self.parse_type()?;
            params.push(
                self.arena.alloc(NodeKind::Param { name: pname, ty }, pspan.to(tspan)),
            );
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RParen)?;

        let ret = if self.match_token(&TokenKind::Colon) {
            self.parse_type()?.0
        } else {
            Type::Void
        };

        self.expect(&TokenKind::Newline)?;
        let body = self.parse_block()?;
        let end = self.expect(&TokenKind::End)?.span;
        Ok(self.arena.alloc(
            NodeKind::Function { name, params, ret, body },
            start.to(end),
        ))
    }

    /// Statements up to (not including) the enclosing block's closing token.
    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        self.skip_newlines();
        let start = self.current().span.start;
        let mut stmts = Vec::new();
        while !self.at_block_end() {
            stmts.push(self.parse_stmt()?);
            self.expect_terminator()?;
            self.skip_newlines();
        }
        let span = match (stmts.first(), stmts.last()) {
            (Some(&first), Some(&last)) => self.arena.span(first).to(self.arena.span(last)),
            _ => Span::new(start, start),
        };
        Ok(self.arena.alloc(NodeKind::Block { stmts }, span))
    }

    fn parse_var(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect(&TokenKind::Var)?.span;
        let (name, name_span) = self.expect_ident()?;
        let ty = if self.match_token(&TokenKind::Colon) {
            Some(self.parse_type()?.0)
        } else {
            None
        };
        let init = if self.match_token(&TokenKind::Eq) {
            self.skip_newlines();
            Some(self.parse_expr()?)
        } else {
            None
        };
        if ty.is_none() && init.is_none() {
            return Err(ParseError::new(
                format!("variable '{}' needs a type annotation or an initializer", name),
                start.to(name_span),
            ));
        }
        let span = start.to(self.prev_span());
        Ok(self.arena.alloc(NodeKind::VarDecl { name, ty, init }, span))
    }

    fn parse_const(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect(&TokenKind::Const)?.span;
        let (name, _) = self.expect_ident()?;
        let ty = if self.match_token(&TokenKind::Colon) {
            Some(self.parse_type()?.0)
        } else {
            None
        };
        self.expect(&TokenKind::Eq)?;
        self.skip_newlines();
        let init = self.parse_expr()?;
        let span = start.to(self.arena.span(init));
        Ok(self.arena.alloc(NodeKind::ConstDecl { name, ty, init }, span))
    }

    fn parse_return(&mut self) -> Result<NodeId, ParseError> {
        let start = self.expect(&TokenKind::Return)?.span;
        let value = if self.peeks_expression() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = match value {
            Some(v) => start.to(self.arena.span(v)),
            None => start,
        };
        Ok(self.arena.alloc(NodeKind::Return { value }, span))
    }

    /// `if`/`unless` chain, continued by `or if`/`or unless`, optionally
    /// closed by `else`, terminated by `end`.
    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        let mut arms = Vec::new();
        loop {
            let negated = match self.current_kind() {
                TokenKind::If => false,
                TokenKind::Unless => true,
                other => {
                    return Err(ParseError::expected("'if' or 'unless'", other, self.current().span))
                }
            };
            self.advance();
            let cond = self.parse_expr()?;
            self.expect(&TokenKind::Newline)?;
            let body = self.parse_block()?;
            arms.push(IfArm { cond, negated, body });

            // `or if` / `or unless` continues the chain.
            if self.check(&TokenKind::Or) {
                self.advance();
                continue;
            }
            break;
        }

        let else_block = if self.match_token(&TokenKind::Else) {
            self.expect(&TokenKind::Newline)?;
            Some(self.parse_block()?)
        } else {
            None
        };

        let end = self.expect(&TokenKind::End)?.span;
        Ok(self.arena.alloc(NodeKind::If { arms, else_block }, start.to(end)))
    }

    fn parse_type(&mut self) -> Result<(Type, Span), ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => match Type::from_name(name) {
                Some(ty) => {
                    let span = self.advance().span;
                    Ok((ty, span))
                }
                None => Err(ParseError::new(
                    format!("unknown type '{}'", name),
                    self.current().span,
                )),
            },
            other => Err(ParseError::expected("a type name", other, self.current().span)),
        }
    }

    // =========================================================================
    // Expression Grammar Chain
    // =========================================================================

    /// Entry into the chain: the assignment tier, with the nesting guard.
    fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        self.descend(|p| p.parse_level(Level::Assign))
    }

    /// Count one level of input-driven recursion against the nesting bound.
    ///
    /// Every recursion whose depth grows with the input goes through here:
    /// the expression entry (parens, assignment right-hand sides, call
    /// arguments, index expressions), each binary tier's same-tier right
    /// operand, and each stacked prefix operator. The fixed descent through
    /// the tiers themselves is not counted, so the bound tracks the input
    /// rather than the number of tiers.
    fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::new(
                format!("expression nesting exceeds the supported depth of {}", MAX_NESTING_DEPTH),
                self.current().span,
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_level(&mut self, level: Level) -> Result<NodeId, ParseError> {
        match level {
            Level::Assign => self.parse_assign(),
            Level::Unary => self.parse_unary(),
            Level::Postfix => self.parse_postfix(),
            Level::Primary => self.parse_primary(),
            binary => self.parse_binary(binary),
        }
    }

    /// Could the next token(s) begin a production of `level`?
    ///
    /// Binary tiers delegate to the next-tighter tier; the unary tier adds
    /// its own leading tokens.
    fn peek_level(&self, level: Level) -> bool {
        match level {
            Level::Unary => {
                matches!(
                    self.current_kind(),
                    TokenKind::Minus
                        | TokenKind::Plus
                        | TokenKind::Not
                        | TokenKind::Tilde
                        | TokenKind::LParen
                ) || self.peek_level(Level::Postfix)
            }
            Level::Postfix => self.peek_level(Level::Primary),
            Level::Primary => matches!(
                self.current_kind(),
                TokenKind::Int(_) | TokenKind::Str(_) | TokenKind::Bool(_) | TokenKind::Ident(_)
            ),
            lower => self.peek_level(lower.next()),
        }
    }

    fn parse_assign(&mut self) -> Result<NodeId, ParseError> {
        let target = self.parse_level(Level::LogicalOr)?;
        if let Some(op) = self.match_assign_op() {
            self.skip_newlines();
            let value = self.parse_expr()?; // right-associative
            let span = self.arena.span(target).to(self.arena.span(value));
            return Ok(self.arena.alloc(NodeKind::Assign { op, target, value }, span));
        }
        let span = self.arena.span(target);
        Ok(self.arena.alloc(NodeKind::Passthrough { level: Level::Assign, inner: target }, span))
    }

    /// Consume an assignment operator if present. `Some(None)` is plain `=`;
    /// `Some(Some(op))` is the compound form.
    fn match_assign_op(&mut self) -> Option<Option<BinOp>> {
        let op = match self.current_kind() {
            TokenKind::Eq => None,
            TokenKind::PlusEq => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            TokenKind::PercentEq => Some(BinOp::Mod),
            TokenKind::AmpEq => Some(BinOp::BitAnd),
            TokenKind::PipeEq => Some(BinOp::BitOr),
            TokenKind::CaretEq => Some(BinOp::BitXor),
            TokenKind::LtLtEq => Some(BinOp::Shl),
            TokenKind::GtGtEq => Some(BinOp::Shr),
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Shared shape of every binary-operator tier.
    fn parse_binary(&mut self, level: Level) -> Result<NodeId, ParseError> {
        let lhs = self.parse_level(level.next())?;
        if let Some(op) = self.match_binary_op(level) {
            self.skip_newlines(); // operator may end a line
            let rhs = self.descend(|p| p.parse_binary(level))?; // same tier: right-associative
            let span = self.arena.span(lhs).to(self.arena.span(rhs));
            return Ok(self.arena.alloc(NodeKind::Binary { op, lhs, rhs }, span));
        }
        let span = self.arena.span(lhs);
        Ok(self.arena.alloc(NodeKind::Passthrough { level, inner: lhs }, span))
    }

    /// Consume one of `level`'s operator tokens, if the current token is one.
    fn match_binary_op(&mut self, level: Level) -> Option<BinOp> {
        match level {
            Level::LogicalOr => {
                // `or` immediately followed by `if`/`unless` belongs to the
                // conditional-chain grammar, not to this tier.
                if self.check(&TokenKind::Or)
                    && !matches!(self.peek(1), TokenKind::If | TokenKind::Unless)
                {
                    self.advance();
                    return Some(BinOp::Or);
                }
                None
            }
            Level::Comparison if self.check(&TokenKind::Is) => {
                // `is` / `is not` are parse-time spellings of `==` / `!=`.
                self.advance();
                if self.match_token(&TokenKind::Not) {
                    Some(BinOp::Ne)
                } else {
                    Some(BinOp::Eq)
                }
            }
            _ => {
                for (kind, op) in level_ops(level) {
                    if self.check(kind) {
                        self.advance();
                        return Some(*op);
                    }
                }
                None
            }
        }
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        let op = match self.current_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.descend(|p| p.parse_unary())?; // prefix operators stack
            let span = start.to(self.arena.span(operand));
            return Ok(self.arena.alloc(NodeKind::Unary { op, operand }, span));
        }

        if self.check(&TokenKind::LParen) {
            self.advance();
            self.skip_newlines();
            let inner = self.parse_expr()?;
            self.skip_newlines();
            let close = self.expect(&TokenKind::RParen)?.span;
            // Kept as a distinct node so diagnostics can span the parentheses.
            return Ok(self.arena.alloc(NodeKind::Paren { inner }, start.to(close)));
        }

        self.parse_postfix()
    }

    /// Primary expression followed by zero or more postfix forms, chaining
    /// left-associatively. `++`/`--` wrap once and end the chain; calls and
    /// indexing keep looping.
    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_kind() {
                TokenKind::PlusPlus => {
                    let end = self.advance().span;
                    let span = self.arena.span(expr).to(end);
                    expr = self.arena.alloc(NodeKind::PostIncr { target: expr }, span);
                    break;
                }
                TokenKind::MinusMinus => {
                    let end = self.advance().span;
                    let span = self.arena.span(expr).to(end);
                    expr = self.arena.alloc(NodeKind::PostDecr { target: expr }, span);
                    break;
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    let end = self.expect(&TokenKind::RParen)?.span;
                    let span = self.arena.span(expr).to(end);
                    expr = self.arena.alloc(NodeKind::Call { callee: expr, args }, span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.skip_newlines();
                    let index = self.parse_expr()?;
                    self.skip_newlines();
                    let end = self.expect(&TokenKind::RBracket)?.span;
                    let span = self.arena.span(expr).to(end);
                    expr = self.arena.alloc(NodeKind::Index { base: expr, index }, span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut args = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_expr()?);
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let span = self.current().span;
        let kind = match self.current_kind() {
            TokenKind::Int(value) => NodeKind::Int(*value),
            TokenKind::Str(value) => NodeKind::Str(value.clone()),
            TokenKind::Bool(value) => NodeKind::Bool(*value),
            TokenKind::Ident(name) => NodeKind::Ident(name.clone()),
            other => return Err(ParseError::expected("an expression", other, span)),
        };
        self.advance();
        Ok(self.arena.alloc(kind, span))
    }
}

/// Operator tokens per binary tier, in match order.
fn level_ops(level: Level) -> &'static [(TokenKind, BinOp)] {
    match level {
        Level::LogicalOr => &[(TokenKind::Or, BinOp::Or)],
        Level::LogicalAnd => &[(TokenKind::And, BinOp::And)],
        Level::Comparison => &[
            (TokenKind::EqEq, BinOp::Eq),
            (TokenKind::BangEq, BinOp::Ne),
            (TokenKind::LtEq, BinOp::Le),
            (TokenKind::GtEq, BinOp::Ge),
            (TokenKind::Lt, BinOp::Lt),
            (TokenKind::Gt, BinOp::Gt),
        ],
        Level::BitOr => &[(TokenKind::Pipe, BinOp::BitOr)],
        Level::BitXor => &[(TokenKind::Caret, BinOp::BitXor)],
        Level::BitAnd => &[(TokenKind::Amp, BinOp::BitAnd)],
        Level::Shift => &[(TokenKind::LtLt, BinOp::Shl), (TokenKind::GtGt, BinOp::Shr)],
        Level::Additive => &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
        Level::Multiplicative => &[
            (TokenKind::Star, BinOp::Mul),
            (TokenKind::Slash, BinOp::Div),
            (TokenKind::Percent, BinOp::Mod),
        ],
        _ => &[],
    }
}
