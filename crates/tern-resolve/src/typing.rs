// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Typed-expression queries.
//!
//! These are derived, not stored: each call walks the (small) subtree it
//! needs. Paren and passthrough wrappers forward every query verbatim, so
//! callers cannot tell a wrapper from the expression it wraps.

use tern_ast::node::{BinOp, NodeKind, UnaryOp};
use tern_ast::{NodeId, Type};

use crate::resolver::Resolved;

impl Resolved<'_> {
    /// Whether the expression's storage can be written or addressed.
    pub fn is_lvalue(&self, id: NodeId) -> bool {
        self.arena().is_lvalue(id)
    }

    /// Whether the expression can be fully evaluated at compile time.
    pub fn is_const_expr(&self, id: NodeId) -> bool {
        let arena = self.arena();
        match arena.kind(id) {
            NodeKind::Int(_) | NodeKind::Str(_) | NodeKind::Bool(_) => true,
            NodeKind::Ident(_) => match self.use_of(id) {
                Some(decl) => matches!(arena.kind(decl), NodeKind::ConstDecl { .. }),
                None => false,
            },
            NodeKind::Binary { lhs, rhs, .. } => {
                self.is_const_expr(*lhs) && self.is_const_expr(*rhs)
            }
            NodeKind::Unary { operand, .. } => self.is_const_expr(*operand),
            NodeKind::Index { base, index } => {
                self.is_const_expr(*base) && self.is_const_expr(*index)
            }
            NodeKind::Paren { inner } | NodeKind::Passthrough { inner, .. } => {
                self.is_const_expr(*inner)
            }
            // Assignments, increments, and calls reach runtime state.
            _ => false,
        }
    }

    /// The value type the expression produces.
    ///
    /// Comparisons and logical operators yield `bool`; arithmetic, bitwise,
    /// and shift operators report the *left* operand's type. There is no
    /// promotion rule between mismatched operand types: the dispatch
    /// protocol rejects such operands, and this query stays left-biased so
    /// it is total even on trees that will be rejected.
    pub fn result_type(&self, id: NodeId) -> Type {
        let arena = self.arena();
        match arena.kind(id) {
            NodeKind::Int(_) => Type::Int,
            NodeKind::Str(_) => Type::Str,
            NodeKind::Bool(_) => Type::Bool,
            NodeKind::Ident(_) => match self.use_of(id) {
                Some(decl) => self.decl_type(decl),
                None => Type::Unknown,
            },
            NodeKind::Binary { op, lhs, .. } => match op {
                BinOp::Eq
                | BinOp::Ne
                | BinOp::Lt
                | BinOp::Le
                | BinOp::Gt
                | BinOp::Ge
                | BinOp::And
                | BinOp::Or => Type::Bool,
                BinOp::Add
                | BinOp::Sub
                | BinOp::Mul
                | BinOp::Div
                | BinOp::Mod
                | BinOp::BitAnd
                | BinOp::BitOr
                | BinOp::BitXor
                | BinOp::Shl
                | BinOp::Shr => self.result_type(*lhs),
            },
            NodeKind::Unary { op, operand } => match op {
                UnaryOp::Not => Type::Bool,
                UnaryOp::Neg | UnaryOp::Pos | UnaryOp::BitNot => self.result_type(*operand),
            },
            // An assignment produces the stored value.
            NodeKind::Assign { target, .. } => self.result_type(*target),
            NodeKind::PostIncr { target } | NodeKind::PostDecr { target } => {
                self.result_type(*target)
            }
            NodeKind::Call { callee, .. } => {
                let callee = arena.unwrapped(*callee);
                match self.use_of(callee) {
                    Some(decl) => match arena.kind(decl) {
                        NodeKind::Function { ret, .. } => *ret,
                        _ => Type::Unknown,
                    },
                    None => Type::Unknown,
                }
            }
            NodeKind::Index { .. } => Type::Int, // byte of a str
            NodeKind::Paren { inner } | NodeKind::Passthrough { inner, .. } => {
                self.result_type(*inner)
            }
            _ => Type::Unknown,
        }
    }

    /// The type a declaration binds: its annotation, or the initializer's
    /// result type. Initializer cycles yield `Unknown` rather than looping.
    pub fn decl_type(&self, decl: NodeId) -> Type {
        match self.arena().kind(decl) {
            NodeKind::Param { ty, .. } => *ty,
            NodeKind::VarDecl { ty: Some(ty), .. } | NodeKind::ConstDecl { ty: Some(ty), .. } => {
                *ty
            }
            NodeKind::VarDecl { ty: None, init: Some(init), .. }
            | NodeKind::ConstDecl { ty: None, init, .. } => {
                if !self.deriving.borrow_mut().insert(decl) {
                    return Type::Unknown;
                }
                let ty = self.result_type(*init);
                self.deriving.borrow_mut().remove(&decl);
                ty
            }
            // `var x` with neither annotation nor initializer is a parse
            // error, so this is only reachable on hand-built trees.
            NodeKind::VarDecl { .. } => Type::Unknown,
            NodeKind::Function { .. } => Type::Unknown,
            _ => Type::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve;
    use tern_ast::Arena;

    fn resolved(src: &str) -> (Arena, NodeId) {
        let lexed = tern_lexer::Lexer::new(src).tokenize();
        assert!(lexed.is_ok(), "lex errors: {:?}", lexed.errors);
        let parsed = tern_parser::Parser::new(lexed.tokens).parse();
        assert!(parsed.is_ok(), "parse errors: {:?}", parsed.errors);
        (parsed.arena, parsed.module.unwrap())
    }

    /// The expression of the last statement in the module.
    fn last_expr(arena: &Arena, module: NodeId) -> NodeId {
        let NodeKind::Module { decls } = arena.kind(module) else { panic!() };
        match arena.kind(*decls.last().unwrap()) {
            NodeKind::ExprStmt { expr } => *expr,
            NodeKind::VarDecl { init: Some(init), .. } => *init,
            NodeKind::ConstDecl { init, .. } => *init,
            other => panic!("last statement has no expression: {:?}", other),
        }
    }

    fn type_of(src: &str) -> Type {
        let (arena, module) = resolved(src);
        let res = resolve(&arena, module);
        res.result_type(last_expr(&arena, module))
    }

    fn constness(src: &str) -> bool {
        let (arena, module) = resolved(src);
        let res = resolve(&arena, module);
        res.is_const_expr(last_expr(&arena, module))
    }

    #[test]
    fn literal_types() {
        assert_eq!(type_of("1\n"), Type::Int);
        assert_eq!(type_of("\"s\"\n"), Type::Str);
        assert_eq!(type_of("true\n"), Type::Bool);
    }

    #[test]
    fn comparisons_and_logic_yield_bool() {
        assert_eq!(type_of("1 == 2\n"), Type::Bool);
        assert_eq!(type_of("1 < 2\n"), Type::Bool);
        assert_eq!(type_of("true and false\n"), Type::Bool);
        assert_eq!(type_of("not true\n"), Type::Bool);
    }

    #[test]
    fn arithmetic_reports_the_left_operand_type() {
        assert_eq!(type_of("1 + 2\n"), Type::Int);
        assert_eq!(type_of("\"a\" + \"b\"\n"), Type::Str);
        // Left-biased even when operands mismatch; the dispatch protocol is
        // what rejects the mismatch.
        assert_eq!(type_of("1 + \"a\"\n"), Type::Int);
        assert_eq!(type_of("\"a\" + 1\n"), Type::Str);
    }

    #[test]
    fn declarations_type_their_uses() {
        assert_eq!(type_of("var b = true\nb\n"), Type::Bool);
        assert_eq!(type_of("var n: int\nn\n"), Type::Int);
        assert_eq!(type_of("const s = \"x\"\ns\n"), Type::Str);
    }

    #[test]
    fn call_yields_declared_return_type() {
        assert_eq!(type_of("def f(): str\nreturn \"x\"\nend\nf()\n"), Type::Str);
        assert_eq!(type_of("def p()\nreturn\nend\np()\n"), Type::Void);
    }

    #[test]
    fn index_yields_int() {
        assert_eq!(type_of("\"abc\"[0]\n"), Type::Int);
    }

    #[test]
    fn initializer_cycles_degrade_to_unknown() {
        // Forward references parse and resolve (tables are per scope, not
        // per position); the type query must not loop on the cycle.
        assert_eq!(type_of("var a = b\nvar b = a\na\n"), Type::Unknown);
    }

    #[test]
    fn const_expr_over_literals_and_consts() {
        assert!(constness("1 + 2 * 3\n"));
        assert!(constness("true and (1 == 1)\n"));
        assert!(constness("const k = 3\nk + 1\n"));
        assert!(constness("\"abc\"[1]\n"));
        assert!(constness("not (1 is not 2)\n"));
    }

    #[test]
    fn runtime_reaches_are_not_const() {
        assert!(!constness("var v = 1\nv + 1\n"));
        assert!(!constness("def f(): int\nreturn 1\nend\nf()\n"));
        assert!(!constness("var v = 1\nv++\n"));
        assert!(!constness("var v = 1\nv = 2\n"));
    }

    #[test]
    fn wrappers_are_transparent_to_all_three_queries() {
        let (arena, module) = resolved("var x = 1\n(x)\n");
        let res = resolve(&arena, module);
        let wrapped = last_expr(&arena, module);
        let bare = arena.unwrapped(wrapped);
        assert_eq!(res.is_lvalue(wrapped), res.is_lvalue(bare));
        assert_eq!(res.is_const_expr(wrapped), res.is_const_expr(bare));
        assert_eq!(res.result_type(wrapped), res.result_type(bare));
        assert_eq!(res.result_type(wrapped), Type::Int);
        assert!(res.is_lvalue(wrapped));
    }
}
