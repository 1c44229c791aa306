// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Backend-neutral lowering.
//!
//! This crate turns a resolved tree into operations on a [`Backend`]. Two
//! evaluation modes share one operator-selection step ([`ops`]): runtime mode
//! emits backend operations, constant mode folds to a [`ConstValue`], and a
//! `const` initializer is required to fold. Type errors, arity errors, and
//! failed folds are collected in the [`LowerResult`]; any error means the
//! backend's output is invalid.

mod backend;
mod error;
pub mod fold;
mod lower;
pub mod ops;
mod value;

pub use backend::Backend;
pub use error::{Lower, LowerError, Poisoned, Side};
pub use lower::{lower_module, LowerResult, Lowerer};
pub use ops::{select_binary, select_unary, Operand, TypedBinaryOp, TypedUnaryOp};
pub use value::ConstValue;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tern_ast::node::NodeKind;
    use tern_ast::{Arena, NodeId, Span};
    use tern_resolve::resolve;

    use super::*;

    fn parsed(src: &str) -> (Arena, NodeId) {
        let lexed = tern_lexer::Lexer::new(src).tokenize();
        assert!(lexed.is_ok(), "lex errors: {:?}", lexed.errors);
        let result = tern_parser::Parser::new(lexed.tokens).parse();
        assert!(result.is_ok(), "parse errors: {:?}", result.errors);
        (result.arena, result.module.unwrap())
    }

    /// The expression of the module's last statement.
    fn last_expr(arena: &Arena, module: NodeId) -> NodeId {
        let NodeKind::Module { decls } = arena.kind(module) else { panic!() };
        match arena.kind(*decls.last().unwrap()) {
            NodeKind::ExprStmt { expr } => *expr,
            NodeKind::VarDecl { init: Some(init), .. } => *init,
            NodeKind::ConstDecl { init, .. } => *init,
            other => panic!("last statement has no expression: {:?}", other),
        }
    }

    // =========================================================================
    // An interpreting backend: Value is the value itself
    // =========================================================================

    #[derive(Default)]
    struct EvalBackend {
        vars: HashMap<NodeId, ConstValue>,
    }

    impl Backend for EvalBackend {
        type Value = ConstValue;

        fn literal(&mut self, value: &ConstValue) -> ConstValue {
            value.clone()
        }

        fn binary(
            &mut self,
            op: TypedBinaryOp,
            lhs: ConstValue,
            rhs: ConstValue,
            span: Span,
        ) -> ConstValue {
            fold::binary(op, &lhs, &rhs, span).expect("runtime trap")
        }

        fn unary(&mut self, op: TypedUnaryOp, operand: ConstValue, _span: Span) -> ConstValue {
            fold::unary(op, &operand)
        }

        fn index(&mut self, base: ConstValue, index: ConstValue, span: Span) -> ConstValue {
            let (ConstValue::Str(s), ConstValue::Int(i)) = (&base, &index) else {
                panic!("ill-typed index reached the backend")
            };
            fold::index(s, *i, span).expect("index trap")
        }

        fn load(&mut self, decl: NodeId) -> ConstValue {
            self.vars[&decl].clone()
        }

        fn store(&mut self, decl: NodeId, value: ConstValue) {
            self.vars.insert(decl, value);
        }

        fn store_index(&mut self, _base: ConstValue, _index: ConstValue, _value: ConstValue) {}

        fn define_local(&mut self, decl: NodeId, init: Option<ConstValue>) {
            if let Some(value) = init {
                self.vars.insert(decl, value);
            }
        }

        fn define_const(&mut self, decl: NodeId, value: &ConstValue) {
            self.vars.insert(decl, value.clone());
        }

        fn call(&mut self, _callee: NodeId, _args: Vec<ConstValue>, _span: Span) -> ConstValue {
            unimplemented!("straight-line tests only")
        }

        fn ret(&mut self, _value: Option<ConstValue>) {}
        fn begin_function(&mut self, _decl: NodeId) {}
        fn end_function(&mut self) {}
        fn begin_branch(&mut self, _cond: ConstValue, _negated: bool) {}
        fn begin_else(&mut self) {}
        fn end_chain(&mut self) {}
    }

    /// Evaluate the module's last expression in both modes and require the
    /// modes to agree.
    fn eval_both(src: &str) -> ConstValue {
        let (arena, module) = parsed(src);
        let res = resolve(&arena, module);
        assert!(res.is_ok(), "resolve errors: {:?}", res.errors);
        let expr = last_expr(&arena, module);

        let mut eval = EvalBackend::default();
        let mut lowerer = Lowerer::new(&res, &mut eval);
        lowerer.lower_stmt(module);
        let runtime = lowerer.lower_expr(expr).expect("runtime mode poisoned");
        let folded = lowerer.fold_expr(expr).expect("constant mode poisoned");
        let result = lowerer.finish();
        assert!(result.is_ok(), "lower errors: {:?}", result.errors);

        assert_eq!(runtime, folded, "modes disagree on {:?}", src);
        runtime
    }

    // =========================================================================
    // A recording backend: Value is an operation number
    // =========================================================================

    #[derive(Default)]
    struct RecordingBackend {
        ops: Vec<String>,
        next: usize,
    }

    impl RecordingBackend {
        fn fresh(&mut self) -> usize {
            self.next += 1;
            self.next - 1
        }

        fn position(&self, needle: &str) -> usize {
            self.ops
                .iter()
                .position(|op| op.contains(needle))
                .unwrap_or_else(|| panic!("no op contains {:?}: {:?}", needle, self.ops))
        }
    }

    impl Backend for RecordingBackend {
        type Value = usize;

        fn literal(&mut self, value: &ConstValue) -> usize {
            let v = self.fresh();
            self.ops.push(format!("v{} = lit {}", v, value));
            v
        }

        fn binary(&mut self, op: TypedBinaryOp, lhs: usize, rhs: usize, _span: Span) -> usize {
            let v = self.fresh();
            self.ops.push(format!("v{} = {:?} v{} v{}", v, op, lhs, rhs));
            v
        }

        fn unary(&mut self, op: TypedUnaryOp, operand: usize, _span: Span) -> usize {
            let v = self.fresh();
            self.ops.push(format!("v{} = {:?} v{}", v, op, operand));
            v
        }

        fn index(&mut self, base: usize, index: usize, _span: Span) -> usize {
            let v = self.fresh();
            self.ops.push(format!("v{} = index v{} v{}", v, base, index));
            v
        }

        fn load(&mut self, decl: NodeId) -> usize {
            let v = self.fresh();
            self.ops.push(format!("v{} = load n{}", v, decl.index()));
            v
        }

        fn store(&mut self, decl: NodeId, value: usize) {
            self.ops.push(format!("store n{} v{}", decl.index(), value));
        }

        fn store_index(&mut self, base: usize, index: usize, value: usize) {
            self.ops.push(format!("storeix v{} v{} v{}", base, index, value));
        }

        fn define_local(&mut self, decl: NodeId, init: Option<usize>) {
            match init {
                Some(v) => self.ops.push(format!("local n{} v{}", decl.index(), v)),
                None => self.ops.push(format!("local n{}", decl.index())),
            }
        }

        fn define_const(&mut self, decl: NodeId, value: &ConstValue) {
            self.ops.push(format!("const n{} = {}", decl.index(), value));
        }

        fn call(&mut self, callee: NodeId, args: Vec<usize>, _span: Span) -> usize {
            let v = self.fresh();
            self.ops.push(format!("v{} = call n{} {:?}", v, callee.index(), args));
            v
        }

        fn ret(&mut self, value: Option<usize>) {
            match value {
                Some(v) => self.ops.push(format!("ret v{}", v)),
                None => self.ops.push("ret".to_string()),
            }
        }

        fn begin_function(&mut self, decl: NodeId) {
            self.ops.push(format!("fn n{}", decl.index()));
        }

        fn end_function(&mut self) {
            self.ops.push("endfn".to_string());
        }

        fn begin_branch(&mut self, cond: usize, negated: bool) {
            let keyword = if negated { "branch-unless" } else { "branch" };
            self.ops.push(format!("{} v{}", keyword, cond));
        }

        fn begin_else(&mut self) {
            self.ops.push("else".to_string());
        }

        fn end_chain(&mut self) {
            self.ops.push("endchain".to_string());
        }
    }

    /// Lower a whole module into a recording backend.
    fn record(src: &str) -> (RecordingBackend, Vec<LowerError>) {
        let (arena, module) = parsed(src);
        let res = resolve(&arena, module);
        assert!(res.is_ok(), "resolve errors: {:?}", res.errors);
        let mut backend = RecordingBackend::default();
        let result = lower_module(&res, module, &mut backend);
        (backend, result.errors)
    }

    fn errors_of(src: &str) -> Vec<LowerError> {
        record(src).1
    }

    // =========================================================================
    // Mode equivalence
    // =========================================================================

    #[test]
    fn modes_agree_on_arithmetic() {
        assert_eq!(eval_both("3 + 4\n"), ConstValue::Int(7));
        assert_eq!(eval_both("1 + 2 * 3\n"), ConstValue::Int(7));
        assert_eq!(eval_both("2 * (3 + 4)\n"), ConstValue::Int(14));
        // Binary operators are right-associative: 10 - (2 - 3).
        assert_eq!(eval_both("10 - 2 - 3\n"), ConstValue::Int(11));
        assert_eq!(eval_both("1 << 65\n"), ConstValue::Int(2));
    }

    #[test]
    fn modes_agree_on_bool_and_str() {
        assert_eq!(eval_both("not (1 is 2)\n"), ConstValue::Bool(true));
        assert_eq!(eval_both("true and (1 == 1)\n"), ConstValue::Bool(true));
        assert_eq!(eval_both("\"a\" + \"b\"\n"), ConstValue::Str("ab".into()));
        assert_eq!(eval_both("\"abc\"[1]\n"), ConstValue::Int(98));
        assert_eq!(eval_both("-(2 + 3)\n"), ConstValue::Int(-5));
    }

    #[test]
    fn modes_agree_through_const_declarations() {
        assert_eq!(eval_both("const k = 2 + 3\nk * 2\n"), ConstValue::Int(10));
    }

    // =========================================================================
    // Dispatch errors
    // =========================================================================

    #[test]
    fn mixed_operand_types_yield_exactly_one_error() {
        let errors = errors_of("1 & true\n");
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert!(matches!(
            errors[0],
            LowerError::OperandType { side: Side::Right, found: "bool", expected: "int", .. }
        ));
    }

    #[test]
    fn both_operands_are_checked_before_poison_propagates() {
        // Two independent leaf errors under one operator: both surface.
        let errors = errors_of("(1 & true) + (false | 2)\n");
        assert_eq!(errors.len(), 2, "errors: {:?}", errors);
    }

    #[test]
    fn errors_invalidate_the_output() {
        let (arena, module) = parsed("1 + 2\n");
        let res = resolve(&arena, module);
        let mut backend = RecordingBackend::default();
        assert!(lower_module(&res, module, &mut backend).is_ok());

        let (arena, module) = parsed("1 & true\n");
        let res = resolve(&arena, module);
        let mut backend = RecordingBackend::default();
        assert!(!lower_module(&res, module, &mut backend).is_ok());
    }

    // =========================================================================
    // Constant mode restrictions
    // =========================================================================

    #[test]
    fn const_initializers_reject_runtime_state() {
        for src in [
            "var v = 1\nconst k = v\n",
            "def f(): int\nreturn 1\nend\nconst k = f()\n",
            "var v = 1\nconst k = v++\n",
        ] {
            let errors = errors_of(src);
            assert_eq!(errors.len(), 1, "source {:?}: {:?}", src, errors);
            assert!(matches!(errors[0], LowerError::NotConst { .. }), "source {:?}", src);
        }
    }

    #[test]
    fn self_referential_const_is_detected() {
        let errors = errors_of("const a = a + 1\n");
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert!(matches!(errors[0], LowerError::NotConst { .. }));
    }

    #[test]
    fn const_folding_failures_are_reported() {
        assert!(matches!(
            errors_of("const k = 1 / 0\n")[..],
            [LowerError::DivisionByZero { .. }]
        ));
        assert!(matches!(
            errors_of("const k = \"abc\"[5]\n")[..],
            [LowerError::IndexOutOfBounds { index: 5, len: 3, .. }]
        ));
    }

    #[test]
    fn const_values_are_folded_once_and_reused() {
        let (backend, errors) = record("const k = 2 + 3\nconst j = k * 2\n");
        assert!(errors.is_empty(), "errors: {:?}", errors);
        assert!(backend.ops.iter().any(|op| op.ends_with("= 5")), "{:?}", backend.ops);
        assert!(backend.ops.iter().any(|op| op.ends_with("= 10")), "{:?}", backend.ops);
    }

    // =========================================================================
    // Declarations, assignment, returns
    // =========================================================================

    #[test]
    fn declaration_annotations_are_checked() {
        assert!(matches!(errors_of("var n: int = true\n")[..], [LowerError::DeclType { .. }]));
        assert!(matches!(errors_of("const k: int = true\n")[..], [LowerError::DeclType { .. }]));
    }

    #[test]
    fn assignment_is_typed_and_respects_const() {
        assert!(matches!(errors_of("var n = 1\nn = true\n")[..], [LowerError::AssignType { .. }]));
        assert!(matches!(
            errors_of("const k = 1\nk = 2\n")[..],
            [LowerError::AssignToConst { .. }]
        ));
        assert!(matches!(
            errors_of("const k = 1\nk++\n")[..],
            [LowerError::AssignToConst { .. }]
        ));
        assert!(matches!(errors_of("1 = 2\n")[..], [LowerError::NotAssignable { .. }]));
    }

    #[test]
    fn compound_assignment_goes_through_dispatch() {
        let (backend, errors) = record("var n = 1\nn += 2\n");
        assert!(errors.is_empty(), "errors: {:?}", errors);
        assert!(backend.position("IntAdd") < backend.position("store n"));

        // `str += int` has no lowering; the mismatch is the dispatch's.
        let errors = errors_of("var s = \"a\"\ns += 1\n");
        assert!(matches!(errors[..], [LowerError::OperandMismatch { .. }]), "{:?}", errors);
    }

    #[test]
    fn postfix_increment_yields_the_previous_value() {
        let (arena, module) = parsed("var n = 1\nn++\n");
        let res = resolve(&arena, module);
        assert!(res.is_ok());
        let expr = last_expr(&arena, module);
        let mut eval = EvalBackend::default();
        let mut lowerer = Lowerer::new(&res, &mut eval);
        lowerer.lower_stmt(module);
        // The module walk already stepped n from 1 to 2.
        let value = lowerer.lower_expr(expr).expect("poisoned");
        assert!(lowerer.finish().is_ok());
        assert_eq!(value, ConstValue::Int(2));
        drop(res);
        assert!(eval.vars.values().any(|v| *v == ConstValue::Int(3)));
    }

    #[test]
    fn return_values_match_the_declared_type() {
        assert!(matches!(
            errors_of("def f(): int\nreturn true\nend\n")[..],
            [LowerError::ReturnType { expected: "int", found: "bool", .. }]
        ));
        assert!(matches!(
            errors_of("def p()\nreturn 1\nend\n")[..],
            [LowerError::ReturnType { expected: "void", found: "int", .. }]
        ));
        assert!(matches!(
            errors_of("def f(): int\nreturn\nend\n")[..],
            [LowerError::ReturnType { expected: "int", found: "void", .. }]
        ));
        assert!(errors_of("def f(): int\nreturn 1\nend\n").is_empty());
    }

    // =========================================================================
    // Calls
    // =========================================================================

    #[test]
    fn calls_are_checked_and_emitted() {
        let (backend, errors) =
            record("def f(n: int): int\nreturn n + 1\nend\nvar r = f(3)\n");
        assert!(errors.is_empty(), "errors: {:?}", errors);
        assert!(backend.position("fn n") < backend.position("ret"));
        assert!(backend.position("call n") < backend.position("local n"));
    }

    #[test]
    fn call_shape_errors() {
        assert!(matches!(
            errors_of("def f(n: int): int\nreturn n\nend\nf()\n")[..],
            [LowerError::ArityMismatch { expected: 1, found: 0, .. }]
        ));
        assert!(matches!(
            errors_of("def f(n: int): int\nreturn n\nend\nf(true)\n")[..],
            [LowerError::ArgType { index: 1, expected: "int", found: "bool", .. }]
        ));
        assert!(matches!(
            errors_of("var v = 1\nv()\n")[..],
            [LowerError::NotCallable { .. }]
        ));
        assert!(matches!(
            errors_of("def f(): int\nreturn 1\nend\nvar v = f\n")[..],
            [LowerError::FnAsValue { .. }]
        ));
    }

    // =========================================================================
    // Branch chains
    // =========================================================================

    #[test]
    fn if_chains_drive_the_branch_hooks_in_order() {
        let src = "var x = 1\n\
                   if x == 1\nx = 2\n\
                   or unless x == 3\nx = 4\n\
                   else\nx = 5\nend\n";
        let (backend, errors) = record(src);
        assert!(errors.is_empty(), "errors: {:?}", errors);
        let first = backend.position("branch v");
        let second = backend.position("branch-unless v");
        let else_pos = backend.position("else");
        let end = backend.position("endchain");
        assert!(first < second && second < else_pos && else_pos < end);
        assert_eq!(backend.ops.iter().filter(|op| *op == "endchain").count(), 1);
    }

    #[test]
    fn conditions_must_be_bool() {
        assert!(matches!(
            errors_of("if 1\nvar x = 2\nend\n")[..],
            [LowerError::CondType { found: "int", .. }]
        ));
        assert!(errors_of("unless false\nvar x = 2\nend\n").is_empty());
    }
}
