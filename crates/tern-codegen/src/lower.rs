// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lowering the resolved tree into backend operations.
//!
//! The lowerer runs in two mirrored modes. Runtime mode ([`Lowerer::lower_expr`])
//! drives the backend's emission methods; constant mode ([`Lowerer::fold_expr`])
//! produces a [`ConstValue`] through the backend's fold hooks. Both modes pass
//! through the same operator selection in [`crate::ops`], so an expression is
//! accepted in one mode exactly when it is accepted in the other, minus the
//! constructs that reach runtime state.
//!
//! Errors never abort the walk. Each one is recorded in the sink and the
//! offending subtree reports [`Poisoned`]; both operands of a binary node are
//! lowered before either poison propagates, so one bad leaf cannot hide an
//! unrelated error in its sibling. Any recorded error invalidates whatever
//! the backend emitted.

use std::collections::{HashMap, HashSet};

use tern_ast::node::{BinOp, NodeKind};
use tern_ast::{NodeId, Type};
use tern_resolve::Resolved;

use crate::backend::Backend;
use crate::error::{Lower, LowerError, Poisoned};
use crate::fold;
use crate::ops::{self, Operand, TypedBinaryOp};
use crate::value::ConstValue;

/// The outcome of lowering one module.
#[derive(Debug)]
pub struct LowerResult {
    pub errors: Vec<LowerError>,
}

impl LowerResult {
    /// Returns true if the backend's output is valid.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lower a resolved module into `backend`.
pub fn lower_module<B: Backend>(
    res: &Resolved<'_>,
    module: NodeId,
    backend: &mut B,
) -> LowerResult {
    let mut lowerer = Lowerer::new(res, backend);
    lowerer.lower_stmt(module);
    lowerer.finish()
}

/// Walks the resolved tree and drives one backend.
pub struct Lowerer<'a, B: Backend> {
    res: &'a Resolved<'a>,
    backend: &'a mut B,
    errors: Vec<LowerError>,
    /// Folded `const` declarations, memoized by declaring node.
    consts: HashMap<NodeId, ConstValue>,
    /// Constants currently being folded; breaks self-referential chains.
    folding: HashSet<NodeId>,
    /// Declared return type of the function being lowered.
    current_ret: Type,
}

impl<'a, B: Backend> Lowerer<'a, B> {
    pub fn new(res: &'a Resolved<'a>, backend: &'a mut B) -> Self {
        Lowerer {
            res,
            backend,
            errors: Vec::new(),
            consts: HashMap::new(),
            folding: HashSet::new(),
            current_ret: Type::Void,
        }
    }

    pub fn finish(self) -> LowerResult {
        LowerResult { errors: self.errors }
    }

    fn report(&mut self, error: LowerError) -> Poisoned {
        self.errors.push(error);
        Poisoned
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Lower one statement. A poisoned expression never aborts the statement
    /// walk; the error is already in the sink.
    pub fn lower_stmt(&mut self, id: NodeId) {
        let arena = self.res.arena();
        match arena.kind(id) {
            NodeKind::Module { decls } => {
                for decl in decls {
                    self.lower_stmt(*decl);
                }
            }
            NodeKind::Block { stmts } => {
                for stmt in stmts {
                    self.lower_stmt(*stmt);
                }
            }
            NodeKind::Function { ret, body, .. } => {
                self.backend.begin_function(id);
                let saved = std::mem::replace(&mut self.current_ret, *ret);
                self.lower_stmt(*body);
                self.current_ret = saved;
                self.backend.end_function();
            }
            NodeKind::VarDecl { name, ty, init } => {
                let init_value = match init {
                    Some(init) => {
                        let Ok(value) = self.lower_expr(*init) else { return };
                        if let Some(ann) = ty {
                            let found = self.res.result_type(*init);
                            if found != *ann && found != Type::Unknown {
                                self.report(LowerError::DeclType {
                                    name: name.clone(),
                                    expected: ann.name(),
                                    found: found.name(),
                                    span: arena.span(*init),
                                });
                                return;
                            }
                        }
                        Some(value)
                    }
                    None => None,
                };
                self.backend.define_local(id, init_value);
            }
            NodeKind::ConstDecl { .. } => {
                if let Ok(value) = self.const_value(id) {
                    self.backend.define_const(id, &value);
                }
            }
            NodeKind::ExprStmt { expr } => {
                let _ = self.lower_expr(*expr);
            }
            NodeKind::Return { value } => match value {
                Some(value) => {
                    let lowered = self.lower_expr(*value);
                    let found = self.res.result_type(*value);
                    if found != self.current_ret && found != Type::Unknown {
                        self.report(LowerError::ReturnType {
                            expected: self.current_ret.name(),
                            found: found.name(),
                            span: arena.span(*value),
                        });
                        return;
                    }
                    if let Ok(value) = lowered {
                        self.backend.ret(Some(value));
                    }
                }
                None => {
                    if self.current_ret != Type::Void {
                        self.report(LowerError::ReturnType {
                            expected: self.current_ret.name(),
                            found: "void",
                            span: arena.span(id),
                        });
                        return;
                    }
                    self.backend.ret(None);
                }
            },
            NodeKind::If { arms, else_block } => {
                for arm in arms {
                    let cond = self.lower_expr(arm.cond);
                    let ty = self.res.result_type(arm.cond);
                    if ty != Type::Bool && ty != Type::Unknown {
                        self.report(LowerError::CondType {
                            found: ty.name(),
                            span: arena.span(arm.cond),
                        });
                    }
                    // A poisoned condition already invalidates the output;
                    // a placeholder keeps the chain hooks balanced so the
                    // body still gets checked.
                    let cond = match cond {
                        Ok(cond) => cond,
                        Err(Poisoned) => self.backend.literal(&ConstValue::Bool(false)),
                    };
                    self.backend.begin_branch(cond, arm.negated);
                    self.lower_stmt(arm.body);
                }
                if let Some(else_block) = else_block {
                    self.backend.begin_else();
                    self.lower_stmt(*else_block);
                }
                self.backend.end_chain();
            }
            // Only statements reach this walk.
            _ => debug_assert!(false, "not a statement: {:?}", arena.kind(id)),
        }
    }

    // =========================================================================
    // Runtime mode
    // =========================================================================

    /// Lower an expression to a backend value.
    pub fn lower_expr(&mut self, id: NodeId) -> Lower<B::Value> {
        let arena = self.res.arena();
        match arena.kind(id) {
            NodeKind::Int(v) => Ok(self.backend.literal(&ConstValue::Int(*v))),
            NodeKind::Str(s) => Ok(self.backend.literal(&ConstValue::Str(s.clone()))),
            NodeKind::Bool(b) => Ok(self.backend.literal(&ConstValue::Bool(*b))),
            NodeKind::Paren { inner } | NodeKind::Passthrough { inner, .. } => {
                self.lower_expr(*inner)
            }
            NodeKind::Ident(_) => {
                // Unresolved identifiers were reported by the resolver.
                let Some(decl) = self.res.use_of(id) else { return Err(Poisoned) };
                match arena.kind(decl) {
                    NodeKind::ConstDecl { .. } => {
                        let value = self.const_value(decl)?;
                        Ok(self.backend.literal(&value))
                    }
                    NodeKind::VarDecl { .. } | NodeKind::Param { .. } => {
                        Ok(self.backend.load(decl))
                    }
                    _ => Err(self.report(LowerError::FnAsValue { span: arena.span(id) })),
                }
            }
            NodeKind::Binary { op, lhs, rhs } => {
                let l = self.lower_expr(*lhs);
                let r = self.lower_expr(*rhs);
                let (l, r) = (l?, r?);
                let typed = ops::select_binary(
                    *op,
                    Operand { ty: self.res.result_type(*lhs), span: arena.span(*lhs) },
                    Operand { ty: self.res.result_type(*rhs), span: arena.span(*rhs) },
                )
                .map_err(|e| self.report(e))?;
                Ok(self.backend.binary(typed, l, r, arena.span(id)))
            }
            NodeKind::Unary { op, operand } => {
                let value = self.lower_expr(*operand)?;
                let typed = ops::select_unary(
                    *op,
                    Operand { ty: self.res.result_type(*operand), span: arena.span(*operand) },
                )
                .map_err(|e| self.report(e))?;
                Ok(match typed {
                    Some(typed) => self.backend.unary(typed, value, arena.span(id)),
                    None => value,
                })
            }
            NodeKind::Assign { op, target, value } => self.lower_assign(id, *op, *target, *value),
            NodeKind::PostIncr { target } => self.lower_incr(id, *target, true),
            NodeKind::PostDecr { target } => self.lower_incr(id, *target, false),
            NodeKind::Call { callee, args } => self.lower_call(id, *callee, args),
            NodeKind::Index { base, index } => {
                let b = self.lower_expr(*base);
                let i = self.lower_expr(*index);
                let (b, i) = (b?, i?);
                self.check_index_types(*base, *index)?;
                Ok(self.backend.index(b, i, arena.span(id)))
            }
            _ => Err(Poisoned),
        }
    }

    fn lower_assign(
        &mut self,
        id: NodeId,
        op: Option<BinOp>,
        target: NodeId,
        value: NodeId,
    ) -> Lower<B::Value> {
        let arena = self.res.arena();
        let place = arena.unwrapped(target);
        match arena.kind(place) {
            NodeKind::Ident(name) => {
                let Some(decl) = self.res.use_of(place) else {
                    let _ = self.lower_expr(value);
                    return Err(Poisoned);
                };
                match arena.kind(decl) {
                    NodeKind::VarDecl { .. } | NodeKind::Param { .. } => {}
                    NodeKind::ConstDecl { .. } => {
                        let _ = self.lower_expr(value);
                        return Err(self.report(LowerError::AssignToConst {
                            name: name.clone(),
                            span: arena.span(place),
                        }));
                    }
                    _ => {
                        let _ = self.lower_expr(value);
                        return Err(self.report(LowerError::NotAssignable {
                            span: arena.span(place),
                        }));
                    }
                }
                let decl_ty = self.res.decl_type(decl);
                match op {
                    Some(op) => {
                        let current = self.backend.load(decl);
                        let v = self.lower_expr(value)?;
                        let typed = ops::select_binary(
                            op,
                            Operand { ty: decl_ty, span: arena.span(place) },
                            Operand {
                                ty: self.res.result_type(value),
                                span: arena.span(value),
                            },
                        )
                        .map_err(|e| self.report(e))?;
                        let stored = self.backend.binary(typed, current, v, arena.span(id));
                        self.backend.store(decl, stored.clone());
                        Ok(stored)
                    }
                    None => {
                        let v = self.lower_expr(value)?;
                        let found = self.res.result_type(value);
                        if found != decl_ty && found != Type::Unknown && decl_ty != Type::Unknown {
                            return Err(self.report(LowerError::AssignType {
                                name: name.clone(),
                                expected: decl_ty.name(),
                                found: found.name(),
                                span: arena.span(value),
                            }));
                        }
                        self.backend.store(decl, v.clone());
                        Ok(v)
                    }
                }
            }
            NodeKind::Index { base, index } => {
                let b = self.lower_expr(*base);
                let i = self.lower_expr(*index);
                let v = self.lower_expr(value);
                let (b, i, v) = (b?, i?, v?);
                self.check_index_types(*base, *index)?;
                let found = self.res.result_type(value);
                if found != Type::Int && found != Type::Unknown {
                    return Err(self.report(LowerError::AssignType {
                        name: "str element".to_string(),
                        expected: "int",
                        found: found.name(),
                        span: arena.span(value),
                    }));
                }
                match op {
                    Some(op) => {
                        let current = self.backend.index(b.clone(), i.clone(), arena.span(place));
                        let typed = ops::select_binary(
                            op,
                            Operand { ty: Type::Int, span: arena.span(place) },
                            Operand { ty: found, span: arena.span(value) },
                        )
                        .map_err(|e| self.report(e))?;
                        let stored = self.backend.binary(typed, current, v, arena.span(id));
                        self.backend.store_index(b, i, stored.clone());
                        Ok(stored)
                    }
                    None => {
                        self.backend.store_index(b, i, v.clone());
                        Ok(v)
                    }
                }
            }
            _ => {
                let _ = self.lower_expr(value);
                Err(self.report(LowerError::NotAssignable { span: arena.span(target) }))
            }
        }
    }

    fn lower_incr(&mut self, id: NodeId, target: NodeId, incr: bool) -> Lower<B::Value> {
        let arena = self.res.arena();
        let place = arena.unwrapped(target);
        let NodeKind::Ident(name) = arena.kind(place) else {
            return Err(self.report(LowerError::NotAssignable { span: arena.span(target) }));
        };
        let Some(decl) = self.res.use_of(place) else { return Err(Poisoned) };
        match arena.kind(decl) {
            NodeKind::VarDecl { .. } | NodeKind::Param { .. } => {}
            NodeKind::ConstDecl { .. } => {
                return Err(self.report(LowerError::AssignToConst {
                    name: name.clone(),
                    span: arena.span(place),
                }))
            }
            _ => {
                return Err(self.report(LowerError::NotAssignable { span: arena.span(place) }))
            }
        }
        let ty = self.res.decl_type(decl);
        if ty != Type::Int {
            return Err(self.report(LowerError::UnaryOperandType {
                op_name: if incr { "increment" } else { "decrement" },
                op_symbol: if incr { "++" } else { "--" },
                expected: "int",
                found: ty.name(),
                span: arena.span(place),
            }));
        }
        let current = self.backend.load(decl);
        let one = self.backend.literal(&ConstValue::Int(1));
        let typed = if incr { TypedBinaryOp::IntAdd } else { TypedBinaryOp::IntSub };
        let next = self.backend.binary(typed, current.clone(), one, arena.span(id));
        self.backend.store(decl, next);
        // Postfix: the expression's value is the one read before the step.
        Ok(current)
    }

    fn lower_call(&mut self, id: NodeId, callee: NodeId, args: &[NodeId]) -> Lower<B::Value> {
        let arena = self.res.arena();
        let callee = arena.unwrapped(callee);
        let NodeKind::Ident(name) = arena.kind(callee) else {
            self.lower_args_for_errors(args);
            return Err(self.report(LowerError::NotCallable {
                what: "this expression".to_string(),
                span: arena.span(callee),
            }));
        };
        let Some(decl) = self.res.use_of(callee) else {
            self.lower_args_for_errors(args);
            return Err(Poisoned);
        };
        let NodeKind::Function { params, .. } = arena.kind(decl) else {
            self.lower_args_for_errors(args);
            return Err(self.report(LowerError::NotCallable {
                what: format!("'{}'", name),
                span: arena.span(callee),
            }));
        };
        if args.len() != params.len() {
            self.lower_args_for_errors(args);
            return Err(self.report(LowerError::ArityMismatch {
                name: name.clone(),
                expected: params.len(),
                found: args.len(),
                span: arena.span(id),
            }));
        }
        let mut values = Vec::with_capacity(args.len());
        let mut poisoned = false;
        for (i, (arg, param)) in args.iter().zip(params).enumerate() {
            let NodeKind::Param { ty, .. } = arena.kind(*param) else { continue };
            match self.lower_expr(*arg) {
                Ok(value) => {
                    let found = self.res.result_type(*arg);
                    if found != *ty && found != Type::Unknown {
                        self.report(LowerError::ArgType {
                            name: name.clone(),
                            index: i + 1,
                            expected: ty.name(),
                            found: found.name(),
                            span: arena.span(*arg),
                        });
                        poisoned = true;
                    } else {
                        values.push(value);
                    }
                }
                Err(Poisoned) => poisoned = true,
            }
        }
        if poisoned {
            return Err(Poisoned);
        }
        Ok(self.backend.call(decl, values, arena.span(id)))
    }

    /// Lower the arguments of an already-failed call so their own errors
    /// still surface.
    fn lower_args_for_errors(&mut self, args: &[NodeId]) {
        for arg in args {
            let _ = self.lower_expr(*arg);
        }
    }

    fn check_index_types(&mut self, base: NodeId, index: NodeId) -> Lower<()> {
        let arena = self.res.arena();
        let base_ty = self.res.result_type(base);
        if base_ty != Type::Str && base_ty != Type::Unknown {
            return Err(self.report(LowerError::IndexBase {
                found: base_ty.name(),
                span: arena.span(base),
            }));
        }
        let index_ty = self.res.result_type(index);
        if index_ty != Type::Int && index_ty != Type::Unknown {
            return Err(self.report(LowerError::IndexType {
                found: index_ty.name(),
                span: arena.span(index),
            }));
        }
        Ok(())
    }

    // =========================================================================
    // Constant mode
    // =========================================================================

    /// Evaluate an expression at compile time.
    ///
    /// Mirrors [`Lowerer::lower_expr`] case for case; the modes differ only at
    /// the leaves (folded values instead of emitted operations) and in the
    /// constructs that reach runtime state, which are rejected here.
    pub fn fold_expr(&mut self, id: NodeId) -> Lower<ConstValue> {
        let arena = self.res.arena();
        match arena.kind(id) {
            NodeKind::Int(v) => Ok(ConstValue::Int(*v)),
            NodeKind::Str(s) => Ok(ConstValue::Str(s.clone())),
            NodeKind::Bool(b) => Ok(ConstValue::Bool(*b)),
            NodeKind::Paren { inner } | NodeKind::Passthrough { inner, .. } => {
                self.fold_expr(*inner)
            }
            NodeKind::Ident(name) => {
                let Some(decl) = self.res.use_of(id) else { return Err(Poisoned) };
                match arena.kind(decl) {
                    NodeKind::ConstDecl { .. } => self.const_value(decl),
                    NodeKind::VarDecl { .. } | NodeKind::Param { .. } => {
                        Err(self.report(LowerError::NotConst {
                            what: format!("'{}' is a runtime variable", name),
                            span: arena.span(id),
                        }))
                    }
                    _ => Err(self.report(LowerError::NotConst {
                        what: format!("'{}' is a function", name),
                        span: arena.span(id),
                    })),
                }
            }
            NodeKind::Binary { op, lhs, rhs } => {
                let l = self.fold_expr(*lhs);
                let r = self.fold_expr(*rhs);
                let (l, r) = (l?, r?);
                let typed = ops::select_binary(
                    *op,
                    Operand { ty: l.ty(), span: arena.span(*lhs) },
                    Operand { ty: r.ty(), span: arena.span(*rhs) },
                )
                .map_err(|e| self.report(e))?;
                // Both operands of `and`/`or` are already evaluated, same as
                // in runtime mode; neither mode short-circuits.
                self.backend
                    .fold_binary(typed, &l, &r, arena.span(id))
                    .map_err(|e| self.report(e))
            }
            NodeKind::Unary { op, operand } => {
                let value = self.fold_expr(*operand)?;
                let typed = ops::select_unary(
                    *op,
                    Operand { ty: value.ty(), span: arena.span(*operand) },
                )
                .map_err(|e| self.report(e))?;
                Ok(match typed {
                    Some(typed) => self.backend.fold_unary(typed, &value),
                    None => value,
                })
            }
            NodeKind::Index { base, index } => {
                let b = self.fold_expr(*base);
                let i = self.fold_expr(*index);
                let (b, i) = (b?, i?);
                let ConstValue::Str(s) = &b else {
                    return Err(self.report(LowerError::IndexBase {
                        found: b.type_name(),
                        span: arena.span(*base),
                    }));
                };
                let Some(i) = i.as_int() else {
                    return Err(self.report(LowerError::IndexType {
                        found: i.type_name(),
                        span: arena.span(*index),
                    }));
                };
                fold::index(s, i, arena.span(id)).map_err(|e| self.report(e))
            }
            NodeKind::Call { .. } => Err(self.report(LowerError::NotConst {
                what: "a call happens at run time".to_string(),
                span: arena.span(id),
            })),
            NodeKind::Assign { .. } => Err(self.report(LowerError::NotConst {
                what: "an assignment happens at run time".to_string(),
                span: arena.span(id),
            })),
            NodeKind::PostIncr { .. } | NodeKind::PostDecr { .. } => {
                Err(self.report(LowerError::NotConst {
                    what: "an increment happens at run time".to_string(),
                    span: arena.span(id),
                }))
            }
            _ => Err(self.report(LowerError::NotConst {
                what: "this is not an expression".to_string(),
                span: arena.span(id),
            })),
        }
    }

    /// The folded value of a `const` declaration, memoized by declaring node.
    fn const_value(&mut self, decl: NodeId) -> Lower<ConstValue> {
        if let Some(value) = self.consts.get(&decl) {
            return Ok(value.clone());
        }
        let arena = self.res.arena();
        let NodeKind::ConstDecl { name, ty, init } = arena.kind(decl) else {
            return Err(Poisoned);
        };
        if !self.folding.insert(decl) {
            return Err(self.report(LowerError::NotConst {
                what: format!("constant '{}' depends on its own value", name),
                span: arena.span(decl),
            }));
        }
        let value = self.fold_expr(*init);
        self.folding.remove(&decl);
        let value = value?;
        if let Some(ann) = ty {
            if value.ty() != *ann {
                return Err(self.report(LowerError::DeclType {
                    name: name.clone(),
                    expected: ann.name(),
                    found: value.type_name(),
                    span: arena.span(*init),
                }));
            }
        }
        self.consts.insert(decl, value.clone());
        Ok(value)
    }
}
