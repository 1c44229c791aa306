// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Symbol tables and the parent-chain walk.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use tern_ast::node::NodeKind;
use tern_ast::{Arena, NodeId, Span};
use thiserror::Error;

/// A resolution error with the spans involved.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("'{name}' is already declared in this scope")]
    Duplicate { name: String, span: Span, first: Span },
    #[error("unknown identifier '{name}'")]
    Unknown { name: String, span: Span },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::Duplicate { span, .. } | ResolveError::Unknown { span, .. } => *span,
        }
    }
}

/// Name → declaring node, for one scope anchor. Names are unique; the first
/// declaration wins and the second insert is rejected.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<String, NodeId>,
}

impl SymbolTable {
    /// On conflict returns the first declaration's id and leaves it bound.
    fn insert(&mut self, name: &str, decl: NodeId) -> Result<(), NodeId> {
        match self.entries.get(name) {
            Some(&first) => Err(first),
            None => {
                self.entries.insert(name.to_string(), decl);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a node anchors a symbol table on the parent chain.
fn is_anchor(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Block { .. } | NodeKind::Function { .. } | NodeKind::Module { .. }
    )
}

/// The resolved view of one compilation unit: symbol tables, the
/// identifier-use side table, and the typed-expression queries.
#[derive(Debug)]
pub struct Resolved<'a> {
    arena: &'a Arena,
    tables: HashMap<NodeId, SymbolTable>,
    /// `Ident` node → declaring node. Written once here, read everywhere.
    uses: HashMap<NodeId, NodeId>,
    pub errors: Vec<ResolveError>,
    /// Declarations whose type is currently being derived; breaks
    /// initializer cycles like `var a = b` / `var b = a`.
    pub(crate) deriving: RefCell<HashSet<NodeId>>,
}

/// Resolve a parsed module: declare pass, then identifier resolution.
pub fn resolve(arena: &Arena, module: NodeId) -> Resolved<'_> {
    let mut resolved = Resolved {
        arena,
        tables: HashMap::new(),
        uses: HashMap::new(),
        errors: Vec::new(),
        deriving: RefCell::new(HashSet::new()),
    };
    resolved.declare_all(module);
    resolved.resolve_all();
    resolved
}

impl<'a> Resolved<'a> {
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Returns true if resolution completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The declaration an identifier use resolved to, if any.
    pub fn use_of(&self, ident: NodeId) -> Option<NodeId> {
        self.uses.get(&ident).copied()
    }

    /// The symbol table of a scope anchor.
    pub fn table(&self, anchor: NodeId) -> Option<&SymbolTable> {
        self.tables.get(&anchor)
    }

    /// Walk `parent` links from `from`, testing each anchor's table, until
    /// the module table is exhausted.
    pub fn lookup(&self, name: &str, from: NodeId) -> Option<NodeId> {
        let mut cursor = self.arena.parent(from);
        while let Some(id) = cursor {
            if is_anchor(self.arena.kind(id)) {
                if let Some(decl) = self.tables.get(&id).and_then(|t| t.get(name)) {
                    return Some(decl);
                }
            }
            // Miss: continue from this anchor's own parent.
            cursor = self.arena.parent(id);
        }
        None
    }

    // =========================================================================
    // Declare pass
    // =========================================================================

    /// Insert every declaration into its nearest enclosing anchor's table.
    ///
    /// Arena ids are in parse order, so iterating them declares names in
    /// source order and "first declaration wins" falls out of the table's
    /// insert rule.
    fn declare_all(&mut self, module: NodeId) {
        debug_assert!(matches!(self.arena.kind(module), NodeKind::Module { .. }));
        for id in self.arena.ids() {
            let name = match self.arena.kind(id) {
                NodeKind::VarDecl { name, .. }
                | NodeKind::ConstDecl { name, .. }
                | NodeKind::Function { name, .. }
                | NodeKind::Param { name, .. } => name.clone(),
                _ => continue,
            };
            let Some(anchor) = self.enclosing_anchor(id) else {
                continue; // unreachable for parsed trees; the root is a module
            };
            let result = self.tables.entry(anchor).or_default().insert(&name, id);
            if let Err(first) = result {
                self.errors.push(ResolveError::Duplicate {
                    name,
                    span: self.arena.span(id),
                    first: self.arena.span(first),
                });
            }
        }
    }

    fn enclosing_anchor(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = self.arena.parent(id);
        while let Some(node) = cursor {
            if is_anchor(self.arena.kind(node)) {
                return Some(node);
            }
            cursor = self.arena.parent(node);
        }
        None
    }

    // =========================================================================
    // Resolve pass
    // =========================================================================

    /// Resolve every `Ident` use. Failures are recorded and the identifier
    /// left unbound; siblings keep being processed.
    fn resolve_all(&mut self) {
        for id in self.arena.ids() {
            let NodeKind::Ident(name) = self.arena.kind(id) else { continue };
            match self.lookup(name, id) {
                Some(decl) => {
                    self.uses.insert(id, decl);
                }
                None => self.errors.push(ResolveError::Unknown {
                    name: name.clone(),
                    span: self.arena.span(id),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_ast::Type;

    fn resolve_src(src: &str) -> (tern_ast::Arena, NodeId) {
        let lexed = tern_lexer::Lexer::new(src).tokenize();
        assert!(lexed.is_ok(), "lex errors: {:?}", lexed.errors);
        let parsed = tern_parser::Parser::new(lexed.tokens).parse();
        assert!(parsed.is_ok(), "parse errors: {:?}", parsed.errors);
        (parsed.arena, parsed.module.unwrap())
    }

    fn ident_use<'a>(res: &Resolved<'a>, name: &str) -> Option<NodeId> {
        for id in res.arena().ids() {
            if let NodeKind::Ident(n) = res.arena().kind(id) {
                if n == name {
                    return res.use_of(id);
                }
            }
        }
        panic!("no use of '{}' in source", name);
    }

    #[test]
    fn resolves_to_enclosing_scope() {
        // `n` is declared at module level, used inside a function body:
        // the walk must pass the block and function tables and hit the module.
        let (arena, module) = resolve_src("var n = 1\ndef f(): int\nreturn n\nend\n");
        let res = resolve(&arena, module);
        assert!(res.is_ok(), "errors: {:?}", res.errors);
        let decl = ident_use(&res, "n").expect("n unresolved");
        assert!(matches!(arena.kind(decl), NodeKind::VarDecl { name, .. } if name == "n"));
    }

    #[test]
    fn inner_declaration_shadows_outer() {
        let (arena, module) =
            resolve_src("var n = 1\ndef f(): int\nvar n = 2\nreturn n\nend\n");
        let res = resolve(&arena, module);
        assert!(res.is_ok(), "errors: {:?}", res.errors);
        let decl = ident_use(&res, "n").expect("n unresolved");
        // The use inside the function resolves to the inner declaration.
        let inner_span = arena.span(decl);
        assert!(inner_span.start > 0, "resolved to the module-level n");
    }

    #[test]
    fn duplicate_in_one_scope_is_one_error_first_wins() {
        let (arena, module) = resolve_src("var x = 1\nvar x = 2\nvar y = x\n");
        let res = resolve(&arena, module);
        assert_eq!(res.errors.len(), 1);
        assert!(matches!(&res.errors[0], ResolveError::Duplicate { name, .. } if name == "x"));

        // The reference resolves to the *first* declaration.
        let decl = ident_use(&res, "x").expect("x unresolved");
        let NodeKind::VarDecl { init: Some(init), .. } = arena.kind(decl) else { panic!() };
        assert!(matches!(arena.kind(arena.unwrapped(*init)), NodeKind::Int(1)));
    }

    #[test]
    fn same_name_in_sibling_scopes_is_fine() {
        let (arena, module) =
            resolve_src("def f(): int\nvar t = 1\nreturn t\nend\ndef g(): int\nvar t = 2\nreturn t\nend\n");
        let res = resolve(&arena, module);
        assert!(res.is_ok(), "errors: {:?}", res.errors);
    }

    #[test]
    fn unknown_identifiers_are_all_reported() {
        let (arena, module) = resolve_src("var a = missing1\nvar b = missing2\n");
        let res = resolve(&arena, module);
        assert_eq!(res.errors.len(), 2);
        assert!(res
            .errors
            .iter()
            .all(|e| matches!(e, ResolveError::Unknown { .. })));
        // Siblings that do resolve are still bound.
        let (arena, module) = resolve_src("var a = 1\nvar b = missing\nvar c = a\n");
        let res = resolve(&arena, module);
        assert_eq!(res.errors.len(), 1);
        assert!(ident_use(&res, "a").is_some());
    }

    #[test]
    fn parameters_live_in_the_function_table() {
        let (arena, module) = resolve_src("def f(n: int): int\nreturn n\nend\n");
        let res = resolve(&arena, module);
        assert!(res.is_ok(), "errors: {:?}", res.errors);
        let decl = ident_use(&res, "n").expect("n unresolved");
        assert!(matches!(arena.kind(decl), NodeKind::Param { ty: Type::Int, .. }));

        // A parameter clashing with a body-level declaration is caught where
        // both land in distinct tables: no error here (body shadows).
        let (arena, module) = resolve_src("def f(n: int): int\nvar n = 2\nreturn n\nend\n");
        let res = resolve(&arena, module);
        assert!(res.is_ok(), "errors: {:?}", res.errors);

        // Two parameters with one name share the function table: error.
        let (arena, module) = resolve_src("def f(n: int, n: int): int\nreturn n\nend\n");
        let res = resolve(&arena, module);
        assert_eq!(res.errors.len(), 1);
    }

    #[test]
    fn functions_are_resolvable_by_name() {
        let (arena, module) = resolve_src("def f(): int\nreturn 1\nend\nvar x = f()\n");
        let res = resolve(&arena, module);
        assert!(res.is_ok(), "errors: {:?}", res.errors);
        let decl = ident_use(&res, "f").expect("f unresolved");
        assert!(matches!(arena.kind(decl), NodeKind::Function { .. }));
    }
}
