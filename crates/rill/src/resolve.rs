//! Static name resolution: one walk over the AST, before any evaluation.
//!
//! The resolver classifies every variable use by lexical distance — how many
//! scope frames out from the use site its binding lives. The interpreter then
//! jumps straight to that frame instead of searching the chain, which is what
//! pins a closure's free variables to its *definition* site even when a later
//! shadowing binding appears. Top-level names are deliberately left
//! unresolved and fall through to dynamic lookup in the globals frame.

use ahash::AHashMap;

use crate::{
    diagnostics::DiagnosticSink,
    expressions::{Expr, ExprLoc, FunctionDecl, Stmt, VarUse, VarUseId},
    intern::{Interner, StringId},
};

/// The resolver's output: lexical depth per variable use.
///
/// Indexed by [`VarUseId`]; `None` means global, resolved dynamically at
/// runtime. Built once here, read-only afterwards.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Resolutions {
    depths: Vec<Option<u16>>,
}

impl Resolutions {
    /// Creates a table sized for `var_use_count` uses, all unresolved.
    pub(crate) fn for_use_count(var_use_count: u32) -> Self {
        Self {
            depths: vec![None; var_use_count as usize],
        }
    }

    /// Extends the table for newly parsed uses, keeping existing entries.
    /// Used by REPL sessions, where earlier lines' closures still consult
    /// their recorded depths.
    pub(crate) fn grow(&mut self, var_use_count: u32) {
        let new_len = var_use_count as usize;
        if new_len > self.depths.len() {
            self.depths.resize(new_len, None);
        }
    }

    /// The recorded depth for a use, or `None` for globals.
    #[must_use]
    pub(crate) fn depth(&self, id: VarUseId) -> Option<usize> {
        self.depths.get(id.index()).copied().flatten().map(usize::from)
    }

    fn record(&mut self, id: VarUseId, depth: usize) {
        let depth = u16::try_from(depth).expect("scope nesting exceeds u16 depths");
        self.depths[id.index()] = Some(depth);
    }
}

/// Binding state inside one resolver scope.
///
/// A name is `Declaring` from its `var` keyword until the end of its
/// initializer; reading it in that window is the self-initializer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarState {
    Declaring,
    Defined,
}

/// Resolves every variable use in `stmts`, writing depths into `resolutions`
/// and reporting static errors to `sink`.
pub(crate) fn resolve(
    stmts: &[Stmt],
    interner: &Interner,
    resolutions: &mut Resolutions,
    sink: &mut impl DiagnosticSink,
) {
    let mut resolver = Resolver {
        scopes: Vec::new(),
        interner,
        resolutions,
        sink,
    };
    for stmt in stmts {
        resolver.resolve_stmt(stmt);
    }
}

struct Resolver<'a, S: DiagnosticSink> {
    /// Innermost scope last. Empty at top level: globals are not resolved.
    scopes: Vec<AHashMap<StringId, VarState>>,
    interner: &'a Interner,
    resolutions: &'a mut Resolutions,
    sink: &'a mut S,
}

impl<S: DiagnosticSink> Resolver<'_, S> {
    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Var { name, initializer } => {
                self.declare(name.id);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name.id);
            }
            Stmt::Block(stmts) => {
                self.begin_scope();
                for stmt in stmts {
                    self.resolve_stmt(stmt);
                }
                self.end_scope();
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            Stmt::Break { .. } => {}
            Stmt::Function(decl) => {
                // the name is defined before the body resolves, so the
                // function can call itself
                if let Some(name) = decl.name {
                    self.declare(name.id);
                    self.define(name.id);
                }
                self.resolve_function(decl);
            }
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
        }
    }

    fn resolve_expr(&mut self, expr: &ExprLoc) {
        match &expr.expr {
            Expr::Literal(_) => {}
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Unary { operand, .. } => self.resolve_expr(operand),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Ternary {
                cond,
                if_true,
                if_false,
            } => {
                self.resolve_expr(cond);
                self.resolve_expr(if_true);
                self.resolve_expr(if_false);
            }
            Expr::Variable(var_use) => {
                // only the innermost scope's entry matters here: an outer
                // binding with the same name is a legitimate shadow source
                let declaring = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&var_use.name) == Some(&VarState::Declaring));
                if declaring {
                    self.report(var_use, "Can't read local variable in its own initializer.");
                }
                self.resolve_local(var_use);
            }
            Expr::Assign { target, value } => {
                self.resolve_expr(value);
                self.resolve_local(target);
            }
            Expr::Call { callee, args } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Lambda(decl) => self.resolve_function(decl),
        }
    }

    /// Params and body share a single scope, matching the single frame a
    /// call creates at runtime.
    fn resolve_function(&mut self, decl: &FunctionDecl) {
        self.begin_scope();
        for param in &decl.params {
            self.declare(param.id);
            self.define(param.id);
        }
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();
    }

    /// Scans scopes innermost-out; the first one binding the name (in any
    /// state) fixes the depth. Unfound names stay global.
    fn resolve_local(&mut self, var_use: &VarUse) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&var_use.name) {
                self.resolutions.record(var_use.use_id, distance);
                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(AHashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: StringId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, VarState::Declaring);
        }
    }

    fn define(&mut self, name: StringId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, VarState::Defined);
        }
    }

    fn report(&mut self, var_use: &VarUse, message: &str) {
        let text = format!("Error at '{}': {message}", self.interner.get(var_use.name));
        self.sink.report(var_use.line, &text);
    }
}
