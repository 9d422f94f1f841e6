//! Tree walker
//!
//! Consumes a [`Module`] and rebuilds it, offering every node to the rules
//! of a [`RuleSet`]. Decisions are taken when a node is entered (pre-order);
//! deferred statement edits run after the node's children were visited.
//!
//! Child order follows the field order of CPython's `ast` module: targets
//! before values, parameters before the body, the body before decorators,
//! a comprehension's element before its clauses, all dictionary keys before
//! all values.

use bugsmith_syntax::{Arg, Comprehension, DictItem, Expr, Module, Param, Segment, Stmt};

use crate::rules::{
    Deferred, ExprContext, MutationContext, NodeKind, RuleSet, Site, StatementWrapRule,
};

/// Single-pass rewriting traversal
#[derive(Debug, Clone, Copy)]
pub struct TreeWalker<'r> {
    rules: &'r RuleSet,
}

impl<'r> TreeWalker<'r> {
    /// Create walker dispatching to `rules`
    #[inline]
    #[must_use]
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    /// Walk a whole module
    #[must_use]
    pub fn walk(&self, module: Module, cx: &mut MutationContext<'_>) -> Module {
        Module::new(self.block(module.body, cx))
    }

    fn block(&self, body: Vec<Stmt>, cx: &mut MutationContext<'_>) -> Vec<Stmt> {
        let mut rebuilt = Vec::with_capacity(body.len());
        for stmt in body {
            rebuilt.push(self.stmt(stmt, cx));
        }
        rebuilt
    }

    fn stmt(&self, mut stmt: Stmt, cx: &mut MutationContext<'_>) -> Stmt {
        let mut deferred = Vec::new();
        for rule in self.rules.for_kind(NodeKind::of_stmt(&stmt)) {
            if let Some(edit) = rule.apply(Site::Stmt(&mut stmt), cx) {
                deferred.push(edit);
            }
        }

        self.stmt_children(&mut stmt, cx);

        for edit in deferred {
            stmt = match edit {
                Deferred::PrependTrace(trace) => {
                    if let Stmt::FunctionDef(def) = &mut stmt {
                        def.body.insert(0, trace);
                    }
                    stmt
                }
                Deferred::Wrap => StatementWrapRule::wrap(stmt),
            };
        }
        stmt
    }

    fn stmt_children(&self, stmt: &mut Stmt, cx: &mut MutationContext<'_>) {
        use ExprContext::{Del, Load, Store};

        match stmt {
            Stmt::FunctionDef(def) => {
                self.params(&mut def.params, cx);
                def.body = self.block(std::mem::take(&mut def.body), cx);
                self.exprs(&mut def.decorators, Load, cx);
                self.opt(def.returns.as_mut(), Load, cx);
            }
            Stmt::ClassDef(def) => {
                self.args(&mut def.bases, cx);
                def.body = self.block(std::mem::take(&mut def.body), cx);
                self.exprs(&mut def.decorators, Load, cx);
            }
            Stmt::Return(value) => self.opt(value.as_mut(), Load, cx),
            Stmt::Delete(targets) => self.exprs(targets, Del, cx),
            Stmt::Assign { targets, value } => {
                self.exprs(targets, Store, cx);
                self.expr(value, Load, cx);
            }
            Stmt::AugAssign { target, value, .. } => {
                self.expr(target, Store, cx);
                self.expr(value, Load, cx);
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                self.expr(target, Store, cx);
                self.expr(annotation, Load, cx);
                self.opt(value.as_mut(), Load, cx);
            }
            Stmt::For(stmt) => {
                self.expr(&mut stmt.target, Store, cx);
                self.expr(&mut stmt.iter, Load, cx);
                stmt.body = self.block(std::mem::take(&mut stmt.body), cx);
                stmt.orelse = self.block(std::mem::take(&mut stmt.orelse), cx);
            }
            Stmt::While { test, body, orelse } | Stmt::If { test, body, orelse } => {
                self.expr(test, Load, cx);
                *body = self.block(std::mem::take(body), cx);
                *orelse = self.block(std::mem::take(orelse), cx);
            }
            Stmt::With(stmt) => {
                for item in &mut stmt.items {
                    self.expr(&mut item.context, Load, cx);
                    self.opt(item.target.as_mut(), Store, cx);
                }
                stmt.body = self.block(std::mem::take(&mut stmt.body), cx);
            }
            Stmt::Raise { exc, cause } => {
                self.opt(exc.as_mut(), Load, cx);
                self.opt(cause.as_mut(), Load, cx);
            }
            Stmt::Try(stmt) => {
                stmt.body = self.block(std::mem::take(&mut stmt.body), cx);
                for handler in &mut stmt.handlers {
                    self.opt(handler.kind.as_mut(), Load, cx);
                    handler.body = self.block(std::mem::take(&mut handler.body), cx);
                }
                stmt.orelse = self.block(std::mem::take(&mut stmt.orelse), cx);
                stmt.finalbody = self.block(std::mem::take(&mut stmt.finalbody), cx);
            }
            Stmt::Assert { test, msg } => {
                self.expr(test, Load, cx);
                self.opt(msg.as_mut(), Load, cx);
            }
            Stmt::Match { subject, cases } => {
                self.expr(subject, Load, cx);
                for case in cases {
                    self.segments(&mut case.pattern, cx);
                    self.opt(case.guard.as_mut(), Load, cx);
                    case.body = self.block(std::mem::take(&mut case.body), cx);
                }
            }
            Stmt::Expr(value) => self.expr(value, Load, cx),
            Stmt::Import(_)
            | Stmt::ImportFrom { .. }
            | Stmt::Global(_)
            | Stmt::Nonlocal(_)
            | Stmt::Pass
            | Stmt::Break
            | Stmt::Continue => {}
        }
    }

    /// Parameter annotations and defaults, grouped the way `ast.arguments` stores them
    fn params(&self, params: &mut [Param], cx: &mut MutationContext<'_>) {
        let load = ExprContext::Load;
        let split = params
            .iter()
            .position(|p| {
                matches!(
                    p,
                    Param::VarArgs { .. } | Param::KeywordOnlyMarker | Param::KwArgs { .. }
                )
            })
            .unwrap_or(params.len());
        let (positional, rest) = params.split_at_mut(split);

        for param in positional.iter_mut() {
            if let Param::Plain { annotation, .. } = param {
                self.opt(annotation.as_mut(), load, cx);
            }
        }
        for param in rest.iter_mut() {
            if let Param::VarArgs { annotation, .. } = param {
                self.opt(annotation.as_mut(), load, cx);
            }
        }
        for param in rest.iter_mut() {
            if let Param::Plain { annotation, .. } = param {
                self.opt(annotation.as_mut(), load, cx);
            }
        }
        for param in rest.iter_mut() {
            if let Param::Plain { default, .. } = param {
                self.opt(default.as_mut(), load, cx);
            }
        }
        for param in rest.iter_mut() {
            if let Param::KwArgs { annotation, .. } = param {
                self.opt(annotation.as_mut(), load, cx);
            }
        }
        for param in positional.iter_mut() {
            if let Param::Plain { default, .. } = param {
                self.opt(default.as_mut(), load, cx);
            }
        }
    }

    /// Positional arguments first, then keywords
    fn args(&self, args: &mut [Arg], cx: &mut MutationContext<'_>) {
        let load = ExprContext::Load;
        for arg in args.iter_mut() {
            if let Arg::Positional(value) = arg {
                self.expr(value, load, cx);
            }
        }
        for arg in args.iter_mut() {
            match arg {
                Arg::Keyword { value, .. } | Arg::KeywordUnpack(value) => {
                    self.expr(value, load, cx);
                }
                Arg::Positional(_) => {}
            }
        }
    }

    fn generators(&self, generators: &mut [Comprehension], cx: &mut MutationContext<'_>) {
        for generator in generators {
            self.expr(&mut generator.target, ExprContext::Store, cx);
            self.expr(&mut generator.iter, ExprContext::Load, cx);
            self.exprs(&mut generator.ifs, ExprContext::Load, cx);
        }
    }

    /// Expressions embedded in f-strings and `case` patterns are reads
    fn segments(&self, segments: &mut [Segment], cx: &mut MutationContext<'_>) {
        for segment in segments {
            if let Segment::Expr(value) = segment {
                self.expr(value, ExprContext::Load, cx);
            }
        }
    }

    fn exprs(&self, exprs: &mut [Expr], ctx: ExprContext, cx: &mut MutationContext<'_>) {
        for expr in exprs {
            self.expr(expr, ctx, cx);
        }
    }

    fn opt(&self, expr: Option<&mut Expr>, ctx: ExprContext, cx: &mut MutationContext<'_>) {
        if let Some(expr) = expr {
            self.expr(expr, ctx, cx);
        }
    }

    fn expr(&self, expr: &mut Expr, ctx: ExprContext, cx: &mut MutationContext<'_>) {
        for rule in self.rules.for_kind(NodeKind::of_expr(expr)) {
            if rule.apply(Site::Expr { expr: &mut *expr, ctx }, cx).is_some() {
                tracing::warn!("Ignored deferred edit from {} on an expression", rule.kind());
            }
        }
        self.expr_children(expr, ctx, cx);
    }

    fn expr_children(&self, expr: &mut Expr, ctx: ExprContext, cx: &mut MutationContext<'_>) {
        use ExprContext::{Load, Store};

        match expr {
            Expr::Name(_)
            | Expr::Int(_)
            | Expr::Number(_)
            | Expr::Str(_)
            | Expr::Bool(_)
            | Expr::None
            | Expr::Ellipsis => {}
            Expr::FString(segments) => self.segments(segments, cx),
            Expr::BinOp { left, right, .. } | Expr::BoolOp { left, right, .. } => {
                self.expr(left, Load, cx);
                self.expr(right, Load, cx);
            }
            Expr::UnaryOp { operand, .. } => self.expr(operand, Load, cx),
            Expr::Compare { left, comparisons } => {
                self.expr(left, Load, cx);
                for (_, right) in comparisons {
                    self.expr(right, Load, cx);
                }
            }
            Expr::Call { func, args } => {
                self.expr(func, Load, cx);
                self.args(args, cx);
            }
            Expr::Attribute { value, .. } => self.expr(value, Load, cx),
            Expr::Subscript { value, indices } => {
                self.expr(value, Load, cx);
                self.exprs(indices, Load, cx);
            }
            Expr::Slice { lower, upper, step } => {
                self.opt(lower.as_deref_mut(), Load, cx);
                self.opt(upper.as_deref_mut(), Load, cx);
                self.opt(step.as_deref_mut(), Load, cx);
            }
            // targets pass their context down to the names they contain
            Expr::Tuple { elts, .. } | Expr::List(elts) => self.exprs(elts, ctx, cx),
            Expr::Starred(value) | Expr::Paren(value) => self.expr(value, ctx, cx),
            Expr::Set(elts) => self.exprs(elts, Load, cx),
            Expr::Dict(items) => {
                for item in items.iter_mut() {
                    if let DictItem::Pair { key, .. } = item {
                        self.expr(key, Load, cx);
                    }
                }
                for item in items.iter_mut() {
                    match item {
                        DictItem::Pair { value, .. } | DictItem::Unpack(value) => {
                            self.expr(value, Load, cx);
                        }
                    }
                }
            }
            Expr::IfExp { test, body, orelse } => {
                self.expr(test, Load, cx);
                self.expr(body, Load, cx);
                self.expr(orelse, Load, cx);
            }
            Expr::Lambda { params, body } => {
                self.params(params, cx);
                self.expr(body, Load, cx);
            }
            Expr::NamedExpr { target, value } => {
                self.expr(target, Store, cx);
                self.expr(value, Load, cx);
            }
            Expr::Await(value) | Expr::YieldFrom(value) => self.expr(value, Load, cx),
            Expr::Yield(value) => self.opt(value.as_deref_mut(), Load, cx),
            Expr::Comp {
                element,
                generators,
                ..
            } => {
                self.expr(element, Load, cx);
                self.generators(generators, cx);
            }
            Expr::DictComp {
                key,
                value,
                generators,
            } => {
                self.expr(key, Load, cx);
                self.expr(value, Load, cx);
                self.generators(generators, cx);
            }
        }
    }
}
