//! Python renderer
//!
//! Turns a [`Module`] back into source text in a canonical layout: one
//! statement per line, fixed indentation, parentheses only where the tree
//! records them.

use crate::ast::{
    Alias, Arg, ClassDef, CompKind, Comprehension, DictItem, ExceptHandler, Expr, FunctionDef,
    MatchCase, Module, Param, Segment, Stmt, WithItem,
};

/// Syntax tree → source text
pub trait SourceRenderer: Send + Sync {
    /// Render a complete module
    fn render(&self, module: &Module) -> String;
}

/// Canonical Python 3 renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PythonRenderer {
    indent_width: usize,
}

impl Default for PythonRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonRenderer {
    /// Create renderer with 4-space indentation
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { indent_width: 4 }
    }

    /// With indentation width (spaces per level, at least one)
    #[inline]
    #[must_use]
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width.max(1);
        self
    }

    /// Render a single expression
    #[must_use]
    pub fn render_expr(&self, expr: &Expr) -> String {
        let mut out = String::new();
        write_expr(expr, &mut out);
        out
    }
}

impl SourceRenderer for PythonRenderer {
    fn render(&self, module: &Module) -> String {
        let mut writer = Writer {
            out: String::new(),
            unit: " ".repeat(self.indent_width),
            level: 0,
        };
        writer.block(&module.body);
        writer.out
    }
}

struct Writer {
    out: String,
    unit: String,
    level: usize,
}

impl Writer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.level {
            self.out.push_str(&self.unit);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn block(&mut self, body: &[Stmt]) {
        for (i, stmt) in body.iter().enumerate() {
            if i > 0 && matches!(stmt, Stmt::FunctionDef(_) | Stmt::ClassDef(_)) {
                self.out.push('\n');
            }
            self.stmt(stmt);
        }
    }

    fn suite(&mut self, header: &str, body: &[Stmt]) {
        self.line(header);
        self.level += 1;
        if body.is_empty() {
            self.line("pass");
        } else {
            self.block(body);
        }
        self.level -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FunctionDef(def) => self.function(def),
            Stmt::ClassDef(def) => self.class(def),
            Stmt::Return(value) => match value {
                Some(value) => self.line(&format!("return {}", expr(value))),
                None => self.line("return"),
            },
            Stmt::Delete(targets) => self.line(&format!("del {}", join(targets))),
            Stmt::Assign { targets, value } => {
                let mut text = String::new();
                for target in targets {
                    write_expr(target, &mut text);
                    text.push_str(" = ");
                }
                write_expr(value, &mut text);
                self.line(&text);
            }
            Stmt::AugAssign { target, op, value } => {
                self.line(&format!("{} {}= {}", expr(target), op.symbol(), expr(value)));
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let mut text = format!("{}: {}", expr(target), expr(annotation));
                if let Some(value) = value {
                    text.push_str(" = ");
                    write_expr(value, &mut text);
                }
                self.line(&text);
            }
            Stmt::For(stmt) => {
                let keyword = if stmt.is_async { "async for" } else { "for" };
                self.suite(
                    &format!("{} {} in {}:", keyword, expr(&stmt.target), expr(&stmt.iter)),
                    &stmt.body,
                );
                self.orelse(&stmt.orelse);
            }
            Stmt::While { test, body, orelse } => {
                self.suite(&format!("while {}:", expr(test)), body);
                self.orelse(orelse);
            }
            Stmt::If { test, body, orelse } => self.if_chain("if", test, body, orelse),
            Stmt::With(stmt) => {
                let keyword = if stmt.is_async { "async with" } else { "with" };
                let items: Vec<String> = stmt.items.iter().map(with_item).collect();
                self.suite(&format!("{} {}:", keyword, items.join(", ")), &stmt.body);
            }
            Stmt::Raise { exc, cause } => {
                let mut text = String::from("raise");
                if let Some(exc) = exc {
                    text.push(' ');
                    write_expr(exc, &mut text);
                }
                if let Some(cause) = cause {
                    text.push_str(" from ");
                    write_expr(cause, &mut text);
                }
                self.line(&text);
            }
            Stmt::Try(stmt) => {
                self.suite("try:", &stmt.body);
                for handler in &stmt.handlers {
                    self.handler(handler);
                }
                self.orelse(&stmt.orelse);
                if !stmt.finalbody.is_empty() {
                    self.suite("finally:", &stmt.finalbody);
                }
            }
            Stmt::Assert { test, msg } => match msg {
                Some(msg) => self.line(&format!("assert {}, {}", expr(test), expr(msg))),
                None => self.line(&format!("assert {}", expr(test))),
            },
            Stmt::Match { subject, cases } => {
                self.line(&format!("match {}:", expr(subject)));
                self.level += 1;
                for case in cases {
                    self.case(case);
                }
                self.level -= 1;
            }
            Stmt::Import(names) => self.line(&format!("import {}", aliases(names))),
            Stmt::ImportFrom { module, names } => {
                self.line(&format!("from {} import {}", module, aliases(names)));
            }
            Stmt::Global(names) => self.line(&format!("global {}", names.join(", "))),
            Stmt::Nonlocal(names) => self.line(&format!("nonlocal {}", names.join(", "))),
            Stmt::Expr(value) => self.line(&expr(value)),
            Stmt::Pass => self.line("pass"),
            Stmt::Break => self.line("break"),
            Stmt::Continue => self.line("continue"),
        }
    }

    fn orelse(&mut self, orelse: &[Stmt]) {
        if !orelse.is_empty() {
            self.suite("else:", orelse);
        }
    }

    fn if_chain(&mut self, keyword: &str, test: &Expr, body: &[Stmt], orelse: &[Stmt]) {
        self.suite(&format!("{} {}:", keyword, expr(test)), body);
        match orelse {
            [Stmt::If {
                test,
                body,
                orelse,
            }] => self.if_chain("elif", test, body, orelse),
            _ => self.orelse(orelse),
        }
    }

    fn handler(&mut self, handler: &ExceptHandler) {
        let mut header = String::from(if handler.is_star { "except*" } else { "except" });
        if let Some(kind) = &handler.kind {
            header.push(' ');
            write_expr(kind, &mut header);
            if let Some(name) = &handler.name {
                header.push_str(" as ");
                header.push_str(name);
            }
        }
        header.push(':');
        self.suite(&header, &handler.body);
    }

    fn case(&mut self, case: &MatchCase) {
        let mut header = String::from("case ");
        write_segments(&case.pattern, &mut header);
        if let Some(guard) = &case.guard {
            header.push_str(" if ");
            write_expr(guard, &mut header);
        }
        header.push(':');
        self.suite(&header, &case.body);
    }

    fn decorators(&mut self, decorators: &[Expr]) {
        for decorator in decorators {
            self.line(&format!("@{}", expr(decorator)));
        }
    }

    fn function(&mut self, def: &FunctionDef) {
        self.decorators(&def.decorators);
        let mut header = String::new();
        if def.is_async {
            header.push_str("async ");
        }
        header.push_str("def ");
        header.push_str(&def.name);
        header.push('(');
        write_params(&def.params, true, &mut header);
        header.push(')');
        if let Some(returns) = &def.returns {
            header.push_str(" -> ");
            write_expr(returns, &mut header);
        }
        header.push(':');
        self.suite(&header, &def.body);
    }

    fn class(&mut self, def: &ClassDef) {
        self.decorators(&def.decorators);
        let mut header = format!("class {}", def.name);
        if !def.bases.is_empty() {
            header.push('(');
            write_args(&def.bases, &mut header);
            header.push(')');
        }
        header.push(':');
        self.suite(&header, &def.body);
    }
}

fn expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(expr, &mut out);
    out
}

fn join(exprs: &[Expr]) -> String {
    let mut out = String::new();
    write_list(exprs, &mut out);
    out
}

fn aliases(names: &[Alias]) -> String {
    names
        .iter()
        .map(|alias| match &alias.asname {
            Some(asname) => format!("{} as {}", alias.name, asname),
            None => alias.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn with_item(item: &WithItem) -> String {
    match &item.target {
        Some(target) => format!("{} as {}", expr(&item.context), expr(target)),
        None => expr(&item.context),
    }
}

fn write_list(exprs: &[Expr], out: &mut String) {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(e, out);
    }
}

fn write_params(params: &[Param], annotated: bool, out: &mut String) {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let (prefix, name, annotation, default) = match param {
            Param::Plain {
                name,
                annotation,
                default,
            } => ("", name.as_str(), annotation.as_ref(), default.as_ref()),
            Param::VarArgs { name, annotation } => ("*", name.as_str(), annotation.as_ref(), None),
            Param::KwArgs { name, annotation } => ("**", name.as_str(), annotation.as_ref(), None),
            Param::KeywordOnlyMarker => {
                out.push('*');
                continue;
            }
            Param::PositionalOnlyMarker => {
                out.push('/');
                continue;
            }
        };
        out.push_str(prefix);
        out.push_str(name);
        let annotation = annotation.filter(|_| annotated);
        if let Some(annotation) = annotation {
            out.push_str(": ");
            write_expr(annotation, out);
        }
        if let Some(default) = default {
            out.push_str(if annotation.is_some() { " = " } else { "=" });
            write_expr(default, out);
        }
    }
}

fn write_args(args: &[Arg], out: &mut String) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match arg {
            Arg::Positional(value) => write_expr(value, out),
            Arg::Keyword { name, value } => {
                out.push_str(name);
                out.push('=');
                write_expr(value, out);
            }
            Arg::KeywordUnpack(value) => {
                out.push_str("**");
                write_expr(value, out);
            }
        }
    }
}

fn write_generators(generators: &[Comprehension], out: &mut String) {
    for generator in generators {
        out.push_str(if generator.is_async { " async for " } else { " for " });
        write_expr(&generator.target, out);
        out.push_str(" in ");
        write_expr(&generator.iter, out);
        for test in &generator.ifs {
            out.push_str(" if ");
            write_expr(test, out);
        }
    }
}

fn write_segments(segments: &[Segment], out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Expr(value) => write_expr(value, out),
        }
    }
}

fn write_opt(expr: Option<&Expr>, out: &mut String) {
    if let Some(expr) = expr {
        write_expr(expr, out);
    }
}

fn write_expr(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Name(id) => out.push_str(id),
        Expr::Int(lit) => out.push_str(lit.spelling()),
        Expr::Number(text) | Expr::Str(text) => out.push_str(text),
        Expr::FString(segments) => write_segments(segments, out),
        Expr::Bool(true) => out.push_str("True"),
        Expr::Bool(false) => out.push_str("False"),
        Expr::None => out.push_str("None"),
        Expr::Ellipsis => out.push_str("..."),
        Expr::BinOp { left, op, right } => {
            write_expr(left, out);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(right, out);
        }
        Expr::UnaryOp { op, operand } => {
            out.push_str(op.prefix());
            write_expr(operand, out);
        }
        Expr::BoolOp { left, op, right } => {
            write_expr(left, out);
            out.push(' ');
            out.push_str(op.keyword());
            out.push(' ');
            write_expr(right, out);
        }
        Expr::Compare { left, comparisons } => {
            write_expr(left, out);
            for (op, right) in comparisons {
                out.push(' ');
                out.push_str(op.symbol());
                out.push(' ');
                write_expr(right, out);
            }
        }
        Expr::Call { func, args } => {
            write_expr(func, out);
            match args.as_slice() {
                // `f(x for x in xs)` needs no second pair of parentheses
                [Arg::Positional(Expr::Comp {
                    kind: CompKind::Generator,
                    element,
                    generators,
                })] => {
                    out.push('(');
                    write_expr(element, out);
                    write_generators(generators, out);
                    out.push(')');
                }
                _ => {
                    out.push('(');
                    write_args(args, out);
                    out.push(')');
                }
            }
        }
        Expr::Attribute { value, attr } => {
            write_expr(value, out);
            if matches!(**value, Expr::Int(_)) {
                out.push(' ');
            }
            out.push('.');
            out.push_str(attr);
        }
        Expr::Subscript { value, indices } => {
            write_expr(value, out);
            out.push('[');
            write_list(indices, out);
            out.push(']');
        }
        Expr::Slice { lower, upper, step } => {
            write_opt(lower.as_deref(), out);
            out.push(':');
            write_opt(upper.as_deref(), out);
            if let Some(step) = step {
                out.push(':');
                write_expr(step, out);
            }
        }
        Expr::Tuple {
            elts,
            parenthesized,
        } => {
            if *parenthesized {
                out.push('(');
            }
            write_list(elts, out);
            if elts.len() == 1 {
                out.push(',');
            }
            if *parenthesized {
                out.push(')');
            }
        }
        Expr::List(elts) => {
            out.push('[');
            write_list(elts, out);
            out.push(']');
        }
        Expr::Set(elts) => {
            out.push('{');
            write_list(elts, out);
            out.push('}');
        }
        Expr::Dict(items) => {
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match item {
                    DictItem::Pair { key, value } => {
                        write_expr(key, out);
                        out.push_str(": ");
                        write_expr(value, out);
                    }
                    DictItem::Unpack(value) => {
                        out.push_str("**");
                        write_expr(value, out);
                    }
                }
            }
            out.push('}');
        }
        Expr::Starred(value) => {
            out.push('*');
            write_expr(value, out);
        }
        Expr::IfExp { test, body, orelse } => {
            write_expr(body, out);
            out.push_str(" if ");
            write_expr(test, out);
            out.push_str(" else ");
            write_expr(orelse, out);
        }
        Expr::Lambda { params, body } => {
            out.push_str("lambda");
            if !params.is_empty() {
                out.push(' ');
                write_params(params, false, out);
            }
            out.push_str(": ");
            write_expr(body, out);
        }
        Expr::NamedExpr { target, value } => {
            write_expr(target, out);
            out.push_str(" := ");
            write_expr(value, out);
        }
        Expr::Await(value) => {
            out.push_str("await ");
            write_expr(value, out);
        }
        Expr::Yield(value) => {
            out.push_str("yield");
            if let Some(value) = value {
                out.push(' ');
                write_expr(value, out);
            }
        }
        Expr::YieldFrom(value) => {
            out.push_str("yield from ");
            write_expr(value, out);
        }
        Expr::Comp {
            kind,
            element,
            generators,
        } => {
            let (open, close) = match kind {
                CompKind::List => ('[', ']'),
                CompKind::Set => ('{', '}'),
                CompKind::Generator => ('(', ')'),
            };
            out.push(open);
            write_expr(element, out);
            write_generators(generators, out);
            out.push(close);
        }
        Expr::DictComp {
            key,
            value,
            generators,
        } => {
            out.push('{');
            write_expr(key, out);
            out.push_str(": ");
            write_expr(value, out);
            write_generators(generators, out);
            out.push('}');
        }
        Expr::Paren(inner) => {
            out.push('(');
            write_expr(inner, out);
            out.push(')');
        }
    }
}
