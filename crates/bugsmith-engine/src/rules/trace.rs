//! Debug print injection

use bugsmith_syntax::{Expr, Stmt};

use super::{Deferred, MutationContext, MutationRule, RuleKind, Site};

/// Messages for the injected `print`; `{name}` is the function name
pub const TRACE_TEMPLATES: [&str; 4] = [
    "🐛 Entering function {name}",
    "🔍 Function {name} called with mysterious purposes",
    "✨ Magic happens here in {name}",
    "🎭 {name} is doing something... probably",
];

/// Inserts a `print(...)` call at the top of function bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceInjectionRule;

impl TraceInjectionRule {
    /// `print('<message>')` statement for `function`
    #[must_use]
    pub fn trace_statement(template: &str, function: &str) -> Stmt {
        let message = template.replace("{name}", function);
        Stmt::Expr(Expr::call(
            Expr::name("print"),
            vec![Expr::Str(format!("'{}'", message))],
        ))
    }
}

impl MutationRule for TraceInjectionRule {
    fn kind(&self) -> RuleKind {
        RuleKind::TraceInjection
    }

    fn apply(&self, site: Site<'_>, cx: &mut MutationContext<'_>) -> Option<Deferred> {
        let Site::Stmt(Stmt::FunctionDef(def)) = site else {
            return None;
        };
        if def.body.is_empty() || !cx.decide() {
            return None;
        }

        let template = cx.choose(&TRACE_TEMPLATES)?;
        cx.record(
            RuleKind::TraceInjection,
            format!("Added debug print to function '{}'", def.name),
        );
        Some(Deferred::PrependTrace(Self::trace_statement(
            template, &def.name,
        )))
    }
}
