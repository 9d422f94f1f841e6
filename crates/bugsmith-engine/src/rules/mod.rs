//! Mutation rules
//!
//! Five independent handlers, each keyed on the node kinds it accepts:
//!
//! | rule | node kind |
//! |---|---|
//! | [`RenameRule`] | name expression |
//! | [`ConstantShiftRule`] | integer literal |
//! | [`OperatorSwapRule`] | binary operation |
//! | [`TraceInjectionRule`] | function definition |
//! | [`StatementWrapRule`] | any statement but `def`, `class`, `if` |
//!
//! The walker offers every node to the rules of a [`RuleSet`] in declared
//! order; a rule rewrites the node in place and may return a [`Deferred`]
//! edit that the walker applies once the node's children have been visited.

mod constant;
mod operator;
mod rename;
mod trace;
mod wrap;

use bugsmith_syntax::{Expr, Stmt};
use serde::{Deserialize, Serialize};

use crate::log::BugLog;
use crate::policy::ChaosPolicy;
use crate::tracker::RenameTracker;

pub use constant::ConstantShiftRule;
pub use operator::OperatorSwapRule;
pub use rename::{RenameRule, RENAME_SUFFIXES};
pub use trace::{TraceInjectionRule, TRACE_TEMPLATES};
pub use wrap::StatementWrapRule;

/// Mutation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Rename,
    ConstantShift,
    OperatorSwap,
    TraceInjection,
    StatementWrap,
}

impl RuleKind {
    /// Declared application order
    pub const ORDER: [RuleKind; 5] = [
        RuleKind::Rename,
        RuleKind::ConstantShift,
        RuleKind::OperatorSwap,
        RuleKind::TraceInjection,
        RuleKind::StatementWrap,
    ];

    /// Check if this rule handles nodes of `kind`
    #[must_use]
    pub fn accepts(self, kind: NodeKind) -> bool {
        match self {
            RuleKind::Rename => kind == NodeKind::Name,
            RuleKind::ConstantShift => kind == NodeKind::IntLiteral,
            RuleKind::OperatorSwap => kind == NodeKind::BinaryOp,
            RuleKind::TraceInjection => kind == NodeKind::FunctionDef,
            RuleKind::StatementWrap => kind == NodeKind::Statement,
        }
    }

    /// Snake-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Rename => "rename",
            RuleKind::ConstantShift => "constant_shift",
            RuleKind::OperatorSwap => "operator_swap",
            RuleKind::TraceInjection => "trace_injection",
            RuleKind::StatementWrap => "statement_wrap",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch tag of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Name expression
    Name,
    /// Integer literal
    IntLiteral,
    /// Binary arithmetic/bitwise operation
    BinaryOp,
    /// Any other expression
    OtherExpr,
    FunctionDef,
    ClassDef,
    If,
    /// Any other statement
    Statement,
}

impl NodeKind {
    /// Tag of an expression
    #[must_use]
    pub fn of_expr(expr: &Expr) -> Self {
        match expr {
            Expr::Name(_) => NodeKind::Name,
            Expr::Int(_) => NodeKind::IntLiteral,
            Expr::BinOp { .. } => NodeKind::BinaryOp,
            _ => NodeKind::OtherExpr,
        }
    }

    /// Tag of a statement
    #[must_use]
    pub fn of_stmt(stmt: &Stmt) -> Self {
        match stmt {
            Stmt::FunctionDef(_) => NodeKind::FunctionDef,
            Stmt::ClassDef(_) => NodeKind::ClassDef,
            Stmt::If { .. } => NodeKind::If,
            _ => NodeKind::Statement,
        }
    }
}

/// How a name expression is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprContext {
    /// Read
    Load,
    /// Binding occurrence
    Store,
    /// `del` target
    Del,
}

/// Node offered to a rule
#[derive(Debug)]
pub enum Site<'a> {
    Expr { expr: &'a mut Expr, ctx: ExprContext },
    Stmt(&'a mut Stmt),
}

impl Site<'_> {
    /// Dispatch tag of the offered node
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Site::Expr { expr, .. } => NodeKind::of_expr(expr),
            Site::Stmt(stmt) => NodeKind::of_stmt(stmt),
        }
    }
}

/// Statement edit applied after the statement's children were walked
///
/// Nodes created by a deferred edit are never offered to any rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    /// Insert the statement at the top of the function body
    PrependTrace(Stmt),
    /// Replace the statement with `if True:` around it
    Wrap,
}

/// Per-run state shared by the rules
#[derive(Debug)]
pub struct MutationContext<'e> {
    policy: ChaosPolicy<'e>,
    tracker: RenameTracker,
    log: BugLog,
}

impl<'e> MutationContext<'e> {
    /// Fresh context: empty tracker and log
    pub fn new(policy: ChaosPolicy<'e>) -> Self {
        Self {
            policy,
            tracker: RenameTracker::new(),
            log: BugLog::new(),
        }
    }

    /// Draw an injection decision
    pub fn decide(&mut self) -> bool {
        self.policy.decide()
    }

    /// Uniform choice from a non-empty slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.policy.choose(items)
    }

    /// Get rename tracker
    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &RenameTracker {
        &self.tracker
    }

    /// Get mutable rename tracker
    #[inline]
    pub fn tracker_mut(&mut self) -> &mut RenameTracker {
        &mut self.tracker
    }

    /// Get bug log
    #[inline]
    #[must_use]
    pub fn log(&self) -> &BugLog {
        &self.log
    }

    /// Append a mutation record
    pub fn record(&mut self, kind: RuleKind, description: impl Into<String>) {
        let description = description.into();
        tracing::debug!("Applied {}: {}", kind, description);
        self.log.record(kind, description);
    }

    /// Finish the run, keeping the log
    #[must_use]
    pub fn into_log(self) -> BugLog {
        self.log
    }
}

/// A mutation category
pub trait MutationRule: Send + Sync {
    /// Category, which also fixes the accepted node kinds
    fn kind(&self) -> RuleKind;

    /// Offer a node; rewrite it in place and/or return a deferred edit
    fn apply(&self, site: Site<'_>, cx: &mut MutationContext<'_>) -> Option<Deferred>;
}

/// Ordered collection of rules
pub struct RuleSet {
    rules: Vec<Box<dyn MutationRule>>,
}

impl RuleSet {
    /// Create empty rule set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The five built-in rules in declared order
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_rule(RenameRule)
            .with_rule(ConstantShiftRule)
            .with_rule(OperatorSwapRule)
            .with_rule(TraceInjectionRule)
            .with_rule(StatementWrapRule)
    }

    /// With an appended rule
    #[must_use]
    pub fn with_rule(mut self, rule: impl MutationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Categories in application order
    #[must_use]
    pub fn kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(|r| r.kind()).collect()
    }

    /// Get number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if rule set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules accepting `kind`, in order
    pub fn for_kind(&self, kind: NodeKind) -> impl Iterator<Item = &dyn MutationRule> {
        self.rules
            .iter()
            .filter(move |r| r.kind().accepts(kind))
            .map(|r| r.as_ref())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.kinds())
            .finish()
    }
}
