//! `+` / `-` swapping

use bugsmith_syntax::{BinOp, Expr};

use super::{Deferred, MutationContext, MutationRule, RuleKind, Site};

/// Flips binary `+` into `-` and back
///
/// Other binary operators, unary minus and augmented assignments are
/// untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorSwapRule;

impl MutationRule for OperatorSwapRule {
    fn kind(&self) -> RuleKind {
        RuleKind::OperatorSwap
    }

    fn apply(&self, site: Site<'_>, cx: &mut MutationContext<'_>) -> Option<Deferred> {
        let Site::Expr {
            expr: Expr::BinOp { op, .. },
            ..
        } = site
        else {
            return None;
        };

        let swapped = match op {
            BinOp::Add => BinOp::Sub,
            BinOp::Sub => BinOp::Add,
            _ => return None,
        };
        if !cx.decide() {
            return None;
        }

        cx.record(
            RuleKind::OperatorSwap,
            format!(
                "Swapped '{}' to '{}' in expression",
                op.symbol(),
                swapped.symbol()
            ),
        );
        *op = swapped;
        None
    }
}
