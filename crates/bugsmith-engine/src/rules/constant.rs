//! Off-by-one integer constants

use bugsmith_syntax::Expr;

use super::{Deferred, MutationContext, MutationRule, RuleKind, Site};

/// Shifts non-zero integer literals by one in either direction
///
/// Booleans, floats, strings and `None` are different node variants and are
/// never offered to this rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantShiftRule;

impl MutationRule for ConstantShiftRule {
    fn kind(&self) -> RuleKind {
        RuleKind::ConstantShift
    }

    fn apply(&self, site: Site<'_>, cx: &mut MutationContext<'_>) -> Option<Deferred> {
        let Site::Expr {
            expr: Expr::Int(literal),
            ..
        } = site
        else {
            return None;
        };

        // zero is left alone
        if literal.is_zero() || !cx.decide() {
            return None;
        }

        let up = *cx.choose(&[false, true])?;
        let shifted = literal.shifted(up)?;
        cx.record(
            RuleKind::ConstantShift,
            format!("Changed constant {} to {}", literal, shifted),
        );
        *literal = shifted;
        None
    }
}
