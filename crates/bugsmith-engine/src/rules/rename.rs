//! Variable renaming

use bugsmith_syntax::Expr;

use super::{Deferred, ExprContext, MutationContext, MutationRule, RuleKind, Site};

/// Suffixes appended to a renamed variable
pub const RENAME_SUFFIXES: [&str; 6] = ["_bug", "_oops", "_whoops", "_mystery", "_chaos", "_glitch"];

/// Renames variables at binding occurrences and rewrites every later use
///
/// A name is a candidate when it is bound (store context), has not been
/// renamed yet and does not start with `_`. Uses visited before the binding
/// keep their original spelling.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameRule;

impl MutationRule for RenameRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Rename
    }

    fn apply(&self, site: Site<'_>, cx: &mut MutationContext<'_>) -> Option<Deferred> {
        let Site::Expr {
            expr: Expr::Name(id),
            ctx,
        } = site
        else {
            return None;
        };

        let candidate = ctx == ExprContext::Store
            && !id.starts_with('_')
            && !cx.tracker().contains(id.as_str());
        if candidate && cx.decide() {
            if let Some(suffix) = cx.choose(&RENAME_SUFFIXES) {
                let renamed = format!("{}{}", id, suffix);
                cx.tracker_mut().record(id.clone(), renamed.clone());
                cx.record(
                    RuleKind::Rename,
                    format!("Renamed variable '{}' to '{}'", id, renamed),
                );
            }
        }

        if let Some(renamed) = cx.tracker().get(id.as_str()) {
            *id = renamed.to_string();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ScriptedEntropy;
    use crate::rules::testing::with_context;

    fn offer(expr: &mut Expr, ctx: ExprContext, cx: &mut MutationContext<'_>) {
        RenameRule.apply(Site::Expr { expr, ctx }, cx);
    }

    #[test]
    fn binding_is_renamed_and_later_uses_follow() {
        let mut entropy = ScriptedEntropy::always();
        let mut target = Expr::name("count");
        let mut read = Expr::name("count");

        let ((), log) = with_context(&mut entropy, |cx| {
            offer(&mut target, ExprContext::Store, cx);
            offer(&mut read, ExprContext::Load, cx);
        });

        assert_eq!(target, Expr::name("count_bug"));
        assert_eq!(read, Expr::name("count_bug"));
        assert_eq!(log.descriptions(), vec!["Renamed variable 'count' to 'count_bug'"]);
    }

    #[test]
    fn reads_never_trigger_a_rename() {
        let mut entropy = ScriptedEntropy::always();
        let mut read = Expr::name("value");

        let ((), log) = with_context(&mut entropy, |cx| offer(&mut read, ExprContext::Load, cx));

        assert_eq!(read, Expr::name("value"));
        assert!(log.is_empty());
        assert_eq!(entropy.draws(), 0);
    }

    #[test]
    fn private_names_are_skipped() {
        let mut entropy = ScriptedEntropy::always();
        let mut target = Expr::name("_cache");

        let ((), log) = with_context(&mut entropy, |cx| offer(&mut target, ExprContext::Store, cx));

        assert_eq!(target, Expr::name("_cache"));
        assert!(log.is_empty());
    }

    #[test]
    fn second_binding_reuses_first_rename() {
        let mut entropy = ScriptedEntropy::always();
        let mut first = Expr::name("x");
        let mut second = Expr::name("x");

        let ((), log) = with_context(&mut entropy, |cx| {
            offer(&mut first, ExprContext::Store, cx);
            offer(&mut second, ExprContext::Store, cx);
        });

        assert_eq!(second, Expr::name("x_bug"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn suffix_comes_from_the_pick() {
        let mut entropy = ScriptedEntropy::always().with_pick(3);
        let mut target = Expr::name("x");

        with_context(&mut entropy, |cx| offer(&mut target, ExprContext::Store, cx));

        assert_eq!(target, Expr::name("x_mystery"));
    }

    #[test]
    fn del_targets_follow_existing_renames() {
        let mut entropy = ScriptedEntropy::from_decisions([true]);
        let mut target = Expr::name("x");
        let mut deleted = Expr::name("x");

        with_context(&mut entropy, |cx| {
            offer(&mut target, ExprContext::Store, cx);
            offer(&mut deleted, ExprContext::Del, cx);
        });

        assert_eq!(deleted, Expr::name("x_bug"));
    }
}
