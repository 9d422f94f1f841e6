//! Useless `if True:` wrappers

use bugsmith_syntax::{Expr, Stmt};

use super::{Deferred, MutationContext, MutationRule, NodeKind, RuleKind, Site};

/// Wraps statements in `if True:`
///
/// Function and class definitions and `if` statements are never wrapped.
/// The wrapper is built after the statement was walked, so neither it nor
/// its `True` test is offered to any rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementWrapRule;

impl StatementWrapRule {
    /// `if True:` around `stmt`
    #[must_use]
    pub fn wrap(stmt: Stmt) -> Stmt {
        Stmt::If {
            test: Expr::Bool(true),
            body: vec![stmt],
            orelse: Vec::new(),
        }
    }

    /// Check if `stmt` may be wrapped
    #[inline]
    #[must_use]
    pub fn is_eligible(stmt: &Stmt) -> bool {
        NodeKind::of_stmt(stmt) == NodeKind::Statement
    }
}

impl MutationRule for StatementWrapRule {
    fn kind(&self) -> RuleKind {
        RuleKind::StatementWrap
    }

    fn apply(&self, site: Site<'_>, cx: &mut MutationContext<'_>) -> Option<Deferred> {
        let Site::Stmt(stmt) = site else {
            return None;
        };
        if !Self::is_eligible(stmt) || !cx.decide() {
            return None;
        }

        cx.record(
            RuleKind::StatementWrap,
            "Wrapped statement in useless 'if True:' block",
        );
        Some(Deferred::Wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ScriptedEntropy;
    use crate::rules::testing::with_context;
    use bugsmith_syntax::ClassDef;

    #[test]
    fn plain_statement_is_wrapped() {
        let mut stmt = Stmt::Pass;
        let mut entropy = ScriptedEntropy::always();
        let (deferred, log) =
            with_context(&mut entropy, |cx| StatementWrapRule.apply(Site::Stmt(&mut stmt), cx));
        assert_eq!(deferred, Some(Deferred::Wrap));
        assert_eq!(
            log.descriptions(),
            vec!["Wrapped statement in useless 'if True:' block"]
        );
    }

    #[test]
    fn definitions_and_ifs_are_not_wrapped() {
        let mut entropy = ScriptedEntropy::always();
        let mut class = Stmt::ClassDef(ClassDef {
            name: "Point".into(),
            bases: Vec::new(),
            body: vec![Stmt::Pass],
            decorators: Vec::new(),
        });
        let mut wrapped = StatementWrapRule::wrap(Stmt::Pass);

        let ((), log) = with_context(&mut entropy, |cx| {
            assert!(StatementWrapRule.apply(Site::Stmt(&mut class), cx).is_none());
            assert!(StatementWrapRule.apply(Site::Stmt(&mut wrapped), cx).is_none());
        });
        assert!(log.is_empty());
        assert_eq!(entropy.draws(), 0);
    }

    #[test]
    fn wrapper_shape() {
        let Stmt::If { test, body, orelse } = StatementWrapRule::wrap(Stmt::Break) else {
            panic!("expected if");
        };
        assert_eq!(test, Expr::Bool(true));
        assert_eq!(body, vec![Stmt::Break]);
        assert!(orelse.is_empty());
    }
}
