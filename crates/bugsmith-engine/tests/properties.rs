//! Property tests for the chaos policy and the injection pipeline

use bugsmith_engine::policy::MAX_PROBABILITY;
use bugsmith_engine::prelude::*;
use bugsmith_engine::rules::ConstantShiftRule;
use bugsmith_engine::RuleSet;
use bugsmith_syntax::{PythonParser, SourceParser};
use bugsmith_test_utils::{count_wrap_eligible, fixtures, parse};
use proptest::prelude::*;

fn bare() -> BugInjector {
    BugInjector::with_config(EngineConfig::default().with_header(false))
}

proptest! {
    /// Tenet: probability grows with the level and never exceeds the cap
    #[test]
    fn prop_probability_monotone_and_capped(a in 1..=10i64, b in 1..=10i64) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low = ChaosLevel::new(low).unwrap();
        let high = ChaosLevel::new(high).unwrap();

        prop_assert!(low.probability() <= high.probability());
        prop_assert!(high.probability() <= MAX_PROBABILITY);
        prop_assert!(low.probability() > 0.0);
    }

    /// Tenet: levels outside 1..=10 are never clamped into range
    #[test]
    fn prop_out_of_range_levels_rejected(level in prop_oneof![i64::MIN..1i64, 11i64..i64::MAX]) {
        prop_assert!(ChaosLevel::new(level).is_err());
    }

    /// Tenet: the same seed reproduces the same run
    #[test]
    fn prop_seed_determinism(seed in any::<u64>(), level in 1..=10i64, index in 0..fixtures::all().len()) {
        let (_, source) = fixtures::all()[index];
        let injector = bare();

        let first = injector.inject_seeded(source, level, seed).unwrap();
        let second = injector.inject_seeded(source, level, seed).unwrap();

        prop_assert_eq!(first, second);
    }

    /// Tenet: every mutant re-parses and wraps stay within eligible statements
    #[test]
    fn prop_mutants_reparse(seed in any::<u64>(), level in 1..=10i64, index in 0..fixtures::all().len()) {
        let (name, source) = fixtures::all()[index];
        let result = BugInjector::new().inject_seeded(source, level, seed).unwrap();

        prop_assert!(
            PythonParser::new().check(&result.mutated_text).is_ok(),
            "fixture {} produced:\n{}",
            name,
            result.mutated_text
        );
        prop_assert!(
            result.bug_log.count_of(RuleKind::StatementWrap) <= count_wrap_eligible(&parse(source))
        );
    }

    /// Tenet: a shifted constant moves by exactly one
    #[test]
    fn prop_constant_shift_is_unit(value in 1u32..100_000, seed in any::<u64>()) {
        let injector = bare().with_rules(RuleSet::new().with_rule(ConstantShiftRule));
        let source = format!("x = {}\n", value);

        let result = injector.inject_seeded(&source, 10, seed).unwrap();
        let shifted: i64 = result
            .mutated_text
            .trim_end()
            .trim_start_matches("x = ")
            .parse()
            .unwrap();

        prop_assert!((shifted - i64::from(value)).abs() <= 1);
        prop_assert_eq!(shifted != i64::from(value), result.bug_count() == 1);
    }
}
