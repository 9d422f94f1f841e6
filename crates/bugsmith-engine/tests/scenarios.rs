//! End-to-end injection scenarios
//!
//! Each test runs the full parse, walk, render and re-parse pipeline with
//! scripted entropy so the outcome is exact.

use std::sync::atomic::{AtomicUsize, Ordering};

use bugsmith_engine::prelude::*;
use bugsmith_engine::{ErrorKind, MutationRequest, RuleSet};
use bugsmith_engine::rules::{
    ConstantShiftRule, OperatorSwapRule, RenameRule, StatementWrapRule, TraceInjectionRule,
};
use bugsmith_syntax::{
    Module, ParseError, PythonParser, PythonRenderer, SourceParser, SourceRenderer,
};
use bugsmith_test_utils::{count_wrap_eligible, fixtures, parse, strip_header};
use pretty_assertions::assert_eq;

fn bare(rules: RuleSet) -> BugInjector {
    BugInjector::with_config(EngineConfig::default().with_header(false)).with_rules(rules)
}

/// Parser that counts how often it is asked to build a tree
#[derive(Debug, Default)]
struct CountingParser {
    inner: PythonParser,
    parses: AtomicUsize,
}

impl SourceParser for CountingParser {
    fn parse(&self, text: &str) -> Result<Module, ParseError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        self.inner.parse(text)
    }

    fn check(&self, text: &str) -> Result<(), ParseError> {
        self.inner.check(text)
    }
}

/// Tenet: a binding occurrence is renamed and its constant shifted by one
#[test]
fn single_assignment_renamed_and_shifted() {
    let injector = bare(RuleSet::new().with_rule(RenameRule).with_rule(ConstantShiftRule));
    let mut entropy = ScriptedEntropy::always();

    let result = injector
        .inject(fixtures::SIMPLE_ASSIGNMENT, 10, &mut entropy)
        .unwrap();

    assert_eq!(result.mutated_text, "x_bug = 0\n");
    assert_eq!(
        result.bug_log.descriptions(),
        vec![
            "Renamed variable 'x' to 'x_bug'".to_string(),
            "Changed constant 1 to 0".to_string(),
        ]
    );
    assert_eq!(result.chaos_level.get(), 10);
}

/// Tenet: with every rule enabled the binding statement is also wrapped
#[test]
fn single_assignment_with_standard_rules() {
    let injector = bare(RuleSet::standard());
    let mut entropy = ScriptedEntropy::always();

    let result = injector
        .inject(fixtures::SIMPLE_ASSIGNMENT, 10, &mut entropy)
        .unwrap();

    assert_eq!(result.mutated_text, "if True:\n    x_bug = 0\n");
    assert_eq!(
        result.bug_log.descriptions(),
        vec![
            "Wrapped statement in useless 'if True:' block".to_string(),
            "Renamed variable 'x' to 'x_bug'".to_string(),
            "Changed constant 1 to 0".to_string(),
        ]
    );
}

/// Tenet: names read inside f-string interpolations follow a rename
#[test]
fn f_string_interpolation_follows_rename() {
    let injector = bare(RuleSet::new().with_rule(RenameRule));
    let mut entropy = ScriptedEntropy::always();

    let result = injector
        .inject("x = 1\nprint(f\"{x}\")\n", 5, &mut entropy)
        .unwrap();

    assert_eq!(result.mutated_text, "x_bug = 1\nprint(f\"{x_bug}\")\n");
}

/// Tenet: `match` statements are mutated like any other compound statement
#[test]
fn match_statement_is_mutated() {
    let injector = bare(RuleSet::standard());
    let mut entropy = ScriptedEntropy::always();
    let source = "\
limit = 2
match value:
    case Mode.FAST if value > limit:
        pass
";

    let result = injector.inject(source, 10, &mut entropy).unwrap();

    assert_eq!(
        result.mutated_text,
        "\
if True:
    limit_bug = 1
if True:
    match value:
        case Mode.FAST if value > limit_bug:
            if True:
                pass
"
    );
    assert_eq!(result.bug_log.count_of(RuleKind::StatementWrap), 3);
}

/// Tenet: valid but unsupported Python is not reported as a syntax error
#[test]
fn unsupported_syntax_has_its_own_kind() {
    let injector = BugInjector::new();
    let mut entropy = ScriptedEntropy::always();

    let err = injector
        .inject("def first[T](items: list[T]) -> T:\n    return items[0]\n", 5, &mut entropy)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedSyntax);
    assert!(matches!(err.parse_error(), Some(ParseError::Unsupported { .. })));
    assert_eq!(entropy.draws(), 0);
}

/// Tenet: long flat operator chains are ordinary input
#[test]
fn long_operator_chains_are_mutated() {
    let injector = bare(RuleSet::new().with_rule(OperatorSwapRule));
    let mut entropy = ScriptedEntropy::always();
    let source = format!("x = {}\nok = {}\n", vec!["1"; 300].join(" + "), vec!["a"; 300].join(" and "));

    let result = injector.inject(&source, 10, &mut entropy).unwrap();

    assert_eq!(result.bug_log.count_of(RuleKind::OperatorSwap), 299);
    assert!(result.mutated_text.starts_with("x = 1 - 1 - 1"));
}

/// Tenet: nesting past the parser limit is a resource error, not bad syntax
#[test]
fn oversized_chain_is_too_complex() {
    let injector = BugInjector::new();
    let mut entropy = ScriptedEntropy::always();
    let source = format!("x = {}\n", vec!["1"; 5000].join(" + "));

    let err = injector.inject(&source, 5, &mut entropy).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceTooComplex);
    assert!(err.is_user_error());
}

/// Tenet: integer constants of any size are shifted
#[test]
fn huge_constant_is_shifted() {
    let injector = bare(RuleSet::new().with_rule(ConstantShiftRule));
    let mut entropy = ScriptedEntropy::always().with_pick(1);
    let source = "n = 340282366920938463463374607431768211455\n";

    let result = injector.inject(source, 5, &mut entropy).unwrap();

    assert_eq!(result.mutated_text, "n = 340282366920938463463374607431768211456\n");
}

/// Tenet: when every decision fails the program is only normalized
#[test]
fn failed_decisions_leave_program_unchanged() {
    let injector = bare(RuleSet::standard());
    for (name, source) in fixtures::all() {
        let mut entropy = ScriptedEntropy::never();
        let result = injector.inject(source, 10, &mut entropy).unwrap();

        let expected = PythonRenderer::new().render(&parse(source));
        assert_eq!(result.mutated_text, expected, "fixture {}", name);
        assert!(result.bug_log.is_empty(), "fixture {}", name);
    }
}

/// Tenet: the header reports the level and the number of applied mutations
#[test]
fn header_matches_log() {
    let injector = BugInjector::new();
    let mut entropy = ScriptedEntropy::always();

    let result = injector.inject("x = 1\n", 3, &mut entropy).unwrap();

    assert!(result.mutated_text.starts_with("\"\"\"\n🐛 DELIBERATELY BUGGED CODE 🐛\n"));
    assert!(result.mutated_text.contains("Chaos Level: 3/10\n"));
    assert!(result.mutated_text.contains("Bugs Injected: 3\n"));
    assert_eq!(strip_header(&result.mutated_text), "if True:\n    x_bug = 0\n");
}

/// Tenet: out-of-range levels are rejected before the source is looked at
#[test]
fn invalid_level_rejected_before_parsing() {
    let injector = BugInjector::from_parts(
        CountingParser::default(),
        PythonRenderer::new(),
        EngineConfig::default(),
    );

    for level in [0, 11, -3] {
        let mut entropy = ScriptedEntropy::always();
        let err = injector.inject("x = 1\n", level, &mut entropy).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(entropy.draws(), 0);
    }
    assert_eq!(injector_parses(&injector), 0);

    let mut entropy = ScriptedEntropy::never();
    injector.inject("x = 1\n", 1, &mut entropy).unwrap();
    assert_eq!(injector_parses(&injector), 1);
}

fn injector_parses(injector: &BugInjector<CountingParser>) -> usize {
    injector.parser().parses.load(Ordering::SeqCst)
}

/// Tenet: a syntax error reports where the source went wrong
#[test]
fn invalid_syntax_carries_position() {
    let injector = BugInjector::new();
    let mut entropy = ScriptedEntropy::always();

    let err = injector
        .inject("x = 1\ndef broken(:\n    pass\n", 5, &mut entropy)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidSyntax);
    let InjectError::InvalidSyntax(parse) = &err else {
        panic!("expected a syntax error, got {:?}", err);
    };
    let position = parse.position().expect("syntax errors are located");
    assert!(position.line >= 2, "located at {}", position);
    assert_eq!(entropy.draws(), 0);
}

/// Tenet: reads visited before the binding keep the original name
#[test]
fn read_before_binding_keeps_name() {
    let injector = bare(RuleSet::new().with_rule(RenameRule).with_rule(ConstantShiftRule));
    let mut entropy = ScriptedEntropy::always();

    let result = injector
        .inject(fixtures::READ_BEFORE_BIND, 5, &mut entropy)
        .unwrap();

    assert_eq!(result.mutated_text, "print(x)\nx_bug = 4\nprint(x_bug)\n");
}

/// Tenet: only `+` and `-` are swapped, outermost operation first
#[test]
fn operator_swap_in_arithmetic() {
    let injector = bare(RuleSet::new().with_rule(OperatorSwapRule));
    let mut entropy = ScriptedEntropy::always();

    let result = injector.inject(fixtures::ARITHMETIC, 5, &mut entropy).unwrap();

    assert!(result.mutated_text.contains("total = price - tax + 1\n"));
    assert!(result.mutated_text.contains("discount = total + 0\n"));
    assert_eq!(
        result.bug_log.descriptions(),
        vec![
            "Swapped '-' to '+' in expression".to_string(),
            "Swapped '+' to '-' in expression".to_string(),
            "Swapped '-' to '+' in expression".to_string(),
        ]
    );
}

/// Tenet: every non-empty function gets exactly one trace at the top
#[test]
fn trace_injected_per_function() {
    let injector = bare(RuleSet::new().with_rule(TraceInjectionRule));
    let mut entropy = ScriptedEntropy::always();

    let result = injector.inject(fixtures::FUNCTIONS, 5, &mut entropy).unwrap();

    assert!(result
        .mutated_text
        .contains("def add(a, b=1):\n    print('🐛 Entering function add')\n    result = a + b\n"));
    assert!(result
        .mutated_text
        .contains("async def fetch(url):\n    print('🐛 Entering function fetch')\n"));
    assert_eq!(result.bug_log.count_of(RuleKind::TraceInjection), 2);
}

/// Tenet: at full chaos every eligible statement is wrapped exactly once
#[test]
fn every_eligible_statement_wrapped_once() {
    let injector = bare(RuleSet::new().with_rule(StatementWrapRule));
    for (name, source) in fixtures::all() {
        let mut entropy = ScriptedEntropy::always();
        let result = injector.inject(source, 10, &mut entropy).unwrap();

        let eligible = count_wrap_eligible(&parse(source));
        assert_eq!(
            result.bug_log.count_of(RuleKind::StatementWrap),
            eligible,
            "fixture {}",
            name
        );
    }
}

/// Tenet: the full rule set at maximum chaos still yields valid Python
#[test]
fn maximum_chaos_output_reparses() {
    let injector = BugInjector::new();
    for (name, source) in fixtures::all() {
        let mut entropy = ScriptedEntropy::always().with_pick(1);
        let result = injector.inject(source, 10, &mut entropy).unwrap();

        assert!(
            PythonParser::new().check(&result.mutated_text).is_ok(),
            "fixture {} produced:\n{}",
            name,
            result.mutated_text
        );
    }
}

/// Tenet: a wire request round-trips through the JSON shapes
#[test]
fn wire_request_and_error() {
    let injector = BugInjector::with_config(EngineConfig::default().with_header(false));

    let request: MutationRequest = serde_json::from_str(r#"{"source_text": "x = 1\n"}"#).unwrap();
    assert_eq!(request.chaos_level, 5);

    let mut entropy = ScriptedEntropy::never();
    let response = injector.handle(&request, &mut entropy).unwrap();
    assert_eq!(response.mutated_text, "x = 1\n");
    assert_eq!(response.bug_count, 0);

    let mut entropy = ScriptedEntropy::never();
    let error = injector
        .handle(&MutationRequest::new("   \n").with_level(5), &mut entropy)
        .unwrap_err();
    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json["error_kind"], "empty_input");
}
