// crates/qocim-routing-filter/tests/runtime.rs
// ============================================================================
// Test Module: Reference Filter Runtime
// Coverage: Built-in semantics, parse errors, limits, and runtime errors.
// ============================================================================
//! ## Overview
//! Integration tests for the routing filter interpreter.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod support;

use qocim_routing_filter::FilterProgram;
use qocim_routing_filter::FilterRuntime;
use qocim_routing_filter::RuntimeError;
use qocim_routing_filter::runtime::MAX_FILTER_NESTING;
use support::TestResult;
use support::ensure;
use support::freshness;
use support::percent_precision;
use support::perthousand_precision;

/// Parses and runs source against indicators.
fn run(source: &str, indicators: &[qocim_core::QocIndicator]) -> Result<bool, RuntimeError> {
    let program = FilterProgram::parse(source)?;
    FilterRuntime::new().run(&program, indicators)
}

// ============================================================================
// SECTION: Semantics
// ============================================================================

/// Tests that comparisons across units normalize first.
#[test]
fn match_builtin_normalizes_units() -> TestResult {
    let source = "var q = message.qocMetaData;\nreturn matchQoCMetricValue(q, \"10.1\", \"GT\", 40);";
    ensure(run(source, &[percent_precision(50)])?, "50 % > 40 %")?;
    ensure(!run(source, &[perthousand_precision(900)])?, "per-thousand is another definition")
}

/// Tests selection arguments on the match built-in.
#[test]
fn match_builtin_applies_selection() -> TestResult {
    let source = "var q = message.qocMetaData;\n\
                  return matchQoCMetricValue(q, \"10.1\", \"ge\", 75, \"MIN\");";
    ensure(!run(source, &[percent_precision(80), percent_precision(20)])?, "min is 20")?;
    ensure(run(source, &[percent_precision(80), percent_precision(90)])?, "min is 80")
}

/// Tests comments, nested blocks, and fallthrough.
#[test]
fn nested_blocks_and_comments() -> TestResult {
    let source = "// header\nvar q = message.qocMetaData;\n\
                  if (hasQoCMetricDefinition(q, \"1.1\")) {\n  if (!(false || true)) { return false; }\n  return true;\n}\n\
                  return false;";
    ensure(run(source, &[freshness(1)])?, "nested return true")?;
    ensure(!run(source, &[])?, "fallthrough return false")
}

/// Tests that Unicode line separators end comments as in the bus's engine.
#[test]
fn line_separators_end_comments() -> TestResult {
    let source = "// header\u{2028}return false;\nreturn true;";
    ensure(!run(source, &[])?, "statement after U+2028 is live")?;
    let source = "// header\u{2029}var q = message.qocMetaData;\u{2028}return hasQoCMetricDefinition(q, \"1.1\");";
    ensure(run(source, &[freshness(1)])?, "U+2029 ends the comment and separators are whitespace")
}

/// Tests that unknown definitions are absent rather than errors.
#[test]
fn unknown_definition_is_absent() -> TestResult {
    let source = "var q = message.qocMetaData; return hasQoCMetricDefinition(q, \"77.7\");";
    ensure(!run(source, &[freshness(1)])?, "unknown definition is missing")
}

/// Tests that negative and fractional literals parse.
#[test]
fn signed_and_fractional_numbers() -> TestResult {
    let source = "var q = message.qocMetaData;\n\
                  return matchQoCMetricValue(q, \"1.1\", \"gt\", -0.5) && matchQoCMetricValue(q, \"1.1\", \"lt\", 2.5e0);";
    ensure(run(source, &[freshness(2)])?, "-0.5 < 2 < 2.5")
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tests syntax errors surface with positions.
#[test]
fn syntax_errors_are_reported() {
    assert_eq!(FilterProgram::parse("   "), Err(RuntimeError::EmptyInput));
    assert!(matches!(
        FilterProgram::parse("return true"),
        Err(RuntimeError::UnexpectedToken { expected: "`;`", .. })
    ));
    assert!(matches!(
        FilterProgram::parse("return a & b;"),
        Err(RuntimeError::UnexpectedToken { expected: "&&", .. })
    ));
    assert_eq!(
        FilterProgram::parse("return \"open;"),
        Err(RuntimeError::UnterminatedString { position: 7 })
    );
    assert!(matches!(FilterProgram::parse("x = 1;"), Err(RuntimeError::UnexpectedToken { .. })));
}

/// Tests the nesting limit.
#[test]
fn nesting_limit_is_enforced() {
    let depth = MAX_FILTER_NESTING + 1;
    let source = format!("return {}true{};", "(".repeat(depth), ")".repeat(depth));
    assert!(matches!(FilterProgram::parse(&source), Err(RuntimeError::NestingTooDeep { .. })));
}

/// Tests runtime errors for bad bindings and calls.
#[test]
fn runtime_errors_are_reported() {
    assert_eq!(
        run("var q = message.payload; return true;", &[]),
        Err(RuntimeError::UnsupportedSource {
            path: "message.payload".to_string()
        })
    );
    assert!(matches!(run("return hasQoCMetricDefinition(q, \"1.1\");", &[]), Err(RuntimeError::UnknownVariable { .. })));
    assert!(matches!(run("var q = message.qocMetaData; return eval(q);", &[]), Err(RuntimeError::UnknownFunction { .. })));
    assert!(matches!(
        run("var q = message.qocMetaData; return hasQoCMetricDefinition(q);", &[]),
        Err(RuntimeError::ArityMismatch { .. })
    ));
    assert!(matches!(
        run("var q = message.qocMetaData; return matchQoCMetricValue(q, \"1.1\", \"about\", 1);", &[]),
        Err(RuntimeError::UnknownOperator(_))
    ));
    assert!(matches!(
        run("var q = message.qocMetaData; return matchQoCMetricValue(q, \"1.1\", \"gt\", 1, \"AVG\");", &[]),
        Err(RuntimeError::UnknownAggregation(_))
    ));
    assert!(matches!(run("return 5;", &[]), Err(RuntimeError::TypeError { .. })));
    assert_eq!(run("if (false) { return true; }", &[]), Err(RuntimeError::MissingReturn));
}
