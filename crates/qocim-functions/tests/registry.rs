// crates/qocim-functions/tests/registry.rs
// ============================================================================
// Test Module: Function Registry
// Coverage: Built-in names, creation, unknown and duplicate names.
// ============================================================================
//! ## Overview
//! Integration tests for the management function registry.

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

use std::sync::Arc;

use qocim_core::MetricDefinition;
use qocim_core::QocIndicator;
use qocim_functions::FunctionError;
use qocim_functions::FunctionEvent;
use qocim_functions::FunctionLog;
use qocim_functions::FunctionRegistry;
use qocim_functions::QocManagementFunction;
use qocim_functions::RemoveQocIndicator;
use support::RecordingLog;
use support::TestResult;
use support::ensure;
use support::params;
use support::report_with;

fn remove_alias(log: Arc<dyn FunctionLog>) -> Box<dyn QocManagementFunction> {
    Box::new(RemoveQocIndicator::with_log(log))
}

#[test]
fn builtin_names_are_sorted() {
    let registry = FunctionRegistry::default();
    assert_eq!(
        registry.names(),
        vec!["add_qoc_indicator", "aggregate_qoc_indicator", "remove_qoc_indicator"]
    );
}

#[test]
fn create_returns_a_configured_function() -> TestResult {
    let log = Arc::new(RecordingLog::default());
    let registry = FunctionRegistry::with_builtin_functions(log.clone());
    let function =
        registry.create("remove_qoc_indicator", &params(&[("qoc_indicator_id", "10")]))?;
    ensure(function.is_configured(), "configured")?;
    ensure(function.name() == "remove_qoc_indicator", "name")?;
    let mut report =
        report_with(vec![QocIndicator::new(MetricDefinition::PercentPrecision, "p", 1_u32)]);
    function.execute(&mut report);
    ensure(report.observations[0].indicators.is_empty(), "executed")?;
    ensure(
        log.events().first()
            == Some(&FunctionEvent::Created {
                function: "remove_qoc_indicator",
            }),
        "events flow to the registry log",
    )
}

#[test]
fn unknown_names_are_rejected() {
    let registry = FunctionRegistry::default();
    let result = registry.create("filter_qoc_indicator", &params(&[]));
    assert!(matches!(
        result,
        Err(FunctionError::UnknownFunction(name)) if name == "filter_qoc_indicator"
    ));
}

#[test]
fn invalid_parameters_fail_creation() {
    let registry = FunctionRegistry::default();
    let result = registry.create(
        "aggregate_qoc_indicator",
        &params(&[("qoc_indicator_id", "10"), ("aggregation_operator", "MEDIAN")]),
    );
    assert!(matches!(result, Err(FunctionError::InvalidParameter { .. })));
}

#[test]
fn custom_constructors_can_be_registered_once() -> TestResult {
    let mut registry = FunctionRegistry::default();
    registry.register("strip_indicator", remove_alias)?;
    ensure(registry.names().contains(&"strip_indicator"), "registered")?;
    ensure(
        registry.register("add_qoc_indicator", remove_alias)
            == Err(FunctionError::DuplicateFunction("add_qoc_indicator".to_string())),
        "duplicate rejected",
    )?;
    let function = registry.create("strip_indicator", &params(&[("qoc_indicator_id", "1")]))?;
    ensure(function.parameters() == params(&[("qoc_indicator_id", "1")]), "configured")
}
