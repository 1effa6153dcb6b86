// crates/qocim-functions/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Shared result helpers, report fixtures, and a recording log.
// ============================================================================
//! ## Overview
//! Shared test helpers for management function integration tests.

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
    dead_code,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::Mutex;

use qocim_core::ContextObservation;
use qocim_core::ContextReport;
use qocim_core::IndicatorId;
use qocim_core::MetricDefinition;
use qocim_core::MetricUnit;
use qocim_core::QocIndicator;
use qocim_functions::FunctionEvent;
use qocim_functions::FunctionLog;
use serde_json::json;

// ========================================================================
// Test Result Helpers
// ========================================================================

/// Standard result type used across function integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn Error>>;

/// Lightweight error type for test assertions.
#[derive(Debug)]
struct TestError {
    /// Human-readable failure message.
    message: String,
}

impl fmt::Display for TestError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl Error for TestError {}

/// Returns an error when a test condition fails.
///
/// # Errors
/// Returns a `TestError` when the condition is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition {
        Ok(())
    } else {
        Err(Box::new(TestError {
            message: message.into(),
        }))
    }
}

// ========================================================================
// Fixtures
// ========================================================================

/// Builds a parameter map from key/value pairs.
pub fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect()
}

/// Builds a single-observation report carrying the indicators.
pub fn report_with(indicators: Vec<QocIndicator>) -> ContextReport {
    let observation = indicators
        .into_iter()
        .fold(ContextObservation::new("obs-1", json!(21.5)), ContextObservation::with_indicator);
    ContextReport::new("report-1").with_observation(observation)
}

/// Builds a custom-family indicator with a numeric value.
///
/// Ordinal 7 keeps the definition clear of every built-in identifier.
pub fn custom(indicator_id: u32, value: u32) -> QocIndicator {
    let definition = MetricDefinition::custom(IndicatorId::new(indicator_id), 7, MetricUnit::Perthousand)
        .expect("ordinal 7 is never built in");
    QocIndicator::new(definition, value.to_string(), value)
}

/// Returns the indicator families of the first observation.
pub fn families(report: &ContextReport) -> Vec<IndicatorId> {
    report.observations.first().map(ContextObservation::indicator_ids).unwrap_or_default()
}

// ========================================================================
// Recording Log
// ========================================================================

/// Event sink collecting events in memory.
#[derive(Default)]
pub struct RecordingLog {
    /// Recorded events in order.
    events: Mutex<Vec<FunctionEvent>>,
}

impl RecordingLog {
    /// Returns a snapshot of the recorded events.
    pub fn events(&self) -> Vec<FunctionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl FunctionLog for RecordingLog {
    fn record(&self, event: FunctionEvent) {
        self.events.lock().unwrap().push(event);
    }
}
