// crates/qocim-routing-filter/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Shared result helpers and fixtures for routing filter integration tests.
// ============================================================================
//! ## Overview
//! Shared test helpers for Result-based assertions and indicator fixtures.

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

use std::error::Error;
use std::fmt;

use qocim_core::MetricDefinition;
use qocim_core::QocIndicator;

// ========================================================================
// Test Result Helpers
// ========================================================================

/// Standard result type used across routing filter integration tests.
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

/// Builds a percent-precision indicator.
pub fn percent_precision(value: u32) -> QocIndicator {
    QocIndicator::new(MetricDefinition::PercentPrecision, "0", value)
}

/// Builds a per-thousand-precision indicator.
pub fn perthousand_precision(value: u32) -> QocIndicator {
    QocIndicator::new(MetricDefinition::PerthousandPrecision, "0", value)
}

/// Builds a freshness indicator measured in seconds.
pub fn freshness(seconds: u32) -> QocIndicator {
    QocIndicator::new(MetricDefinition::Freshness, "0", seconds)
}

/// Builds a presence constraint for a definition at its default threshold.
pub fn presence(definition: MetricDefinition) -> qocim_core::QocConstraint {
    let indicator = QocIndicator::with_default(definition, "0")
        .unwrap_or_else(|| QocIndicator::new(definition, "0", 0_u32));
    qocim_core::QocConstraint::for_indicator(indicator)
}
