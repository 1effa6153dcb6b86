// crates/qocim-functions/src/error.rs
// ============================================================================
// Module: Function Errors
// Description: Validation and lookup errors for QoC management functions.
// Purpose: Report rejected parameters and unknown registry names.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`FunctionError`] covers parameter validation and registry lookups.
//! Execution itself never fails: a function that cannot run records a
//! skipped event instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while configuring or creating management functions.
///
/// # Invariants
/// - Validation variants never escape `execute`; they are recorded as events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    /// A required parameter is absent or blank.
    #[error("{function}: missing parameter `{parameter}`")]
    MissingParameter {
        /// Function name.
        function: &'static str,
        /// Parameter key.
        parameter: &'static str,
    },
    /// A parameter value failed validation.
    #[error("{function}: invalid parameter `{parameter}` = `{value}`: {reason}")]
    InvalidParameter {
        /// Function name.
        function: &'static str,
        /// Parameter key.
        parameter: &'static str,
        /// Rejected value.
        value: String,
        /// Rejection reason.
        reason: String,
    },
    /// No function is registered under the name.
    #[error("unknown management function `{0}`")]
    UnknownFunction(String),
    /// A function is already registered under the name.
    #[error("management function `{0}` is already registered")]
    DuplicateFunction(String),
}
