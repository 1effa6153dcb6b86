// crates/qocim-core/src/runtime/matcher.rs
// ============================================================================
// Module: QoCIM Operator Matcher
// Description: Operator evaluation over metric values and metadata sets.
// Purpose: Decide unary presence tests and unit-normalized numeric comparisons.
// Dependencies: crate::core::{indicator, metric, operator}, thiserror
// ============================================================================

//! ## Overview
//! [`match_operator`] evaluates an operator against a left operand (a metric
//! value or a metadata set scoped to one metric definition) and an optional
//! right value. Binary comparisons normalize both values to their dimension's
//! base scale, so `50 %` compares as `500 ‰`. Values of different dimensions
//! fail with [`MatchError::TypeMismatch`].
//!
//! [`matches`] is the fail-safe form: every error yields `false`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;

use thiserror::Error;

use crate::core::indicator::QocIndicator;
use crate::core::metric::MetricDefinition;
use crate::core::metric::MetricUnit;
use crate::core::metric::MetricValue;
use crate::core::operator::QocOperator;
use crate::core::operator::UnknownOperator;

// ============================================================================
// SECTION: Operands
// ============================================================================

/// Left operand of a match.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// A single metric value.
    Value(&'a MetricValue),
    /// A metadata set scoped to one metric definition.
    Metadata {
        /// Indicators attached to an observation.
        indicators: &'a [QocIndicator],
        /// Metric definition under test.
        definition: MetricDefinition,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the operator matcher.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Operator tag was not recognized.
    #[error(transparent)]
    UnknownOperator(#[from] UnknownOperator),
    /// Values belong to incompatible dimensions.
    #[error("type mismatch: cannot compare {left} with {right}")]
    TypeMismatch {
        /// Unit of the left value.
        left: MetricUnit,
        /// Unit of the right value.
        right: MetricUnit,
    },
    /// Binary operator invoked without a right value.
    #[error("operator {0} requires a right operand")]
    MissingOperand(QocOperator),
}

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Evaluates `operator` against the operands.
///
/// # Errors
///
/// Returns [`MatchError::TypeMismatch`] for incompatible units and
/// [`MatchError::MissingOperand`] when a binary operator has no right value.
pub fn match_operator(
    operator: QocOperator,
    left: Operand<'_>,
    right: Option<&MetricValue>,
) -> Result<bool, MatchError> {
    match (operator, left) {
        (QocOperator::Exists, Operand::Value(_)) => Ok(true),
        (QocOperator::NotExists, Operand::Value(_)) => Ok(false),
        (
            QocOperator::Exists,
            Operand::Metadata {
                indicators,
                definition,
            },
        ) => Ok(contains_definition(indicators, definition)),
        (
            QocOperator::NotExists,
            Operand::Metadata {
                indicators,
                definition,
            },
        ) => Ok(!contains_definition(indicators, definition)),
        (_, Operand::Value(value)) => compare_values(operator, value, right),
        (
            _,
            Operand::Metadata {
                indicators,
                definition,
            },
        ) => {
            let Some(indicator) =
                indicators.iter().find(|indicator| indicator.definition() == definition)
            else {
                return Ok(false);
            };
            compare_values(operator, indicator.metric_value(), right)
        }
    }
}

/// Parses an operator tag and evaluates it.
///
/// # Errors
///
/// Returns [`MatchError::UnknownOperator`] for unrecognized tags, plus the
/// errors of [`match_operator`].
pub fn match_tagged(
    tag: &str,
    left: Operand<'_>,
    right: Option<&MetricValue>,
) -> Result<bool, MatchError> {
    let operator: QocOperator = tag.parse()?;
    match_operator(operator, left, right)
}

/// Fail-safe matching: any error yields `false`.
#[must_use]
pub fn matches(operator: QocOperator, left: Operand<'_>, right: Option<&MetricValue>) -> bool {
    match_operator(operator, left, right).unwrap_or(false)
}

/// Returns true when the metadata set carries the definition.
fn contains_definition(indicators: &[QocIndicator], definition: MetricDefinition) -> bool {
    indicators.iter().any(|indicator| indicator.definition() == definition)
}

/// Compares two metric values with a binary operator.
fn compare_values(
    operator: QocOperator,
    left: &MetricValue,
    right: Option<&MetricValue>,
) -> Result<bool, MatchError> {
    let Some(right) = right else {
        return Err(MatchError::MissingOperand(operator));
    };
    let ordering = left.compare(right).ok_or(MatchError::TypeMismatch {
        left: left.unit,
        right: right.unit,
    })?;
    Ok(ordering_satisfies(operator, ordering))
}

/// Maps an ordering onto a binary operator.
const fn ordering_satisfies(operator: QocOperator, ordering: Ordering) -> bool {
    match operator {
        QocOperator::Eq => ordering.is_eq(),
        QocOperator::Ne => ordering.is_ne(),
        QocOperator::Lt => ordering.is_lt(),
        QocOperator::Le => ordering.is_le(),
        QocOperator::Gt => ordering.is_gt(),
        QocOperator::Ge => ordering.is_ge(),
        QocOperator::Exists | QocOperator::NotExists => false,
    }
}
