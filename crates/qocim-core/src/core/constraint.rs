// crates/qocim-core/src/core/constraint.rs
// ============================================================================
// Module: QoCIM Metadata Constraints
// Description: Constraints pairing a threshold indicator with a criterion.
// Purpose: Provide the compiler input unit for routing filters.
// Dependencies: crate::core::{hashing, identifiers, indicator, metric, operator}, serde
// ============================================================================

//! ## Overview
//! A [`QocConstraint`] states that a context report must carry a QoC indicator
//! of some family, optionally compared against the threshold carried by the
//! constraint's indicator. Constraint lists are compiled in input order, so
//! the canonical digest of a list is order-sensitive as well.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::CriterionId;
use crate::core::indicator::QocIndicator;
use crate::core::metric::MetricDefinition;
use crate::core::metric::MetricValue;
use crate::core::operator::QocOperator;

// ============================================================================
// SECTION: Constraints
// ============================================================================

/// QoC metadata constraint.
///
/// # Invariants
/// - `indicator` carries the threshold; its metric value identifier is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QocConstraint {
    /// Criterion constrained by this metadata.
    pub criterion_id: CriterionId,
    /// Indicator carrying the threshold value.
    pub indicator: QocIndicator,
    /// Comparison operator (presence by default).
    #[serde(default = "default_operator")]
    pub operator: QocOperator,
}

/// Default operator for constraints without an explicit operator.
const fn default_operator() -> QocOperator {
    QocOperator::Exists
}

impl QocConstraint {
    /// Creates a presence constraint for the given criterion.
    #[must_use]
    pub fn new(criterion_id: impl Into<CriterionId>, indicator: QocIndicator) -> Self {
        Self {
            criterion_id: criterion_id.into(),
            indicator,
            operator: QocOperator::Exists,
        }
    }

    /// Creates a presence constraint whose criterion is named after the indicator
    /// family (`[<indicator_id>]`).
    #[must_use]
    pub fn for_indicator(indicator: QocIndicator) -> Self {
        let criterion_id = format!("[{}]", indicator.indicator_id());
        Self::new(criterion_id, indicator)
    }

    /// Returns the constraint with the given operator.
    #[must_use]
    pub fn with_operator(mut self, operator: QocOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Returns the metric definition (family) this constraint applies to.
    #[must_use]
    pub const fn definition(&self) -> MetricDefinition {
        self.indicator.definition()
    }

    /// Returns the threshold value.
    #[must_use]
    pub const fn threshold(&self) -> &MetricValue {
        self.indicator.metric_value()
    }
}

/// Computes the canonical digest of an ordered constraint list.
///
/// # Errors
///
/// Returns [`HashError`] when canonical serialization fails.
pub fn constraint_list_digest(constraints: &[QocConstraint]) -> Result<HashDigest, HashError> {
    hash_canonical_json(HashAlgorithm::Sha256, constraints)
}
