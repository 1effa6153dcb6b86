// crates/qocim-core/src/core/indicator.rs
// ============================================================================
// Module: QoCIM Indicators
// Description: QoC indicators attached to context observations.
// Purpose: Pair an immutable indicator identity with a replaceable metric value.
// Dependencies: crate::core::{identifiers, metric}, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`QocIndicator`] carries one metric value produced under a
//! [`MetricDefinition`]. The indicator identity is derived from the definition
//! at construction and never changes; the value may be replaced.
//! Deserialized indicators are checked against the same invariants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de;
use serde_json::Number;
use thiserror::Error;

use crate::core::identifiers::IndicatorId;
use crate::core::identifiers::MetricValueId;
use crate::core::metric::MetricDefinition;
use crate::core::metric::MetricUnit;
use crate::core::metric::MetricValue;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Invariant violations found in a decoded indicator.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    /// Indicator identifier disagrees with the definition's family.
    #[error("indicator id {found} does not match definition {definition} (expected {expected})")]
    IndicatorIdMismatch {
        /// Definition identifier.
        definition: String,
        /// Family identifier the definition requires.
        expected: IndicatorId,
        /// Identifier carried by the indicator.
        found: IndicatorId,
    },
    /// Value unit disagrees with the definition's unit.
    #[error("value unit {found} does not match definition {definition} (expected {expected})")]
    UnitMismatch {
        /// Definition identifier.
        definition: String,
        /// Unit the definition requires.
        expected: MetricUnit,
        /// Unit carried by the value.
        found: MetricUnit,
    },
    /// Custom definition reuses a built-in definition identifier.
    #[error("custom definition {0} shadows a built-in definition")]
    ShadowedDefinition(String),
}

// ============================================================================
// SECTION: Indicator
// ============================================================================

/// QoC indicator with its metric value.
///
/// # Invariants
/// - `indicator_id` equals `definition.indicator_id()` and is immutable.
/// - `value.unit` equals `definition.unit()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QocIndicator {
    /// Indicator family identifier.
    indicator_id: IndicatorId,
    /// Metric definition the value was produced under.
    definition: MetricDefinition,
    /// Caller-assigned metric value identifier.
    metric_value_id: MetricValueId,
    /// Metric value.
    value: MetricValue,
}

impl QocIndicator {
    /// Creates an indicator for the given definition.
    #[must_use]
    pub fn new(
        definition: MetricDefinition,
        metric_value_id: impl Into<MetricValueId>,
        value: impl Into<Number>,
    ) -> Self {
        Self {
            indicator_id: definition.indicator_id(),
            definition,
            metric_value_id: metric_value_id.into(),
            value: definition.value(value.into()),
        }
    }

    /// Creates an indicator holding the definition's default value.
    ///
    /// Returns `None` for definitions without a default.
    #[must_use]
    pub fn with_default(
        definition: MetricDefinition,
        metric_value_id: impl Into<MetricValueId>,
    ) -> Option<Self> {
        let value = definition.default_value()?;
        Some(Self::new(definition, metric_value_id, value))
    }

    /// Returns the indicator family identifier.
    #[must_use]
    pub const fn indicator_id(&self) -> IndicatorId {
        self.indicator_id
    }

    /// Returns the metric definition.
    #[must_use]
    pub const fn definition(&self) -> MetricDefinition {
        self.definition
    }

    /// Returns the metric value identifier.
    #[must_use]
    pub const fn metric_value_id(&self) -> &MetricValueId {
        &self.metric_value_id
    }

    /// Returns the metric value.
    #[must_use]
    pub const fn metric_value(&self) -> &MetricValue {
        &self.value
    }

    /// Replaces the metric value, keeping the definition's unit.
    pub fn set_value(&mut self, value: impl Into<Number>) {
        self.value = self.definition.value(value.into());
    }

    /// Checks the identity and unit invariants.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError`] for the first invariant that does not hold.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let definition = self.definition;
        if definition.shadows_builtin() {
            return Err(IndicatorError::ShadowedDefinition(definition.definition_id()));
        }
        if self.indicator_id != definition.indicator_id() {
            return Err(IndicatorError::IndicatorIdMismatch {
                definition: definition.definition_id(),
                expected: definition.indicator_id(),
                found: self.indicator_id,
            });
        }
        if self.value.unit != definition.unit() {
            return Err(IndicatorError::UnitMismatch {
                definition: definition.definition_id(),
                expected: definition.unit(),
                found: self.value.unit,
            });
        }
        Ok(())
    }
}

/// Wire form of [`QocIndicator`] before invariant checks.
#[derive(Deserialize)]
struct QocIndicatorRaw {
    /// Indicator family identifier.
    indicator_id: IndicatorId,
    /// Metric definition.
    definition: MetricDefinition,
    /// Metric value identifier.
    metric_value_id: MetricValueId,
    /// Metric value.
    value: MetricValue,
}

impl<'de> Deserialize<'de> for QocIndicator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = QocIndicatorRaw::deserialize(deserializer)?;
        let indicator = Self {
            indicator_id: raw.indicator_id,
            definition: raw.definition,
            metric_value_id: raw.metric_value_id,
            value: raw.value,
        };
        indicator.validate().map_err(<D::Error as de::Error>::custom)?;
        Ok(indicator)
    }
}

// ============================================================================
// SECTION: Metadata Lookups
// ============================================================================

/// Returns the first indicator with the given family identifier.
#[must_use]
pub fn search_first_indicator(
    indicators: &[QocIndicator],
    indicator_id: IndicatorId,
) -> Option<&QocIndicator> {
    indicators.iter().find(|indicator| indicator.indicator_id == indicator_id)
}

/// Returns the position of the first indicator with the given family identifier.
#[must_use]
pub fn position_of_indicator(indicators: &[QocIndicator], indicator_id: IndicatorId) -> Option<usize> {
    indicators.iter().position(|indicator| indicator.indicator_id == indicator_id)
}

/// Returns the first indicator produced under the given definition identifier.
#[must_use]
pub fn search_first_definition<'a>(
    indicators: &'a [QocIndicator],
    definition_id: &str,
) -> Option<&'a QocIndicator> {
    indicators.iter().find(|indicator| indicator.definition.definition_id() == definition_id)
}
