// crates/qocim-core/src/core/metric.rs
// ============================================================================
// Module: QoCIM Metric Model
// Description: Metric units, metric values, and built-in metric definitions.
// Purpose: Provide the per-family capability set (identity, defaults, compare).
// Dependencies: bigdecimal, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A QoC metric value is a decimal number tagged with the [`MetricUnit`] it was
//! measured in. Units belong to a [`Dimension`]; values of one dimension are
//! normalized to the dimension's base scale before comparison, so a percentage
//! and a per-thousand value compare on the same scale. Values of different
//! dimensions never compare.
//!
//! [`MetricDefinition`] is the closed set of indicator families known to the
//! middleware. Each definition exposes its indicator identity, stable
//! definition identifier, unit, bounds, and an informal description.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use thiserror::Error;

use crate::core::identifiers::IndicatorId;

// ============================================================================
// SECTION: Units
// ============================================================================

/// Physical dimension shared by compatible units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Elapsed time (base scale: milliseconds).
    Time,
    /// Ratio of a whole (base scale: per-thousand).
    Ratio,
    /// Dimensionless scalar.
    Scalar,
}

/// Unit a metric value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    /// Seconds.
    Second,
    /// Milliseconds.
    Millisecond,
    /// Percent (1/100).
    Percent,
    /// Per-thousand (1/1000).
    Perthousand,
    /// Dimensionless scalar.
    Scalar,
}

impl MetricUnit {
    /// Returns the dimension this unit measures.
    #[must_use]
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Second | Self::Millisecond => Dimension::Time,
            Self::Percent | Self::Perthousand => Dimension::Ratio,
            Self::Scalar => Dimension::Scalar,
        }
    }

    /// Returns the factor converting this unit to its dimension's base scale.
    const fn base_factor(self) -> u32 {
        match self {
            Self::Second => 1_000,
            Self::Percent => 10,
            Self::Millisecond | Self::Perthousand | Self::Scalar => 1,
        }
    }

    /// Returns a stable label for the unit.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Millisecond => "millisecond",
            Self::Percent => "percent",
            Self::Perthousand => "perthousand",
            Self::Scalar => "scalar",
        }
    }
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Metric Values
// ============================================================================

/// Typed metric value.
///
/// # Invariants
/// - `value` is a finite JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Unit the value is expressed in.
    pub unit: MetricUnit,
    /// Raw numeric value.
    pub value: Number,
}

impl MetricValue {
    /// Creates a metric value.
    #[must_use]
    pub const fn new(unit: MetricUnit, value: Number) -> Self {
        Self {
            unit,
            value,
        }
    }

    /// Creates a percentage value.
    #[must_use]
    pub fn percent(value: impl Into<Number>) -> Self {
        Self::new(MetricUnit::Percent, value.into())
    }

    /// Creates a per-thousand value.
    #[must_use]
    pub fn perthousand(value: impl Into<Number>) -> Self {
        Self::new(MetricUnit::Perthousand, value.into())
    }

    /// Creates a value measured in seconds.
    #[must_use]
    pub fn seconds(value: impl Into<Number>) -> Self {
        Self::new(MetricUnit::Second, value.into())
    }

    /// Returns the value normalized to its dimension's base scale.
    #[must_use]
    pub fn normalized(&self) -> Option<(Dimension, BigDecimal)> {
        let decimal = decimal_from_number(&self.value)?;
        let scaled = decimal * BigDecimal::from(self.unit.base_factor());
        Some((self.unit.dimension(), scaled))
    }

    /// Compares two values after unit normalization.
    ///
    /// Returns `None` when the dimensions differ or a value is not decimal.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        let (left_dimension, left) = self.normalized()?;
        let (right_dimension, right) = other.normalized()?;
        if left_dimension != right_dimension {
            return None;
        }
        Some(left.cmp(&right))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Parses a JSON number into `BigDecimal` with a stable string representation.
#[must_use]
pub fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    let rendered = number.to_string();
    BigDecimal::from_str(&rendered).ok()
}

// ============================================================================
// SECTION: Descriptions
// ============================================================================

/// Informal description of a criterion family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Description {
    /// Search keywords attached to the family.
    pub keywords: &'static [&'static str],
    /// Informal, human-readable description.
    pub informal: &'static str,
}

/// Description of the freshness family.
const FRESHNESS_DESCRIPTION: Description = Description {
    keywords: &["time", "measurement", "interval"],
    informal: "This is an informal description of the freshness criterion.",
};

/// Description of the precision family.
const PRECISION_DESCRIPTION: Description = Description {
    keywords: &["precision", "accuracy", "measurement"],
    informal: "This is an informal description of the precision criterion.",
};

// ============================================================================
// SECTION: Metric Definitions
// ============================================================================

/// Errors raised when declaring a metric definition.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricDefinitionError {
    /// Custom definition identifier is owned by a built-in definition.
    #[error("definition id {0} is reserved by a built-in definition")]
    ReservedDefinitionId(String),
}

/// Metric definition of a QoC indicator family.
///
/// # Invariants
/// - `definition_id` is unique per variant and stable on the wire.
/// - Built-in definitions carry fixed indicator identifiers and bounds.
/// - Custom definitions built through [`MetricDefinition::custom`] never reuse
///   a built-in definition identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricDefinition {
    /// Freshness measured in seconds since the observation.
    Freshness,
    /// Precision evaluated in percent.
    PercentPrecision,
    /// Precision evaluated in per-thousand.
    PerthousandPrecision,
    /// Caller-declared definition without bounds.
    Custom {
        /// Indicator family identifier.
        indicator_id: IndicatorId,
        /// Ordinal of the definition within its family.
        ordinal: u16,
        /// Unit of the values.
        unit: MetricUnit,
    },
}

/// Built-in metric definitions in declaration order.
pub const BUILTIN_DEFINITIONS: [MetricDefinition; 3] = [
    MetricDefinition::Freshness,
    MetricDefinition::PercentPrecision,
    MetricDefinition::PerthousandPrecision,
];

impl MetricDefinition {
    /// Declares a caller-defined definition.
    ///
    /// # Errors
    ///
    /// Returns [`MetricDefinitionError::ReservedDefinitionId`] when
    /// `<indicator_id>.<ordinal>` names a built-in definition.
    pub fn custom(
        indicator_id: IndicatorId,
        ordinal: u16,
        unit: MetricUnit,
    ) -> Result<Self, MetricDefinitionError> {
        let definition = Self::Custom {
            indicator_id,
            ordinal,
            unit,
        };
        if definition.shadows_builtin() {
            return Err(MetricDefinitionError::ReservedDefinitionId(definition.definition_id()));
        }
        Ok(definition)
    }

    /// Returns true for a custom definition reusing a built-in identifier.
    #[must_use]
    pub fn shadows_builtin(self) -> bool {
        matches!(self, Self::Custom { .. }) && Self::builtin(&self.definition_id()).is_some()
    }

    /// Returns the indicator family identifier.
    #[must_use]
    pub const fn indicator_id(self) -> IndicatorId {
        match self {
            Self::Freshness => IndicatorId::FRESHNESS,
            Self::PercentPrecision | Self::PerthousandPrecision => IndicatorId::PRECISION,
            Self::Custom {
                indicator_id,
                ..
            } => indicator_id,
        }
    }

    /// Returns the stable definition identifier (`<indicator>.<ordinal>`).
    #[must_use]
    pub fn definition_id(self) -> String {
        match self {
            Self::Freshness => "1.1".to_string(),
            Self::PercentPrecision => "10.1".to_string(),
            Self::PerthousandPrecision => "10.2".to_string(),
            Self::Custom {
                indicator_id,
                ordinal,
                ..
            } => format!("{indicator_id}.{ordinal}"),
        }
    }

    /// Resolves a built-in definition from its identifier.
    #[must_use]
    pub fn builtin(definition_id: &str) -> Option<Self> {
        BUILTIN_DEFINITIONS
            .into_iter()
            .find(|definition| definition.definition_id() == definition_id.trim())
    }

    /// Returns the unit values of this definition are expressed in.
    #[must_use]
    pub const fn unit(self) -> MetricUnit {
        match self {
            Self::Freshness => MetricUnit::Second,
            Self::PercentPrecision => MetricUnit::Percent,
            Self::PerthousandPrecision => MetricUnit::Perthousand,
            Self::Custom {
                unit,
                ..
            } => unit,
        }
    }

    /// Returns the lower bound of the definition, when bounded.
    #[must_use]
    pub fn min_value(self) -> Option<Number> {
        match self {
            Self::Freshness | Self::PercentPrecision | Self::PerthousandPrecision => {
                Some(Number::from(0_u32))
            }
            Self::Custom {
                ..
            } => None,
        }
    }

    /// Returns the upper bound of the definition, when bounded.
    #[must_use]
    pub fn max_value(self) -> Option<Number> {
        match self {
            Self::PercentPrecision => Some(Number::from(100_u32)),
            Self::PerthousandPrecision => Some(Number::from(1_000_u32)),
            Self::Freshness
            | Self::Custom {
                ..
            } => None,
        }
    }

    /// Returns the default value (the lower bound).
    #[must_use]
    pub fn default_value(self) -> Option<Number> {
        self.min_value()
    }

    /// Returns true when `value` lies within the definition's bounds.
    #[must_use]
    pub fn accepts(self, value: &Number) -> bool {
        let Some(value) = decimal_from_number(value) else {
            return false;
        };
        let above_min = self
            .min_value()
            .and_then(|min| decimal_from_number(&min))
            .is_none_or(|min| value >= min);
        let below_max = self
            .max_value()
            .and_then(|max| decimal_from_number(&max))
            .is_none_or(|max| value <= max);
        above_min && below_max
    }

    /// Wraps a raw number into a metric value of this definition's unit.
    #[must_use]
    pub const fn value(self, value: Number) -> MetricValue {
        MetricValue::new(self.unit(), value)
    }

    /// Returns the informal description of the family, when known.
    #[must_use]
    pub const fn description(self) -> Option<Description> {
        match self {
            Self::Freshness => Some(FRESHNESS_DESCRIPTION),
            Self::PercentPrecision | Self::PerthousandPrecision => Some(PRECISION_DESCRIPTION),
            Self::Custom {
                ..
            } => None,
        }
    }
}

impl fmt::Display for MetricDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition_id())
    }
}
