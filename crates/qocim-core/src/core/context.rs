// crates/qocim-core/src/core/context.rs
// ============================================================================
// Module: QoCIM Context Model
// Description: Context reports, observations, and aggregation information.
// Purpose: Provide the payload structures mutated by QoC management functions.
// Dependencies: crate::core::{identifiers, indicator, metric}, bigdecimal, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ContextReport`] owns an ordered list of [`ContextObservation`] values;
//! each observation owns its QoC indicators. The observed datum itself is an
//! opaque JSON value. [`Information`] is the named datum consumed by
//! aggregation operators.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;

use crate::core::identifiers::IndicatorId;
use crate::core::indicator::QocIndicator;
use crate::core::metric::decimal_from_number;

// ============================================================================
// SECTION: Context Observations
// ============================================================================

/// Context observation with its QoC metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextObservation {
    /// Observation identifier.
    pub id: String,
    /// Observed datum.
    #[serde(default)]
    pub value: Value,
    /// QoC indicators describing the observation.
    #[serde(default)]
    pub indicators: Vec<QocIndicator>,
}

impl ContextObservation {
    /// Creates an observation without indicators.
    #[must_use]
    pub fn new(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            value,
            indicators: Vec::new(),
        }
    }

    /// Returns the observation with the given indicator appended.
    #[must_use]
    pub fn with_indicator(mut self, indicator: QocIndicator) -> Self {
        self.indicators.push(indicator);
        self
    }

    /// Returns the indicator identifiers in metadata order.
    #[must_use]
    pub fn indicator_ids(&self) -> Vec<IndicatorId> {
        self.indicators.iter().map(QocIndicator::indicator_id).collect()
    }
}

// ============================================================================
// SECTION: Context Reports
// ============================================================================

/// Context report carrying observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextReport {
    /// Report identifier.
    pub id: String,
    /// Observations in arrival order.
    #[serde(default)]
    pub observations: Vec<ContextObservation>,
}

impl ContextReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            observations: Vec::new(),
        }
    }

    /// Returns the report with the given observation appended.
    #[must_use]
    pub fn with_observation(mut self, observation: ContextObservation) -> Self {
        self.observations.push(observation);
        self
    }
}

// ============================================================================
// SECTION: Information
// ============================================================================

/// Named datum consumed by aggregation operators.
///
/// # Invariants
/// - When `exact` is present it is the decimal `data` was rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Information {
    /// Information name.
    pub name: String,
    /// Datum; only JSON numbers are numeric.
    pub data: Value,
    /// Full-precision decimal behind `data`, kept off the wire.
    #[serde(skip)]
    exact: Option<BigDecimal>,
}

impl Information {
    /// Creates an information value.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            exact: None,
        }
    }

    /// Builds information from an indicator, using its normalized value as data.
    ///
    /// The normalized decimal is kept at full precision for [`Self::numeric`];
    /// `data` holds its JSON rendering. Indicators whose value cannot be
    /// normalized yield non-numeric data.
    #[must_use]
    pub fn from_indicator(indicator: &QocIndicator) -> Self {
        let exact = indicator.metric_value().normalized().map(|(_, decimal)| decimal.normalized());
        let data = exact
            .as_ref()
            .and_then(|decimal| Number::from_str(&decimal.to_string()).ok())
            .map_or(Value::Null, Value::Number);
        Self {
            name: indicator.metric_value_id().as_str().to_string(),
            data,
            exact,
        }
    }

    /// Returns the datum as a decimal when it is numeric.
    #[must_use]
    pub fn numeric(&self) -> Option<BigDecimal> {
        if let Some(exact) = &self.exact {
            return Some(exact.clone());
        }
        match &self.data {
            Value::Number(number) => decimal_from_number(number),
            _ => None,
        }
    }
}
