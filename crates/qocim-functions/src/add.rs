// crates/qocim-functions/src/add.rs
// ============================================================================
// Module: Add Indicator Function
// Description: Attaches an indicator to observations lacking its definition.
// Purpose: Stamp known QoC metadata onto context produced without it.
// Dependencies: qocim-core, serde_json
// ============================================================================

//! ## Overview
//! [`AddQocIndicator`] is configured with a built-in metric definition, a
//! metric value identifier, and a value inside the definition's bounds. It
//! appends that indicator to every observation that does not already carry
//! the definition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use qocim_core::ContextReport;
use qocim_core::MetricDefinition;
use qocim_core::MetricValueId;
use qocim_core::QocIndicator;
use serde_json::Number;

use crate::error::FunctionError;
use crate::function::FunctionCore;
use crate::function::FunctionState;
use crate::function::Parameters;
use crate::function::QOC_METRIC_DEFINITION_ID;
use crate::function::QOC_METRIC_VALUE;
use crate::function::QOC_METRIC_VALUE_ID;
use crate::function::QocManagementFunction;
use crate::function::invalid;
use crate::function::required;
use crate::log::FunctionLog;
use crate::log::NoopFunctionLog;

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Registry name of [`AddQocIndicator`].
pub const ADD_QOC_INDICATOR: &str = "add_qoc_indicator";

/// Validated add-indicator parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddParameters {
    /// Built-in definition of the new indicator.
    pub definition: MetricDefinition,
    /// Metric value identifier of the new indicator.
    pub metric_value_id: MetricValueId,
    /// Value within the definition's bounds.
    pub value: Number,
}

impl AddParameters {
    /// Parses and validates the parameter map.
    fn parse(parameters: &Parameters) -> Result<Self, FunctionError> {
        let definition_id = required(ADD_QOC_INDICATOR, parameters, QOC_METRIC_DEFINITION_ID)?;
        let definition = MetricDefinition::builtin(definition_id).ok_or_else(|| {
            invalid(
                ADD_QOC_INDICATOR,
                QOC_METRIC_DEFINITION_ID,
                definition_id,
                "not a built-in metric definition",
            )
        })?;
        let metric_value_id = required(ADD_QOC_INDICATOR, parameters, QOC_METRIC_VALUE_ID)?;
        let raw_value = required(ADD_QOC_INDICATOR, parameters, QOC_METRIC_VALUE)?;
        let value = Number::from_str(raw_value).map_err(|err| {
            invalid(ADD_QOC_INDICATOR, QOC_METRIC_VALUE, raw_value, err.to_string())
        })?;
        if !definition.accepts(&value) {
            return Err(invalid(
                ADD_QOC_INDICATOR,
                QOC_METRIC_VALUE,
                raw_value,
                format!("outside the bounds of definition {}", definition.definition_id()),
            ));
        }
        Ok(Self {
            definition,
            metric_value_id: MetricValueId::new(metric_value_id),
            value,
        })
    }
}

// ============================================================================
// SECTION: Function
// ============================================================================

/// Appends an indicator to every observation that lacks its definition.
#[derive(Debug)]
pub struct AddQocIndicator {
    /// Shared configuration state.
    core: FunctionCore<AddParameters>,
}

impl AddQocIndicator {
    /// Creates an unconfigured function that discards events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_log(Arc::new(NoopFunctionLog))
    }

    /// Creates an unconfigured function reporting to `log`.
    #[must_use]
    pub fn with_log(log: Arc<dyn FunctionLog>) -> Self {
        Self {
            core: FunctionCore::new(ADD_QOC_INDICATOR, log),
        }
    }
}

impl Default for AddQocIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl QocManagementFunction for AddQocIndicator {
    fn name(&self) -> &'static str {
        ADD_QOC_INDICATOR
    }

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<(), FunctionError> {
        self.core.configure_with(parameters, AddParameters::parse)
    }

    fn parameters(&self) -> Parameters {
        match self.core.state() {
            FunctionState::Configured(parameters) => BTreeMap::from([
                (QOC_METRIC_DEFINITION_ID.to_string(), parameters.definition.definition_id()),
                (QOC_METRIC_VALUE_ID.to_string(), parameters.metric_value_id.to_string()),
                (QOC_METRIC_VALUE.to_string(), parameters.value.to_string()),
            ]),
            FunctionState::Unconfigured => BTreeMap::new(),
        }
    }

    fn is_configured(&self) -> bool {
        self.core.state().is_configured()
    }

    fn execute<'r>(&self, report: &'r mut ContextReport) -> &'r mut ContextReport {
        self.core.execute(report, |parameters, observation| {
            if observation
                .indicators
                .iter()
                .any(|indicator| indicator.definition() == parameters.definition)
            {
                return false;
            }
            observation.indicators.push(QocIndicator::new(
                parameters.definition,
                parameters.metric_value_id.clone(),
                parameters.value.clone(),
            ));
            true
        })
    }
}
