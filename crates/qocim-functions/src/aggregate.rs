// crates/qocim-functions/src/aggregate.rs
// ============================================================================
// Module: Aggregate Indicator Function
// Description: Reduces an indicator family to the one an operator selects.
// Purpose: Collapse redundant QoC metadata before delivery.
// Dependencies: qocim-core
// ============================================================================

//! ## Overview
//! For every observation the indicators of one family are turned into
//! normalized [`Information`] values and handed to an aggregation operator.
//! The selected indicator stays in place; the rest of the family is removed.
//! Observations with fewer than two indicators of the family, or with no
//! numeric candidate, are left untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use qocim_core::AggregationOperator;
use qocim_core::AggregationRegistry;
use qocim_core::ContextObservation;
use qocim_core::ContextReport;
use qocim_core::IndicatorId;
use qocim_core::Information;

use crate::error::FunctionError;
use crate::function::AGGREGATION_OPERATOR;
use crate::function::FunctionCore;
use crate::function::FunctionState;
use crate::function::Parameters;
use crate::function::QOC_INDICATOR_ID;
use crate::function::QocManagementFunction;
use crate::function::invalid;
use crate::function::required;
use crate::log::FunctionLog;
use crate::log::NoopFunctionLog;

// ============================================================================
// SECTION: Function
// ============================================================================

/// Registry name of [`AggregateQocIndicator`].
pub const AGGREGATE_QOC_INDICATOR: &str = "aggregate_qoc_indicator";

/// Validated aggregate-indicator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateParameters {
    /// Indicator family to reduce.
    pub indicator_id: IndicatorId,
    /// Registered operator name.
    pub operator: &'static str,
}

/// Reduces one indicator family per observation with an aggregation operator.
#[derive(Debug)]
pub struct AggregateQocIndicator {
    /// Shared configuration state.
    core: FunctionCore<AggregateParameters>,
    /// Operators available to the function.
    registry: Arc<AggregationRegistry>,
}

impl AggregateQocIndicator {
    /// Creates an unconfigured function over the built-in operators.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(
            Arc::new(AggregationRegistry::with_builtin_operators()),
            Arc::new(NoopFunctionLog),
        )
    }

    /// Creates an unconfigured function over `registry` reporting to `log`.
    #[must_use]
    pub fn with_registry(registry: Arc<AggregationRegistry>, log: Arc<dyn FunctionLog>) -> Self {
        Self {
            core: FunctionCore::new(AGGREGATE_QOC_INDICATOR, log),
            registry,
        }
    }

    /// Parses parameters against the registry.
    fn parse(&self, parameters: &Parameters) -> Result<AggregateParameters, FunctionError> {
        let raw_id = required(AGGREGATE_QOC_INDICATOR, parameters, QOC_INDICATOR_ID)?;
        let indicator_id = raw_id.parse::<IndicatorId>().map_err(|err| {
            invalid(AGGREGATE_QOC_INDICATOR, QOC_INDICATOR_ID, raw_id, err.to_string())
        })?;
        let raw_operator = required(AGGREGATE_QOC_INDICATOR, parameters, AGGREGATION_OPERATOR)?;
        let operator = self.registry.get(raw_operator).map_err(|err| {
            invalid(AGGREGATE_QOC_INDICATOR, AGGREGATION_OPERATOR, raw_operator, err.to_string())
        })?;
        Ok(AggregateParameters {
            indicator_id,
            operator: operator.name(),
        })
    }
}

impl Default for AggregateQocIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl QocManagementFunction for AggregateQocIndicator {
    fn name(&self) -> &'static str {
        AGGREGATE_QOC_INDICATOR
    }

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<(), FunctionError> {
        let parsed = self.parse(parameters);
        self.core.configure_with(parameters, |_| parsed)
    }

    fn parameters(&self) -> Parameters {
        match self.core.state() {
            FunctionState::Configured(parameters) => BTreeMap::from([
                (QOC_INDICATOR_ID.to_string(), parameters.indicator_id.to_string()),
                (AGGREGATION_OPERATOR.to_string(), parameters.operator.to_string()),
            ]),
            FunctionState::Unconfigured => BTreeMap::new(),
        }
    }

    fn is_configured(&self) -> bool {
        self.core.state().is_configured()
    }

    fn execute<'r>(&self, report: &'r mut ContextReport) -> &'r mut ContextReport {
        if let FunctionState::Configured(parameters) = self.core.state()
            && self.registry.get(parameters.operator).is_err()
        {
            self.core.skip(report, "aggregation operator is no longer registered");
            return report;
        }
        self.core.execute(report, |parameters, observation| {
            self.registry.get(parameters.operator).is_ok_and(|operator| {
                reduce_family(operator, parameters.indicator_id, observation)
            })
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Keeps only the selected indicator of the family; returns true on change.
fn reduce_family(
    operator: &dyn AggregationOperator,
    indicator_id: IndicatorId,
    observation: &mut ContextObservation,
) -> bool {
    let candidates: Vec<Information> = observation
        .indicators
        .iter()
        .filter(|indicator| indicator.indicator_id() == indicator_id)
        .map(Information::from_indicator)
        .collect();
    if candidates.len() < 2 {
        return false;
    }
    let Some(selected) = operator.aggregate(&candidates) else {
        return false;
    };
    let Some(keep) = candidates.iter().position(|candidate| std::ptr::eq(candidate, selected))
    else {
        return false;
    };
    let mut family_position = 0_usize;
    observation.indicators.retain(|indicator| {
        if indicator.indicator_id() != indicator_id {
            return true;
        }
        let retained = family_position == keep;
        family_position += 1;
        retained
    });
    true
}
