// crates/qocim-functions/src/remove.rs
// ============================================================================
// Module: Remove Indicator Function
// Description: Removes one indicator family from every observation.
// Purpose: Strip QoC metadata a subscriber must not see.
// Dependencies: qocim-core
// ============================================================================

//! ## Overview
//! [`RemoveQocIndicator`] is configured with one indicator family identifier
//! and drops the first indicator of that family from each observation of a
//! report. Observations without the family are left alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use qocim_core::ContextReport;
use qocim_core::IndicatorId;
use qocim_core::indicator::position_of_indicator;

use crate::error::FunctionError;
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

/// Registry name of [`RemoveQocIndicator`].
pub const REMOVE_QOC_INDICATOR: &str = "remove_qoc_indicator";

/// Removes the first indicator of a family from every observation.
///
/// Repeated execution with the same identifier is idempotent once no
/// observation carries the family any more.
#[derive(Debug)]
pub struct RemoveQocIndicator {
    /// Shared configuration state.
    core: FunctionCore<IndicatorId>,
}

impl RemoveQocIndicator {
    /// Creates an unconfigured function that discards events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_log(Arc::new(NoopFunctionLog))
    }

    /// Creates an unconfigured function reporting to `log`.
    #[must_use]
    pub fn with_log(log: Arc<dyn FunctionLog>) -> Self {
        Self {
            core: FunctionCore::new(REMOVE_QOC_INDICATOR, log),
        }
    }

    /// Returns the configured indicator family, if any.
    #[must_use]
    pub const fn indicator_id(&self) -> Option<IndicatorId> {
        match self.core.state() {
            FunctionState::Configured(id) => Some(*id),
            FunctionState::Unconfigured => None,
        }
    }
}

impl Default for RemoveQocIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl QocManagementFunction for RemoveQocIndicator {
    fn name(&self) -> &'static str {
        REMOVE_QOC_INDICATOR
    }

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<(), FunctionError> {
        self.core.configure_with(parameters, |parameters| {
            let raw = required(REMOVE_QOC_INDICATOR, parameters, QOC_INDICATOR_ID)?;
            raw.parse::<IndicatorId>().map_err(|err| {
                invalid(REMOVE_QOC_INDICATOR, QOC_INDICATOR_ID, raw, err.to_string())
            })
        })
    }

    fn parameters(&self) -> Parameters {
        self.indicator_id().map_or_else(BTreeMap::new, |id| {
            BTreeMap::from([(QOC_INDICATOR_ID.to_string(), id.to_string())])
        })
    }

    fn is_configured(&self) -> bool {
        self.core.state().is_configured()
    }

    fn execute<'r>(&self, report: &'r mut ContextReport) -> &'r mut ContextReport {
        self.core.execute(report, |indicator_id, observation| {
            position_of_indicator(&observation.indicators, *indicator_id)
                .map(|position| observation.indicators.remove(position))
                .is_some()
        })
    }
}
