// crates/qocim-functions/src/function.rs
// ============================================================================
// Module: Management Function Contract
// Description: Two-phase management function trait and shared execution core.
// Purpose: Enforce that unconfigured functions never mutate a report.
// Dependencies: qocim-core, crate::log
// ============================================================================

//! ## Overview
//! A management function is created [`FunctionState::Unconfigured`] and
//! becomes [`FunctionState::Configured`] once its parameter map validates.
//! Rejected parameters reset it to `Unconfigured`. Executing an unconfigured
//! function returns the report untouched and records a skip event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use qocim_core::ContextObservation;
use qocim_core::ContextReport;

use crate::error::FunctionError;
use crate::log::FunctionEvent;
use crate::log::FunctionLog;

// ============================================================================
// SECTION: Parameter Keys
// ============================================================================

/// Indicator family identifier parameter.
pub const QOC_INDICATOR_ID: &str = "qoc_indicator_id";
/// Metric definition identifier parameter.
pub const QOC_METRIC_DEFINITION_ID: &str = "qoc_metric_definition_id";
/// Metric value identifier parameter.
pub const QOC_METRIC_VALUE_ID: &str = "qoc_metric_value_id";
/// Metric value parameter.
pub const QOC_METRIC_VALUE: &str = "qoc_metric_value";
/// Aggregation operator name parameter.
pub const AGGREGATION_OPERATOR: &str = "aggregation_operator";

/// Parameter map accepted by management functions.
pub type Parameters = BTreeMap<String, String>;

// ============================================================================
// SECTION: Contract
// ============================================================================

/// Configuration state of a management function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionState<P> {
    /// No valid parameters have been supplied.
    Unconfigured,
    /// Parameters validated.
    Configured(P),
}

impl<P> FunctionState<P> {
    /// Returns true when configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }
}

/// QoC management function applied to context reports.
pub trait QocManagementFunction: Send + Sync {
    /// Returns the stable registry name.
    fn name(&self) -> &'static str;

    /// Validates and applies parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError`] when a parameter is missing or invalid; the
    /// function is left unconfigured.
    fn set_parameters(&mut self, parameters: &Parameters) -> Result<(), FunctionError>;

    /// Returns the current parameters, empty when unconfigured.
    fn parameters(&self) -> Parameters;

    /// Returns true when the function holds valid parameters.
    fn is_configured(&self) -> bool;

    /// Applies the function to every observation of the report.
    ///
    /// Unconfigured functions return the report unchanged.
    fn execute<'r>(&self, report: &'r mut ContextReport) -> &'r mut ContextReport;

    /// Builder form of [`QocManagementFunction::set_parameters`].
    #[must_use]
    fn configure(mut self, parameters: &Parameters) -> Self
    where
        Self: Sized,
    {
        // Rejections are recorded as events and leave the function unconfigured.
        let _ = self.set_parameters(parameters);
        self
    }
}

// ============================================================================
// SECTION: Shared Core
// ============================================================================

/// State and event sink shared by the built-in functions.
pub(crate) struct FunctionCore<P> {
    /// Function name used in events.
    name: &'static str,
    /// Configuration state.
    state: FunctionState<P>,
    /// Event sink.
    log: Arc<dyn FunctionLog>,
}

impl<P> FunctionCore<P> {
    /// Creates an unconfigured core and records its creation.
    pub(crate) fn new(name: &'static str, log: Arc<dyn FunctionLog>) -> Self {
        log.record(FunctionEvent::Created {
            function: name,
        });
        Self {
            name,
            state: FunctionState::Unconfigured,
            log,
        }
    }

    /// Returns the configuration state.
    pub(crate) const fn state(&self) -> &FunctionState<P> {
        &self.state
    }

    /// Parses parameters and transitions the state accordingly.
    pub(crate) fn configure_with(
        &mut self,
        parameters: &Parameters,
        parse: impl FnOnce(&Parameters) -> Result<P, FunctionError>,
    ) -> Result<(), FunctionError> {
        match parse(parameters) {
            Ok(parsed) => {
                self.state = FunctionState::Configured(parsed);
                self.log.record(FunctionEvent::Configured {
                    function: self.name,
                    parameters: parameters.clone(),
                });
                Ok(())
            }
            Err(err) => {
                self.state = FunctionState::Unconfigured;
                self.log.record(FunctionEvent::ConfigurationRejected {
                    function: self.name,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Runs `apply` over every observation when configured.
    ///
    /// `apply` returns true when it changed the observation.
    pub(crate) fn execute<'r>(
        &self,
        report: &'r mut ContextReport,
        mut apply: impl FnMut(&P, &mut ContextObservation) -> bool,
    ) -> &'r mut ContextReport {
        let FunctionState::Configured(parameters) = &self.state else {
            self.skip(report, "function is not configured");
            return report;
        };
        self.log.record(FunctionEvent::ExecutionBegun {
            function: self.name,
            report_id: report.id.clone(),
        });
        let mut mutated = 0_usize;
        for observation in &mut report.observations {
            if apply(parameters, observation) {
                mutated += 1;
            }
        }
        self.log.record(FunctionEvent::ExecutionFinished {
            function: self.name,
            report_id: report.id.clone(),
            mutated_observations: mutated,
        });
        report
    }

    /// Records a skipped execution.
    pub(crate) fn skip(&self, report: &ContextReport, reason: &str) {
        self.log.record(FunctionEvent::ExecutionSkipped {
            function: self.name,
            report_id: report.id.clone(),
            reason: reason.to_string(),
        });
    }
}

impl<P: fmt::Debug> fmt::Debug for FunctionCore<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCore")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Parameter Helpers
// ============================================================================

/// Returns the trimmed value of a required parameter.
pub(crate) fn required<'p>(
    function: &'static str,
    parameters: &'p Parameters,
    parameter: &'static str,
) -> Result<&'p str, FunctionError> {
    parameters
        .get(parameter)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or(FunctionError::MissingParameter {
            function,
            parameter,
        })
}

/// Builds an invalid-parameter error.
pub(crate) fn invalid(
    function: &'static str,
    parameter: &'static str,
    value: &str,
    reason: impl Into<String>,
) -> FunctionError {
    FunctionError::InvalidParameter {
        function,
        parameter,
        value: value.to_string(),
        reason: reason.into(),
    }
}
