// crates/qocim-functions/src/lib.rs
// ============================================================================
// Module: QoCIM Functions Library
// Description: QoC management functions applied to context reports.
// Purpose: Expose the function contract, built-in functions, registry, and event log.
// Dependencies: qocim-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Management functions mutate the QoC indicators of context reports before
//! delivery. Each function is configured from a string parameter map and is a
//! no-op until its parameters validate. Validation failures never escape
//! `execute`; they are recorded through a [`FunctionLog`].
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use qocim_core::ContextObservation;
//! use qocim_core::ContextReport;
//! use qocim_core::MetricDefinition;
//! use qocim_core::QocIndicator;
//! use qocim_functions::QocManagementFunction;
//! use qocim_functions::RemoveQocIndicator;
//!
//! let parameters = BTreeMap::from([("qoc_indicator_id".to_string(), "10".to_string())]);
//! let remove = RemoveQocIndicator::new().configure(&parameters);
//! let mut report = ContextReport::new("r1").with_observation(
//!     ContextObservation::new("o1", serde_json::Value::Null)
//!         .with_indicator(QocIndicator::new(MetricDefinition::PercentPrecision, "0", 80_u32)),
//! );
//! remove.execute(&mut report);
//! assert!(report.observations[0].indicators.is_empty());
//! ```

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod add;
pub mod aggregate;
pub mod error;
pub mod function;
pub mod log;
pub mod registry;
pub mod remove;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use add::AddParameters;
pub use add::AddQocIndicator;
pub use aggregate::AggregateParameters;
pub use aggregate::AggregateQocIndicator;
pub use error::FunctionError;
pub use function::FunctionState;
pub use function::Parameters;
pub use function::QocManagementFunction;
pub use log::FunctionEvent;
pub use log::FunctionLog;
pub use log::JsonLinesFunctionLog;
pub use log::LogError;
pub use log::NoopFunctionLog;
pub use registry::FunctionConstructor;
pub use registry::FunctionRegistry;
pub use remove::RemoveQocIndicator;
