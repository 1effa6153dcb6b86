// crates/qocim-routing-filter/src/lib.rs
// ============================================================================
// Module: QoCIM Routing Filter Library
// Description: Public API surface for routing filter compilation.
// Purpose: Compile QoC constraints into predicates for a pub/sub transport.
// Dependencies: crate::{artifact, compiler, config, error, generator, runtime}
// ============================================================================

//! ## Overview
//! Routing filters let a publish/subscribe bus decide whether a context
//! report should reach a subscriber, based on the QoC metadata it carries.
//! Constraints compile into a small statement-only predicate language; the
//! bundled [`FilterRuntime`] evaluates that language in-process.
//!
//! ```
//! use qocim_core::MetricDefinition;
//! use qocim_core::QocConstraint;
//! use qocim_core::QocIndicator;
//! use qocim_routing_filter::FilterRuntime;
//! use qocim_routing_filter::compile;
//!
//! let constraint = QocConstraint::for_indicator(
//!     QocIndicator::with_default(MetricDefinition::PercentPrecision, "0").unwrap(),
//! );
//! let filter = compile(&[constraint]).unwrap();
//! let indicators = [QocIndicator::new(MetricDefinition::PercentPrecision, "m", 80_u32)];
//! assert!(FilterRuntime::new().evaluate(&filter, &indicators).unwrap());
//! ```

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifact;
pub mod compiler;
pub mod config;
pub mod error;
pub mod generator;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use artifact::FilterArtifact;
pub use compiler::RoutingFilterCompiler;
pub use compiler::compile;
pub use config::ConfigError;
pub use config::MissingPolicy;
pub use config::RoutingFilterConfig;
pub use error::RoutingFilterError;
pub use generator::GeneratorChain;
pub use runtime::FilterProgram;
pub use runtime::FilterRuntime;
pub use runtime::RuntimeError;
