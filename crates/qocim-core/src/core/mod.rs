// crates/qocim-core/src/core/mod.rs
// ============================================================================
// Module: QoCIM Core Types
// Description: Indicators, metric definitions, operators, constraints, and criteria.
// Purpose: Provide the typed QoC model shared by every QoCIM crate.
// Dependencies: bigdecimal, serde, serde_json, smallvec
// ============================================================================

//! ## Overview
//! Core types describe QoC metadata as it travels with context observations:
//! indicator families, the metric definitions values are produced under,
//! the operators used to compare them, and the constraints and criteria a
//! consumer declares.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod constraint;
pub mod context;
pub mod criterion;
pub mod hashing;
pub mod identifiers;
pub mod indicator;
pub mod metric;
pub mod operator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use constraint::QocConstraint;
pub use constraint::constraint_list_digest;
pub use context::ContextObservation;
pub use context::ContextReport;
pub use context::Information;
pub use criterion::Combinator;
pub use criterion::CompositeCriterion;
pub use criterion::CriterionArena;
pub use criterion::CriterionError;
pub use criterion::CriterionIndex;
pub use criterion::CriterionNode;
pub use criterion::PrimitiveCriterion;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::CriterionId;
pub use identifiers::IndicatorId;
pub use identifiers::MetricValueId;
pub use indicator::IndicatorError;
pub use indicator::QocIndicator;
pub use metric::BUILTIN_DEFINITIONS;
pub use metric::Description;
pub use metric::Dimension;
pub use metric::MetricDefinition;
pub use metric::MetricDefinitionError;
pub use metric::MetricUnit;
pub use metric::MetricValue;
pub use operator::ALL_OPERATORS;
pub use operator::QocOperator;
pub use operator::UnknownOperator;
