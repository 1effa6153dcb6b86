// crates/qocim-core/src/runtime/mod.rs
// ============================================================================
// Module: QoCIM Runtime
// Description: Operator matching and aggregation over QoC metadata.
// Purpose: Evaluate criteria and reduce information lists deterministically.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Runtime helpers shared by the routing filter and the QoC management
//! functions: the operator matcher and the aggregation operators.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregation;
pub mod matcher;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregation::AggregationError;
pub use aggregation::AggregationOperator;
pub use aggregation::AggregationRegistry;
pub use aggregation::SelectionOperator;
pub use matcher::MatchError;
pub use matcher::Operand;
pub use matcher::match_operator;
pub use matcher::match_tagged;
pub use matcher::matches;
