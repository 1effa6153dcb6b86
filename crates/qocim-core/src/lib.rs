// crates/qocim-core/src/lib.rs
// ============================================================================
// Module: QoCIM Core Library
// Description: Public API surface for the QoCIM core model.
// Purpose: Expose QoC metadata types, the operator matcher, and aggregation.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! QoCIM core models quality-of-context (QoC) metadata attached to context
//! observations. It provides the typed indicator model, unit-aware operator
//! matching, criterion trees, and selection aggregation. Routing filter
//! generation and management functions build on these types in their own
//! crates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod runtime;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use runtime::AggregationError;
pub use runtime::AggregationOperator;
pub use runtime::AggregationRegistry;
pub use runtime::MatchError;
pub use runtime::Operand;
pub use runtime::SelectionOperator;
pub use runtime::match_operator;
pub use runtime::match_tagged;
pub use runtime::matches;
