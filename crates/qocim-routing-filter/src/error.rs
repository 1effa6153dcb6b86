// crates/qocim-routing-filter/src/error.rs
// ============================================================================
// Module: Routing Filter Errors
// Description: Error type raised while compiling routing filters.
// Purpose: Give callers stable, matchable compile failures.
// Dependencies: crate::config, qocim-core, thiserror
// ============================================================================

//! ## Overview
//! Every compile failure surfaces as one [`RoutingFilterError`]. Failures
//! from the core model (criterion lookups, canonical hashing) and from
//! configuration validation are wrapped rather than flattened, so callers can
//! still match on the underlying cause.

// ============================================================================
// SECTION: Imports
// ============================================================================

use qocim_core::CriterionError;
use qocim_core::CriterionId;
use qocim_core::HashError;
use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the routing filter compiler.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingFilterError {
    /// No constraint was supplied.
    #[error("constraint list is empty")]
    EmptyConstraintList,
    /// Criterion tree could not be read.
    #[error(transparent)]
    Criterion(#[from] CriterionError),
    /// Criterion has a binary operator but no usable threshold.
    #[error("criterion {0} has no threshold and its definition has no default")]
    MissingThreshold(CriterionId),
    /// Criterion tree nests deeper than the filter runtime accepts.
    #[error("criterion tree depth {depth} exceeds the compilable maximum {max_depth}")]
    CriterionTooDeep {
        /// Maximum number of nested composites.
        max_depth: usize,
        /// Composite depth that was reached.
        depth: usize,
    },
    /// Rendering configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Constraint list could not be digested for the header.
    #[error(transparent)]
    Hash(#[from] HashError),
}
