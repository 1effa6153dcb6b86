// crates/qocim-routing-filter/src/compiler.rs
// ============================================================================
// Module: Routing Filter Compiler
// Description: Entry points compiling constraints and criteria into artifacts.
// Purpose: Build a fresh generator chain per call and wrap its output.
// Dependencies: crate::{artifact, config, error, generator}, qocim-core
// ============================================================================

//! ## Overview
//! [`RoutingFilterCompiler`] owns a validated configuration and nothing else.
//! Each call builds a new [`GeneratorChain`], so identical ordered input
//! always yields byte-identical artifacts, and one compiler can be shared
//! across threads.

use qocim_core::CriterionArena;
use qocim_core::CriterionIndex;
use qocim_core::QocConstraint;

use crate::artifact::FilterArtifact;
use crate::config::ConfigError;
use crate::config::RoutingFilterConfig;
use crate::error::RoutingFilterError;
use crate::generator::GeneratorChain;

/// Compiler turning QoC constraints into routing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingFilterCompiler {
    /// Rendering configuration.
    config: RoutingFilterConfig,
}

impl RoutingFilterCompiler {
    /// Creates a compiler with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration does not validate.
    pub fn new(config: RoutingFilterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
        })
    }

    /// Returns the compiler configuration.
    #[must_use]
    pub const fn config(&self) -> &RoutingFilterConfig {
        &self.config
    }

    /// Compiles an ordered constraint list into one routing filter.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingFilterError::EmptyConstraintList`] for an empty list.
    pub fn compile(&self, constraints: &[QocConstraint]) -> Result<FilterArtifact, RoutingFilterError> {
        let chain = GeneratorChain::for_constraints(constraints)?;
        Ok(FilterArtifact::new(chain.render(&self.config)?))
    }

    /// Compiles a criterion tree into a filter rejecting unsatisfying reports.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingFilterError`] when `root` is unknown, the tree nests
    /// deeper than the runtime accepts, or a binary primitive has no usable
    /// threshold.
    pub fn compile_criterion(
        &self,
        arena: &CriterionArena,
        root: CriterionIndex,
    ) -> Result<FilterArtifact, RoutingFilterError> {
        let chain = GeneratorChain::for_criterion(arena, root)?;
        Ok(FilterArtifact::new(chain.render(&self.config)?))
    }
}

/// Compiles constraints with the default configuration.
///
/// # Errors
///
/// Returns [`RoutingFilterError::EmptyConstraintList`] for an empty list.
pub fn compile(constraints: &[QocConstraint]) -> Result<FilterArtifact, RoutingFilterError> {
    RoutingFilterCompiler::default().compile(constraints)
}
