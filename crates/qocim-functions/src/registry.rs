// crates/qocim-functions/src/registry.rs
// ============================================================================
// Module: Function Registry
// Description: Name-keyed constructors for management functions.
// Purpose: Create configured functions from a name and a parameter map.
// Dependencies: crate::{add, aggregate, remove, log}
// ============================================================================

//! ## Overview
//! The registry replaces global factories: callers own a [`FunctionRegistry`]
//! and look constructors up by the stable function name. Every function it
//! creates reports to the registry's event sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use qocim_core::AggregationRegistry;

use crate::add::ADD_QOC_INDICATOR;
use crate::add::AddQocIndicator;
use crate::aggregate::AGGREGATE_QOC_INDICATOR;
use crate::aggregate::AggregateQocIndicator;
use crate::error::FunctionError;
use crate::function::Parameters;
use crate::function::QocManagementFunction;
use crate::log::FunctionLog;
use crate::log::NoopFunctionLog;
use crate::remove::REMOVE_QOC_INDICATOR;
use crate::remove::RemoveQocIndicator;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Constructor producing an unconfigured function bound to an event sink.
pub type FunctionConstructor = fn(Arc<dyn FunctionLog>) -> Box<dyn QocManagementFunction>;

/// Registry of management function constructors keyed by name.
///
/// # Invariants
/// - Names are unique within the registry.
pub struct FunctionRegistry {
    /// Constructors keyed by stable name.
    constructors: BTreeMap<&'static str, FunctionConstructor>,
    /// Event sink handed to created functions.
    log: Arc<dyn FunctionLog>,
}

impl FunctionRegistry {
    /// Creates an empty registry reporting to `log`.
    #[must_use]
    pub fn new(log: Arc<dyn FunctionLog>) -> Self {
        Self {
            constructors: BTreeMap::new(),
            log,
        }
    }

    /// Creates a registry with the built-in functions reporting to `log`.
    #[must_use]
    pub fn with_builtin_functions(log: Arc<dyn FunctionLog>) -> Self {
        let mut constructors: BTreeMap<&'static str, FunctionConstructor> = BTreeMap::new();
        constructors.insert(REMOVE_QOC_INDICATOR, remove_constructor);
        constructors.insert(ADD_QOC_INDICATOR, add_constructor);
        constructors.insert(AGGREGATE_QOC_INDICATOR, aggregate_constructor);
        Self {
            constructors,
            log,
        }
    }

    /// Registers a constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::DuplicateFunction`] when the name is taken.
    pub fn register(
        &mut self,
        name: &'static str,
        constructor: FunctionConstructor,
    ) -> Result<(), FunctionError> {
        if self.constructors.contains_key(name) {
            return Err(FunctionError::DuplicateFunction(name.to_string()));
        }
        self.constructors.insert(name, constructor);
        Ok(())
    }

    /// Creates and configures the function registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::UnknownFunction`] for unregistered names and the
    /// validation error when `parameters` are rejected.
    pub fn create(
        &self,
        name: &str,
        parameters: &Parameters,
    ) -> Result<Box<dyn QocManagementFunction>, FunctionError> {
        let constructor = self
            .constructors
            .get(name.trim())
            .ok_or_else(|| FunctionError::UnknownFunction(name.to_string()))?;
        let mut function = constructor(Arc::clone(&self.log));
        function.set_parameters(parameters)?;
        Ok(function)
    }

    /// Returns registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtin_functions(Arc::new(NoopFunctionLog))
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("constructors", &self.names())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Built-in Constructors
// ============================================================================

/// Constructs [`RemoveQocIndicator`].
fn remove_constructor(log: Arc<dyn FunctionLog>) -> Box<dyn QocManagementFunction> {
    Box::new(RemoveQocIndicator::with_log(log))
}

/// Constructs [`AddQocIndicator`].
fn add_constructor(log: Arc<dyn FunctionLog>) -> Box<dyn QocManagementFunction> {
    Box::new(AddQocIndicator::with_log(log))
}

/// Constructs [`AggregateQocIndicator`] over the built-in operators.
fn aggregate_constructor(log: Arc<dyn FunctionLog>) -> Box<dyn QocManagementFunction> {
    Box::new(AggregateQocIndicator::with_registry(
        Arc::new(AggregationRegistry::with_builtin_operators()),
        log,
    ))
}
