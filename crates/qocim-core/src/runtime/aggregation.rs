// crates/qocim-core/src/runtime/aggregation.rs
// ============================================================================
// Module: QoCIM Aggregation Operators
// Description: Selection operators reducing information lists to one element.
// Purpose: Provide stateless MAX/MIN selection and an explicit operator registry.
// Dependencies: crate::core::context, serde, thiserror
// ============================================================================

//! ## Overview
//! Selection operators pick one element of an information list by numeric
//! value. Non-numeric elements are skipped, ties keep the first-seen element,
//! and `None` is returned when nothing numeric is present. Operators are
//! looked up by their stable name through an [`AggregationRegistry`] owned by
//! the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::context::Information;

// ============================================================================
// SECTION: Operator Trait
// ============================================================================

/// Aggregation operator over information lists.
pub trait AggregationOperator: Send + Sync {
    /// Returns the stable registry name.
    fn name(&self) -> &'static str;

    /// Reduces `values` to one element, or `None` when nothing qualifies.
    fn aggregate<'a>(&self, values: &'a [Information]) -> Option<&'a Information>;
}

// ============================================================================
// SECTION: Selection Operators
// ============================================================================

/// Built-in selection operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SelectionOperator {
    /// Selects the greatest numeric value.
    Max,
    /// Selects the smallest numeric value.
    Min,
}

impl SelectionOperator {
    /// Returns the stable operator name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Max => "MAX",
            Self::Min => "MIN",
        }
    }

    /// Returns true when `candidate` should replace the current selection.
    const fn replaces(self, candidate_vs_current: Ordering) -> bool {
        match self {
            Self::Max => candidate_vs_current.is_gt(),
            Self::Min => candidate_vs_current.is_lt(),
        }
    }
}

impl fmt::Display for SelectionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionOperator {
    type Err = AggregationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MAX" => Ok(Self::Max),
            "MIN" => Ok(Self::Min),
            _ => Err(AggregationError::UnknownOperator(name.to_string())),
        }
    }
}

impl AggregationOperator for SelectionOperator {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn aggregate<'a>(&self, values: &'a [Information]) -> Option<&'a Information> {
        let mut selected: Option<(&Information, bigdecimal::BigDecimal)> = None;
        for information in values {
            let Some(candidate) = information.numeric() else {
                continue;
            };
            let replace = match &selected {
                None => true,
                Some((_, current)) => self.replaces(candidate.cmp(current)),
            };
            if replace {
                selected = Some((information, candidate));
            }
        }
        selected.map(|(information, _)| information)
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Errors raised by aggregation lookups.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// No operator is registered under the name.
    #[error("unknown aggregation operator `{0}`")]
    UnknownOperator(String),
    /// An operator is already registered under the name.
    #[error("aggregation operator `{0}` is already registered")]
    Duplicate(String),
}

/// Registry of aggregation operators keyed by name.
///
/// # Invariants
/// - Names are unique within the registry.
pub struct AggregationRegistry {
    /// Operators keyed by stable name.
    operators: BTreeMap<&'static str, Box<dyn AggregationOperator>>,
}

impl AggregationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operators: BTreeMap::new(),
        }
    }

    /// Creates a registry with `MAX` and `MIN` registered.
    #[must_use]
    pub fn with_builtin_operators() -> Self {
        let mut operators: BTreeMap<&'static str, Box<dyn AggregationOperator>> = BTreeMap::new();
        for operator in [SelectionOperator::Max, SelectionOperator::Min] {
            operators.insert(operator.as_str(), Box::new(operator));
        }
        Self {
            operators,
        }
    }

    /// Registers an operator under its name.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::Duplicate`] when the name is taken.
    pub fn register(&mut self, operator: Box<dyn AggregationOperator>) -> Result<(), AggregationError> {
        let name = operator.name();
        if self.operators.contains_key(name) {
            return Err(AggregationError::Duplicate(name.to_string()));
        }
        self.operators.insert(name, operator);
        Ok(())
    }

    /// Returns the operator registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::UnknownOperator`] when nothing is registered.
    pub fn get(&self, name: &str) -> Result<&dyn AggregationOperator, AggregationError> {
        self.operators
            .get(name.trim())
            .map(AsRef::as_ref)
            .ok_or_else(|| AggregationError::UnknownOperator(name.to_string()))
    }

    /// Returns registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.operators.keys().copied().collect()
    }
}

impl Default for AggregationRegistry {
    fn default() -> Self {
        Self::with_builtin_operators()
    }
}

impl fmt::Debug for AggregationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationRegistry").field("operators", &self.names()).finish()
    }
}
