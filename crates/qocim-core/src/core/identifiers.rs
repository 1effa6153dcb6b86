// crates/qocim-core/src/core/identifiers.rs
// ============================================================================
// Module: QoCIM Identifiers
// Description: Canonical identifiers for QoC indicators, criteria, and values.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the identifiers used throughout QoCIM. Indicator
//! identifiers are small integers shared by every metric definition of one
//! criterion family. Criterion and metric value identifiers are opaque strings
//! and serialize transparently on the wire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// QoC indicator identifier (criterion family identity).
///
/// # Invariants
/// - Stable per criterion family (freshness = 1, precision = 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorId(u32);

impl IndicatorId {
    /// Identifier of the freshness indicator.
    pub const FRESHNESS: Self = Self(1);
    /// Identifier of the precision indicator.
    pub const PRECISION: Self = Self(10);

    /// Creates a new indicator identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for IndicatorId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<u32>().map(Self)
    }
}

impl From<u32> for IndicatorId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// QoC criterion identifier.
///
/// # Invariants
/// - Opaque UTF-8 string in dotted or bracketed notation (for example `[2.1]`); no
///   normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriterionId(String);

impl CriterionId {
    /// Creates a new criterion identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CriterionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CriterionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Caller-assigned identifier of a QoC metric value.
///
/// # Invariants
/// - Opaque UTF-8 string; routing filters never inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricValueId(String);

impl MetricValueId {
    /// Placeholder identifier used when the value identity does not matter.
    pub const PLACEHOLDER: &'static str = "0";

    /// Creates a new metric value identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the placeholder identifier (`"0"`).
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(Self::PLACEHOLDER)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for MetricValueId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MetricValueId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
