// crates/qocim-core/src/core/operator.rs
// ============================================================================
// Module: QoCIM Filter Operators
// Description: Unary and binary comparison operators for QoC filters.
// Purpose: Provide the closed operator set with stable wire tags.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Operators are applied by the matcher and rendered into routing filters.
//! Tags are stable snake_case strings; upper-case spellings (`EQ`,
//! `NOT_EXISTS`) are accepted when parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Comparison operator applied to QoC metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QocOperator {
    /// The indicator family is present.
    Exists,
    /// The indicator family is absent.
    NotExists,
    /// Numeric equality.
    Eq,
    /// Numeric inequality.
    Ne,
    /// Numeric less-than.
    Lt,
    /// Numeric less-than-or-equal.
    Le,
    /// Numeric greater-than.
    Gt,
    /// Numeric greater-than-or-equal.
    Ge,
}

/// Canonical list of operators.
pub const ALL_OPERATORS: [QocOperator; 8] = [
    QocOperator::Exists,
    QocOperator::NotExists,
    QocOperator::Eq,
    QocOperator::Ne,
    QocOperator::Lt,
    QocOperator::Le,
    QocOperator::Gt,
    QocOperator::Ge,
];

impl QocOperator {
    /// Returns the stable wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
        }
    }

    /// Returns true for presence operators that ignore the right operand.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Exists | Self::NotExists)
    }
}

impl fmt::Display for QocOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised for unrecognized operator tags.
///
/// # Invariants
/// - `tag` is the raw input, untrimmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operator `{tag}`")]
pub struct UnknownOperator {
    /// Unrecognized tag.
    pub tag: String,
}

impl FromStr for QocOperator {
    type Err = UnknownOperator;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let normalized = tag.trim().to_ascii_lowercase();
        ALL_OPERATORS.into_iter().find(|operator| operator.as_str() == normalized).ok_or_else(
            || UnknownOperator {
                tag: tag.to_string(),
            },
        )
    }
}
