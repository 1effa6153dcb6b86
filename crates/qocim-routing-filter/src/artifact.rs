// crates/qocim-routing-filter/src/artifact.rs
// ============================================================================
// Module: Filter Artifact
// Description: Immutable compiled routing filter with its content digest.
// Purpose: Hand compiled predicates to the transport layer.
// Dependencies: qocim-core, serde
// ============================================================================

//! ## Overview
//! A [`FilterArtifact`] is the only output of compilation. It owns the filter
//! code and the SHA-256 digest taken when it was built; transports can key
//! subscriptions on the digest without rehashing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use qocim_core::HashAlgorithm;
use qocim_core::HashDigest;
use qocim_core::hashing::hash_bytes;
use serde::Serialize;

// ============================================================================
// SECTION: Artifact
// ============================================================================

/// Compiled routing filter.
///
/// # Invariants
/// - `digest` is the SHA-256 digest of `code` and is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterArtifact {
    /// Predicate code.
    code: String,
    /// Digest of `code`.
    digest: HashDigest,
}

impl FilterArtifact {
    /// Wraps compiled code and digests it.
    pub(crate) fn new(code: String) -> Self {
        let digest = hash_bytes(HashAlgorithm::Sha256, code.as_bytes());
        Self {
            code,
            digest,
        }
    }

    /// Returns the predicate code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Returns the content digest.
    #[must_use]
    pub const fn digest(&self) -> &HashDigest {
        &self.digest
    }

    /// Consumes the artifact and returns the predicate code.
    #[must_use]
    pub fn into_code(self) -> String {
        self.code
    }
}

impl fmt::Display for FilterArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
