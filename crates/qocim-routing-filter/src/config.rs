// crates/qocim-routing-filter/src/config.rs
// ============================================================================
// Module: Routing Filter Configuration
// Description: Compiler configuration loading and validation.
// Purpose: Provide strict, fail-closed TOML parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Compiler configuration is loaded from a TOML file with strict size and path
//! limits. Every field has a default, so an empty file yields the default
//! configuration. Invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "qocim-routing-filter.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "QOCIM_ROUTING_FILTER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum indentation width of emitted statements.
pub(crate) const MAX_INDENT_WIDTH: usize = 8;
/// Maximum length of the metadata variable name.
pub(crate) const MAX_VARIABLE_LENGTH: usize = 64;
/// Default metadata variable name.
const DEFAULT_METADATA_VARIABLE: &str = "qoc";
/// Default indentation width.
const DEFAULT_INDENT_WIDTH: usize = 4;
/// Identifiers reserved by the filter language and the bus's script engine.
const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "message", "new", "null", "package", "private", "protected", "public", "return", "static",
    "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void",
    "while", "with", "yield",
];

// ============================================================================
// SECTION: Missing Policy
// ============================================================================

/// How missing indicator families combine into the rejection guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Reject only when every constrained family is missing (`&&`-joined).
    #[default]
    RejectWhenAllMissing,
    /// Reject as soon as one constrained family is missing (`||`-joined).
    RejectWhenAnyMissing,
}

impl MissingPolicy {
    /// Returns the operator joining per-family missing tests.
    #[must_use]
    pub const fn junction(self) -> &'static str {
        match self {
            Self::RejectWhenAllMissing => " && ",
            Self::RejectWhenAnyMissing => " || ",
        }
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Routing filter compiler configuration.
///
/// # Invariants
/// - `metadata_variable` is an ASCII identifier that is not a reserved word.
/// - `indent_width` is within `1..=MAX_INDENT_WIDTH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingFilterConfig {
    /// Junction policy for missing-family tests.
    pub missing_policy: MissingPolicy,
    /// Name of the variable bound to the message metadata.
    pub metadata_variable: String,
    /// Spaces used to indent statements inside blocks.
    pub indent_width: usize,
}

impl Default for RoutingFilterConfig {
    fn default() -> Self {
        Self {
            missing_policy: MissingPolicy::default(),
            metadata_variable: DEFAULT_METADATA_VARIABLE.to_string(),
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

impl RoutingFilterConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from `path`, then [`CONFIG_ENV_VAR`], then
    /// `qocim-routing-filter.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indent_width == 0 || self.indent_width > MAX_INDENT_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "indent_width must be between 1 and {MAX_INDENT_WIDTH}"
            )));
        }
        validate_identifier(&self.metadata_variable)
    }

    /// Returns the indentation prefix for block statements.
    #[must_use]
    pub fn indent(&self) -> String {
        " ".repeat(self.indent_width)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates the metadata variable name.
fn validate_identifier(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.len() > MAX_VARIABLE_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "metadata_variable must be 1 to {MAX_VARIABLE_LENGTH} characters"
        )));
    }
    let mut chars = name.chars();
    let starts_well = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    if !starts_well || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(ConfigError::Invalid(format!(
            "metadata_variable `{name}` is not an identifier"
        )));
    }
    if RESERVED_WORDS.contains(&name) {
        return Err(ConfigError::Invalid(format!("metadata_variable `{name}` is reserved")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
