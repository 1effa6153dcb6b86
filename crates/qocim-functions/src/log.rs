// crates/qocim-functions/src/log.rs
// ============================================================================
// Module: Function Event Log
// Description: Structured events emitted by QoC management functions.
// Purpose: Record configuration and execution outcomes without a hard logging dependency.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Management functions never propagate validation failures; they report
//! them as [`FunctionEvent`] records through a [`FunctionLog`] sink.
//! [`NoopFunctionLog`] discards events and [`JsonLinesFunctionLog`] writes
//! one JSON object per line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Structured management function event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FunctionEvent {
    /// A function instance was created.
    Created {
        /// Function name.
        function: &'static str,
    },
    /// Parameters were accepted.
    Configured {
        /// Function name.
        function: &'static str,
        /// Accepted parameters.
        parameters: BTreeMap<String, String>,
    },
    /// Parameters were rejected; the function is unconfigured.
    ConfigurationRejected {
        /// Function name.
        function: &'static str,
        /// Rejection reason.
        reason: String,
    },
    /// Execution started on a report.
    ExecutionBegun {
        /// Function name.
        function: &'static str,
        /// Report identifier.
        report_id: String,
    },
    /// Execution completed on a report.
    ExecutionFinished {
        /// Function name.
        function: &'static str,
        /// Report identifier.
        report_id: String,
        /// Number of observations whose indicators changed.
        mutated_observations: usize,
    },
    /// Execution was skipped and the report left untouched.
    ExecutionSkipped {
        /// Function name.
        function: &'static str,
        /// Report identifier.
        report_id: String,
        /// Skip reason.
        reason: String,
    },
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink receiving management function events.
pub trait FunctionLog: Send + Sync {
    /// Records one event.
    fn record(&self, event: FunctionEvent);
}

/// Sink discarding every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFunctionLog;

impl FunctionLog for NoopFunctionLog {
    fn record(&self, _event: FunctionEvent) {}
}

/// Errors raised while writing event records.
#[derive(Debug, Error)]
pub enum LogError {
    /// Writing or serializing a record failed.
    #[error("function log write failed: {0}")]
    WriteFailed(String),
}

/// Sink writing one JSON object per line.
pub struct JsonLinesFunctionLog<W: Write + Send> {
    /// Output writer for log records.
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesFunctionLog<W> {
    /// Creates a sink over the writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one event as a JSON line.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriteFailed`] when serialization or I/O fails.
    pub fn write_event(&self, event: &FunctionEvent) -> Result<(), LogError> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| LogError::WriteFailed("log writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, event)
            .map_err(|err| LogError::WriteFailed(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| LogError::WriteFailed(err.to_string()))?;
        guard.flush().map_err(|err| LogError::WriteFailed(err.to_string()))?;
        drop(guard);
        Ok(())
    }

    /// Consumes the sink and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriteFailed`] when the writer mutex is poisoned.
    pub fn into_inner(self) -> Result<W, LogError> {
        self.writer
            .into_inner()
            .map_err(|_| LogError::WriteFailed("log writer mutex poisoned".to_string()))
    }
}

impl<W: Write + Send> FunctionLog for JsonLinesFunctionLog<W> {
    fn record(&self, event: FunctionEvent) {
        // Event logging is best effort; execution results never depend on it.
        let _ = self.write_event(&event);
    }
}
