//! Error types surfaced by the library
//!
//! Individual strategy failures are recovered inside the capture engine and the
//! export sink; only the variants documented on each operation reach callers.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::Rect;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error(
        "No screenshot backend available (tried: {}){}",
        join_or_none(.attempted),
        install_hint(.missing)
    )]
    NoBackendAvailable {
        /// Strategies that ran and failed, in rank order
        attempted: Vec<String>,
        /// External tools that were not installed
        missing: Vec<String>,
    },

    #[error("{tool} did not finish within {:.1}s", .timeout.as_secs_f32())]
    ToolTimeout { tool: String, timeout: Duration },

    #[error("Failed to decode capture from {origin}: {reason}")]
    DecodeFailure { origin: String, reason: String },

    #[error("{tool} exited with status {status:?}: {stderr}")]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Native display capture failed: {0}")]
    Native(String),

    #[error("Screenshot portal failed: {0}")]
    Portal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("Region {region:?} does not overlap the captured frame")]
    InvalidRegion { region: Rect },
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No writable location for the screenshot (tried {})", .attempted.len())]
    NoWritableLocation { attempted: Vec<PathBuf> },

    #[error("Image encoding failed: {0}")]
    EncodeFailure(String),

    #[error("Clipboard unavailable (tried: {})", join_or_none(.attempted))]
    ClipboardUnavailable { attempted: Vec<String> },
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} timed out after {:.1}s and was terminated", .timeout.as_secs_f32())]
    TimedOut { program: String, timeout: Duration },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "nothing".to_string()
    } else {
        names.join(", ")
    }
}

fn install_hint(missing: &[String]) -> String {
    if missing.is_empty() {
        String::new()
    } else {
        format!("; install one of: {}", missing.join(", "))
    }
}
