//! Error types for tfinv-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running a local command
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Command timed out
    #[error("command `{command}` timed out after {timeout:?}")]
    Timeout {
        /// Rendered command line
        command: String,
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Process spawn error
    #[error("failed to spawn `{command}`: {reason}")]
    SpawnError {
        /// Rendered command line
        command: String,
        /// Underlying OS error
        reason: String,
    },

    /// stdout was not valid UTF-8
    #[error("`{command}` wrote invalid UTF-8 to stdout: {reason}")]
    InvalidOutput {
        /// Rendered command line
        command: String,
        /// Decoding error
        reason: String,
    },

    /// I/O error while collecting output
    #[error("I/O error: {0}")]
    IoError(String),
}
