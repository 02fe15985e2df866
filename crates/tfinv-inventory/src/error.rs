//! Error types for tfinv-inventory

use thiserror::Error;

/// Errors that can occur while turning state into an inventory
///
/// None of these are recovered from; the first one aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Top-level state layout is not one we understand
    #[error("malformed state: {0}")]
    MalformedState(String),

    /// A resource has no discoverable type
    #[error("resource has no type")]
    MissingType,

    /// Flattened list length marker is not a non-negative integer
    #[error("invalid length marker for `{key}`: {value}")]
    InvalidLength {
        /// Attribute name the marker belongs to
        key: String,
        /// Raw marker value
        value: String,
    },

    /// Fetching state from terraform failed
    #[error("failed to fetch state with `{command}`: {stderr}")]
    FetchFailure {
        /// Rendered command line
        command: String,
        /// What the command wrote to stderr
        stderr: String,
    },

    /// State text is not valid JSON
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// A required attribute is absent
    #[error("missing attribute `{key}`")]
    MissingAttribute {
        /// Attribute name
        key: String,
    },

    /// An attribute holds the wrong kind of value
    #[error("attribute `{key}` should be {expected}")]
    InvalidAttribute {
        /// Attribute name
        key: String,
        /// Kind of value that was expected
        expected: &'static str,
    },

    /// The executor could not run the command at all
    #[error("execution error: {0}")]
    Execution(String),
}

impl From<serde_json::Error> for InventoryError {
    fn from(e: serde_json::Error) -> Self {
        InventoryError::Parse(e.to_string())
    }
}

impl From<tfinv_exec::ExecError> for InventoryError {
    fn from(e: tfinv_exec::ExecError) -> Self {
        InventoryError::Execution(e.to_string())
    }
}
