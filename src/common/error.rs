//! Error types for the conformance CLI
//!
//! The error taxonomy mirrors how failures reach the operator: protocol
//! errors reported by the sandbox, local input validation caught before any
//! network call, normalized transport failures, and silently dropped stale
//! results.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conformance CLI
#[derive(Error, Debug)]
pub enum Error {
    // === Protocol Errors ===
    /// The gateway answered with an `{error}` envelope. Always user-visible,
    /// never retried automatically, never fatal to the view.
    #[error("Operation '{operation}' failed: {message}")]
    Operation { operation: String, message: String },

    #[error("Operation '{operation}' returned an unexpected response: {detail}")]
    UnexpectedResponse { operation: String, detail: String },

    // === Local Validation Errors ===
    /// Malformed operator input, caught before any network call
    #[error("Invalid action input: {0}")]
    InvalidInput(String),

    #[error("Invalid header {kind} '{value}'")]
    InvalidHeader { kind: &'static str, value: String },

    // === Transport Errors ===
    /// Failure raised by the underlying channel, normalized so the
    /// controller has a single error path
    #[error("Transport error: {0}")]
    Transport(String),

    // === Controller Errors ===
    /// A result arrived after the view it belonged to was torn down.
    /// Dropped silently, never reported to the operator.
    #[error("Result discarded: view is no longer current")]
    Stale,

    #[error("No action is currently awaiting input (missing prompt action id)")]
    MissingActionId,

    #[error("Cannot {action} while the controller is {state}")]
    InvalidState { action: String, state: String },

    #[error("Another scenario is already running in this sandbox. Stop it first")]
    ScenarioRunning,

    #[error("The current action cannot be skipped")]
    NotSkippable,

    #[error("This sandbox does not support counterpart party actions")]
    PartyActionUnsupported,

    #[error("Aborted by operator")]
    Aborted,

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a protocol error from an `{error}` envelope
    pub fn operation(operation: &str, message: &str) -> Self {
        Self::Operation {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an unexpected-response error
    pub fn unexpected_response(operation: &str, detail: &str) -> Self {
        Self::UnexpectedResponse {
            operation: operation.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(action: &str, state: impl std::fmt::Display) -> Self {
        Self::InvalidState {
            action: action.to_string(),
            state: state.to_string(),
        }
    }

    /// Whether this error must be swallowed rather than shown (stale-state race)
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
