//! Error types for dfhack-client.

use std::time::Duration;

use thiserror::Error;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum DfhackError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (default codec).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Socket connect or handshake failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// No bytes received within the response timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Protocol error (bad handshake, unexpected frame id, duplicate terminal, etc.).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Server replied with a FAIL frame. The code comes from the header's
    /// size field, which the wire protocol overloads for this sentinel.
    #[error("remote call failed with code {code}")]
    Remote {
        /// Numeric error code carried in the FAIL header.
        code: i32,
    },

    /// Method name is unknown to the registry at call time.
    #[error("method not bound: {0}")]
    UnboundMethod(String),

    /// Bind requested for a name with no seed entry and no explicit types.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Type name could not be resolved by the message codec.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// Input value's type name does not match the binding's input type.
    #[error("type mismatch for {method}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Method being called.
        method: String,
        /// Input type recorded in the binding.
        expected: String,
        /// Type name of the value actually supplied.
        actual: String,
    },
}

/// Result type alias using DfhackError.
pub type Result<T> = std::result::Result<T, DfhackError>;
