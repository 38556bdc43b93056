//! Error types for sqlgate.
//!
//! Defines the error enum shared by the gate, the engine client and the CLI.

use thiserror::Error;

/// Main error type for sqlgate operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The query does not parse under the configured dialect.
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        /// 1-based column reported by the parser, if any.
        column: Option<u64>,
    },

    /// The query parsed but was rejected by the policy.
    #[error("Policy violation: {0}")]
    Policy(String),

    /// The embedded engine failed while running an approved query.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Opening or closing the embedded database failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (invalid config file, bad policy entries, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors (seed scripts, exports).
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Creates a parse error with an optional column position.
    pub fn parse(msg: impl Into<String>, column: Option<u64>) -> Self {
        Self::Parse {
            message: msg.into(),
            column,
        }
    }

    /// Creates a policy violation with the given reason.
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Creates an execution error with the engine's message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "Parse Error",
            Self::Policy(_) => "Policy Violation",
            Self::Execution(_) => "Execution Error",
            Self::Connection(_) => "Connection Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare reason without the category prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::Parse { message, .. } => message,
            Self::Policy(msg)
            | Self::Execution(msg)
            | Self::Connection(msg)
            | Self::Config(msg)
            | Self::Io(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias using GateError.
pub type Result<T> = std::result::Result<T, GateError>;
