//! Error types for the Aura bridge core.
//!
//! Uses `thiserror` for public API error types. Malformed user input is not an
//! error here: the selection core reports it as an
//! [`ActionOutcome`](crate::selection::ActionOutcome) instead.

use std::path::PathBuf;

/// Top-level error type for the bridge core library.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Injection error: {0}")]
    Injection(#[from] InjectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while driving the terminal session.
#[derive(Debug, thiserror::Error)]
pub enum InjectionError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Nothing to inject: {reason}")]
    EmptyCommand { reason: String },
}

/// Violations of the client message protocol. These are reported back to the
/// client as `error` messages; the session stays open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid message: {message}")]
    MalformedEnvelope { message: String },

    #[error("No pending question to answer")]
    NoPendingQuestion,

    #[error("A question needs at least one option")]
    EmptyOptions,

    #[error("Query text is empty")]
    EmptyQuery,

    #[error("Unknown session: {session_id}")]
    UnknownSession { session_id: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::ParseError {
            message: err.to_string(),
        }
    }
}

/// Convenience result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
