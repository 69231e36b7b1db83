//! Error types for the BigIP worker.

use thiserror::Error;

/// A command message that cannot be turned into a device call.
///
/// The message text is shown to people verbatim (failure notification body
/// and output log), so it is kept free of prefixes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InvalidCommand {
    message: String,
}

impl InvalidCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure raised while the device executor performs a sync or state change.
#[derive(Error, Debug)]
pub enum ExecutionFault {
    /// The argument vector was rejected by the device command surface.
    #[error("Invalid device arguments: {0}")]
    BadArguments(String),

    /// The device-control program could not be found.
    #[error("Device control program not found: {program}")]
    NotInstalled { program: String },

    /// The device-control program could not be started.
    #[error("Failed to run device control program: {0}")]
    Spawn(#[source] std::io::Error),

    /// The device-control program exited unsuccessfully.
    #[error("Device command `{command}` failed: {message}")]
    CommandFailed {
        command: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// The device-control program did not finish in time.
    #[error("Device command `{command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// Any other executor-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Worker error type.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Redis connection or operation error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// IO error (output log files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error (malformed stream entries, unexpected replies)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation failure
    #[error(transparent)]
    InvalidCommand(#[from] InvalidCommand),

    /// Executor failure
    #[error(transparent)]
    Execution(#[from] ExecutionFault),
}

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;
