//! # Task Error Types
//!
//! Structured error handling for the dispatch core using thiserror
//! instead of `Box<dyn Error>` patterns.
//!
//! The taxonomy follows the failure classes a task can hit:
//!
//! - [`TaskError::Configuration`] - missing credential, never retried
//! - [`TaskError::Upstream`] - non-2xx response or network failure
//! - [`TaskError::Persistence`] - I/O failure writing the result file
//! - [`TaskError::Protocol`] - malformed message body or unknown API alias
//! - [`TaskError::Broker`] - AMQP connection/channel/publish failures

use thiserror::Error;

/// Error type shared by executors, the broker bridge, and the API client
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Upstream API error: {message}")]
    Upstream { message: String },

    #[error("Persistence error: {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("Broker operation failed: {operation}: {message}")]
    Broker { operation: String, message: String },

    #[error("Operation {operation} timed out after {timeout_seconds}s")]
    Timeout {
        operation: String,
        timeout_seconds: u64,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl TaskError {
    /// Create a configuration error (e.g. missing API key)
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing-credential error naming the expected variable
    pub fn missing_credential(env_key: impl Into<String>) -> Self {
        Self::Configuration {
            message: format!("API key not found: {}", env_key.into()),
        }
    }

    /// Create an upstream error from a message
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create an upstream error carrying the response status and body
    pub fn upstream_status(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            message: format!("HTTP {}: {}", status, body.into()),
        }
    }

    /// Create a persistence error
    pub fn persistence(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an unknown-alias protocol error
    pub fn unknown_alias(alias: impl Into<String>) -> Self {
        Self::Protocol {
            message: format!("Unknown API alias: {}", alias.into()),
        }
    }

    /// Create a broker operation error
    pub fn broker(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Broker {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Broker {
            operation: "connect".to_string(),
            message: message.into(),
        }
    }

    /// Create a publish error
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Broker {
            operation: "publish".to_string(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_seconds,
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// True when the failure is a missing/invalid precondition that a retry
    /// cannot fix (the executor surfaces these without a network attempt)
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            TaskError::protocol(format!("Malformed message body: {err}"))
        } else {
            TaskError::serialization(err.to_string())
        }
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        TaskError::persistence("<unknown>", err.to_string())
    }
}

impl From<reqwest::Error> for TaskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TaskError::timeout("upstream_fetch", 30)
        } else {
            TaskError::upstream(err.to_string())
        }
    }
}

impl From<lapin::Error> for TaskError {
    fn from(err: lapin::Error) -> Self {
        TaskError::broker("channel", err.to_string())
    }
}

/// Result type alias for task operations
pub type TaskResult<T> = Result<T, TaskError>;
