//! Error types for call audio routing
//!
//! The communication device arbiter never surfaces errors: an unavailable
//! device, a stale clear or a declined activation is reported as `false`
//! plus a log line. The variants here cover the plumbing around it: the
//! routing queue, configuration and logging setup.

use thiserror::Error;

/// Result type alias for routing operations
pub type Result<T> = std::result::Result<T, RouteError>;

/// Errors raised by the routing plumbing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The bounded inbound queue had no free slot
    #[error("Routing queue full, dropped {message}")]
    QueueFull { message: String },

    /// The serialized routing worker is no longer running
    #[error("Routing worker has stopped")]
    WorkerStopped,

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Logging could not be initialized
    #[error("Logging setup failed: {message}")]
    Logging { message: String },
}

impl RouteError {
    /// Create a queue-full error for the named message
    pub fn queue_full(message: impl Into<String>) -> Self {
        Self::QueueFull {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a logging setup error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    /// Whether retrying the same submission later can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }
}
