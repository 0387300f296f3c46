//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up or tearing down telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber is already installed
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),

    /// Log filter directive could not be parsed
    #[error("Invalid log directive: {0}")]
    InvalidDirective(String),

    /// Unknown log format name
    #[error("Invalid log format: {0}. Expected: pretty, json")]
    InvalidLogFormat(String),

    /// Sink worker did not drain in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Sink worker task failed
    #[error("Sink worker error: {0}")]
    Worker(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
