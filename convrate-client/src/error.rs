//! Transport error types.

use convrate_domain::{CalculationError, ZERO_VISITORS_MESSAGE};
use thiserror::Error;

/// Shown when the server rejected a request without an `error` message.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Failed to calculate conversion rate";

/// Shown when a failure carries no message at all.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An error occurred";

/// Errors that can occur while talking to the calculation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// HTTP request could not be sent or completed
    #[error("{0}")]
    RequestFailed(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Endpoint answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

impl From<TransportError> for CalculationError {
    /// Classify a transport failure.
    ///
    /// A 400 carrying the zero-visitor message is `ZeroVisitors`, any other
    /// 4xx is `InvalidInput`, everything else is `InternalFailure`. The
    /// server's message is kept verbatim.
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Rejected { status, message } if (400..500).contains(&status) => {
                if message == ZERO_VISITORS_MESSAGE {
                    CalculationError::ZeroVisitors(message)
                } else {
                    CalculationError::InvalidInput(message)
                }
            }
            other => {
                let message = other.to_string();
                if message.is_empty() {
                    CalculationError::internal(UNKNOWN_ERROR_MESSAGE)
                } else {
                    CalculationError::internal(message)
                }
            }
        }
    }
}
