//! Calculation error taxonomy.
//!
//! Every failed calculation is classified into exactly one [`ErrorKind`].
//! The message carried by each variant is what the caller renders verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message returned when either count is negative or not a finite number.
pub const INVALID_INPUT_MESSAGE: &str = "Conversions and visitors must be positive numbers";

/// Message returned when the visitor count is zero.
pub const ZERO_VISITORS_MESSAGE: &str = "Cannot calculate conversion rate: visitor count is zero. \
This may indicate a data synchronization issue or tracking misconfiguration.";

/// Classified outcome of a failed calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum CalculationError {
    /// Caller supplied negative or non-numeric counts (no computation attempted)
    #[error("{0}")]
    InvalidInput(String),

    /// Visitor count is zero (computation attempted, mathematically undefined)
    #[error("{0}")]
    ZeroVisitors(String),

    /// Anything else: malformed body, unexpected fault
    #[error("{0}")]
    InternalFailure(String),
}

impl CalculationError {
    /// `InvalidInput` with the standard message.
    pub fn invalid_input() -> Self {
        Self::InvalidInput(INVALID_INPUT_MESSAGE.to_string())
    }

    /// `ZeroVisitors` with the standard message.
    pub fn zero_visitors() -> Self {
        Self::ZeroVisitors(ZERO_VISITORS_MESSAGE.to_string())
    }

    /// `InternalFailure` with a custom message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalFailure(message.into())
    }

    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ZeroVisitors(_) => ErrorKind::ZeroVisitors,
            Self::InternalFailure(_) => ErrorKind::InternalFailure,
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(msg) | Self::ZeroVisitors(msg) | Self::InternalFailure(msg) => msg,
        }
    }

    /// Whether the caller's request was at fault.
    pub fn is_client_error(&self) -> bool {
        self.kind().is_client_error()
    }
}

/// Error classification, independent of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`CalculationError::InvalidInput`]
    InvalidInput,
    /// See [`CalculationError::ZeroVisitors`]
    ZeroVisitors,
    /// See [`CalculationError::InternalFailure`]
    InternalFailure,
}

impl ErrorKind {
    /// Value of the `error_type` tag attached to failure reports.
    pub fn as_tag(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::ZeroVisitors => "division_by_zero",
            ErrorKind::InternalFailure => "internal_failure",
        }
    }

    /// `InvalidInput` and `ZeroVisitors` are the caller's fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ErrorKind::InvalidInput | ErrorKind::ZeroVisitors)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Result type for calculation operations.
pub type CalculationResult<T> = Result<T, CalculationError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_messages() {
        assert_eq!(
            CalculationError::invalid_input().message(),
            "Conversions and visitors must be positive numbers"
        );
        assert!(CalculationError::zero_visitors()
            .message()
            .starts_with("Cannot calculate conversion rate: visitor count is zero."));
        assert!(ZERO_VISITORS_MESSAGE.ends_with("tracking misconfiguration."));
    }

    #[test]
    fn test_display_is_message_only() {
        let err = CalculationError::internal("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_error_tags() {
        assert_eq!(CalculationError::zero_visitors().kind().as_tag(), "division_by_zero");
        assert_eq!(CalculationError::invalid_input().kind().as_tag(), "invalid_input");
        assert_eq!(CalculationError::internal("x").kind().to_string(), "internal_failure");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(CalculationError::invalid_input().is_client_error());
        assert!(CalculationError::zero_visitors().is_client_error());
        assert!(!CalculationError::internal("x").is_client_error());
    }

    #[test]
    fn test_serialization_shape() -> anyhow::Result<()> {
        let json = serde_json::to_value(CalculationError::internal("boom"))?;
        assert_eq!(json["kind"], "internal_failure");
        assert_eq!(json["message"], "boom");
        Ok(())
    }
}
