//! Conversion Rate Domain Layer
//!
//! Pure domain types with zero I/O dependencies.
//! Contains the rate value objects, the error taxonomy, input validation
//! and the JSON wire protocol shared by the daemon and its clients.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod error;
pub mod protocol;
pub mod rate;
pub mod validation;

// Re-export commonly used types
pub use error::{
    CalculationError, CalculationResult, ErrorKind, INVALID_INPUT_MESSAGE, ZERO_VISITORS_MESSAGE,
};
pub use protocol::{
    CalculateRequest, CalculateResponse, ErrorResponse, HealthResponse, CALCULATE_CONVERSION_PATH,
    ENDPOINT_TAG, GENERIC_SERVER_ERROR, HEALTH_PATH,
};
pub use rate::{RateInput, RateResult};
pub use validation::validate;
