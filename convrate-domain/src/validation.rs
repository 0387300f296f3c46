//! Input validation.
//!
//! Rejects only what is obviously malformed: negative or non-finite counts.
//! A visitor count of zero passes; whether a rate is defined for it is the
//! calculator's decision, not the validator's.

use crate::error::{CalculationError, CalculationResult};
use crate::rate::RateInput;

/// Validate raw input before a computation is attempted.
///
/// # Errors
/// Returns `CalculationError::InvalidInput` if either count is negative,
/// NaN or infinite. No other variant is ever returned.
pub fn validate(input: RateInput) -> CalculationResult<RateInput> {
    if !input.is_finite() {
        return Err(CalculationError::invalid_input());
    }
    if input.conversions < 0.0 || input.visitors < 0.0 {
        return Err(CalculationError::invalid_input());
    }
    Ok(input)
}
