//! Conversion rate calculator.
//!
//! Division happens in `f64`. The quotient is then rounded half-up to two
//! decimal places on its exact decimal expansion (via `rust_decimal`), so a
//! value such as `1.005` that is stored as `1.00499999…` rounds down, while a
//! true midpoint such as `3.125` rounds up.

use convrate_domain::{CalculationError, CalculationResult, RateInput, RateResult};
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept in a rate.
const RATE_DECIMAL_PLACES: u32 = 2;

/// Pure, stateless conversion rate calculator.
///
/// Assumes its caller already validated the input. Anything it cannot
/// handle is classified as `InternalFailure`; it never panics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionRateCalculator;

impl ConversionRateCalculator {
    /// Create a new calculator.
    pub fn new() -> Self {
        Self
    }

    /// Compute `conversions / visitors * 100`, rounded to two decimals.
    ///
    /// # Errors
    /// - `ZeroVisitors` if `visitors == 0`
    /// - `InternalFailure` if the input was not validated or the quotient
    ///   is not a finite number
    pub fn compute(&self, input: RateInput) -> CalculationResult<RateResult> {
        if !input.is_finite() || input.conversions < 0.0 || input.visitors < 0.0 {
            tracing::warn!(
                conversions = input.conversions,
                visitors = input.visitors,
                "Calculator received unvalidated input"
            );
            return Err(CalculationError::internal(format!(
                "Unvalidated input reached the calculator: conversions={}, visitors={}",
                input.conversions, input.visitors
            )));
        }

        if input.visitors == 0.0 {
            return Err(CalculationError::zero_visitors());
        }

        let percentage = (input.conversions / input.visitors) * 100.0;
        if !percentage.is_finite() {
            return Err(CalculationError::internal(format!(
                "Conversion rate is not a finite number: {}",
                percentage
            )));
        }

        Ok(RateResult::new(round_percentage(percentage)?))
    }
}

/// Round a percentage half-up to two decimal places.
///
/// Values too large for `Decimal` are returned unchanged: at that magnitude
/// an `f64` has no fractional digits left to round. The result is parsed back
/// from its decimal text so it equals the nearest `f64` literal (`33.33`).
pub fn round_percentage(value: f64) -> CalculationResult<f64> {
    // Below half a cent; also covers magnitudes Decimal cannot represent
    if value.abs() < 0.005 {
        return Ok(0.0);
    }

    let Some(exact) = Decimal::from_f64_retain(value) else {
        return Ok(value);
    };

    round_half_up(exact)
        .to_string()
        .parse::<f64>()
        .map_err(|e| CalculationError::internal(format!("Failed to convert rate: {}", e)))
}

fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Tests
// =============================================================================
