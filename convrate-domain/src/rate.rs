//! Rate value objects.
//!
//! [`RateInput`] is unvalidated: it carries whatever the caller
//! sent so that failure reports can include the raw values. Validation lives
//! in [`crate::validation`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// RateInput
// =============================================================================

/// Caller-supplied counts for a single calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateInput {
    /// Number of conversions
    pub conversions: f64,
    /// Number of visitors
    pub visitors: f64,
}

impl RateInput {
    /// Create a new input.
    pub fn new(conversions: f64, visitors: f64) -> Self {
        Self {
            conversions,
            visitors,
        }
    }

    /// Build an input from raw JSON values.
    ///
    /// Only JSON numbers are numeric. Anything else (strings, null, missing
    /// fields) becomes NaN, which validation rejects as `InvalidInput`.
    pub fn from_json(conversions: &Value, visitors: &Value) -> Self {
        Self::new(numeric(conversions), numeric(visitors))
    }

    /// Both counts are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.conversions.is_finite() && self.visitors.is_finite()
    }
}

fn numeric(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

// =============================================================================
// RateResult
// =============================================================================

/// A conversion rate in percent, rounded to two decimal places.
///
/// # Invariants
/// - Finite and non-negative when produced by the calculator
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RateResult {
    /// Percentage, two decimal places
    pub rate: f64,
}

impl RateResult {
    /// Wrap an already rounded percentage.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Get the percentage.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl fmt::Display for RateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.rate)
    }
}

// =============================================================================
// Tests
// =============================================================================
