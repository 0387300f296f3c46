//! Conversion form.
//!
//! Text fields are coerced to numbers before submission: an empty field is
//! `0`, unparsable text is NaN and gets rejected by validation.

use convrate_domain::{CalculationResult, RateResult};

use crate::controller::{ClientRequestController, RequestState};
use crate::transport::CalculationTransport;

/// Coerce a text field to a number.
pub fn parse_field(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// The two input fields of the calculator form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionForm {
    /// Raw conversions text
    pub conversions: String,
    /// Raw visitors text
    pub visitors: String,
}

impl ConversionForm {
    /// Create a form with the given field contents.
    pub fn new(conversions: impl Into<String>, visitors: impl Into<String>) -> Self {
        Self {
            conversions: conversions.into(),
            visitors: visitors.into(),
        }
    }

    /// Coerce both fields and submit them through `controller`.
    pub async fn submit<T>(
        &self,
        controller: &ClientRequestController<T>,
    ) -> CalculationResult<RateResult>
    where
        T: CalculationTransport + ?Sized,
    {
        controller
            .calculate_rate(parse_field(&self.conversions), parse_field(&self.visitors))
            .await
    }

    /// Label of the submit button.
    pub fn submit_label(state: &RequestState) -> &'static str {
        if state.is_loading {
            "Calculating..."
        } else {
            "Calculate Rate"
        }
    }

    /// Text shown under the form, if any.
    ///
    /// The error message is shown verbatim. The rate is shown only when there
    /// is no error.
    pub fn render(state: &RequestState) -> Option<String> {
        match (&state.error, &state.rate) {
            (Some(error), _) => Some(error.message().to_string()),
            (None, Some(rate)) => Some(format!("Conversion Rate: {}", rate)),
            (None, None) => None,
        }
    }
}
