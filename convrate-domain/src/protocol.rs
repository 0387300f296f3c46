//! JSON wire protocol for the calculation endpoint.
//!
//! ```text
//! POST /api/calculate-conversion   { "conversions": 50, "visitors": 200 }
//!   200 { "rate": 25 }
//!   400 { "error": "<InvalidInput or ZeroVisitors message>" }
//!   500 { "error": "Something went wrong!" }
//! GET /health
//!   200 { "status": "ok", "version": "..." }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::rate::{RateInput, RateResult};

/// Path of the calculation endpoint.
pub const CALCULATE_CONVERSION_PATH: &str = "/api/calculate-conversion";

/// Path of the health check.
pub const HEALTH_PATH: &str = "/health";

/// Value of the `endpoint` tag on failure reports.
pub const ENDPOINT_TAG: &str = "calculate-conversion";

/// Body of every server-error response.
pub const GENERIC_SERVER_ERROR: &str = "Something went wrong!";

/// Request body as received.
///
/// Fields are kept as raw JSON so that non-numeric values can be classified
/// as invalid input (and reported verbatim) instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// Raw conversions value
    #[serde(default)]
    pub conversions: Value,
    /// Raw visitors value
    #[serde(default)]
    pub visitors: Value,
}

impl CalculateRequest {
    /// Parse a raw request body.
    ///
    /// # Errors
    /// Returns a description of the problem unless the body is a JSON object.
    /// Missing fields are not an error here; they fail validation later.
    pub fn parse(body: &[u8]) -> Result<Self, String> {
        let fields: BTreeMap<String, &RawValue> =
            serde_json::from_slice(body).map_err(|e| e.to_string())?;

        Ok(Self {
            conversions: fields.get("conversions").map_or(Value::Null, |raw| field_value(raw)),
            visitors: fields.get("visitors").map_or(Value::Null, |raw| field_value(raw)),
        })
    }

    /// Convert to a (not yet validated) input.
    pub fn to_input(&self) -> RateInput {
        RateInput::from_json(&self.conversions, &self.visitors)
    }
}

impl From<RateInput> for CalculateRequest {
    fn from(input: RateInput) -> Self {
        Self {
            conversions: Value::from(input.conversions),
            visitors: Value::from(input.visitors),
        }
    }
}

/// Decode one field, keeping its literal text when it does not fit a JSON value.
///
/// A number such as `1e400` is valid JSON but outside `f64`. It is kept as a
/// string so that validation rejects it as `InvalidInput` and the report
/// still carries what the caller sent.
fn field_value(raw: &RawValue) -> Value {
    serde_json::from_str(raw.get())
        .unwrap_or_else(|_| Value::String(raw.get().trim().to_string()))
}

/// Success payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculateResponse {
    /// Rounded percentage
    pub rate: f64,
}

impl From<RateResult> for CalculateResponse {
    fn from(result: RateResult) -> Self {
        Self { rate: result.rate }
    }
}

/// Failure payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Message shown to the caller
    pub error: String,
}

impl ErrorResponse {
    /// Create a failure payload.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Crate version of the server
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_missing_fields_default_to_null() -> anyhow::Result<()> {
        let req: CalculateRequest = serde_json::from_value(json!({ "conversions": 3 }))?;
        assert_eq!(req.visitors, Value::Null);
        assert!(req.to_input().visitors.is_nan());
        Ok(())
    }

    #[test]
    fn test_parse_object_body() {
        let req = CalculateRequest::parse(br#"{"conversions": 50, "visitors": "x"}"#).unwrap();
        assert_eq!(req.conversions, json!(50));
        assert_eq!(req.visitors, json!("x"));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(CalculateRequest::parse(b"").is_err());
        assert!(CalculateRequest::parse(b"{ not json").is_err());
        assert!(CalculateRequest::parse(b"[1, 2]").is_err());
        assert!(CalculateRequest::parse(b"42").is_err());
    }

    #[test]
    fn test_parse_keeps_out_of_range_numbers() {
        let req = CalculateRequest::parse(br#"{"conversions": 1e400, "visitors": 10}"#).unwrap();
        assert_eq!(req.conversions, json!("1e400"));
        assert_eq!(req.visitors, json!(10));
        assert!(req.to_input().conversions.is_nan());
    }

    #[test]
    fn test_request_from_input() -> anyhow::Result<()> {
        let req = CalculateRequest::from(RateInput::new(50.0, 200.0));
        let body = serde_json::to_value(&req)?;
        assert_eq!(body, json!({ "conversions": 50.0, "visitors": 200.0 }));
        Ok(())
    }

    #[test]
    fn test_response_shapes() -> anyhow::Result<()> {
        let ok = serde_json::to_value(CalculateResponse::from(RateResult::new(25.0)))?;
        assert_eq!(ok["rate"].as_f64(), Some(25.0));

        let err = serde_json::to_value(ErrorResponse::new(GENERIC_SERVER_ERROR))?;
        assert_eq!(err, json!({ "error": "Something went wrong!" }));
        Ok(())
    }
}
