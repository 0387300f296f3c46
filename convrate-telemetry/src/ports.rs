//! Observability port definitions.
//!
//! The sink is the only side channel of the calculation path. Callers hand it
//! a [`FailureReport`] and move on; implementations must never block.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use convrate_domain::CalculationError;

// =============================================================================
// Observability Sink
// =============================================================================

/// Port for failure reporting.
///
/// Implementations:
/// - `TracingSink` - Structured `tracing` event per report
/// - `ChannelSink` - Queues reports for a background `SinkWorker`
/// - `RecordingSink` - For testing (keeps reports in memory)
/// - `NoopSink` - Telemetry disabled
pub trait ObservabilitySink: Send + Sync {
    /// Capture one failure.
    ///
    /// Called exactly once per failure, before the caller sees a response.
    /// Must return promptly and must not panic.
    fn capture(&self, report: FailureReport);
}

impl<S: ObservabilitySink + ?Sized> ObservabilitySink for std::sync::Arc<S> {
    fn capture(&self, report: FailureReport) {
        (**self).capture(report)
    }
}

// =============================================================================
// Failure Report
// =============================================================================

/// A single failure with its structured context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    /// The classified error
    pub error: CalculationError,
    /// Low-cardinality tags (`endpoint`, `error_type`, `feature`, ...)
    pub tags: BTreeMap<String, String>,
    /// Free-form context (raw `conversions` / `visitors`)
    pub extra: BTreeMap<String, Value>,
    /// When the failure was captured
    pub occurred_at: DateTime<Utc>,
}

impl FailureReport {
    /// Create a report with no tags or extra context.
    pub fn new(error: CalculationError) -> Self {
        Self {
            error,
            tags: BTreeMap::new(),
            extra: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add extra context.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up a tag.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Look up extra context.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_builder() {
        let report = FailureReport::new(CalculationError::zero_visitors())
            .with_tag("endpoint", "calculate-conversion")
            .with_tag("error_type", "division_by_zero")
            .with_extra("conversions", 10)
            .with_extra("visitors", 0);

        assert_eq!(report.tag("endpoint"), Some("calculate-conversion"));
        assert_eq!(report.tag("error_type"), Some("division_by_zero"));
        assert_eq!(report.extra("conversions"), Some(&json!(10)));
        assert_eq!(report.extra("missing"), None);
    }

    #[test]
    fn test_report_serialization() -> anyhow::Result<()> {
        let report = FailureReport::new(CalculationError::invalid_input())
            .with_tag("feature", "conversion-calculator")
            .with_extra("visitors", Value::Null);

        let json = serde_json::to_value(&report)?;
        assert_eq!(json["error"]["kind"], "invalid_input");
        assert_eq!(json["tags"]["feature"], "conversion-calculator");
        assert!(json["extra"]["visitors"].is_null());
        Ok(())
    }
}
