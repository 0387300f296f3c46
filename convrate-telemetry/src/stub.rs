//! Stub implementations for testing.

use std::sync::RwLock;

use convrate_domain::ErrorKind;

use crate::ports::{FailureReport, ObservabilitySink};

// =============================================================================
// Recording Sink
// =============================================================================

/// Keeps every captured report in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: RwLock<Vec<FailureReport>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all reports captured so far.
    pub fn reports(&self) -> Vec<FailureReport> {
        match self.reports.read() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of reports captured.
    pub fn count(&self) -> usize {
        self.reports().len()
    }

    /// Number of reports of the given kind.
    pub fn count_kind(&self, kind: ErrorKind) -> usize {
        self.reports()
            .iter()
            .filter(|r| r.error.kind() == kind)
            .count()
    }

    /// Forget all reports.
    pub fn clear(&self) {
        match self.reports.write() {
            Ok(mut reports) => reports.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl ObservabilitySink for RecordingSink {
    fn capture(&self, report: FailureReport) {
        match self.reports.write() {
            Ok(mut reports) => reports.push(report),
            Err(poisoned) => poisoned.into_inner().push(report),
        }
    }
}
