//! Sink adapters.
//!
//! `ChannelSink` never blocks the caller: reports are queued with `try_send`
//! and forwarded by a `SinkWorker` task. When the queue is full the report is
//! dropped with a warning.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{TelemetryError, TelemetryResult};
use crate::ports::{FailureReport, ObservabilitySink};

/// How long shutdown waits for the worker to drain.
const WORKER_DRAIN_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Tracing Sink
// =============================================================================

/// Emits one structured `tracing` error event per report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn capture(&self, report: FailureReport) {
        let extra = serde_json::to_string(&report.extra).unwrap_or_default();
        error!(
            target: "convrate::observability",
            error_type = %report.error.kind(),
            error = %report.error,
            tags = ?report.tags,
            extra = %extra,
            occurred_at = %report.occurred_at,
            "Calculation failure captured"
        );
    }
}

// =============================================================================
// Noop Sink
// =============================================================================

/// Discards every report (telemetry disabled).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ObservabilitySink for NoopSink {
    fn capture(&self, _report: FailureReport) {}
}

// =============================================================================
// Tagged Sink
// =============================================================================

/// Adds fixed tags (e.g. `environment`) to every report.
///
/// Tags already present on a report win.
pub struct TaggedSink<S> {
    inner: S,
    tags: BTreeMap<String, String>,
}

impl<S: ObservabilitySink> TaggedSink<S> {
    /// Wrap a sink.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            tags: BTreeMap::new(),
        }
    }

    /// Add a fixed tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

impl<S: ObservabilitySink> ObservabilitySink for TaggedSink<S> {
    fn capture(&self, mut report: FailureReport) {
        for (key, value) in &self.tags {
            report.tags.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self.inner.capture(report);
    }
}

// =============================================================================
// Channel Sink + Worker
// =============================================================================

/// Queues reports for a background [`SinkWorker`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<FailureReport>,
}

impl ObservabilitySink for ChannelSink {
    fn capture(&self, report: FailureReport) {
        match self.sender.try_send(report) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(report)) => {
                warn!(
                    error_type = %report.error.kind(),
                    "Observability queue full, dropping failure report"
                );
            }
            Err(mpsc::error::TrySendError::Closed(report)) => {
                warn!(
                    error_type = %report.error.kind(),
                    "Observability worker stopped, dropping failure report"
                );
            }
        }
    }
}

/// Background task forwarding queued reports to an inner sink.
pub struct SinkWorker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<u64>,
}

/// Spawn a worker that forwards reports to `inner`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_sink_worker<S>(inner: S, capacity: usize) -> (ChannelSink, SinkWorker)
where
    S: ObservabilitySink + 'static,
{
    let (sender, mut receiver) = mpsc::channel::<FailureReport>(capacity.max(1));
    let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let mut forwarded: u64 = 0;

        loop {
            tokio::select! {
                maybe_report = receiver.recv() => match maybe_report {
                    Some(report) => {
                        inner.capture(report);
                        forwarded += 1;
                    }
                    None => break,
                },
                _ = &mut shutdown_rx => {
                    // Stop accepting, then drain what is already queued
                    receiver.close();
                    while let Some(report) = receiver.recv().await {
                        inner.capture(report);
                        forwarded += 1;
                    }
                    break;
                }
            }
        }

        debug!(forwarded, "Observability worker stopped");
        forwarded
    });

    (ChannelSink { sender }, SinkWorker { shutdown, handle })
}

impl SinkWorker {
    /// Stop the worker after draining queued reports.
    ///
    /// Returns the total number of reports forwarded.
    pub async fn shutdown(self) -> TelemetryResult<u64> {
        // The worker may already have exited if every sender was dropped
        let _ = self.shutdown.send(());

        tokio::time::timeout(Duration::from_secs(WORKER_DRAIN_TIMEOUT_SECS), self.handle)
            .await
            .map_err(|_| TelemetryError::Timeout("observability worker did not drain".to_string()))?
            .map_err(|e| TelemetryError::Worker(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
