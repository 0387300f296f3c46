//! Conversion Rate Telemetry
//!
//! Failure observability for the calculation service.
//!
//! # Architecture
//!
//! ```text
//! Endpoint / Controller → ObservabilitySink → (channel) → SinkWorker → TracingSink
//! ```
//!
//! # Components
//!
//! - **Ports**: `ObservabilitySink` trait and the `FailureReport` it receives
//! - **Sinks**: tracing-backed sink, non-blocking channel sink with a
//!   background worker, fixed-tag decorator, no-op sink
//! - **Stub**: `RecordingSink` that keeps reports in memory for tests
//! - **Telemetry**: explicit init/teardown of the subscriber and sink worker
//!
//! # Example
//!
//! ```rust,ignore
//! use convrate_telemetry::{Telemetry, TelemetryConfig};
//!
//! let telemetry = Telemetry::init(TelemetryConfig::default())?;
//! let sink = telemetry.sink();
//! // ... hand `sink` to the API ...
//! telemetry.shutdown().await?;
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod ports;
pub mod sinks;
pub mod stub;
pub mod telemetry;

// Re-exports for convenience
pub use error::{TelemetryError, TelemetryResult};
pub use ports::{FailureReport, ObservabilitySink};
pub use sinks::{spawn_sink_worker, ChannelSink, NoopSink, SinkWorker, TaggedSink, TracingSink};
pub use stub::RecordingSink;
pub use telemetry::{
    install_subscriber, install_subscriber_with_writer, LogFormat, Telemetry, TelemetryConfig,
};
