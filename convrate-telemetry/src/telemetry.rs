//! Telemetry lifecycle.
//!
//! Process-wide observability setup is an explicit value: `Telemetry::init`
//! installs the tracing subscriber and starts the sink worker, and
//! `Telemetry::shutdown` drains it. Nothing here runs at module load.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

use crate::error::{TelemetryError, TelemetryResult};
use crate::ports::ObservabilitySink;
use crate::sinks::{spawn_sink_worker, NoopSink, SinkWorker, TaggedSink, TracingSink};

// =============================================================================
// Configuration
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(TelemetryError::InvalidLogFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Forward failure reports (false = discard them)
    pub enabled: bool,
    /// Attached to every report as the `environment` tag
    pub environment: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Capacity of the report queue
    pub buffer: usize,
    /// Filter directive added on top of `RUST_LOG`
    pub default_directive: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
            buffer: 1024,
            default_directive: "convrated=info".to_string(),
        }
    }
}

// =============================================================================
// Telemetry
// =============================================================================

/// Running telemetry: the sink handed to the service, and its worker.
pub struct Telemetry {
    sink: Arc<dyn ObservabilitySink>,
    worker: Option<SinkWorker>,
    environment: String,
}

impl Telemetry {
    /// Install the global tracing subscriber, then start the sink.
    ///
    /// Call once per process, from within a tokio runtime.
    pub fn init(config: TelemetryConfig) -> TelemetryResult<Self> {
        install_subscriber(config.log_format, &config.default_directive)?;
        let telemetry = Self::start(config);

        info!(
            environment = %telemetry.environment,
            "Telemetry is {}",
            if telemetry.is_enabled() { "enabled" } else { "disabled" }
        );

        Ok(telemetry)
    }

    /// Start the sink without touching the global subscriber.
    pub fn start(config: TelemetryConfig) -> Self {
        if !config.enabled {
            return Self {
                sink: Arc::new(NoopSink),
                worker: None,
                environment: config.environment,
            };
        }

        let (channel, worker) = spawn_sink_worker(TracingSink, config.buffer);
        let sink = TaggedSink::new(channel).with_tag("environment", config.environment.clone());

        Self {
            sink: Arc::new(sink),
            worker: Some(worker),
            environment: config.environment,
        }
    }

    /// The sink to inject into the endpoint and controllers.
    pub fn sink(&self) -> Arc<dyn ObservabilitySink> {
        self.sink.clone()
    }

    /// Whether reports are forwarded.
    pub fn is_enabled(&self) -> bool {
        self.worker.is_some()
    }

    /// Drain queued reports and stop the worker.
    ///
    /// Returns the number of reports forwarded over the lifetime.
    pub async fn shutdown(self) -> TelemetryResult<u64> {
        match self.worker {
            Some(worker) => {
                let forwarded = worker.shutdown().await?;
                info!(forwarded, "Telemetry shut down");
                Ok(forwarded)
            }
            None => Ok(0),
        }
    }
}

/// Install the global `tracing` subscriber, writing to stdout.
///
/// `RUST_LOG` is honored; `default_directive` is added on top of it.
pub fn install_subscriber(format: LogFormat, default_directive: &str) -> TelemetryResult<()> {
    install_subscriber_with_writer(format, default_directive, std::io::stdout)
}

/// Install the global `tracing` subscriber with a custom writer.
///
/// Command-line tools pass `std::io::stderr` so that logs stay out of their
/// output.
pub fn install_subscriber_with_writer<W>(
    format: LogFormat,
    default_directive: &str,
    writer: W,
) -> TelemetryResult<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let directive: Directive = default_directive
        .parse()
        .map_err(|_| TelemetryError::InvalidDirective(default_directive.to_string()))?;

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(fmt_layer::layer().with_writer(writer)), None),
        LogFormat::Json => (None, Some(fmt_layer::layer().json().with_writer(writer))),
    };

    tracing_subscriber::registry()
        .with(pretty)
        .with(json)
        .with(EnvFilter::from_default_env().add_directive(directive))
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

// =============================================================================
// Tests
// =============================================================================
