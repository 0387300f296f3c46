//! Conversion Rate Daemon Library
//!
//! HTTP service that turns conversion and visitor counts into a rounded
//! conversion rate percentage.
//!
//! # Architecture
//!
//! ```text
//! HTTP → CatchPanic → Trace → CalculationEndpoint → validate → ConversionRateCalculator
//!                                      │
//!                              ObservabilitySink (failures only)
//! ```
//!
//! # Components
//!
//! - **Daemon**: Binds the listener and serves until shutdown
//! - **API**: Health check and the calculation endpoint
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use convrated::{Config, Daemon};
//! use convrate_telemetry::Telemetry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let telemetry = Telemetry::init(config.telemetry.clone())?;
//!     Daemon::new(config, telemetry.sink()).run().await?;
//!     telemetry.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;

// Re-exports for convenience
pub use api::{create_router, ApiState, CalculationEndpoint, EndpointResponse};
pub use config::{ApiConfig, Config, Environment};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
