//! Conversion Rate Daemon
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration
//! cargo run -p convrated
//!
//! # Start with custom environment
//! CONVRATE_ENV=production CONVRATE_API_PORT=8081 cargo run -p convrated
//! ```
//!
//! # Environment Variables
//!
//! - `CONVRATE_ENV`: Environment (test, development, production)
//! - `CONVRATE_API_HOST`: API host (default: 0.0.0.0)
//! - `CONVRATE_API_PORT`: API port (default: `PORT`, then 5001)
//! - `CONVRATE_CORS_PERMISSIVE`: Allow any origin (default: true)
//! - `CONVRATE_LOG_FORMAT`: pretty or json (default: pretty)
//! - `CONVRATE_TELEMETRY`: log or off (default: log)
//! - `CONVRATE_TELEMETRY_BUFFER`: Report queue capacity (default: 1024)

use convrate_telemetry::Telemetry;
use convrated::{Config, Daemon};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing and the failure sink
    let telemetry = Telemetry::init(config.telemetry.clone())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        "Conversion rate daemon"
    );

    let daemon = Daemon::new(config, telemetry.sink());
    let outcome = daemon.run().await;

    if let Err(e) = &outcome {
        error!(error = %e, "Daemon stopped with an error");
    }

    // Drain queued reports even when the server failed
    telemetry.shutdown().await?;
    outcome?;

    Ok(())
}
