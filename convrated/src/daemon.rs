//! Daemon: process runtime around the calculation endpoint.
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Initialize telemetry (caller, see `main.rs`)
//! 3. Bind the API listener
//! 4. Serve until SIGINT
//! 5. Finish in-flight requests, then return so telemetry can drain

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use convrate_telemetry::ObservabilitySink;

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Daemon
// =============================================================================

/// The conversion rate daemon.
pub struct Daemon {
    /// Configuration
    config: Config,
    /// Failure reports from every request
    sink: Arc<dyn ObservabilitySink>,
}

impl Daemon {
    /// Create a daemon reporting failures to `sink`.
    pub fn new(config: Config, sink: Arc<dyn ObservabilitySink>) -> Self {
        Self { config, sink }
    }

    /// Build the fully layered router.
    pub fn router(&self) -> Router {
        let state = Arc::new(ApiState::new(self.sink.clone()));
        create_router(state, self.config.api.cors_permissive)
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            "Starting conversion rate daemon"
        );

        let (listener, api_addr) = self.bind().await?;
        info!(%api_addr, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        info!("API server stopped");
        Ok(())
    }

    /// Start the API server in the background.
    ///
    /// Returns the bound address; the server runs until the runtime stops.
    pub async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let (listener, local_addr) = self.bind().await?;
        let router = self.router();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "API server error");
            }
        });

        Ok(local_addr)
    }

    async fn bind(&self) -> DaemonResult<(TcpListener, SocketAddr)> {
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DaemonError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| DaemonError::Config(format!("Failed to get local address: {}", e)))?;

        Ok((listener, local_addr))
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

// =============================================================================
// Tests
// =============================================================================
