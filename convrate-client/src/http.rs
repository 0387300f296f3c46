//! HTTP transport for the calculation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::timeout;

use convrate_domain::{
    CalculateRequest, CalculateResponse, ErrorResponse, HealthResponse, RateInput, RateResult,
    CALCULATE_CONVERSION_PATH, HEALTH_PATH,
};

use crate::error::{TransportError, TransportResult, FALLBACK_FAILURE_MESSAGE};
use crate::transport::CalculationTransport;

// =============================================================================
// Constants
// =============================================================================

/// Default server address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// HTTP Transport
// =============================================================================

/// Talks to a `convrated` instance over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Server base URL (scheme + host + port)
    base_url: String,
    /// Per-request timeout
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Query the server's health check.
    pub async fn health(&self) -> TransportResult<HealthResponse> {
        let response = timeout(self.timeout, self.client.get(self.url(HEALTH_PATH)).send())
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::ParseError(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl CalculationTransport for HttpTransport {
    async fn submit(&self, input: RateInput) -> TransportResult<RateResult> {
        let request = CalculateRequest::from(input);

        let response = timeout(
            self.timeout,
            self.client
                .post(self.url(CALCULATE_CONVERSION_PATH))
                .json(&request)
                .send(),
        )
        .await
        .map_err(|_| TransportError::Timeout)?
        .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::ParseError(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .map(|err| err.error)
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| FALLBACK_FAILURE_MESSAGE.to_string());

            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        // `{"rate": null}` fails here instead of becoming NaN
        let parsed: CalculateResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::ParseError(e.to_string()))?;

        Ok(RateResult::new(parsed.rate))
    }
}

// =============================================================================
// Tests
// =============================================================================
