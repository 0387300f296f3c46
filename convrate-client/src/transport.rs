//! Calculation transport port.
//!
//! Implementations:
//! - `HttpTransport` - POSTs to a running daemon
//! - `StubTransport` - For testing (in-process calculator, scripted failures)

use async_trait::async_trait;

use convrate_domain::{RateInput, RateResult};

use crate::error::TransportResult;

/// Port for submitting one calculation to the endpoint.
#[async_trait]
pub trait CalculationTransport: Send + Sync {
    /// Submit validated input and wait for the endpoint's answer.
    ///
    /// One call is one request. No retries, no cancellation.
    async fn submit(&self, input: RateInput) -> TransportResult<RateResult>;
}
