//! Stub transport for testing.
//!
//! Answers in-process with the real calculator and classifies outcomes the
//! way the daemon does, so controller tests see realistic rejections without
//! a network.

use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use convrate_domain::{validate, CalculationError, RateInput, RateResult, GENERIC_SERVER_ERROR};
use convrate_engine::ConversionRateCalculator;

use crate::error::{TransportError, TransportResult};
use crate::transport::CalculationTransport;

/// Stub transport for testing.
pub struct StubTransport {
    /// Calculator standing in for the endpoint
    calculator: ConversionRateCalculator,
    /// Number of submissions received
    calls: RwLock<u64>,
    /// Delays applied to upcoming submissions, in order
    delays: RwLock<VecDeque<Duration>>,
    /// Error returned by the next submission instead of calculating
    fail_next: RwLock<Option<TransportError>>,
    /// Raw rate returned by the next submission instead of calculating
    rate_override: RwLock<Option<f64>>,
}

impl StubTransport {
    /// Create a new stub transport.
    pub fn new() -> Self {
        Self {
            calculator: ConversionRateCalculator::new(),
            calls: RwLock::new(0),
            delays: RwLock::new(VecDeque::new()),
            fail_next: RwLock::new(None),
            rate_override: RwLock::new(None),
        }
    }

    /// Number of submissions received so far.
    pub fn call_count(&self) -> u64 {
        *self.calls.read().unwrap()
    }

    /// Delay the next not-yet-started submission.
    pub fn push_delay(&self, delay: Duration) {
        self.delays.write().unwrap().push_back(delay);
    }

    /// Make the next submission fail with `error`.
    pub fn set_fail_next(&self, error: TransportError) {
        *self.fail_next.write().unwrap() = Some(error);
    }

    /// Make the next submission answer with this raw rate.
    pub fn set_rate_next(&self, rate: f64) {
        *self.rate_override.write().unwrap() = Some(rate);
    }

    fn respond(&self, input: RateInput) -> TransportResult<RateResult> {
        match validate(input).and_then(|valid| self.calculator.compute(valid)) {
            Ok(rate) => Ok(rate),
            Err(CalculationError::InternalFailure(_)) => Err(TransportError::Rejected {
                status: 500,
                message: GENERIC_SERVER_ERROR.to_string(),
            }),
            Err(err) => Err(TransportError::Rejected {
                status: 400,
                message: err.message().to_string(),
            }),
        }
    }
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalculationTransport for StubTransport {
    async fn submit(&self, input: RateInput) -> TransportResult<RateResult> {
        *self.calls.write().unwrap() += 1;

        let delay = self.delays.write().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.fail_next.write().unwrap().take() {
            return Err(error);
        }

        if let Some(rate) = self.rate_override.write().unwrap().take() {
            return Ok(RateResult::new(rate));
        }

        self.respond(input)
    }
}
