//! Client request controller.
//!
//! Drives one submission through `Idle → Loading → {Succeeded, Failed}` and
//! publishes every transition on a `watch` channel.
//!
//! # Overlapping submissions
//!
//! A new call resets the state as soon as it starts. Superseded calls are not
//! cancelled; whichever call completes last writes the final state, and every
//! completion writes a terminal state, so `is_loading` never stays `true`
//! once all calls have finished.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument};

use convrate_domain::{validate, CalculationError, CalculationResult, RateInput, RateResult};
use convrate_telemetry::{FailureReport, ObservabilitySink};

use crate::transport::CalculationTransport;

/// Value of the `feature` tag on client failure reports.
pub const FEATURE_TAG: &str = "conversion-calculator";

// =============================================================================
// Request State
// =============================================================================

/// Phase derived from a [`RequestState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// No attempt yet (or just reset by a new submission)
    Idle,
    /// Waiting for the endpoint
    Loading,
    /// Rate available
    Succeeded,
    /// Error available
    Failed,
}

/// Observable state of the controller.
///
/// After a completed cycle exactly one of `rate` / `error` is set. Both are
/// `None` before the first attempt and while loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    /// Last successful rate
    pub rate: Option<RateResult>,
    /// Last failure
    pub error: Option<CalculationError>,
    /// A request is in flight
    pub is_loading: bool,
}

impl RequestState {
    fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    fn succeeded(rate: RateResult) -> Self {
        Self {
            rate: Some(rate),
            ..Self::default()
        }
    }

    fn failed(error: CalculationError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RequestPhase {
        match (self.is_loading, &self.rate, &self.error) {
            (true, _, _) => RequestPhase::Loading,
            (false, _, Some(_)) => RequestPhase::Failed,
            (false, Some(_), None) => RequestPhase::Succeeded,
            (false, None, None) => RequestPhase::Idle,
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Orchestrates calculation requests for a single caller.
pub struct ClientRequestController<T: CalculationTransport + ?Sized> {
    /// Endpoint transport
    transport: Arc<T>,
    /// Failure reports
    sink: Arc<dyn ObservabilitySink>,
    /// Published state
    state: watch::Sender<RequestState>,
}

impl<T: CalculationTransport + ?Sized> ClientRequestController<T> {
    /// Create a controller in the `Idle` state.
    pub fn new(transport: Arc<T>, sink: Arc<dyn ObservabilitySink>) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            transport,
            sink,
            state,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Shorthand for `state().is_loading`.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Validate and submit one calculation.
    ///
    /// Invalid input fails immediately without contacting the endpoint and
    /// without a failure report. Endpoint failures are reported with the
    /// `feature` tag before the state is updated.
    #[instrument(name = "calculate_rate", skip(self))]
    pub async fn calculate_rate(
        &self,
        conversions: f64,
        visitors: f64,
    ) -> CalculationResult<RateResult> {
        self.state.send_replace(RequestState::default());

        let input = match validate(RateInput::new(conversions, visitors)) {
            Ok(input) => input,
            Err(error) => {
                debug!(%error, "Rejected before submission");
                self.state.send_replace(RequestState::failed(error.clone()));
                return Err(error);
            }
        };

        self.state.send_replace(RequestState::loading());

        let outcome = self
            .transport
            .submit(input)
            .await
            .map_err(CalculationError::from)
            .and_then(ensure_finite);

        match outcome {
            Ok(rate) => {
                info!(rate = rate.rate, "Conversion rate calculated");
                self.state.send_replace(RequestState::succeeded(rate));
                Ok(rate)
            }
            Err(error) => {
                self.sink.capture(
                    FailureReport::new(error.clone())
                        .with_tag("feature", FEATURE_TAG)
                        .with_tag("error_type", error.kind().as_tag())
                        .with_extra("conversions", conversions)
                        .with_extra("visitors", visitors),
                );
                self.state.send_replace(RequestState::failed(error.clone()));
                Err(error)
            }
        }
    }
}

/// A rate that is not a finite number never reaches the state.
fn ensure_finite(rate: RateResult) -> CalculationResult<RateResult> {
    if rate.rate.is_finite() {
        Ok(rate)
    } else {
        Err(CalculationError::internal(format!(
            "Received an invalid conversion rate: {}",
            rate.rate
        )))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::stub::StubTransport;
    use convrate_domain::ErrorKind;
    use convrate_telemetry::RecordingSink;
    use std::time::Duration;

    fn setup() -> (
        Arc<ClientRequestController<StubTransport>>,
        Arc<StubTransport>,
        Arc<RecordingSink>,
    ) {
        let transport = Arc::new(StubTransport::new());
        let sink = Arc::new(RecordingSink::new());
        let controller = Arc::new(ClientRequestController::new(transport.clone(), sink.clone()));
        (controller, transport, sink)
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (controller, _, _) = setup();
        let state = controller.state();

        assert_eq!(state.phase(), RequestPhase::Idle);
        assert!(state.rate.is_none());
        assert!(state.error.is_none());
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_successful_calculation() {
        let (controller, transport, sink) = setup();

        let rate = controller.calculate_rate(50.0, 200.0).await.unwrap();

        assert_eq!(rate, RateResult::new(25.0));
        let state = controller.state();
        assert_eq!(state.phase(), RequestPhase::Succeeded);
        assert_eq!(state.rate, Some(RateResult::new(25.0)));
        assert!(state.error.is_none());
        assert!(!state.is_loading);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_negative_input_fails_without_network_call() {
        let (controller, transport, sink) = setup();

        let err = controller.calculate_rate(-5.0, 10.0).await.unwrap_err();

        assert_eq!(err, CalculationError::invalid_input());
        assert_eq!(controller.state().phase(), RequestPhase::Failed);
        assert_eq!(transport.call_count(), 0);
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_non_finite_input_fails_without_network_call() {
        let (controller, transport, _) = setup();

        let err = controller.calculate_rate(f64::NAN, 10.0).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_visitors_reaches_endpoint_and_is_reported() {
        let (controller, transport, sink) = setup();

        let err = controller.calculate_rate(5.0, 0.0).await.unwrap_err();

        assert_eq!(err, CalculationError::zero_visitors());
        assert_eq!(transport.call_count(), 1);

        let state = controller.state();
        assert_eq!(state.phase(), RequestPhase::Failed);
        assert!(state.rate.is_none());
        assert!(!state.is_loading);

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tag("feature"), Some("conversion-calculator"));
        assert_eq!(reports[0].extra("conversions"), Some(&serde_json::json!(5.0)));
        assert_eq!(reports[0].extra("visitors"), Some(&serde_json::json!(0.0)));
    }

    #[tokio::test]
    async fn test_non_finite_rate_never_reaches_state() {
        let (controller, transport, sink) = setup();
        transport.set_rate_next(f64::INFINITY);

        let err = controller.calculate_rate(5.0, 1.0).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InternalFailure);
        assert!(controller.state().rate.is_none());
        assert_eq!(sink.count_kind(ErrorKind::InternalFailure), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_message_is_surfaced() {
        let (controller, transport, _) = setup();
        transport.set_fail_next(TransportError::RequestFailed("connection refused".to_string()));

        let err = controller.calculate_rate(1.0, 2.0).await.unwrap_err();

        assert_eq!(err, CalculationError::internal("connection refused"));
        assert_eq!(controller.state().error, Some(err));
    }

    #[tokio::test]
    async fn test_new_submission_clears_previous_outcome() {
        let (controller, _, _) = setup();

        controller.calculate_rate(10.0, 0.0).await.unwrap_err();
        assert!(controller.state().error.is_some());

        controller.calculate_rate(1.0, 4.0).await.unwrap();
        let state = controller.state();
        assert!(state.error.is_none());
        assert_eq!(state.rate, Some(RateResult::new(25.0)));
    }

    #[tokio::test]
    async fn test_loading_state_is_observable() {
        let (controller, transport, _) = setup();
        transport.push_delay(Duration::from_millis(50));
        let mut updates = controller.subscribe();

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.calculate_rate(1.0, 2.0).await })
        };

        let loading = updates
            .wait_for(|state| state.is_loading)
            .await
            .unwrap()
            .clone();
        assert!(loading.rate.is_none());
        assert!(loading.error.is_none());
        assert_eq!(loading.phase(), RequestPhase::Loading);

        task.await.unwrap().unwrap();
        assert_eq!(controller.state().phase(), RequestPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_last_completion_wins_and_loading_clears() {
        let (controller, transport, _) = setup();

        // First submission is slow, second is fast
        transport.push_delay(Duration::from_millis(200));
        transport.push_delay(Duration::from_millis(10));

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.calculate_rate(1.0, 2.0).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = controller.calculate_rate(1.0, 4.0).await.unwrap();
        assert_eq!(fast, RateResult::new(25.0));

        slow.await.unwrap().unwrap();

        let state = controller.state();
        assert_eq!(state.rate, Some(RateResult::new(50.0)));
        assert!(!state.is_loading);
        assert_eq!(transport.call_count(), 2);
    }
}
