//! HTTP API for the conversion rate daemon.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Conversion rate calculation
//!
//! Every failed calculation is reported to the observability sink exactly
//! once, before the response leaves the handler.

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, instrument, warn, Span};
use uuid::Uuid;

use convrate_domain::{
    validate, CalculateRequest, CalculateResponse, CalculationError, ErrorResponse,
    HealthResponse, CALCULATE_CONVERSION_PATH, ENDPOINT_TAG, GENERIC_SERVER_ERROR, HEALTH_PATH,
};
use convrate_engine::ConversionRateCalculator;
use convrate_telemetry::{FailureReport, ObservabilitySink};

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState {
    pub endpoint: CalculationEndpoint,
}

impl ApiState {
    /// Create state around a fresh endpoint.
    pub fn new(sink: Arc<dyn ObservabilitySink>) -> Self {
        Self {
            endpoint: CalculationEndpoint::new(sink),
        }
    }
}

// =============================================================================
// Calculation Endpoint
// =============================================================================

/// Translates a request body into a classified protocol response.
///
/// Holds no per-request state: the calculator is pure and the sink is the
/// only side effect.
pub struct CalculationEndpoint {
    calculator: ConversionRateCalculator,
    sink: Arc<dyn ObservabilitySink>,
}

/// Outcome of one calculation request.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointResponse {
    /// 200 with the rate
    Success(CalculateResponse),
    /// 4xx/5xx with a message
    Failure {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl EndpointResponse {
    /// HTTP status of this outcome.
    pub fn status(&self) -> StatusCode {
        match self {
            EndpointResponse::Success(_) => StatusCode::OK,
            EndpointResponse::Failure { status, .. } => *status,
        }
    }

    fn from_error(error: &CalculationError) -> Self {
        if error.is_client_error() {
            EndpointResponse::Failure {
                status: StatusCode::BAD_REQUEST,
                body: ErrorResponse::new(error.message()),
            }
        } else {
            // Internal detail stays in the report
            internal_failure_response()
        }
    }
}

impl IntoResponse for EndpointResponse {
    fn into_response(self) -> Response {
        match self {
            EndpointResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            EndpointResponse::Failure { status, body } => (status, Json(body)).into_response(),
        }
    }
}

fn internal_failure_response() -> EndpointResponse {
    EndpointResponse::Failure {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse::new(GENERIC_SERVER_ERROR),
    }
}

impl CalculationEndpoint {
    /// Create an endpoint reporting to `sink`.
    pub fn new(sink: Arc<dyn ObservabilitySink>) -> Self {
        Self {
            calculator: ConversionRateCalculator::new(),
            sink,
        }
    }

    /// The sink failures are reported to.
    pub fn sink(&self) -> Arc<dyn ObservabilitySink> {
        self.sink.clone()
    }

    /// Parse, validate and compute.
    ///
    /// A body that is not a JSON object is an `InternalFailure`. Non-numeric
    /// or negative counts are `InvalidInput`; zero visitors is `ZeroVisitors`.
    pub fn handle(&self, body: &[u8]) -> EndpointResponse {
        let request = match CalculateRequest::parse(body) {
            Ok(request) => request,
            Err(e) => {
                let error = CalculationError::internal(format!("Malformed request body: {}", e));
                return self.fail(error, &Value::Null, &Value::Null);
            }
        };

        let outcome = validate(request.to_input()).and_then(|input| self.calculator.compute(input));

        match outcome {
            Ok(result) => {
                debug!(rate = result.rate, "Conversion rate calculated");
                EndpointResponse::Success(CalculateResponse::from(result))
            }
            Err(error) => self.fail(error, &request.conversions, &request.visitors),
        }
    }

    /// Run one request inside its unit of work, including serialization.
    #[instrument(
        name = "calculate_conversion",
        skip_all,
        fields(request_id = %Uuid::now_v7(), status = tracing::field::Empty)
    )]
    pub fn respond(&self, body: &[u8]) -> Response {
        let outcome = self.handle(body);
        Span::current().record("status", outcome.status().as_u16());
        outcome.into_response()
    }

    fn fail(
        &self,
        error: CalculationError,
        conversions: &Value,
        visitors: &Value,
    ) -> EndpointResponse {
        warn!(
            error_type = %error.kind(),
            error = %error,
            %conversions,
            %visitors,
            "Conversion rate calculation failed"
        );

        self.sink.capture(
            FailureReport::new(error.clone())
                .with_tag("endpoint", ENDPOINT_TAG)
                .with_tag("error_type", error.kind().as_tag())
                .with_extra("conversions", conversions.clone())
                .with_extra("visitors", visitors.clone()),
        );

        EndpointResponse::from_error(&error)
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the API router with middleware.
pub fn create_router(state: Arc<ApiState>, cors_permissive: bool) -> Router {
    let sink = state.endpoint.sink();
    with_middleware(routes(state), sink, cors_permissive)
}

/// Routes without middleware.
pub fn routes(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(CALCULATE_CONVERSION_PATH, post(calculate_conversion_handler))
        .with_state(state)
}

/// Wrap a router with panic recovery, request tracing and CORS.
///
/// A panic anywhere below this layer is reported as `InternalFailure` and
/// answered with a generic 500.
pub fn with_middleware(
    router: Router,
    sink: Arc<dyn ObservabilitySink>,
    cors_permissive: bool,
) -> Router {
    let router = router
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(sink.as_ref(), panic)
        }))
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Calculate a conversion rate.
///
/// The body is taken raw so that malformed JSON is classified here instead
/// of being rejected by an extractor.
async fn calculate_conversion_handler(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Response {
    state.endpoint.respond(&body)
}

// =============================================================================
// Helpers
// =============================================================================

fn panic_response(sink: &dyn ObservabilitySink, panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Request handler panicked");

    let error = CalculationError::internal(format!("Handler panicked: {}", detail));
    sink.capture(
        FailureReport::new(error.clone())
            .with_tag("endpoint", ENDPOINT_TAG)
            .with_tag("error_type", error.kind().as_tag())
            .with_extra("conversions", Value::Null)
            .with_extra("visitors", Value::Null),
    );

    internal_failure_response().into_response()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use convrate_domain::{ErrorKind, INVALID_INPUT_MESSAGE, ZERO_VISITORS_MESSAGE};
    use convrate_telemetry::RecordingSink;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    fn create_test_app() -> (Router, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let state = Arc::new(ApiState::new(sink.clone()));
        (create_router(state, true), sink)
    }

    fn calculate_request(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(CALCULATE_CONVERSION_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = create_test_app();

        let request = Request::builder().uri(HEALTH_PATH).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_calculate_success() {
        let (app, sink) = create_test_app();

        let req = json!({ "conversions": 50, "visitors": 200 }).to_string();
        let (status, body) = send(app, calculate_request(req)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rate"].as_f64(), Some(25.0));
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_calculate_zero_conversions() {
        let (app, _) = create_test_app();

        let req = json!({ "conversions": 0, "visitors": 100 }).to_string();
        let (status, body) = send(app, calculate_request(req)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rate"].as_f64(), Some(0.0));
    }

    #[tokio::test]
    async fn test_calculate_zero_visitors() {
        let (app, sink) = create_test_app();

        let req = json!({ "conversions": 10, "visitors": 0 }).to_string();
        let (status, body) = send(app, calculate_request(req)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": ZERO_VISITORS_MESSAGE }));

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tag("endpoint"), Some("calculate-conversion"));
        assert_eq!(reports[0].tag("error_type"), Some("division_by_zero"));
        assert_eq!(reports[0].extra("conversions"), Some(&json!(10)));
        assert_eq!(reports[0].extra("visitors"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_calculate_negative_input() {
        let (app, sink) = create_test_app();

        let req = json!({ "conversions": -5, "visitors": 10 }).to_string();
        let (status, body) = send(app, calculate_request(req)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], INVALID_INPUT_MESSAGE);
        assert_eq!(sink.count_kind(ErrorKind::InvalidInput), 1);
    }

    #[tokio::test]
    async fn test_calculate_non_numeric_input() {
        let (app, sink) = create_test_app();

        let req = json!({ "conversions": "ten", "visitors": 10 }).to_string();
        let (status, body) = send(app, calculate_request(req)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], INVALID_INPUT_MESSAGE);
        assert_eq!(sink.reports()[0].extra("conversions"), Some(&json!("ten")));
    }

    #[tokio::test]
    async fn test_calculate_out_of_range_number() {
        let (app, sink) = create_test_app();

        let req = r#"{"conversions": 1e400, "visitors": 10}"#;
        let (status, body) = send(app, calculate_request(req)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], INVALID_INPUT_MESSAGE);

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tag("error_type"), Some("invalid_input"));
        assert_eq!(reports[0].extra("conversions"), Some(&json!("1e400")));
        assert_eq!(reports[0].extra("visitors"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn test_calculate_missing_field() {
        let (app, _) = create_test_app();

        let req = json!({ "conversions": 3 }).to_string();
        let (status, body) = send(app, calculate_request(req)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], INVALID_INPUT_MESSAGE);
    }

    #[tokio::test]
    async fn test_calculate_malformed_body() {
        let (app, sink) = create_test_app();

        let (status, body) = send(app, calculate_request("{ not json")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Something went wrong!" }));

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tag("error_type"), Some("internal_failure"));
        assert_eq!(reports[0].extra("visitors"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_calculate_is_idempotent() {
        let (app, _) = create_test_app();
        let req = json!({ "conversions": 7, "visitors": 9 }).to_string();

        let (_, first) = send(app.clone(), calculate_request(req.clone())).await;
        let (_, second) = send(app, calculate_request(req)).await;

        assert_eq!(first, second);
        assert_eq!(first["rate"].as_f64(), Some(77.78));
    }

    #[tokio::test]
    async fn test_panic_becomes_reported_server_error() {
        let sink = Arc::new(RecordingSink::new());
        let router = Router::new().route(
            CALCULATE_CONVERSION_PATH,
            post(|| async {
                if true {
                    panic!("calculator exploded");
                }
                StatusCode::OK
            }),
        );
        let app = with_middleware(router, sink.clone(), false);

        let (status, body) = send(app, calculate_request("{}")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Something went wrong!");

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].error.kind(), ErrorKind::InternalFailure);
        assert!(reports[0].error.message().contains("calculator exploded"));
    }

    #[test]
    fn test_endpoint_status_classification() {
        let sink = Arc::new(RecordingSink::new());
        let endpoint = CalculationEndpoint::new(sink.clone());

        assert_eq!(endpoint.handle(br#"{"conversions":1,"visitors":3}"#).status(), StatusCode::OK);
        assert_eq!(
            endpoint.handle(br#"{"conversions":1,"visitors":0}"#).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            endpoint.handle(br#"{"conversions":-1,"visitors":3}"#).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(endpoint.handle(b"[1, 2]").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(endpoint.handle(b"42").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(sink.count(), 4);
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let endpoint = CalculationEndpoint::new(Arc::new(RecordingSink::new()));

        match endpoint.handle(b"") {
            EndpointResponse::Failure { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body.error, GENERIC_SERVER_ERROR);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
