//! Conversion Rate Client
//!
//! Caller-side orchestration of a conversion rate calculation.
//!
//! # Architecture
//!
//! ```text
//! ConversionForm → ClientRequestController → validate → CalculationTransport → endpoint
//!                           │
//!                     RequestState (watch channel)
//! ```
//!
//! # Components
//!
//! - **Transport**: `CalculationTransport` port with an HTTP adapter and a stub
//! - **Controller**: one submission at a time, observable loading/error/result state
//! - **Form**: text field coercion and result rendering

#![warn(clippy::all)]

pub mod controller;
pub mod error;
pub mod form;
pub mod http;
pub mod stub;
pub mod transport;

// Re-exports for convenience
pub use controller::{ClientRequestController, RequestPhase, RequestState, FEATURE_TAG};
pub use error::{TransportError, TransportResult};
pub use form::{parse_field, ConversionForm};
pub use http::HttpTransport;
pub use stub::StubTransport;
pub use transport::CalculationTransport;
