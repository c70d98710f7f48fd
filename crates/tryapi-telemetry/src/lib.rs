//! # tryapi Telemetry
//!
//! Logging and OpenTelemetry tracing for tryapi.
//!
//! [`init_telemetry`] installs the global subscriber; [`trace_request_execution`]
//! records one span per executed request using the OpenTelemetry HTTP
//! semantic convention attribute names.

mod spans;
mod tracer;

pub use spans::{RequestSpanAttributes, trace_request_execution};
pub use tracer::{TelemetryOptions, init_telemetry, register_span_processor, tracer_provider};

/// Span attribute names.
pub mod attributes {
    // HTTP semantic conventions
    pub const HTTP_REQUEST_METHOD: &str = "http.request.method";
    pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";
    pub const URL_FULL: &str = "url.full";

    // tryapi attributes
    pub const TRYAPI_OPERATION_ID: &str = "tryapi.operation.id";
    pub const TRYAPI_OUTCOME: &str = "tryapi.outcome";
    pub const TRYAPI_ELAPSED_MS: &str = "tryapi.elapsed_ms";

    /// Instrumentation scope of the tracer
    pub const SYSTEM_NAME: &str = "tryapi";
}
