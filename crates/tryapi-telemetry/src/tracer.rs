//! Tracer setup and management

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{SimpleSpanProcessor, TracerProvider};
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when neither `RUST_LOG` nor the options name one
const DEFAULT_FILTER: &str = "warn";

/// Global tracer provider holder
static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Global span processor builders (registered before initialization)
type ProcessorBuilder = Box<dyn FnOnce() -> SimpleSpanProcessor + Send>;
static SPAN_PROCESSOR_BUILDERS: Mutex<Option<Vec<ProcessorBuilder>>> = Mutex::new(Some(Vec::new()));

/// How logs are written.
#[derive(Debug, Clone, Default)]
pub struct TelemetryOptions {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub log_filter: Option<String>,
    /// One JSON object per line instead of human-readable text
    pub json: bool,
}

/// Register a span processor builder to be used when telemetry is initialized.
///
/// Must be called before [`init_telemetry`]; later registrations are ignored.
pub fn register_span_processor(builder: ProcessorBuilder) {
    let Ok(mut builders) = SPAN_PROCESSOR_BUILDERS.lock() else {
        tracing::warn!("Span processor registry is poisoned");
        return;
    };

    if let Some(ref mut vec) = *builders {
        vec.push(builder);
    } else {
        tracing::warn!("Attempted to register span processor after telemetry initialization");
    }
}

/// Initialize logging and OpenTelemetry tracing.
///
/// Logs go to stderr so command output on stdout stays clean. Calling this
/// more than once keeps the first subscriber.
///
/// # Example
///
/// ```rust,no_run
/// use tryapi_telemetry::{TelemetryOptions, init_telemetry};
///
/// init_telemetry(&TelemetryOptions::default());
/// ```
pub fn init_telemetry(options: &TelemetryOptions) {
    // Take the span processor builders (can only initialize once)
    let builders = SPAN_PROCESSOR_BUILDERS
        .lock()
        .ok()
        .and_then(|mut builders| builders.take())
        .unwrap_or_default();

    // Build tracer provider with registered processors
    let mut provider_builder = TracerProvider::builder();
    for builder in builders {
        provider_builder = provider_builder.with_span_processor(builder());
    }
    let tracer_provider = provider_builder.build();
    let tracer = tracer_provider.tracer(crate::attributes::SYSTEM_NAME);
    let _ = TRACER_PROVIDER.set(Arc::new(tracer_provider));

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
    let filter = env_filter(options.log_filter.as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    let registry = tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(filter);
    let result = if options.json {
        registry.with(fmt_layer.json()).try_init()
    } else {
        registry.with(fmt_layer).try_init()
    };
    if let Err(e) = result {
        tracing::debug!("Telemetry already initialized: {}", e);
    }
}

fn env_filter(log_filter: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Get the global tracer provider if initialized
pub fn tracer_provider() -> Option<Arc<TracerProvider>> {
    TRACER_PROVIDER.get().cloned()
}
