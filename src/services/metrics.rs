use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
static STYTCH_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let request_duration = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let stytch_requests_total = IntCounterVec::new(
        Opts::new(
            "stytch_requests_total",
            "Outbound Stytch API calls by operation and result",
        ),
        &["operation", "result"],
    )
    .expect("metric can be created");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(request_duration.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(stytch_requests_total.clone()))
        .expect("collector can be registered");

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = STYTCH_REQUESTS_TOTAL.set(stytch_requests_total);
}

/// No-op until [`init_metrics`] has run, so library use and tests never
/// touch a half-built registry.
pub fn observe_http_request(method: &str, path: &str, status: &str, seconds: f64) {
    if let Some(requests_total) = HTTP_REQUESTS_TOTAL.get() {
        requests_total
            .with_label_values(&[method, path, status])
            .inc();
    }
    if let Some(request_duration) = HTTP_REQUEST_DURATION_SECONDS.get() {
        request_duration
            .with_label_values(&[method, path, status])
            .observe(seconds);
    }
}

pub fn observe_stytch_request(operation: &str, result: &str) {
    if let Some(stytch_requests_total) = STYTCH_REQUESTS_TOTAL.get() {
        stytch_requests_total
            .with_label_values(&[operation, result])
            .inc();
    }
}

pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
