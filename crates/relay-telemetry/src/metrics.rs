//! Prometheus metrics for the relay.
//!
//! All metrics follow the naming convention: `pki_relay_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISPATCHER METRICS
    // =========================================================================

    /// Messages taken off a request or revoke queue
    pub static ref MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("pki_relay_messages_received_total", "Messages received from the work queue"),
        &["role"]
    ).expect("metric creation failed");

    /// Replies delivered to response queues
    pub static ref REPLIES_SENT: CounterVec = CounterVec::new(
        Opts::new("pki_relay_replies_sent_total", "Replies sent to response queues"),
        &["role", "outcome"]  // outcome: success/failure
    ).expect("metric creation failed");

    /// Failed receive attempts (each one triggers a backoff)
    pub static ref RECEIVE_FAILURES: CounterVec = CounterVec::new(
        Opts::new("pki_relay_receive_failures_total", "Failed long-poll receives"),
        &["role"]
    ).expect("metric creation failed");

    /// Messages acknowledged without a reply
    pub static ref MESSAGES_DROPPED: CounterVec = CounterVec::new(
        Opts::new(
            "pki_relay_messages_dropped_total",
            "Undecodable messages acknowledged without reply"
        ),
        &["role", "reason"]
    ).expect("metric creation failed");

    /// Current receive backoff
    pub static ref BACKOFF_DELAY_SECONDS: Gauge = Gauge::new(
        "pki_relay_backoff_delay_seconds",
        "Delay before the next receive attempt"
    ).expect("metric creation failed");

    /// Process + reply + acknowledge duration
    pub static ref CYCLE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "pki_relay_cycle_duration_seconds",
            "Time from message receipt to acknowledgement"
        ).buckets(exponential_buckets(0.005, 2.0, 12).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // CERTIFICATE AUTHORITY METRICS
    // =========================================================================

    /// Certificates issued
    pub static ref CERTIFICATES_ISSUED: Counter = Counter::new(
        "pki_relay_certificates_issued_total",
        "Client certificates issued"
    ).expect("metric creation failed");

    /// Certificates revoked
    pub static ref CERTIFICATES_REVOKED: Counter = Counter::new(
        "pki_relay_certificates_revoked_total",
        "Client certificates revoked"
    ).expect("metric creation failed");
}

/// Handle to the populated registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Dispatcher
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(REPLIES_SENT.clone()),
        Box::new(RECEIVE_FAILURES.clone()),
        Box::new(MESSAGES_DROPPED.clone()),
        Box::new(BACKOFF_DELAY_SECONDS.clone()),
        Box::new(CYCLE_DURATION.clone()),
        // Authority
        Box::new(CERTIFICATES_ISSUED.clone()),
        Box::new(CERTIFICATES_REVOKED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
