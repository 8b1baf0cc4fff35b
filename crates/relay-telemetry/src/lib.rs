//! # Relay Telemetry
//!
//! Logging and metrics for the PKI relay.
//!
//! ## Components
//!
//! - **Logs**: `tracing` with an `EnvFilter`, pretty for terminals or JSON
//!   for log shippers
//! - **Metrics**: Prometheus counters in a process registry, rendered with
//!   [`gather_metrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PR_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `PR_JSON_LOGS` | `false` | Emit JSON log lines |
//! | `PR_CONSOLE_OUTPUT` | `true` | Write logs to stderr at all |
//! | `PR_SERVICE_NAME` | `pki-relay` | Service name attached to startup logs |

#![warn(missing_docs)]

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, BACKOFF_DELAY_SECONDS, CERTIFICATES_ISSUED,
    CERTIFICATES_REVOKED, CYCLE_DURATION, MESSAGES_DROPPED, MESSAGES_RECEIVED, RECEIVE_FAILURES,
    REPLIES_SENT,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The log filter directive did not parse.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install the log subscriber and register metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first so nothing logged during subscriber setup is uncounted.
    let metrics_handle = register_metrics()?;

    tracing_setup::init_tracing(&config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.effective_log_level(),
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
