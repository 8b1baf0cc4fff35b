//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive)
    pub log_level: String,

    /// Force `debug` regardless of `log_level`
    pub debug: bool,

    /// Whether to write logs to stderr
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "pki-relay".to_string(),
            log_level: "info".to_string(),
            debug: false,
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PR_SERVICE_NAME`: Service name (default: pki-relay)
    /// - `PR_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `PR_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `PR_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("PR_SERVICE_NAME").unwrap_or_else(|_| "pki-relay".to_string()),

            log_level: env::var("PR_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            debug: false,

            console_output: env::var("PR_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("PR_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Same config with `--debug` applied.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Name the worker in the service name, e.g. `pki-relay-request`.
    pub fn for_worker(mut self, role: &str) -> Self {
        self.service_name = format!("{}-{}", self.service_name, role);
        self
    }

    /// The filter directive actually installed.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}
