//! # Worker Configuration
//!
//! Runtime settings assembled from the command line and `PR_*` environment
//! variables, plus the per-subsystem configs derived from them.

use crate::handlers::BackoffConfig;
use pr_01_queue_transport::{SqsConfig, MAX_WAIT_SECONDS};
use pr_02_queue_resolver::{BackupTag, ResolverConfig};
use pr_03_certificate_authority::AuthorityConfig;
use shared_types::QueueRole;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Complete worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queue service region.
    pub region: String,
    /// IAM role the worker runs as. Scopes discovery to its account.
    pub role_arn: Option<String>,
    /// Explicit request queue address.
    pub request_url: Option<String>,
    /// Explicit revocation queue address.
    pub revoke_url: Option<String>,
    /// Long-poll wait per receive.
    pub wait: Duration,
    /// Queue service endpoint override (local emulators).
    pub sqs_endpoint: Option<String>,
    /// Sign queue service requests.
    pub sign_requests: bool,
    /// PKI directory of the certificate authority.
    pub pki_dir: PathBuf,
    /// Tag of the backup container holding fallback queue addresses.
    pub backup_tag: Option<BackupTag>,
    /// Directory whose subdirectories are backup containers.
    pub backup_root: Option<PathBuf>,
    /// Receive backoff bounds.
    pub backoff: BackoffConfig,
    /// Verbose logging.
    pub debug: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            role_arn: None,
            request_url: None,
            revoke_url: None,
            wait: Duration::from_secs(MAX_WAIT_SECONDS),
            sqs_endpoint: None,
            sign_requests: true,
            pki_dir: AuthorityConfig::default().pki_dir,
            backup_tag: None,
            backup_root: None,
            backoff: BackoffConfig::default(),
            debug: false,
        }
    }
}

impl WorkerConfig {
    /// Check the settings before anything is constructed from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        if self.wait > Duration::from_secs(MAX_WAIT_SECONDS) {
            return Err(ConfigError::WaitTooLong(self.wait.as_secs()));
        }
        if self.backup_tag.is_some() && self.backup_root.is_none() {
            return Err(ConfigError::BackupRootMissing);
        }
        if self.backoff.base.is_zero() || self.backoff.base > self.backoff.max {
            return Err(ConfigError::InvalidBackoff);
        }
        Ok(())
    }

    /// Apply `PR_*` environment overrides.
    ///
    /// - `PR_PKI_DIR`: PKI directory
    /// - `PR_BACKUP_ROOT`: backup container root
    /// - `PR_SQS_UNSIGNED`: `1`/`true` disables request signing
    /// - `PR_BACKOFF_BASE_MS` / `PR_BACKOFF_MAX_MS`: receive backoff bounds
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("PR_PKI_DIR") {
            self.pki_dir = PathBuf::from(dir);
        }
        if let Ok(root) = std::env::var("PR_BACKUP_ROOT") {
            info!(root = %root, "[worker] Backup store root from environment");
            self.backup_root = Some(PathBuf::from(root));
        }
        if let Ok(flag) = std::env::var("PR_SQS_UNSIGNED") {
            if flag == "1" || flag.eq_ignore_ascii_case("true") {
                self.sign_requests = false;
            }
        }
        if let Some(ms) = env_millis("PR_BACKOFF_BASE_MS") {
            self.backoff.base = ms;
        }
        if let Some(ms) = env_millis("PR_BACKOFF_MAX_MS") {
            self.backoff.max = ms;
        }
        self
    }

    /// Explicit address for `role`, if one was given.
    pub fn override_for(&self, role: QueueRole) -> Option<&str> {
        match role {
            QueueRole::Request => self.request_url.as_deref(),
            QueueRole::Revoke => self.revoke_url.as_deref(),
        }
    }

    /// Queue service client settings.
    pub fn sqs_config(&self) -> SqsConfig {
        SqsConfig {
            service_endpoint: self.sqs_endpoint.clone(),
            sign_requests: self.sign_requests,
            ..SqsConfig::for_region(self.region.clone())
        }
    }

    /// Resolver settings.
    pub fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig {
            backup_tag: self.backup_tag.clone(),
            ..ResolverConfig::default()
        };
        if let Some(arn) = &self.role_arn {
            config = config.with_role_arn(arn);
            if config.account_scope.is_none() {
                warn!(
                    role_arn = %arn,
                    "[worker] Role ARN has no account id, discovery is unscoped"
                );
            }
        }
        config
    }

    /// Certificate authority settings.
    pub fn authority_config(&self) -> AuthorityConfig {
        AuthorityConfig::with_pki_dir(self.pki_dir.clone())
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!(variable = name, value = %raw, "[worker] Ignoring non-numeric override");
            None
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No region was given.
    MissingRegion,
    /// Long-poll wait above the service maximum.
    WaitTooLong(u64),
    /// A backup tag was given without a store to search.
    BackupRootMissing,
    /// Backoff bounds are zero or inverted.
    InvalidBackoff,
    /// `--backup-bucket-tag` is not `key=value`.
    InvalidBackupTag(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingRegion => write!(f, "an AWS region is required (--aws-region)"),
            ConfigError::WaitTooLong(secs) => write!(
                f,
                "--timeout must be at most {} seconds, got {}",
                MAX_WAIT_SECONDS, secs
            ),
            ConfigError::BackupRootMissing => write!(
                f,
                "--backup-bucket-tag needs a backup store; set PR_BACKUP_ROOT"
            ),
            ConfigError::InvalidBackoff => {
                write!(f, "backoff base must be non-zero and not above the maximum")
            }
            ConfigError::InvalidBackupTag(raw) => {
                write!(f, "backup bucket tag '{}' must have the form key=value", raw)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
