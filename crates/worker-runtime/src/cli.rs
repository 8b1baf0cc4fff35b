//! # Command Line
//!
//! `pki-relay <command> --aws-region <region> [options]`

use crate::container::{ConfigError, WorkerConfig};
use clap::{Args, Parser, Subcommand};
use pr_01_queue_transport::MAX_WAIT_SECONDS;
use pr_02_queue_resolver::BackupTag;
use shared_types::QueueRole;
use std::path::PathBuf;
use std::time::Duration;

/// Queue-driven client certificate issuance
#[derive(Parser, Debug)]
#[command(name = "pki-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// What to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Issue certificates for requests on the request queue
    ProcessRequests(WorkerArgs),
    /// Revoke certificates for requests on the revocation queue
    ProcessRevokes(WorkerArgs),
    /// Ask a running worker for a certificate
    SubmitRequest(SubmitArgs),
    /// Ask a running worker to revoke a certificate
    SubmitRevoke(SubmitArgs),
}

impl Command {
    /// Queue role the command works against.
    pub fn role(&self) -> QueueRole {
        match self {
            Command::ProcessRequests(_) | Command::SubmitRequest(_) => QueueRole::Request,
            Command::ProcessRevokes(_) | Command::SubmitRevoke(_) => QueueRole::Revoke,
        }
    }

    /// Options shared by every command.
    pub fn worker_args(&self) -> &WorkerArgs {
        match self {
            Command::ProcessRequests(args) | Command::ProcessRevokes(args) => args,
            Command::SubmitRequest(args) | Command::SubmitRevoke(args) => &args.worker,
        }
    }
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct WorkerArgs {
    /// Region of the queue service
    #[arg(long, env = "AWS_REGION")]
    pub aws_region: String,

    /// IAM role the worker runs as; discovery is limited to its account
    #[arg(long)]
    pub role_arn: Option<String>,

    /// Request queue URL, skipping discovery
    #[arg(long)]
    pub request_url: Option<String>,

    /// Revocation queue URL, skipping discovery
    #[arg(long)]
    pub revoke_url: Option<String>,

    /// Long-poll wait in seconds
    #[arg(long, default_value_t = MAX_WAIT_SECONDS,
          value_parser = clap::value_parser!(u64).range(0..=MAX_WAIT_SECONDS))]
    pub timeout: u64,

    /// Queue service endpoint, e.g. a local emulator
    #[arg(long, env = "PR_SQS_ENDPOINT")]
    pub sqs_endpoint: Option<String>,

    /// PKI directory of the certificate authority
    #[arg(long)]
    pub pki_dir: Option<PathBuf>,

    /// Tag (key=value) of the backup bucket holding fallback queue URLs
    #[arg(long)]
    pub backup_bucket_tag: Option<String>,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,
}

impl WorkerArgs {
    /// Defaults, then `PR_*` environment, then flags.
    pub fn to_config(&self) -> Result<WorkerConfig, ConfigError> {
        let mut config = WorkerConfig::default().apply_env_overrides();

        config.region = self.aws_region.clone();
        config.role_arn = self.role_arn.clone();
        config.request_url = self.request_url.clone();
        config.revoke_url = self.revoke_url.clone();
        config.wait = Duration::from_secs(self.timeout);
        config.debug = self.debug;
        if let Some(endpoint) = &self.sqs_endpoint {
            config.sqs_endpoint = Some(endpoint.clone());
        }
        if let Some(dir) = &self.pki_dir {
            config.pki_dir = dir.clone();
        }
        if let Some(raw) = &self.backup_bucket_tag {
            let tag = BackupTag::parse(raw)
                .ok_or_else(|| ConfigError::InvalidBackupTag(raw.clone()))?;
            config.backup_tag = Some(tag);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Options for the submit commands.
#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Shared options
    #[command(flatten)]
    pub worker: WorkerArgs,

    /// Identity to act on
    #[arg(long)]
    pub username: String,

    /// Queue URL the reply should be sent to
    #[arg(long)]
    pub response_url: String,

    /// How long to wait for the reply, in seconds
    #[arg(long, default_value = "60")]
    pub reply_timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("pki-relay").chain(args.iter().copied()))
    }

    #[test]
    fn test_process_requests_defaults() {
        let cli = parse(&["process-requests", "--aws-region", "eu-west-1"]).unwrap();
        assert_eq!(cli.command.role(), QueueRole::Request);

        let config = cli.command.worker_args().to_config().unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.wait, Duration::from_secs(20));
        assert!(config.request_url.is_none());
    }

    #[test]
    fn test_timeout_above_limit_is_rejected() {
        assert!(parse(&["process-revokes", "--aws-region", "x", "--timeout", "21"]).is_err());
        let cli = parse(&["process-revokes", "--aws-region", "x", "--timeout", "5"]).unwrap();
        assert_eq!(cli.command.worker_args().timeout, 5);
        assert_eq!(cli.command.role(), QueueRole::Revoke);
    }

    #[test]
    fn test_overrides_are_carried() {
        let cli = parse(&[
            "process-revokes",
            "--aws-region",
            "eu-west-1",
            "--revoke-url",
            "https://sqs.eu-west-1.amazonaws.com/123456789012/openvpn-revocations-a",
            "--role-arn",
            "arn:aws:iam::123456789012:role/openvpn",
            "--debug",
        ])
        .unwrap();

        let config = cli.command.worker_args().to_config().unwrap();
        assert!(config.debug);
        assert_eq!(
            config.override_for(QueueRole::Revoke),
            Some("https://sqs.eu-west-1.amazonaws.com/123456789012/openvpn-revocations-a")
        );
        assert_eq!(
            config.resolver_config().account_scope.as_deref(),
            Some("123456789012")
        );
    }

    #[test]
    fn test_malformed_backup_tag() {
        let cli = parse(&[
            "process-requests",
            "--aws-region",
            "eu-west-1",
            "--backup-bucket-tag",
            "no-equals-sign",
        ])
        .unwrap();
        assert_eq!(
            cli.command.worker_args().to_config().unwrap_err(),
            ConfigError::InvalidBackupTag("no-equals-sign".to_string())
        );
    }

    #[test]
    fn test_submit_arguments() {
        let cli = parse(&[
            "submit-request",
            "--aws-region",
            "eu-west-1",
            "--username",
            "alice",
            "--response-url",
            "https://sqs.eu-west-1.amazonaws.com/123456789012/alice-replies",
        ])
        .unwrap();

        let Command::SubmitRequest(args) = &cli.command else {
            panic!("expected submit-request");
        };
        assert_eq!(args.username, "alice");
        assert_eq!(args.reply_timeout, 60);
        assert_eq!(cli.command.worker_args().aws_region, "eu-west-1");
    }
}
