//! # PKI Relay
//!
//! Entry point for the certificate relay worker.
//!
//! ## Startup Sequence
//!
//! 1. Parse the command line and `PR_*` environment
//! 2. Install logging and metrics
//! 3. Build the queue transport and resolver
//! 4. Resolve the work queue (fatal on ambiguity)
//! 5. Open the certificate authority and serve the queue until Ctrl+C
//!
//! The submit commands stop after step 4 and act as a client instead.

use anyhow::{Context, Result};
use clap::Parser;
use relay_telemetry::{init_telemetry, TelemetryConfig};
use shared_types::{Endpoint, QueueRole};
use std::time::Duration;
use tracing::{error, info, warn};
use worker_runtime::{Cli, Command, RelayContainer, SubmitArgs, WorkerError};

/// Exit code for a submit that did not get a success reply.
const EXIT_SUBMIT_FAILED: i32 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let role = cli.command.role();
    let args = cli.command.worker_args();

    let telemetry = TelemetryConfig::from_env()
        .with_debug(args.debug)
        .for_worker(role.as_str());
    let _telemetry = init_telemetry(telemetry).context("Failed to initialize telemetry")?;

    let relay = match args
        .to_config()
        .map_err(WorkerError::from)
        .and_then(RelayContainer::connect)
    {
        Ok(relay) => relay,
        Err(err) => exit_with(err),
    };

    match cli.command {
        Command::ProcessRequests(_) | Command::ProcessRevokes(_) => {
            if let Err(err) = serve(&relay, role).await {
                exit_with(err);
            }
        }
        Command::SubmitRequest(submit_args) | Command::SubmitRevoke(submit_args) => {
            submit(&relay, role, &submit_args).await?;
        }
    }

    Ok(())
}

/// Serve the queue for `role` until Ctrl+C or a fatal error.
async fn serve(relay: &RelayContainer, role: QueueRole) -> Result<(), WorkerError> {
    let authority = relay.open_authority()?;
    let dispatcher = relay.dispatcher(role, authority).await?;

    info!(%role, queue = %dispatcher.queue(), "Worker is running. Press Ctrl+C to stop.");
    tokio::select! {
        err = dispatcher.run() => Err(err),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "[worker] Failed to listen for Ctrl+C");
            }
            info!(%role, "[worker] Shutting down");
            Ok(())
        }
    }
}

/// Send one request and print the reply.
async fn submit(relay: &RelayContainer, role: QueueRole, args: &SubmitArgs) -> Result<()> {
    let work_queue = match relay.resolve(role).await {
        Ok(queue) => queue,
        Err(err) => exit_with(err),
    };
    let response_queue = match Endpoint::parse(&args.response_url) {
        Ok(queue) => queue,
        Err(err) => exit_with(WorkerError::Startup(format!("--response-url: {}", err))),
    };

    let response = relay
        .submit_client()
        .submit(
            &work_queue,
            &args.username,
            &response_queue,
            Duration::from_secs(args.reply_timeout),
        )
        .await;

    match response {
        Ok(reply) if reply.is_success() => {
            println!("{}", reply.body());
            Ok(())
        }
        Ok(reply) => {
            eprintln!("{}", reply.error_message());
            std::process::exit(EXIT_SUBMIT_FAILED);
        }
        Err(err) => {
            error!(error = %err, "[worker] Submit failed");
            std::process::exit(EXIT_SUBMIT_FAILED);
        }
    }
}

fn exit_with(err: WorkerError) -> ! {
    error!(error = %err, "[worker] Fatal error");
    std::process::exit(err.exit_code());
}
