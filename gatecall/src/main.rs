//! # Gatecall CLI Entry Point
//!
//! The main executable of the gateway. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Installs the `tracing` subscriber (stderr, filtered by `GATECALL_LOG`)
//!    and parses command-line arguments using [`cli::Cli`].
//! 2. **Engine**: Builds one [`Invoker`] owning the descriptor caches.
//! 3. **Execution**: Runs a single call, or a batch of calls read from stdin.
//! 4. **Presentation**: Prints JSON responses to stdout and failures to stderr.
mod batch;
mod cli;
mod request;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use gatecall_core::{InvokeError, Invoker};
use request::{GatewayRequest, RequestError};
use std::process;
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only ever carries JSON
    fmt()
        .with_env_filter(EnvFilter::from_env("GATECALL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    tracing::debug!(
        descriptor_dir = %args.descriptor_dir.display(),
        timeout = ?args.timeout(),
        "starting gatecall"
    );

    let invoker = Invoker::with_directory(args.descriptor_dir.clone(), args.timeout());
    let default_target = args.default_target.as_deref();

    match args.command {
        Commands::Call {
            target,
            method,
            service,
            descriptor,
            descriptor_id,
            body,
        } => {
            let request = GatewayRequest {
                target: target.unwrap_or_default(),
                method,
                service: service.unwrap_or_default(),
                descriptor_file: descriptor,
                descriptor_id: descriptor_id.unwrap_or_default(),
                body,
                ..Default::default()
            };
            run_call(&invoker, default_target, request).await
        }
        Commands::Batch => {
            let stdin = BufReader::new(tokio::io::stdin());
            let summary = batch::run(&invoker, default_target, stdin, tokio::io::stdout())
                .await
                .context("batch I/O failed")?;

            tracing::info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "batch finished"
            );
            Ok(())
        }
    }
}

/// Why a single `call` failed. Request-shape problems exit with 2, everything else with 1.
#[derive(Debug)]
enum CallFailure {
    Request(RequestError),
    Invoke(InvokeError),
}

impl CallFailure {
    fn line(&self) -> serde_json::Value {
        match self {
            CallFailure::Request(err) => batch::error_line(err, "invalid_request"),
            CallFailure::Invoke(err) => batch::invoke_error_line(err),
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            CallFailure::Request(_) => 2,
            CallFailure::Invoke(err) if err.kind().is_client_error() => 2,
            CallFailure::Invoke(_) => 1,
        }
    }
}

async fn call(
    invoker: &Invoker,
    default_target: Option<&str>,
    request: GatewayRequest,
) -> Result<Vec<u8>, CallFailure> {
    let request = request
        .into_invoke_request(default_target)
        .map_err(CallFailure::Request)?;

    invoker.invoke(request).await.map_err(CallFailure::Invoke)
}

async fn run_call(
    invoker: &Invoker,
    default_target: Option<&str>,
    request: GatewayRequest,
) -> anyhow::Result<()> {
    match call(invoker, default_target, request).await {
        Ok(response) => {
            let value: serde_json::Value =
                serde_json::from_slice(&response).context("invalid JSON response")?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", failure.line());
            process::exit(failure.exit_code());
        }
    }
}
