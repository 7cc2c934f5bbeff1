//! # CLI
//!
//! This module defines the command-line interface of `gatecall` using `clap`.
//!
//! Global options configure the shared [`gatecall_core::Invoker`]; they can also be set
//! through `GATECALL_*` environment variables.
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gatecall", version, about = "Dynamic JSON to gRPC gateway")]
pub struct Cli {
    /// Timeout of a single gRPC call in milliseconds (0 means no timeout)
    #[arg(long, env = "GATECALL_TIMEOUT_MS", default_value_t = 0, global = true)]
    pub timeout_ms: u64,

    /// Directory holding one descriptor set per service, named `<package.Service>.pb`
    #[arg(
        long,
        env = "GATECALL_DESCRIPTOR_DIR",
        default_value = "descriptors",
        global = true
    )]
    pub descriptor_dir: PathBuf,

    /// Target used when a request does not provide one (e.g. localhost:50051)
    #[arg(long, env = "GATECALL_DEFAULT_TARGET", global = true)]
    pub default_target: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn timeout(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.timeout_ms)).filter(|t| !t.is_zero())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Perform a single unary gRPC call
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// gatecall call --target localhost:50051 --method /echo.EchoService/Echo --body '{"message": "hi"}'
    /// gatecall call --target localhost:50051 --descriptor echo.pb --method Echo --service EchoService
    /// ```
    Call {
        /// Server address (host:port or URI)
        #[arg(long)]
        target: Option<String>,

        /// Full method name (/package.Service/Method), or a method name when a descriptor is given
        #[arg(long)]
        method: String,

        /// Service name (fully qualified or short), used with --descriptor
        #[arg(long)]
        service: Option<String>,

        /// Path to a descriptor set (.pb) sent along with the call
        #[arg(long)]
        descriptor: Option<PathBuf>,

        /// Id under which the descriptor set is cached
        #[arg(long)]
        descriptor_id: Option<String>,

        /// JSON request body
        #[arg(long, value_parser = parse_body)]
        body: Option<serde_json::Value>,
    },

    /// Read one JSON request per line from stdin and write one JSON result per line to stdout
    ///
    /// All requests share the same descriptor caches, so a descriptor sent once under a
    /// `descriptor_id` can be referred to by that id in the following lines.
    Batch,
}

fn parse_body(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))
}
