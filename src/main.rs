//! Binary entry point for seqthink.
//!
//! This binary provides the CLI for the sequential thinking MCP server.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]

use clap::{Parser, Subcommand};
use seqthink::config::ThinkingConfig;
use seqthink::mcp::{McpServer, ToolRegistry, Transport};
use seqthink::observability::{self, LoggingConfig};
use seqthink::tracker::ThoughtTracker;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Seqthink - a sequential thinking MCP server.
#[derive(Parser)]
#[command(name = "seqthink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server.
    Serve {
        /// Transport type: stdio or http.
        #[arg(short, long, default_value = "stdio")]
        transport: String,

        /// Port for HTTP transport.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Render accepted thoughts to the diagnostic stream.
        #[arg(long, env = "SEQTHINK_LOG_THOUGHTS")]
        log_thoughts: bool,

        /// Append rendered thoughts to this file instead of stderr.
        #[arg(long, env = "SEQTHINK_THOUGHT_LOG")]
        thought_log: Option<PathBuf>,
    },

    /// Print the tool's input and output schemas.
    Schema,
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = observability::init(&LoggingConfig::from_env(cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Serve {
            transport,
            port,
            log_thoughts,
            thought_log,
        } => cmd_serve(transport, port, log_thoughts, thought_log),

        Commands::Schema => cmd_schema(),
    }
}

/// Serve command.
fn cmd_serve(
    transport: String,
    port: u16,
    log_thoughts: bool,
    thought_log: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let transport_type = match transport.as_str() {
        "http" => Transport::Http,
        _ => Transport::Stdio,
    };

    let mut config = ThinkingConfig::new().with_log_thoughts(log_thoughts);
    if let Some(path) = thought_log {
        config = config.with_thought_log(path);
    }

    let tracker = Arc::new(ThoughtTracker::new(config.build_log()?));
    let registry = ToolRegistry::new(tracker);

    let mut server = McpServer::new(registry)
        .with_transport(transport_type)
        .with_port(port);

    tracing::info!(transport = %transport, "sequential thinking MCP server running");
    server.start().map_err(|e| e.to_string())?;

    Ok(())
}

/// Schema command.
fn cmd_schema() -> Result<(), Box<dyn std::error::Error>> {
    let registry = ToolRegistry::new(Arc::new(ThoughtTracker::default()));

    for tool in registry.list_tools() {
        println!("{}", serde_json::to_string_pretty(&tool)?);
    }

    Ok(())
}
