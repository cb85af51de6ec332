//! Tunnel Lifecycle Host
//!
//! Runs the tunnel worker either in the foreground or as a service driven by
//! process signals.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌──────────────┐      ┌──────────────┐
//!     │  C ABI host  │      │   service    │
//!     │ (ffi exports)│      │   manager    │
//!     └──────┬───────┘      └──────┬───────┘
//!            │                     │ signals → ControlRequest
//!            ▼                     ▼
//!     ┌──────────────┐      ┌──────────────┐
//!     │ ffi::surface │      │   service    │
//!     │              │      │   session    │
//!     └──────┬───────┘      └──────┬───────┘
//!            └──────────┬──────────┘
//!                       ▼
//!              ┌─────────────────┐
//!              │   Controller    │
//!              │ LifecycleState  │──── ShutdownSignal
//!              └────────┬────────┘            │ observer
//!                       ▼                     ▼
//!              ┌─────────────────┐   ┌─────────────────┐
//!              │  WorkerInvoker  │──▶│     Worker      │
//!              └─────────────────┘   └─────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tunnel_lifecycle::config::{load_config, ControllerConfig};
use tunnel_lifecycle::lifecycle::Controller;
use tunnel_lifecycle::observability::{logging, metrics};
use tunnel_lifecycle::service;

#[derive(Parser)]
#[command(name = "tunnel-lifecycle")]
#[command(about = "Start and stop a tunnel worker in the foreground or as a service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the worker in the foreground until it exits or Ctrl-C
    Run {
        /// Worker argument vector, program name first
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run as a service: SIGTERM stops, SIGINT shuts down, SIGHUP reports status
    Service {
        /// Start arguments; fewer than two falls back to worker.default_args
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print the build identifier
    Version,
    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ControllerConfig::default(),
    };

    match cli.command {
        Commands::Version => {
            println!("tunnel-lifecycle {}", tunnel_lifecycle::VERSION);
        }
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run { args } => {
            let controller = start(&config)?;
            run_foreground(&controller, args).await?;
        }
        Commands::Service { args } => {
            let controller = start(&config)?;
            let exit = service::run_with_signals(&controller, &config, args).await?;
            if !exit.is_success() {
                std::process::exit(exit.code() as i32);
            }
        }
    }

    Ok(())
}

/// Initialize observability and build the controller.
fn start(config: &ControllerConfig) -> Result<Controller, Box<dyn std::error::Error>> {
    logging::init_logging(&config.observability)?;
    tracing::info!(version = tunnel_lifecycle::VERSION, "tunnel-lifecycle starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        program = %config.worker.program,
        silent = config.worker.silent,
        "Configuration loaded"
    );
    Ok(Controller::from_config(config)?)
}

async fn run_foreground(
    controller: &Controller,
    args: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.init();
    let mut worker = controller.run_async(args)?;

    let result = tokio::select! {
        result = &mut worker => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, stopping worker");
            controller.stop();
            worker.await
        }
    };
    controller.stop();

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
