//! CLI command implementations
//!
//! Both commands load settings the same way: defaults, overlaid by the
//! optional JSON file, validated before anything else starts.

use std::io::{self, Write};
use std::path::Path;

use tracing::info;

use crate::app::{demo_server, seed_demo, Services};
use crate::config::Settings;
use crate::observability::init_logging;

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port, seed } => serve(config.as_deref(), port, seed),
        Command::CheckConfig { config } => check_config(config.as_deref(), &mut io::stdout()),
    }
}

/// Boot the demo application and serve until the listener fails
pub fn serve(config_path: Option<&Path>, port: Option<u16>, seed: usize) -> CliResult<()> {
    let mut settings = Settings::load(config_path)?;
    if let Some(port) = port {
        settings.http.port = port;
        settings.validate()?;
    }
    init_logging(&settings.logging);

    let services = Services::in_memory(&settings);
    if seed > 0 {
        seed_demo(&services, seed)?;
    }
    let server = demo_server(&settings, &services)?;
    info!(addr = %server.socket_addr(), debug = settings.debug, "starting gantry");

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print the merged, validated settings as pretty JSON
pub fn check_config<W: Write>(config_path: Option<&Path>, out: &mut W) -> CliResult<()> {
    let settings = Settings::load(config_path)?;
    serde_json::to_writer_pretty(&mut *out, &settings)?;
    writeln!(out)?;
    Ok(())
}
