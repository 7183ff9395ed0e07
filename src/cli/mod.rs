//! CLI module for gantry
//!
//! Provides command-line interface for:
//! - serve: Boot the demo application and serve HTTP
//! - check-config: Validate and print merged settings

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
