//! CLI argument definitions using clap
//!
//! Commands:
//! - gantry serve [--config <path>] [--port <port>] [--seed <n>]
//! - gantry check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gantry - cached, paginated REST resources over a document store
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the demo application over HTTP
    Serve {
        /// Path to a JSON settings file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,

        /// Insert this many random demo entities before serving
        #[arg(long, default_value_t = 0)]
        seed: usize,
    },

    /// Load and validate settings, then print them as JSON
    CheckConfig {
        /// Path to a JSON settings file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["gantry", "serve", "--port", "9000", "--seed", "50"]);
        match cli.command {
            Command::Serve { config, port, seed } => {
                assert!(config.is_none());
                assert_eq!(port, Some(9000));
                assert_eq!(seed, 50);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_check_config() {
        let cli = Cli::parse_from(["gantry", "check-config", "--config", "gantry.json"]);
        assert!(matches!(
            cli.command,
            Command::CheckConfig { config: Some(ref p) } if p == &PathBuf::from("gantry.json")
        ));
    }
}
