//! gantry CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`, printing any
//! error to stderr and exiting non-zero. Settings, logging and the
//! server are all set up by the command itself.

use gantry::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
