//! Mirror CLI Binary
//!
//! Command-line entry point for the mirror synchronization daemon.

use clap::Parser;
use mirror::cli::{resolve_config, Cli, RunContext};
use mirror::logging::init_logging;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Configuration problems are reported before logging exists
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    // An unusable log destination is fatal at startup
    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Starting folder synchronization");

    let context = match RunContext::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error preparing folders: {}", e);
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    match context.execute(&cli.command) {
        Ok(outcome) => {
            println!("{}", outcome.output);
            if !outcome.success {
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
