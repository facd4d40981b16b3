//! Beacon CLI Binary
//!
//! Demo host that drives the progress session registry in a terminal.

use beacon::cli::{map_error, Cli, Commands, RunContext};
use beacon::config::{BeaconConfig, ConfigLoader};
use beacon::logging::{init_logging, LoggingConfig};
use clap::Parser;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    let logging_config = build_logging_config(&cli, &config);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Beacon CLI starting");

    let context = RunContext::new(config, cli.json, !cli.no_color);
    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            // JSON mode keeps stdout for render events only.
            if !cli.json || cli.command == Commands::Config {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: &BeaconConfig) -> LoggingConfig {
    let mut logging = config.logging.clone();

    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if cli.no_color {
        logging.color = false;
    }

    logging
}
