//! dexbridge: command bridge between AI agents and a browser extension.
//!
//! Main entry point for the dexbridge CLI and server.

mod cli;
mod server;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use dexbridge_config::{Config, ConfigError, ConfigLoader, ConfigValidator, ValidationResult};

use crate::cli::{Cli, Commands, DEFAULT_CONFIG_PATH, RunArgs};
use crate::server::{init_tracing, run_server};

fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => ConfigLoader::load(path),
        None => ConfigLoader::load_or_default(Path::new(DEFAULT_CONFIG_PATH)),
    }
}

fn print_validation(result: &ValidationResult) {
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}", error);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    let args = match cli.command {
        Some(Commands::Validate) => {
            let result = ConfigValidator::validate(&config);
            print_validation(&result);
            if result.is_valid() {
                println!("Configuration is valid");
                return ExitCode::SUCCESS;
            }
            return ExitCode::FAILURE;
        }
        Some(Commands::Run(args)) => args,
        None => RunArgs::default(),
    };
    args.apply(&mut config);

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    if !validation.is_valid() {
        for e in &validation.errors {
            error!(path = %e.path, "{}", e.message);
        }
        return ExitCode::from(2);
    }

    match run_server(config).await {
        Ok(report) => {
            info!("{}", report);
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
