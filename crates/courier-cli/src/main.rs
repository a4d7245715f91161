//! Courier CLI - run configured HTTP operations from the command line
//!
//! `run` executes one operation through the orchestrator and prints the
//! response envelope, `options` shows how the operations file resolves for
//! an operation, and `codes` prints the error catalog.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;

use cli::{Cli, Commands};
use colored::control;
use error::Result;
use logging::LoggingConfig;
use std::process;
use tracing::instrument;

/// Exit status of a request that ran but did not succeed
const REQUEST_FAILED: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(REQUEST_FAILED),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Dispatch the subcommand; `Ok(false)` means the request was classified as a failure
#[instrument(skip(cli), fields(command = ?cli.command, request_id = logging::current_request_id()))]
async fn run(cli: Cli) -> Result<bool> {
    tracing::info!(verbosity = cli.verbosity_level(), "Executing command");

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => handlers::handle_run(args, config_path).await,
        Commands::Options(args) => handlers::handle_options(args, config_path).map(|()| true),
        Commands::Codes(args) => handlers::handle_codes(args).map(|()| true),
    }
}

/// Build the logging configuration from flags and environment
fn logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = LoggingConfig::from_verbosity(cli.verbosity_level());
    config.merge_with_env();

    if let Some(format) = cli.log_format {
        config.format = format.into();
    }
    if cli.quiet {
        config.level = "error".to_string();
    }
    config.color = cli.use_color();
    config
}

fn init_logging(cli: &Cli) -> Result<()> {
    logging::init_logging(logging_config(cli))
}
