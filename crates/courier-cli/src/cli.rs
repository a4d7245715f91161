//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use courier_core::HttpMethod;
use std::path::PathBuf;

/// Courier CLI - run configured HTTP operations through the Courier engine
///
/// Every run prints the caller-facing response envelope as JSON.
#[derive(Parser, Debug)]
#[command(
    name = "courier",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to the operations file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "COURIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, global = true, env = "COURIER_LOG_FORMAT")]
    pub log_format: Option<LogFormatArg>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute an operation once and print the response envelope
    Run(RunArgs),

    /// Print the resolved options of an operation
    Options(OptionsArgs),

    /// Print the error code catalog
    Codes(CodesArgs),
}

/// Operation coordinates shared by `run` and `options`
#[derive(Parser, Debug, Clone)]
pub struct OperationArgs {
    pub provider: String,
    pub service: String,
    pub endpoint: String,

    /// HTTP method of the operation
    #[arg(short, long, value_parser = parse_method, default_value = "GET")]
    pub method: HttpMethod,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub operation: OperationArgs,

    /// Path segment appended after the configured path (repeatable)
    #[arg(short, long = "segment", value_name = "SEGMENT")]
    pub segments: Vec<String>,

    /// Query parameter as KEY=VALUE (repeatable)
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Caller identifier for a per-caller cache entry
    #[arg(long)]
    pub scope: Option<String>,

    /// Skip the cache read but still write the fresh response
    #[arg(long)]
    pub refresh: bool,

    /// Serve the named canned response instead of calling the network
    #[arg(long, value_name = "VARIANT")]
    pub mock: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the options command
#[derive(Parser, Debug)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub operation: OperationArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OptionsFormat,
}

/// Output format of resolved options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OptionsFormat {
    Json,
    Yaml,
}

/// Arguments for the codes command
#[derive(Parser, Debug)]
pub struct CodesArgs {
    /// Offset added to every reported code
    #[arg(long, default_value = "0")]
    pub offset: u32,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Compact,
    Full,
    Json,
}

fn parse_method(s: &str) -> Result<HttpMethod, String> {
    HttpMethod::parse(s).ok_or_else(|| format!("unknown HTTP method '{}'", s))
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::env::var("NO_COLOR").is_err()
    }
}
