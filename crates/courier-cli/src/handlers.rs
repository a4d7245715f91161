//! Command handlers for CLI subcommands
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license

use crate::cli::{CodesArgs, OperationArgs, OptionsArgs, OptionsFormat, RunArgs};
use crate::config;
use crate::error::{Error, Result};
use courier_core::{
    Arguments, ErrorCode, HttpTransport, OptionLayer, Operation, Orchestrator, RequestOptions,
};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

impl OperationArgs {
    pub fn to_operation(&self) -> Operation {
        Operation::new(&self.provider, &self.service, &self.endpoint, self.method)
    }
}

/// Per-call override layer built from `run` flags
pub fn overrides(args: &RunArgs) -> OptionLayer {
    OptionLayer {
        cache_scope: args.scope.clone(),
        refresh: args.refresh.then_some(true),
        mock: args.mock.clone(),
        ..Default::default()
    }
}

/// Call arguments built from `run` flags
pub fn call_arguments(args: &RunArgs) -> Result<Arguments> {
    let body = args
        .body
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(|e| Error::invalid_args(format!("--body is not valid JSON: {}", e)))?;

    Ok(Arguments {
        segments: args.segments.clone(),
        query: args.query.iter().cloned().collect(),
        body,
    })
}

/// Resolve options; configuration failures become the abort path
pub fn resolve_or_abort(config_path: Option<&Path>, operation: Operation, overrides: &OptionLayer) -> RequestOptions {
    let resolved = config::load(config_path)
        .and_then(|resolver| Ok(resolver.resolve(operation.clone(), Some(overrides))?));
    match resolved {
        Ok(options) => options,
        Err(e) => {
            tracing::error!(operation = %operation, error = %e, "Operation could not be configured");
            RequestOptions::aborted(operation, ErrorCode::LocalConfiguration)
        }
    }
}

/// Handle the run command; returns whether the request succeeded
pub async fn handle_run(args: RunArgs, config_path: Option<&Path>) -> Result<bool> {
    let call = call_arguments(&args)?;
    let operation = args.operation.to_operation();
    let options = resolve_or_abort(config_path, operation, &overrides(&args));

    let engine = Orchestrator::new(Arc::new(HttpTransport::with_default_config()?));
    let envelope = engine.execute(&options, &call).await;

    tracing::info!(
        operation = %options.operation,
        status = envelope.status,
        code = envelope.body.code,
        "Request finished"
    );
    print_json(&envelope, args.pretty)?;
    Ok(envelope.body.success)
}

/// Handle the options command
pub fn handle_options(args: OptionsArgs, config_path: Option<&Path>) -> Result<()> {
    let resolver = config::load(config_path)?;
    let options = resolver.resolve(args.operation.to_operation(), None)?;

    match args.format {
        OptionsFormat::Json => print_json(&options, true),
        OptionsFormat::Yaml => {
            let yaml = serde_yaml::to_string(&options)?;
            write_stdout(&yaml)
        }
    }
}

/// Handle the codes command
pub fn handle_codes(args: CodesArgs) -> Result<()> {
    write_stdout(&codes_table(args.offset))
}

/// Catalog as a text table
pub fn codes_table(offset: u32) -> String {
    let mut table = format!("{:<26} {:>5} {:>9}  {}\n", "NAME", "BASE", "REPORTED", "CATEGORY");
    for code in ErrorCode::ALL {
        let category = code.category().map(|c| c.as_str()).unwrap_or("-");
        table.push_str(&format!(
            "{:<26} {:>5} {:>9}  {}\n",
            code.name(),
            code.base(),
            code.reported(offset),
            category
        ));
    }
    table
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let mut text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    text.push('\n');
    write_stdout(&text)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use courier_core::CacheScope;
    use serde_json::json;
    use tempfile::TempDir;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["courier", "run", "acme", "users", "lookup"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_call_arguments() {
        let args = run_args(&["--segment", "42", "--query", "a=1", "--body", r#"{"x": 1}"#]);
        let call = call_arguments(&args).unwrap();
        assert_eq!(call.segments, vec!["42".to_string()]);
        assert_eq!(call.query.get("a").map(String::as_str), Some("1"));
        assert_eq!(call.body, Some(json!({"x": 1})));

        let err = call_arguments(&run_args(&["--body", "{oops"])).unwrap_err();
        assert!(err.should_show_help());
    }

    #[test]
    fn test_overrides_only_set_given_flags() {
        let layer = overrides(&run_args(&[]));
        assert_eq!(layer, OptionLayer::default());

        let layer = overrides(&run_args(&["--scope", "alice", "--refresh", "--mock", "empty"]));
        assert_eq!(layer.cache_scope.as_deref(), Some("alice"));
        assert_eq!(layer.refresh, Some(true));
        assert_eq!(layer.mock.as_deref(), Some("empty"));
    }

    #[test]
    fn test_resolve_or_abort() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ops.toml");
        std::fs::write(
            &path,
            "[providers.acme]\nbase-url = \"http://acme.test\"\n[providers.acme.services.users.endpoints.lookup]\ncache = true\n",
        )
        .unwrap();

        let args = run_args(&["--scope", "alice"]);
        let options = resolve_or_abort(Some(&path), args.operation.to_operation(), &overrides(&args));
        assert!(options.preflight_error.is_none());
        assert_eq!(options.cache.scope, CacheScope::Caller("alice".to_string()));

        let unknown = Operation::new("globex", "users", "lookup", courier_core::HttpMethod::Get);
        let options = resolve_or_abort(Some(&path), unknown, &OptionLayer::default());
        assert_eq!(options.preflight_error, Some(ErrorCode::LocalConfiguration));
    }

    #[test]
    fn test_codes_table_applies_offset() {
        let table = codes_table(1000);
        let timeout = table.lines().find(|line| line.starts_with("timeout ")).unwrap();
        assert!(timeout.contains("1030"));
        assert!(timeout.ends_with("transport"));
        assert_eq!(table.lines().count(), ErrorCode::ALL.len() + 1);
    }
}
