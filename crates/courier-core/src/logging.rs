//! Log call contract
//!
//! The engine reports through [`log_event`]; where the events end up is the
//! business of whatever `tracing` subscriber the application installed.

use crate::error::Severity;
use crate::http::Fault;
use serde_json::Value;
use std::collections::BTreeMap;

/// Structured variables attached to a log event
pub type LogVariables = BTreeMap<&'static str, Value>;

/// Where in the request lifecycle an event was raised
#[derive(Debug, Clone, Copy)]
pub struct LogContext<'a> {
    pub operation: &'a str,
    pub stage: &'static str,
}

impl<'a> LogContext<'a> {
    pub fn new(operation: &'a str, stage: &'static str) -> Self {
        Self { operation, stage }
    }
}

/// Emit one event: `preface` is the human-readable summary, `fault` the
/// transport fault if any, `variables` free-form structured detail.
pub fn log_event(
    severity: Severity,
    preface: &str,
    fault: Option<&Fault>,
    variables: &LogVariables,
    context: LogContext<'_>,
) {
    let fault_name = fault.map(|f| f.kind.name()).unwrap_or("");
    let fault_message = fault.map(|f| f.message.as_str()).unwrap_or("");
    let variables = Value::Object(
        variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    );

    match severity {
        Severity::Debug => tracing::debug!(
            operation = context.operation,
            stage = context.stage,
            fault = fault_name,
            fault_message,
            %variables,
            "{}", preface
        ),
        Severity::Info => tracing::info!(
            operation = context.operation,
            stage = context.stage,
            fault = fault_name,
            fault_message,
            %variables,
            "{}", preface
        ),
        Severity::Warning => tracing::warn!(
            operation = context.operation,
            stage = context.stage,
            fault = fault_name,
            fault_message,
            %variables,
            "{}", preface
        ),
        Severity::Error => tracing::error!(
            operation = context.operation,
            stage = context.stage,
            fault = fault_name,
            fault_message,
            %variables,
            "{}", preface
        ),
        Severity::Critical => tracing::error!(
            critical = true,
            operation = context.operation,
            stage = context.stage,
            fault = fault_name,
            fault_message,
            %variables,
            "{}", preface
        ),
    }
}

/// Build a [`LogVariables`] map from `key => value` pairs
#[macro_export]
macro_rules! log_vars {
    () => { $crate::logging::LogVariables::new() };
    ($($key:literal => $value:expr),+ $(,)?) => {{
        let mut vars = $crate::logging::LogVariables::new();
        $( vars.insert($key, ::serde_json::json!($value)); )+
        vars
    }};
}
