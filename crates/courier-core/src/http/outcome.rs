//! Transport requests, outcomes and faults
//!
//! A [`TransportOutcome`] is what one attempt on the wire produced. Decoding
//! the body is part of the attempt: a JSON content type that does not parse,
//! a content type the caller did not expect or a missing body all surface
//! as a [`Fault`] rather than as a status.

use crate::types::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Kind of transport fault
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultKind {
    /// Remote answered with a 5xx status
    ServerError,
    TimedOut,
    HostUnreachable,
    ConnectionFailed,
    NoResponseData,
    ContentTypeMismatch,
    ParseError,
    TooManyRedirects,
    MalformedTarget,
    /// Anything the adapter could not name
    Other(String),
}

impl FaultKind {
    /// Every named kind
    pub const NAMED: [FaultKind; 9] = [
        FaultKind::ServerError,
        FaultKind::TimedOut,
        FaultKind::HostUnreachable,
        FaultKind::ConnectionFailed,
        FaultKind::NoResponseData,
        FaultKind::ContentTypeMismatch,
        FaultKind::ParseError,
        FaultKind::TooManyRedirects,
        FaultKind::MalformedTarget,
    ];

    /// Fault name as reported by adapters
    pub fn name(&self) -> &str {
        match self {
            FaultKind::ServerError => "server error",
            FaultKind::TimedOut => "timed out",
            FaultKind::HostUnreachable => "host unreachable",
            FaultKind::ConnectionFailed => "connection failed",
            FaultKind::NoResponseData => "no response data",
            FaultKind::ContentTypeMismatch => "content-type mismatch",
            FaultKind::ParseError => "parse error",
            FaultKind::TooManyRedirects => "too many redirects",
            FaultKind::MalformedTarget => "malformed target",
            FaultKind::Other(name) => name,
        }
    }

    /// Map an adapter-reported name onto a kind; unknown names become `Other`
    pub fn from_name(name: &str) -> Self {
        Self::NAMED
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| FaultKind::Other(name.to_string()))
    }

    /// Faults worth one retry after a delay
    pub fn is_transient(&self) -> bool {
        matches!(self, FaultKind::HostUnreachable | FaultKind::ConnectionFailed)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fault descriptor of a failed attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub kind: FaultKind,
    /// Raw diagnostic text; logged, never shown to callers
    pub message: String,
    /// Adapter-specific numeric code, 0 when none
    pub code: i64,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: 0,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Everything an adapter needs for one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub base_url: String,
    pub path: String,
    pub segments: Vec<String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
    pub expect_content_type: Option<String>,
    pub require_body: bool,
}

/// Result of one transport attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportOutcome {
    /// HTTP status, 0 when no connection was established
    pub status: u16,
    /// Decoded body: JSON for JSON content types, a string otherwise
    pub body: Value,
    pub content_type: Option<String>,
    /// Response headers, names lower-cased
    pub headers: BTreeMap<String, String>,
    /// Whether the adapter saw response headers at all
    pub headers_recorded: bool,
    pub fault: Option<Fault>,
}

impl TransportOutcome {
    /// Outcome of an attempt that never got a response
    pub fn failed(fault: Fault) -> Self {
        Self {
            status: 0,
            body: Value::Null,
            content_type: None,
            headers: BTreeMap::new(),
            headers_recorded: false,
            fault: Some(fault),
        }
    }

    /// Successful JSON outcome, as produced by mocks and tests
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            content_type: Some("application/json".to_string()),
            headers: BTreeMap::new(),
            headers_recorded: true,
            fault: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self.headers_recorded = true;
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Status 503 or a connection-level fault
    pub fn is_transient(&self) -> bool {
        self.status == 503 || self.fault.as_ref().is_some_and(|f| f.kind.is_transient())
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Whether the declared content type contains `needle` (case-insensitive)
    pub fn content_type_contains(&self, needle: &str) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
    }
}

/// Decode a raw response body, reporting decoding problems as a fault
pub fn decode_body(
    status: u16,
    content_type: Option<&str>,
    raw: &[u8],
    expect_content_type: Option<&str>,
    require_body: bool,
) -> (Value, Option<Fault>) {
    let declared = content_type.unwrap_or("").to_ascii_lowercase();

    if raw.is_empty() {
        let fault = (require_body && status != 204 && status != 304)
            .then(|| Fault::new(FaultKind::NoResponseData, format!("empty body with status {}", status)));
        return (Value::Null, fault);
    }

    if let Some(expected) = expect_content_type {
        if !declared.contains(&expected.to_ascii_lowercase()) {
            let fault = Fault::new(
                FaultKind::ContentTypeMismatch,
                format!("expected content type '{}', got '{}'", expected, declared),
            );
            return (Value::Null, Some(fault));
        }
    }

    if declared.contains("json") {
        match serde_json::from_slice::<Value>(raw) {
            Ok(value) => (value, None),
            Err(e) => (Value::Null, Some(Fault::new(FaultKind::ParseError, e.to_string()))),
        }
    } else {
        (Value::String(String::from_utf8_lossy(raw).into_owned()), None)
    }
}
