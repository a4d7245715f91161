//! The uniform response envelope
//!
//! Every request, whatever happened on the wire, ends in exactly one
//! [`ResponseEnvelope`]. The serialized form is what callers see; headers
//! received from the remote are kept for diagnostics and never serialized.

use crate::catalog::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Statuses a successful body may report
pub const SUCCESS_STATUSES: [u16; 5] = [200, 201, 202, 204, 304];

/// Header tagging envelopes served from a canned mock
pub const MOCK_MARKER_HEADER: &str = "x-courier-mock";

/// Three-state outcome of response validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Validated {
    #[default]
    NotAttempted,
    Failed,
    Passed,
}

/// Body consumed by the ultimate caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub success: bool,
    /// Status mirror; keeps the original remote status when the envelope status was forced
    pub status: u16,
    pub payload: Value,
    /// Safe, user-facing message; empty on success
    pub message: String,
    /// Reported error code (catalog value plus offset), 0 on success
    pub code: u32,
}

/// Response envelope returned to, and cached for, the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Status to report externally
    pub status: u16,
    /// Outbound headers for the caller
    pub headers: BTreeMap<String, String>,
    /// Headers received from the remote side
    #[serde(skip_serializing, default)]
    pub remote_headers: BTreeMap<String, String>,
    pub validated: Validated,
    pub body: ResponseBody,
}

impl ResponseEnvelope {
    /// Successful envelope carrying a payload
    pub fn success(status: u16, payload: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            remote_headers: BTreeMap::new(),
            validated: Validated::NotAttempted,
            body: ResponseBody {
                success: true,
                status,
                payload,
                message: String::new(),
                code: 0,
            },
        }
    }

    /// Failed envelope; the payload is always cleared
    pub fn failure(status: u16, original_status: u16, code: ErrorCode, offset: u32) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            remote_headers: BTreeMap::new(),
            validated: Validated::NotAttempted,
            body: ResponseBody {
                success: false,
                status: original_status,
                payload: Value::Null,
                message: String::new(),
                code: code.reported(offset),
            },
        }
    }

    /// Whether the body/status invariants hold
    pub fn is_consistent(&self) -> bool {
        if self.body.success {
            self.body.code == 0 && SUCCESS_STATUSES.contains(&self.status)
        } else {
            true
        }
    }

    /// Downgrade in place to a failure, clearing the payload
    pub(crate) fn downgrade(&mut self, status: u16, code: ErrorCode, offset: u32) {
        self.status = status;
        self.body.success = false;
        self.body.payload = Value::Null;
        self.body.code = code.reported(offset);
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn is_mock(&self) -> bool {
        self.headers.contains_key(MOCK_MARKER_HEADER)
    }
}
