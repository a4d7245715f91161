//! Error code catalog
//!
//! Every classified failure carries exactly one [`ErrorCode`]. The numeric
//! value reported to callers is the catalog base value plus a deployment
//! specific offset, so several services can share one code space.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Broad family an error code belongs to; drives log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// Caller misuse, unresolved configuration or an engine defect
    Local,
    /// Connection, timeout, redirect and payload decoding faults
    Transport,
    /// HTTP status interpreted as a failure
    RemoteStatus,
    /// Response broke the declared contract (headers, rule sets)
    Contract,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Local => "local",
            ErrorCategory::Transport => "transport",
            ErrorCategory::RemoteStatus => "remote-status",
            ErrorCategory::Contract => "contract",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    None,
    Unknown,
    LocalAlgo,
    LocalUse,
    LocalConfiguration,
    HostUnavailable,
    ServiceUnavailable,
    Timeout,
    TimeoutPropagated,
    ResponseNone,
    TooManyRedirects,
    Remote,
    RemotePropagated,
    MalignStatusUnexpected,
    EndpointNotFound,
    ResourceNotFound,
    Unauthenticated,
    Unauthorized,
    RemoteValidationBad,
    RemoteValidationFailed,
    RemoteConflict,
    ResponseType,
    ResponseFormat,
    BenignStatusUnexpected,
    HeaderMissing,
    ResponseValidation,
}

impl ErrorCode {
    /// Every code in catalog order
    pub const ALL: [ErrorCode; 26] = [
        ErrorCode::None,
        ErrorCode::Unknown,
        ErrorCode::LocalAlgo,
        ErrorCode::LocalUse,
        ErrorCode::LocalConfiguration,
        ErrorCode::HostUnavailable,
        ErrorCode::ServiceUnavailable,
        ErrorCode::Timeout,
        ErrorCode::TimeoutPropagated,
        ErrorCode::ResponseNone,
        ErrorCode::TooManyRedirects,
        ErrorCode::Remote,
        ErrorCode::RemotePropagated,
        ErrorCode::MalignStatusUnexpected,
        ErrorCode::EndpointNotFound,
        ErrorCode::ResourceNotFound,
        ErrorCode::Unauthenticated,
        ErrorCode::Unauthorized,
        ErrorCode::RemoteValidationBad,
        ErrorCode::RemoteValidationFailed,
        ErrorCode::RemoteConflict,
        ErrorCode::ResponseType,
        ErrorCode::ResponseFormat,
        ErrorCode::BenignStatusUnexpected,
        ErrorCode::HeaderMissing,
        ErrorCode::ResponseValidation,
    ];

    /// Catalog base value
    pub fn base(self) -> u32 {
        match self {
            ErrorCode::None => 0,
            ErrorCode::Unknown => 1,
            ErrorCode::LocalAlgo => 10,
            ErrorCode::LocalUse => 11,
            ErrorCode::LocalConfiguration => 13,
            ErrorCode::HostUnavailable => 20,
            ErrorCode::ServiceUnavailable => 21,
            ErrorCode::Timeout => 30,
            ErrorCode::TimeoutPropagated => 31,
            ErrorCode::ResponseNone => 40,
            ErrorCode::TooManyRedirects => 42,
            ErrorCode::Remote => 50,
            ErrorCode::RemotePropagated => 51,
            ErrorCode::MalignStatusUnexpected => 59,
            ErrorCode::EndpointNotFound => 60,
            ErrorCode::ResourceNotFound => 61,
            ErrorCode::Unauthenticated => 65,
            ErrorCode::Unauthorized => 66,
            ErrorCode::RemoteValidationBad => 70,
            ErrorCode::RemoteValidationFailed => 71,
            ErrorCode::RemoteConflict => 72,
            ErrorCode::ResponseType => 81,
            ErrorCode::ResponseFormat => 82,
            ErrorCode::BenignStatusUnexpected => 89,
            ErrorCode::HeaderMissing => 90,
            ErrorCode::ResponseValidation => 95,
        }
    }

    /// Numeric code reported to callers; `none` is always 0
    pub fn reported(self, offset: u32) -> u32 {
        if self.is_none() {
            0
        } else {
            self.base() + offset
        }
    }

    /// Kebab-case catalog name
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::None => "none",
            ErrorCode::Unknown => "unknown",
            ErrorCode::LocalAlgo => "local-algo",
            ErrorCode::LocalUse => "local-use",
            ErrorCode::LocalConfiguration => "local-configuration",
            ErrorCode::HostUnavailable => "host-unavailable",
            ErrorCode::ServiceUnavailable => "service-unavailable",
            ErrorCode::Timeout => "timeout",
            ErrorCode::TimeoutPropagated => "timeout-propagated",
            ErrorCode::ResponseNone => "response-none",
            ErrorCode::TooManyRedirects => "too-many-redirects",
            ErrorCode::Remote => "remote",
            ErrorCode::RemotePropagated => "remote-propagated",
            ErrorCode::MalignStatusUnexpected => "malign-status-unexpected",
            ErrorCode::EndpointNotFound => "endpoint-not-found",
            ErrorCode::ResourceNotFound => "resource-not-found",
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::RemoteValidationBad => "remote-validation-bad",
            ErrorCode::RemoteValidationFailed => "remote-validation-failed",
            ErrorCode::RemoteConflict => "remote-conflict",
            ErrorCode::ResponseType => "response-type",
            ErrorCode::ResponseFormat => "response-format",
            ErrorCode::BenignStatusUnexpected => "benign-status-unexpected",
            ErrorCode::HeaderMissing => "header-missing",
            ErrorCode::ResponseValidation => "response-validation",
        }
    }

    /// Error family, `None` for the success code
    pub fn category(self) -> Option<ErrorCategory> {
        let category = match self {
            ErrorCode::None => return None,
            ErrorCode::Unknown
            | ErrorCode::LocalAlgo
            | ErrorCode::LocalUse
            | ErrorCode::LocalConfiguration => ErrorCategory::Local,
            ErrorCode::HostUnavailable
            | ErrorCode::Timeout
            | ErrorCode::ResponseNone
            | ErrorCode::TooManyRedirects
            | ErrorCode::ResponseType
            | ErrorCode::ResponseFormat => ErrorCategory::Transport,
            ErrorCode::ServiceUnavailable
            | ErrorCode::TimeoutPropagated
            | ErrorCode::Remote
            | ErrorCode::RemotePropagated
            | ErrorCode::MalignStatusUnexpected
            | ErrorCode::EndpointNotFound
            | ErrorCode::ResourceNotFound
            | ErrorCode::Unauthenticated
            | ErrorCode::Unauthorized
            | ErrorCode::RemoteValidationBad
            | ErrorCode::RemoteValidationFailed
            | ErrorCode::RemoteConflict
            | ErrorCode::BenignStatusUnexpected => ErrorCategory::RemoteStatus,
            ErrorCode::HeaderMissing | ErrorCode::ResponseValidation => ErrorCategory::Contract,
        };
        Some(category)
    }

    /// Key handed to the text resolver for the user-facing message
    pub fn message_key(self) -> String {
        format!("error.{}", self.name())
    }

    pub fn is_none(self) -> bool {
        self == ErrorCode::None
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::None
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.name() == s)
            .ok_or_else(|| format!("unknown error code '{}'", s))
    }
}
