//! Outcome classification
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! Turns a [`TransportOutcome`] into a response envelope and exactly one
//! [`ErrorCode`]. The decision table lives in [`verdict`]: one match arm per
//! row, keyed on a [`Signal`] that is either a transport fault or a status
//! class. Adding a case means adding a variant and a row; the compiler
//! rejects a table that forgets one.

use crate::catalog::ErrorCode;
use crate::http::{FaultKind, TransportOutcome};
use crate::response::ResponseEnvelope;
use crate::types::{NotFoundPolicy, RequestOptions};

/// Status classes the decision table distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 200, 201, 202, 304
    Success(u16),
    /// 204
    NoContent,
    /// 400
    BadRequest,
    /// 401
    Unauthenticated,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 412, 422
    Unprocessable(u16),
    /// Anything else, including 0
    Unexpected(u16),
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            200 | 201 | 202 | 304 => StatusClass::Success(status),
            204 => StatusClass::NoContent,
            400 => StatusClass::BadRequest,
            401 => StatusClass::Unauthenticated,
            403 => StatusClass::Forbidden,
            404 => StatusClass::NotFound,
            409 => StatusClass::Conflict,
            412 | 422 => StatusClass::Unprocessable(status),
            other => StatusClass::Unexpected(other),
        }
    }
}

/// Input of the decision table: a fault wins over the status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Fault { kind: FaultKind, status: u16 },
    Status(StatusClass),
}

impl Signal {
    pub fn of(outcome: &TransportOutcome) -> Self {
        match &outcome.fault {
            Some(fault) => Signal::Fault {
                kind: fault.kind.clone(),
                status: outcome.status,
            },
            None => Signal::Status(StatusClass::of(outcome.status)),
        }
    }
}

/// One row of the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Status reported on the envelope
    pub status: u16,
    /// Status mirrored on the body
    pub body_status: u16,
    pub code: ErrorCode,
    pub success: bool,
}

impl Verdict {
    fn ok(status: u16) -> Self {
        Self { status, body_status: status, code: ErrorCode::None, success: true }
    }

    /// No error, but not a success either (a 404 the caller did not ask to flag)
    fn pass(status: u16) -> Self {
        Self { status, body_status: status, code: ErrorCode::None, success: false }
    }

    /// Error reported under `status`, mirrored on the body
    fn fail(status: u16, code: ErrorCode) -> Self {
        Self { status, body_status: status, code, success: false }
    }

    /// Forced status with the original one kept on the body
    fn force_keeping_original(status: u16, original: u16, code: ErrorCode) -> Self {
        Self { status, body_status: original, code, success: false }
    }
}

/// The decision table
pub fn verdict(signal: &Signal, not_found: NotFoundPolicy, html: bool) -> Verdict {
    match signal {
        Signal::Fault { kind, status } => match (kind, *status) {
            (FaultKind::ServerError, 500) => Verdict::fail(502, ErrorCode::Remote),
            (FaultKind::ServerError, 502) => Verdict::fail(502, ErrorCode::RemotePropagated),
            (FaultKind::ServerError, 503) => Verdict::fail(503, ErrorCode::ServiceUnavailable),
            (FaultKind::ServerError, 504) => Verdict::fail(504, ErrorCode::TimeoutPropagated),
            (FaultKind::ServerError, other) => {
                Verdict::force_keeping_original(502, other, ErrorCode::MalignStatusUnexpected)
            }
            (FaultKind::TimedOut, _) => Verdict::fail(504, ErrorCode::Timeout),
            (FaultKind::HostUnreachable | FaultKind::ConnectionFailed, _) => {
                Verdict::fail(502, ErrorCode::HostUnavailable)
            }
            (FaultKind::NoResponseData, _) => Verdict::fail(502, ErrorCode::ResponseNone),
            (FaultKind::ContentTypeMismatch, _) => Verdict::fail(502, ErrorCode::ResponseType),
            (FaultKind::ParseError, _) => Verdict::fail(502, ErrorCode::ResponseFormat),
            (FaultKind::TooManyRedirects, _) => Verdict::fail(502, ErrorCode::TooManyRedirects),
            (FaultKind::MalformedTarget, _) => Verdict::fail(500, ErrorCode::LocalUse),
            (FaultKind::Other(_), _) => Verdict::fail(500, ErrorCode::Unknown),
        },
        Signal::Status(class) => match *class {
            StatusClass::Success(status) => Verdict::ok(status),
            StatusClass::NoContent if not_found.err_on_resource_not_found => {
                Verdict::fail(204, ErrorCode::ResourceNotFound)
            }
            StatusClass::NoContent => Verdict::ok(204),
            StatusClass::BadRequest => Verdict::fail(400, ErrorCode::RemoteValidationBad),
            StatusClass::Unauthenticated => Verdict::fail(401, ErrorCode::Unauthenticated),
            StatusClass::Forbidden => Verdict::fail(403, ErrorCode::Unauthorized),
            StatusClass::NotFound if not_found.err_on_endpoint_not_found && html => {
                Verdict::fail(404, ErrorCode::EndpointNotFound)
            }
            StatusClass::NotFound if not_found.err_on_resource_not_found => {
                Verdict::fail(404, ErrorCode::ResourceNotFound)
            }
            StatusClass::NotFound => Verdict::pass(404),
            StatusClass::Conflict => Verdict::fail(409, ErrorCode::RemoteConflict),
            StatusClass::Unprocessable(status) => Verdict::fail(status, ErrorCode::RemoteValidationFailed),
            StatusClass::Unexpected(status) => {
                Verdict::force_keeping_original(502, status, ErrorCode::BenignStatusUnexpected)
            }
        },
    }
}

/// Result of classifying one outcome
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub envelope: ResponseEnvelope,
    pub code: ErrorCode,
    /// Diagnostic detail for the log record; never shown to callers
    pub detail: Option<String>,
}

/// First required header the outcome does not carry
pub fn missing_header<'a>(outcome: &TransportOutcome, required: &'a [String]) -> Option<&'a str> {
    required
        .iter()
        .map(String::as_str)
        .find(|name| !outcome.headers_recorded || outcome.header(name).is_none())
}

/// Classify a transport outcome under the given options
pub fn classify(outcome: &TransportOutcome, options: &RequestOptions) -> Classification {
    let signal = Signal::of(outcome);
    let mut verdict = verdict(&signal, options.not_found, outcome.content_type_contains("html"));
    let mut detail = outcome.fault.as_ref().map(|f| f.to_string());

    if verdict.code.is_none() {
        if let Some(name) = missing_header(outcome, &options.required_headers) {
            verdict = Verdict::fail(502, ErrorCode::HeaderMissing);
            detail = Some(format!("required header '{}' missing", name));
        }
    }

    let mut envelope = if verdict.code.is_none() {
        let mut envelope = ResponseEnvelope::success(verdict.status, outcome.body.clone());
        envelope.body.success = verdict.success;
        envelope
    } else {
        ResponseEnvelope::failure(verdict.status, verdict.body_status, verdict.code, options.error_code_offset)
    };
    envelope.remote_headers = outcome.headers.clone();

    Classification {
        envelope,
        code: verdict.code,
        detail,
    }
}
