//! Mapping of reqwest errors onto transport faults

use crate::http::outcome::{Fault, FaultKind};
use std::error::Error as StdError;

/// Create a fault from a network/request error
pub fn fault_from_request_error(error: &reqwest::Error) -> Fault {
    let kind = if error.is_timeout() {
        FaultKind::TimedOut
    } else if error.is_redirect() {
        FaultKind::TooManyRedirects
    } else if error.is_builder() {
        FaultKind::MalformedTarget
    } else if error.is_connect() {
        if is_resolution_failure(error) {
            FaultKind::HostUnreachable
        } else {
            FaultKind::ConnectionFailed
        }
    } else if error.is_decode() || error.is_body() {
        FaultKind::ParseError
    } else {
        FaultKind::Other("transport failure".to_string())
    };

    Fault::new(kind, describe(error))
}

/// Fault for a target that does not form a valid URL
pub fn fault_from_url_error(error: &url::ParseError, target: &str) -> Fault {
    Fault::new(
        FaultKind::MalformedTarget,
        format!("invalid target '{}': {}", target, error),
    )
}

/// Whether a connect error was caused by name resolution
fn is_resolution_failure(error: &reqwest::Error) -> bool {
    source_chain(error).any(|text| {
        let text = text.to_ascii_lowercase();
        text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
            || text.contains("no such host")
    })
}

/// Full error text including the chain of causes
fn describe(error: &reqwest::Error) -> String {
    source_chain(error).collect::<Vec<_>>().join(": ")
}

fn source_chain<'a>(error: &'a (dyn StdError + 'static)) -> impl Iterator<Item = String> + 'a {
    std::iter::successors(Some(error), |&e| e.source()).map(|e| e.to_string())
}
