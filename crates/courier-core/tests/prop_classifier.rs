//! Property-based tests for outcome classification
//!
//! Every fault kind and every status in 0..=999, under every combination of
//! not-found flags and content types, must land on exactly one verdict that
//! keeps the envelope invariants.

use courier_core::classifier::{classify, verdict, Signal, StatusClass};
use courier_core::http::{Fault, FaultKind, TransportOutcome};
use courier_core::response::SUCCESS_STATUSES;
use courier_core::{ErrorCode, HttpMethod, NotFoundPolicy, Operation, RequestOptions};
use proptest::prelude::*;
use serde_json::{json, Value};

// Strategy functions for property testing

fn fault_kind_strategy() -> impl Strategy<Value = FaultKind> {
    prop_oneof![
        proptest::sample::select(FaultKind::NAMED.to_vec()),
        "[a-z ]{1,20}".prop_map(|name| FaultKind::from_name(&name)),
    ]
}

fn not_found_strategy() -> impl Strategy<Value = NotFoundPolicy> {
    (any::<bool>(), any::<bool>()).prop_map(|(endpoint, resource)| NotFoundPolicy {
        err_on_endpoint_not_found: endpoint,
        err_on_resource_not_found: resource,
    })
}

fn content_type_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop_oneof![
        Just("application/json".to_string()),
        Just("text/html; charset=utf-8".to_string()),
        Just("text/plain".to_string()),
    ])
}

fn options(not_found: NotFoundPolicy, offset: u32) -> RequestOptions {
    let mut options = RequestOptions::new(Operation::new("acme", "users", "lookup", HttpMethod::Get), "http://x");
    options.not_found = not_found;
    options.error_code_offset = offset;
    options
}

proptest! {
    #[test]
    fn prop_every_status_maps_to_one_consistent_verdict(
        status in 0u16..=999,
        not_found in not_found_strategy(),
        content_type in content_type_strategy(),
        offset in 0u32..10_000,
    ) {
        let mut outcome = TransportOutcome::json(status, json!({"upstream": "detail"}));
        outcome.content_type = content_type;
        let result = classify(&outcome, &options(not_found, offset));

        prop_assert!(result.envelope.is_consistent());
        prop_assert_eq!(result.envelope.body.code, result.code.reported(offset));

        if result.code.is_none() {
            // Only the enumerated statuses (and an unflagged 404) escape classification
            prop_assert!(SUCCESS_STATUSES.contains(&status) || status == 404);
            prop_assert_eq!(result.envelope.status, status);
        } else {
            prop_assert!(!result.envelope.body.success);
            prop_assert_eq!(&result.envelope.body.payload, &Value::Null);
        }

        if let StatusClass::Unexpected(original) = StatusClass::of(status) {
            prop_assert_eq!(result.code, ErrorCode::BenignStatusUnexpected);
            prop_assert_eq!(result.envelope.status, 502);
            prop_assert_eq!(result.envelope.body.status, original);
        }
    }

    #[test]
    fn prop_every_fault_is_an_error(
        kind in fault_kind_strategy(),
        status in 0u16..=999,
        not_found in not_found_strategy(),
    ) {
        let mut outcome = TransportOutcome::failed(Fault::new(kind.clone(), "raw diagnostic text"));
        outcome.status = status;
        let result = classify(&outcome, &options(not_found, 0));

        prop_assert!(!result.code.is_none());
        prop_assert!(!result.envelope.body.success);
        prop_assert!([500, 502, 503, 504].contains(&result.envelope.status));
        prop_assert_eq!(&result.envelope.body.payload, &Value::Null);
        prop_assert!(!result.envelope.body.message.contains("raw diagnostic text"));

        // The verdict depends on the fault and its status only, never on not-found flags
        let plain = verdict(&Signal::Fault { kind, status }, NotFoundPolicy::default(), false);
        prop_assert_eq!(plain.code, result.code);
        prop_assert_eq!(plain.status, result.envelope.status);
    }

    #[test]
    fn prop_required_header_only_fires_without_earlier_code(
        status in 0u16..=999,
        present in any::<bool>(),
    ) {
        let mut outcome = TransportOutcome::json(status, json!({}));
        if present {
            outcome = outcome.with_header("X-Request-Id", "r-1");
        }
        let opts = options(NotFoundPolicy::default(), 0).with_required_headers(["x-request-id"]);
        let without = classify(&outcome, &options(NotFoundPolicy::default(), 0));
        let with = classify(&outcome, &opts);

        if without.code.is_none() && !present {
            prop_assert_eq!(with.code, ErrorCode::HeaderMissing);
            prop_assert_eq!(with.envelope.status, 502);
        } else {
            prop_assert_eq!(with.code, without.code);
            prop_assert_eq!(with.envelope.status, without.envelope.status);
        }
    }
}

#[test]
fn test_every_named_fault_has_its_own_row() {
    let expected = [
        (FaultKind::TimedOut, 504, ErrorCode::Timeout),
        (FaultKind::HostUnreachable, 502, ErrorCode::HostUnavailable),
        (FaultKind::ConnectionFailed, 502, ErrorCode::HostUnavailable),
        (FaultKind::NoResponseData, 502, ErrorCode::ResponseNone),
        (FaultKind::ContentTypeMismatch, 502, ErrorCode::ResponseType),
        (FaultKind::ParseError, 502, ErrorCode::ResponseFormat),
        (FaultKind::TooManyRedirects, 502, ErrorCode::TooManyRedirects),
        (FaultKind::MalformedTarget, 500, ErrorCode::LocalUse),
        (FaultKind::Other("socket reset".to_string()), 500, ErrorCode::Unknown),
    ];
    for (kind, status, code) in expected {
        let v = verdict(&Signal::Fault { kind: kind.clone(), status: 0 }, NotFoundPolicy::default(), false);
        assert_eq!((v.status, v.code), (status, code), "fault {}", kind);
    }
}
