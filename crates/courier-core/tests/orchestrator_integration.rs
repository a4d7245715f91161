//! End-to-end tests of the request lifecycle against a scripted transport


use courier_core::http::FaultKind;
use courier_core::response::MOCK_MARKER_HEADER;
use courier_core::{Arguments, CacheScope, ErrorCode, Orchestrator, ResponseEnvelope, Validated};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_support::*;

fn engine(transport: &Arc<ScriptedTransport>) -> Orchestrator {
    Orchestrator::new(transport.clone())
}

async fn run(engine: &Orchestrator, options: &courier_core::RequestOptions) -> ResponseEnvelope {
    engine.execute(options, &Arguments::new()).await
}

#[tokio::test]
async fn test_plain_success() {
    let transport = Arc::new(ScriptedTransport::always(ok(json!({"id": 42}))));
    let envelope = run(&engine(&transport), &options()).await;

    assert_eq!(envelope.status, 200);
    assert!(envelope.body.success);
    assert_eq!(envelope.body.code, 0);
    assert_eq!(envelope.body.payload, json!({"id": 42}));
    assert!(envelope.body.message.is_empty());
    assert_eq!(envelope.validated, Validated::NotAttempted);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_arguments_reach_the_transport() {
    let transport = Arc::new(ScriptedTransport::always(ok(json!({}))));
    let args = Arguments::new().segment("42").query("expand", "roles");
    engine(&transport).execute(&options(), &args).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].base_url, "http://remote.test");
    assert_eq!(requests[0].path, "v1/users");
    assert_eq!(requests[0].segments, vec!["42".to_string()]);
    assert_eq!(requests[0].query.get("expand").map(String::as_str), Some("roles"));
}

#[tokio::test]
async fn test_resource_not_found() {
    let transport = Arc::new(ScriptedTransport::always(courier_core::TransportOutcome::json(404, json!({"detail": "no user"}))));
    let mut opts = options();
    opts.not_found.err_on_resource_not_found = true;

    let envelope = run(&engine(&transport), &opts).await;
    assert_eq!(envelope.status, 404);
    assert!(!envelope.body.success);
    assert_eq!(envelope.body.code, ErrorCode::ResourceNotFound.base());
    assert_eq!(envelope.body.payload, Value::Null);
}

#[tokio::test]
async fn test_server_error_becomes_remote() {
    let transport = Arc::new(ScriptedTransport::always(server_error(500)));
    let envelope = run(&engine(&transport), &options()).await;

    assert_eq!(envelope.status, 502);
    assert_eq!(envelope.body.code, ErrorCode::Remote.base());
    assert!(!envelope.body.message.is_empty());
    assert!(!envelope.body.message.contains("remote answered"));
}

#[tokio::test]
async fn test_error_code_offset_is_applied() {
    let transport = Arc::new(ScriptedTransport::always(fault(FaultKind::TimedOut, 0)));
    let mut opts = options();
    opts.error_code_offset = 7000;

    let envelope = run(&engine(&transport), &opts).await;
    assert_eq!(envelope.status, 504);
    assert_eq!(envelope.body.code, 7030);
}

#[tokio::test]
async fn test_cache_round_trip_is_verbatim() {
    let transport = Arc::new(ScriptedTransport::new([ok(json!({"v": 1})), ok(json!({"v": 2}))]));
    let engine = engine(&transport);
    let opts = options().with_cache(Duration::from_secs(60), CacheScope::Shared);

    let first = run(&engine, &opts).await;

    // A policy change after the write must not re-evaluate the cached envelope
    let mut changed = opts.clone();
    changed.required_headers = vec!["x-never-sent".to_string()];
    changed.error_code_offset = 500;
    let second = run(&engine, &changed).await;

    assert_eq!(second, first);
    assert_eq!(second.body.payload, json!({"v": 1}));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_cache_entries_expire() {
    let transport = Arc::new(ScriptedTransport::new([ok(json!({"v": 1})), ok(json!({"v": 2}))]));
    let engine = engine(&transport);
    let opts = options().with_cache(Duration::from_millis(20), CacheScope::Shared);

    run(&engine, &opts).await;
    tokio::time::sleep(Duration::from_millis(40)).await;
    let envelope = run(&engine, &opts).await;

    assert_eq!(envelope.body.payload, json!({"v": 2}));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_refresh_skips_read_but_writes() {
    let transport = Arc::new(ScriptedTransport::new([ok(json!({"v": 1})), ok(json!({"v": 2}))]));
    let engine = engine(&transport);
    let opts = options().with_cache(Duration::from_secs(60), CacheScope::Shared);

    run(&engine, &opts).await;
    let mut refresh = opts.clone();
    refresh.cache.refresh = true;
    let refreshed = run(&engine, &refresh).await;
    assert_eq!(refreshed.body.payload, json!({"v": 2}));

    let cached = run(&engine, &opts).await;
    assert_eq!(cached.body.payload, json!({"v": 2}));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_cache_scopes_are_isolated() {
    let transport = Arc::new(ScriptedTransport::new([ok(json!({"who": "alice"})), ok(json!({"who": "bob"}))]));
    let engine = engine(&transport);
    let alice = options().with_cache(Duration::from_secs(60), CacheScope::Caller("alice".into()));
    let bob = options().with_cache(Duration::from_secs(60), CacheScope::Caller("bob".into()));

    run(&engine, &alice).await;
    let for_bob = run(&engine, &bob).await;
    assert_eq!(for_bob.body.payload, json!({"who": "bob"}));
    assert_eq!(run(&engine, &alice).await.body.payload, json!({"who": "alice"}));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let transport = Arc::new(ScriptedTransport::new([server_error(502), ok(json!({"v": 1}))]));
    let engine = engine(&transport);
    let opts = options().with_cache(Duration::from_secs(60), CacheScope::Shared);

    let failed = run(&engine, &opts).await;
    assert_eq!(failed.body.code, ErrorCode::RemotePropagated.base());

    let recovered = run(&engine, &opts).await;
    assert!(recovered.body.success);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_retry_happens_exactly_once() {
    let transport = Arc::new(ScriptedTransport::always(fault(FaultKind::ConnectionFailed, 0)));
    let opts = options().with_retry_delay(Duration::from_millis(5));

    let envelope = run(&engine(&transport), &opts).await;
    assert_eq!(envelope.status, 502);
    assert_eq!(envelope.body.code, ErrorCode::HostUnavailable.base());
    assert_eq!(transport.calls(), 2);
    assert_eq!(transport.resets(), 1);
}

#[tokio::test]
async fn test_retry_can_recover() {
    let transport = Arc::new(ScriptedTransport::new([server_error(503), ok(json!({"up": true}))]));
    let opts = options().with_retry_delay(Duration::from_millis(5));

    let envelope = run(&engine(&transport), &opts).await;
    assert!(envelope.body.success);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_no_retry_without_delay_or_for_permanent_faults() {
    let transport = Arc::new(ScriptedTransport::always(fault(FaultKind::HostUnreachable, 0)));
    run(&engine(&transport), &options()).await;
    assert_eq!(transport.calls(), 1);

    let transport = Arc::new(ScriptedTransport::always(fault(FaultKind::TimedOut, 0)));
    run(&engine(&transport), &options().with_retry_delay(Duration::from_millis(5))).await;
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_cold_cache_executions_are_not_deduplicated() {
    let transport = Arc::new(ScriptedTransport::always(courier_core::TransportOutcome::json(401, json!({}))));
    let engine = engine(&transport);
    let opts = options().with_cache(Duration::from_secs(60), CacheScope::Shared);

    let first = run(&engine, &opts).await;
    let second = run(&engine, &opts).await;
    assert_eq!(first.body.code, ErrorCode::Unauthenticated.base());
    assert_eq!(second.body.code, first.body.code);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_validation_first_pass_wins_and_gates_cache() {
    let rules = TempDir::new().unwrap();
    write_artifact(rules.path(), "acme.users.lookup.get.strict", &json!({"required": ["email"]}));
    write_artifact(rules.path(), "acme.users.lookup.get", &json!({"required": ["id"]}));

    let transport = Arc::new(ScriptedTransport::always(ok(json!({"id": 1}))));
    let engine = engine(&transport);
    let mut opts = options()
        .with_validation(["strict", "default"])
        .with_cache(Duration::from_secs(60), CacheScope::Shared);
    opts.rule_paths = paths_in(rules.path());

    let envelope = run(&engine, &opts).await;
    assert!(envelope.body.success);
    assert_eq!(envelope.validated, Validated::Passed);

    let cached = run(&engine, &opts).await;
    assert_eq!(cached.validated, Validated::Passed);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_validation_failure_downgrades_envelope() {
    let rules = TempDir::new().unwrap();
    write_artifact(rules.path(), "acme.users.lookup.get", &json!({"required": ["email"]}));

    let transport = Arc::new(ScriptedTransport::always(ok(json!({"id": 1, "secret": "s3"}))));
    let engine = engine(&transport);
    let mut opts = options()
        .with_validation(Vec::<String>::new())
        .with_cache(Duration::from_secs(60), CacheScope::Shared);
    opts.rule_paths = paths_in(rules.path());

    let envelope = run(&engine, &opts).await;
    assert_eq!(envelope.status, 502);
    assert!(!envelope.body.success);
    assert_eq!(envelope.body.code, ErrorCode::ResponseValidation.base());
    assert_eq!(envelope.body.payload, Value::Null);
    assert_eq!(envelope.validated, Validated::Failed);

    // Not cached: the second call reaches the network again
    run(&engine, &opts).await;
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_missing_rule_set_is_configuration_error() {
    let rules = TempDir::new().unwrap();
    let transport = Arc::new(ScriptedTransport::always(ok(json!({"id": 1}))));
    let mut opts = options().with_validation(["default"]);
    opts.rule_paths = paths_in(rules.path());

    let envelope = run(&engine(&transport), &opts).await;
    assert_eq!(envelope.status, 500);
    assert_eq!(envelope.body.code, ErrorCode::LocalConfiguration.base());
    assert_eq!(envelope.body.payload, Value::Null);
    assert_eq!(envelope.validated, Validated::Failed);
}

#[tokio::test]
async fn test_mock_suppresses_network_and_cache() {
    let mocks = TempDir::new().unwrap();
    write_artifact(mocks.path(), "acme.users.lookup.get.empty", &json!({"payload": []}));

    let transport = Arc::new(ScriptedTransport::always(ok(json!({"from": "network"}))));
    let engine = engine(&transport);
    let cached = options().with_cache(Duration::from_secs(60), CacheScope::Shared);
    run(&engine, &cached).await;

    let mut mocked = cached.clone().with_mock("empty");
    mocked.mock_paths = paths_in(mocks.path());
    let envelope = run(&engine, &mocked).await;

    assert_eq!(envelope.body.payload, json!([]));
    assert_eq!(envelope.headers.get(MOCK_MARKER_HEADER).map(String::as_str), Some("empty"));
    assert!(envelope.is_mock());

    // The mock was not written to the response cache either
    let again = run(&engine, &cached).await;
    assert_eq!(again.body.payload, json!({"from": "network"}));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_required_header_missing() {
    let transport = Arc::new(ScriptedTransport::always(ok(json!({"id": 1}))));
    let opts = options().with_required_headers(["x-request-id"]);

    let envelope = run(&engine(&transport), &opts).await;
    assert_eq!(envelope.status, 502);
    assert_eq!(envelope.body.code, ErrorCode::HeaderMissing.base());
}

#[tokio::test]
async fn test_remote_headers_never_serialized() {
    let transport = Arc::new(ScriptedTransport::always(ok(json!({})).with_header("Set-Cookie", "session=abc")));
    let envelope = run(&engine(&transport), &options()).await;

    assert_eq!(envelope.remote_headers.get("set-cookie").map(String::as_str), Some("session=abc"));
    let serialized = serde_json::to_string(&envelope).unwrap();
    assert!(!serialized.contains("session=abc"));
}

#[tokio::test]
async fn test_not_found_without_flags_is_cached_pass_through() {
    let transport = Arc::new(ScriptedTransport::always(courier_core::TransportOutcome::json(404, json!({"items": []}))));
    let engine = engine(&transport);
    let opts = options().with_cache(Duration::from_secs(60), CacheScope::Shared);

    let envelope = run(&engine, &opts).await;
    assert_eq!(envelope.status, 404);
    assert!(!envelope.body.success);
    assert_eq!(envelope.body.code, 0);

    run(&engine, &opts).await;
    assert_eq!(transport.calls(), 1);
}
