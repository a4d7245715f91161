//! Canned responses
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! A mock artifact is either an object of the shape
//! `{"status": 200, "headers": {...}, "payload": ...}` or any other JSON
//! value, which is then served as the payload of a 200. The canned outcome is
//! classified like a real JSON response and tagged with
//! [`MOCK_MARKER_HEADER`].

use crate::artifacts::ArtifactLoader;
use crate::classifier::{classify, Classification};
use crate::http::TransportOutcome;
use crate::response::MOCK_MARKER_HEADER;
use crate::store::Store;
use crate::types::RequestOptions;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared mock cache holding raw artifacts; classification happens per call
pub type MockStore = dyn Store<Value>;

/// Artifact shape of a canned response
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct CannedResponse {
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    payload: Value,
}

fn default_status() -> u16 {
    200
}

impl CannedResponse {
    /// Read the envelope shape, falling back to "the whole artifact is the payload"
    fn from_artifact(artifact: Value) -> Self {
        let shaped = artifact
            .as_object()
            .is_some_and(|fields| fields.contains_key("payload") || fields.contains_key("status"));
        if shaped {
            if let Ok(canned) = serde_json::from_value::<CannedResponse>(artifact.clone()) {
                return canned;
            }
        }
        Self {
            status: default_status(),
            headers: BTreeMap::new(),
            payload: artifact,
        }
    }

    fn into_outcome(self) -> TransportOutcome {
        self.headers
            .iter()
            .fold(TransportOutcome::json(self.status, self.payload.clone()), |outcome, (name, value)| {
                outcome.with_header(name, value.clone())
            })
    }
}

/// Resolves canned responses by operation and variant
#[derive(Clone)]
pub struct MockResolver {
    cache: Arc<MockStore>,
}

impl MockResolver {
    pub fn new(cache: Arc<MockStore>) -> Self {
        Self { cache }
    }

    /// Resolve the mock variant named in `options.mock`
    ///
    /// Missing, duplicated and unparsable artifacts are configuration errors.
    pub fn resolve(&self, options: &RequestOptions) -> Result<Classification> {
        let variant = options
            .mock
            .variant
            .as_deref()
            .ok_or_else(|| Error::configuration("mock resolution requested without a variant"))?;
        let key = options.operation.variant_key(variant);
        let use_cache = !options.mock.no_cache;

        let artifact = match self.cached(&key, use_cache) {
            Some(artifact) => artifact,
            None => {
                let artifact = ArtifactLoader::new(options.mock_paths.clone()).load(&key)?;
                if use_cache {
                    if let Err(e) = self.cache.set(&key, artifact.clone(), None) {
                        tracing::error!(key = %key, error = %e, "Mock cache write failed");
                    }
                }
                artifact
            }
        };

        let outcome = CannedResponse::from_artifact(artifact).into_outcome();
        let mut mock = classify(&outcome, options);
        mock.envelope.remote_headers.clear();
        mock.envelope
            .headers
            .extend(outcome.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        mock.envelope
            .headers
            .insert(MOCK_MARKER_HEADER.to_string(), variant.to_string());

        tracing::debug!(key = %key, status = mock.envelope.status, "Serving mock response");
        Ok(mock)
    }

    fn cached(&self, key: &str, use_cache: bool) -> Option<Value> {
        if !use_cache {
            return None;
        }
        match self.cache.get(key) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Mock cache read failed, loading artifact");
                None
            }
        }
    }
}

impl std::fmt::Debug for MockResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ErrorCode;
    use crate::store::MemoryStore;
    use crate::types::{ArtifactPaths, HttpMethod, Operation};
    use serde_json::json;
    use tempfile::TempDir;

    fn options(dir: &TempDir, variant: &str) -> RequestOptions {
        let mut options = RequestOptions::new(Operation::new("acme", "users", "lookup", HttpMethod::Get), "http://x")
            .with_mock(variant);
        options.mock_paths = ArtifactPaths {
            external: vec![dir.path().to_path_buf()],
            legacy: None,
        };
        options
    }

    fn resolver() -> (MockResolver, Arc<MemoryStore<Value>>) {
        let cache = Arc::new(MemoryStore::named("mocks"));
        (MockResolver::new(cache.clone()), cache)
    }

    #[test]
    fn test_shaped_artifact() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("acme.users.lookup.get.json"),
            json!({"status": 201, "headers": {"X-Trace": "t1"}, "payload": {"id": 9}}).to_string(),
        )
        .unwrap();

        let (resolver, cache) = resolver();
        let mock = resolver.resolve(&options(&dir, "default")).unwrap();

        assert_eq!(mock.code, ErrorCode::None);
        assert_eq!(mock.envelope.status, 201);
        assert_eq!(mock.envelope.body.payload, json!({"id": 9}));
        assert_eq!(mock.envelope.headers.get("x-trace").map(String::as_str), Some("t1"));
        assert!(mock.envelope.is_mock());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_bare_artifact_is_payload() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("acme.users.lookup.get.empty.yaml"), "- a\n- b\n").unwrap();

        let (resolver, _) = resolver();
        let mock = resolver.resolve(&options(&dir, "empty")).unwrap();
        assert_eq!(mock.envelope.status, 200);
        assert_eq!(mock.envelope.body.payload, json!(["a", "b"]));
        assert_eq!(mock.envelope.headers.get(MOCK_MARKER_HEADER).map(String::as_str), Some("empty"));
    }

    #[test]
    fn test_canned_error_status_is_classified() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("acme.users.lookup.get.denied.json"),
            json!({"status": 403, "payload": {"reason": "nope"}}).to_string(),
        )
        .unwrap();

        let (resolver, _) = resolver();
        let mock = resolver.resolve(&options(&dir, "denied")).unwrap();
        assert_eq!(mock.code, ErrorCode::Unauthorized);
        assert_eq!(mock.envelope.body.payload, Value::Null);
    }

    #[test]
    fn test_missing_artifact_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let (resolver, _) = resolver();
        let err = resolver.resolve(&options(&dir, "absent")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_cached_artifact_is_classified_under_current_options() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("acme.users.lookup.get.gone.json"), r#"{"status": 404}"#).unwrap();

        let (resolver, cache) = resolver();
        let first = resolver.resolve(&options(&dir, "gone")).unwrap();
        assert_eq!(first.code, ErrorCode::None);
        assert_eq!(first.envelope.body.code, 0);
        assert_eq!(cache.len(), 1);

        let mut strict = options(&dir, "gone");
        strict.not_found.err_on_resource_not_found = true;
        strict.error_code_offset = 1000;
        let second = resolver.resolve(&strict).unwrap();
        assert_eq!(second.code, ErrorCode::ResourceNotFound);
        assert_eq!(second.envelope.body.code, 1061);
        assert!(second.envelope.is_mock());

        // Served from the cache, not the file
        std::fs::remove_file(dir.path().join("acme.users.lookup.get.gone.json")).unwrap();
        let third = resolver.resolve(&strict.with_required_headers(["x-request-id"])).unwrap();
        assert_eq!(third.code, ErrorCode::ResourceNotFound);
    }

    #[test]
    fn test_no_cache_skips_the_store() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("acme.users.lookup.get.json"), "{}").unwrap();

        let (resolver, cache) = resolver();
        let mut opts = options(&dir, "default");
        opts.mock.no_cache = true;
        resolver.resolve(&opts).unwrap();
        assert!(cache.is_empty());
    }
}
