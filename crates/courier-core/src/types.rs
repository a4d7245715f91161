//! Core type definitions for Courier
//!
//! [`RequestOptions`] is the fully resolved, read-only description of one
//! outbound call. It is produced by the [`config`](crate::config) resolver and
//! never mutated by the engine.

use crate::catalog::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the rule-set / mock variant used when none is declared
pub const DEFAULT_VARIANT: &str = "default";

/// Scope marker for cache entries shared by every caller
pub const SHARED_SCOPE: &str = "*";

/// Identity of a configured remote operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub provider: String,
    pub service: String,
    pub endpoint: String,
    pub method: HttpMethod,
}

impl Operation {
    pub fn new(
        provider: impl Into<String>,
        service: impl Into<String>,
        endpoint: impl Into<String>,
        method: HttpMethod,
    ) -> Self {
        Self {
            provider: provider.into(),
            service: service.into(),
            endpoint: endpoint.into(),
            method,
        }
    }

    /// Dotted identifier, e.g. `acme.users.lookup.get`
    pub fn id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.provider,
            self.service,
            self.endpoint,
            self.method.as_str().to_ascii_lowercase()
        )
    }

    /// Artifact / cache name for a variant: `id` for the default variant, `id.variant` otherwise
    pub fn variant_key(&self, variant: &str) -> String {
        if variant == DEFAULT_VARIANT {
            self.id()
        } else {
            format!("{}.{}", self.id(), variant)
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// HTTP method of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Parse a method name case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may read a cached envelope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// One entry for every caller
    Shared,
    /// One entry per caller identifier
    Caller(String),
}

impl CacheScope {
    pub fn as_key_part(&self) -> &str {
        match self {
            CacheScope::Shared => SHARED_SCOPE,
            CacheScope::Caller(id) => id,
        }
    }

    /// `*` means shared, anything else is a caller identifier
    pub fn parse(raw: &str) -> Self {
        if raw == SHARED_SCOPE {
            CacheScope::Shared
        } else {
            CacheScope::Caller(raw.to_string())
        }
    }
}

impl Default for CacheScope {
    fn default() -> Self {
        CacheScope::Shared
    }
}

/// Response caching policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub enabled: bool,
    /// Time-to-live of a written entry
    pub ttl: Duration,
    pub scope: CacheScope,
    /// Skip the read but still write the fresh envelope
    pub refresh: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: Duration::from_secs(300),
            scope: CacheScope::Shared,
            refresh: false,
        }
    }
}

impl CachePolicy {
    /// Cache key of an operation under this policy
    pub fn key(&self, operation: &Operation) -> String {
        format!("{}[user-{}]", operation.id(), self.scope.as_key_part())
    }
}

/// Response validation policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationPolicy {
    pub enabled: bool,
    /// Rule-set variants, tried in order; empty means `[default]`
    pub variants: Vec<String>,
    /// Do not read or write the rule-set cache
    pub no_cache: bool,
}

impl ValidationPolicy {
    /// Effective variant list
    pub fn variants(&self) -> Vec<String> {
        if self.variants.is_empty() {
            vec![DEFAULT_VARIANT.to_string()]
        } else {
            self.variants.clone()
        }
    }
}

/// Canned response policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MockPolicy {
    /// Variant to serve; `None` disables mocking
    pub variant: Option<String>,
    pub no_cache: bool,
}

impl MockPolicy {
    pub fn is_active(&self) -> bool {
        self.variant.is_some()
    }
}

/// How 204/404 responses are disambiguated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotFoundPolicy {
    /// 404 with an HTML body means the route itself does not exist
    pub err_on_endpoint_not_found: bool,
    /// 204 and remaining 404s mean the addressed resource does not exist
    pub err_on_resource_not_found: bool,
}

/// Where rule-set and mock artifacts are looked up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArtifactPaths {
    /// Externally declared directories, searched first
    pub external: Vec<PathBuf>,
    /// Legacy directory, searched when no external directory has the artifact
    pub legacy: Option<PathBuf>,
}

/// Fully resolved options for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    pub operation: Operation,
    /// Scheme and host (and optional prefix path) of the remote
    pub base_url: String,
    /// Path below the base address
    pub path: String,
    /// Outbound headers sent with every attempt
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
    /// Content type the response must declare
    pub expect_content_type: Option<String>,
    /// An empty body is a "no response data" fault
    pub require_body: bool,
    pub cache: CachePolicy,
    pub validation: ValidationPolicy,
    pub mock: MockPolicy,
    pub rule_paths: ArtifactPaths,
    pub mock_paths: ArtifactPaths,
    /// Headers the response must carry
    pub required_headers: Vec<String>,
    pub not_found: NotFoundPolicy,
    /// Delay before the single retry; zero disables retrying
    pub retry_delay: Duration,
    /// Statuses whose remote-status errors log at warning instead of error
    pub warn_statuses: Vec<u16>,
    pub debug_dump: bool,
    /// Passed to the text resolver as `application-title`
    pub app_title: String,
    /// Added to every reported error code
    pub error_code_offset: u32,
    /// Configuration fault detected before execution; short-circuits the request
    pub preflight_error: Option<ErrorCode>,
}

impl RequestOptions {
    /// Options with defaults for everything but the target
    pub fn new(operation: Operation, base_url: impl Into<String>) -> Self {
        Self {
            operation,
            base_url: base_url.into(),
            path: String::new(),
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(30),
            expect_content_type: None,
            require_body: false,
            cache: CachePolicy::default(),
            validation: ValidationPolicy::default(),
            mock: MockPolicy::default(),
            rule_paths: ArtifactPaths::default(),
            mock_paths: ArtifactPaths::default(),
            required_headers: Vec::new(),
            not_found: NotFoundPolicy::default(),
            retry_delay: Duration::ZERO,
            warn_statuses: Vec::new(),
            debug_dump: false,
            app_title: "Courier".to_string(),
            error_code_offset: 0,
            preflight_error: None,
        }
    }

    /// Options that only carry an abort condition
    pub fn aborted(operation: Operation, code: ErrorCode) -> Self {
        let mut options = Self::new(operation, String::new());
        options.preflight_error = Some(code);
        options
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_cache(mut self, ttl: Duration, scope: CacheScope) -> Self {
        self.cache.enabled = true;
        self.cache.ttl = ttl;
        self.cache.scope = scope;
        self
    }

    pub fn with_validation<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation.enabled = true;
        self.validation.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mock(mut self, variant: impl Into<String>) -> Self {
        self.mock.variant = Some(variant.into());
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_required_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn cache_key(&self) -> String {
        self.cache.key(&self.operation)
    }
}

/// Per-call arguments: positional path segments, named query parameters and a body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Arguments {
    pub segments: Vec<String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
