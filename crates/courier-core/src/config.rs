//! Operations file and option resolution
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! An operations file declares option layers at five levels:
//!
//! ```toml
//! [defaults]
//! timeout-ms = 5000
//!
//! [providers.acme]
//! base-url = "https://api.acme.test"
//!
//! [providers.acme.services.users.endpoints.lookup]
//! path = "v1/users"
//! cache = true
//!
//! [providers.acme.services.users.endpoints.lookup.methods.get]
//! validate = true
//! ```
//!
//! Layers merge field by field, later wins: defaults, provider, service,
//! endpoint, method, then the per-call override.

use crate::error::ConfigError;
use crate::types::{
    ArtifactPaths, CacheScope, HttpMethod, NotFoundPolicy, Operation, RequestOptions,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// One layer of optional settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OptionLayer {
    pub base_url: Option<String>,
    pub path: Option<String>,
    /// Outbound headers; merged per header name
    pub headers: Option<BTreeMap<String, String>>,
    pub timeout_ms: Option<u64>,
    pub expect_content_type: Option<String>,
    pub require_body: Option<bool>,

    pub cache: Option<bool>,
    pub cache_ttl_secs: Option<u64>,
    /// `*` for a shared entry, anything else is a caller identifier
    pub cache_scope: Option<String>,
    pub refresh: Option<bool>,

    pub validate: Option<bool>,
    pub rule_variants: Option<Vec<String>>,
    pub rule_no_cache: Option<bool>,
    pub rule_paths: Option<Vec<PathBuf>>,
    pub rule_legacy_path: Option<PathBuf>,

    pub mock: Option<String>,
    pub mock_no_cache: Option<bool>,
    pub mock_paths: Option<Vec<PathBuf>>,
    pub mock_legacy_path: Option<PathBuf>,

    pub required_headers: Option<Vec<String>>,
    pub err_on_endpoint_not_found: Option<bool>,
    pub err_on_resource_not_found: Option<bool>,
    pub retry_delay_ms: Option<u64>,
    pub warn_statuses: Option<Vec<u16>>,
    pub debug_dump: Option<bool>,
    pub app_title: Option<String>,
    pub error_code_offset: Option<u32>,
}

macro_rules! overlay {
    ($target:ident, $other:ident; $($field:ident),+ $(,)?) => {
        $(
            if $other.$field.is_some() {
                $target.$field = $other.$field.clone();
            }
        )+
    };
}

impl OptionLayer {
    /// Overlay `other` on top of `self`
    pub fn merge(&mut self, other: &OptionLayer) {
        let headers = match (self.headers.take(), &other.headers) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs.iter().map(|(k, v)| (k.clone(), v.clone())));
                Some(mine)
            }
            (mine, theirs) => theirs.clone().or(mine),
        };

        overlay!(self, other;
            base_url, path, timeout_ms, expect_content_type, require_body,
            cache, cache_ttl_secs, cache_scope, refresh,
            validate, rule_variants, rule_no_cache, rule_paths, rule_legacy_path,
            mock, mock_no_cache, mock_paths, mock_legacy_path,
            required_headers, err_on_endpoint_not_found, err_on_resource_not_found,
            retry_delay_ms, warn_statuses, debug_dump, app_title, error_code_offset,
        );
        self.headers = headers;
    }

    /// Merge a sequence of layers, later wins
    pub fn merged<'a>(layers: impl IntoIterator<Item = &'a OptionLayer>) -> OptionLayer {
        layers.into_iter().fold(OptionLayer::default(), |mut acc, layer| {
            acc.merge(layer);
            acc
        })
    }

    /// Turn a fully merged layer into request options
    pub fn into_options(self, operation: Operation) -> ConfigResult<RequestOptions> {
        let base_url = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingBaseUrl { operation: operation.id() })?;

        let mut options = RequestOptions::new(operation, base_url);

        options.path = self.path.unwrap_or_default();
        options.headers = self.headers.unwrap_or_default();
        if let Some(ms) = self.timeout_ms {
            options.timeout = Duration::from_millis(ms);
        }
        options.expect_content_type = self.expect_content_type;
        options.require_body = self.require_body.unwrap_or(false);

        options.cache.enabled = self.cache.unwrap_or(false);
        if let Some(ttl) = self.cache_ttl_secs {
            options.cache.ttl = Duration::from_secs(ttl);
        }
        if let Some(scope) = self.cache_scope {
            if scope.trim().is_empty() {
                return Err(ConfigError::InvalidScope { operation: options.operation.id() });
            }
            options.cache.scope = CacheScope::parse(&scope);
        }
        options.cache.refresh = self.refresh.unwrap_or(false);

        options.validation.enabled = self.validate.unwrap_or(false);
        options.validation.variants = self.rule_variants.unwrap_or_default();
        options.validation.no_cache = self.rule_no_cache.unwrap_or(false);
        options.rule_paths = ArtifactPaths {
            external: self.rule_paths.unwrap_or_default(),
            legacy: self.rule_legacy_path,
        };

        options.mock.variant = self.mock.filter(|variant| !variant.is_empty());
        options.mock.no_cache = self.mock_no_cache.unwrap_or(false);
        options.mock_paths = ArtifactPaths {
            external: self.mock_paths.unwrap_or_default(),
            legacy: self.mock_legacy_path,
        };

        options.required_headers = self.required_headers.unwrap_or_default();
        options.not_found = NotFoundPolicy {
            err_on_endpoint_not_found: self.err_on_endpoint_not_found.unwrap_or(false),
            err_on_resource_not_found: self.err_on_resource_not_found.unwrap_or(false),
        };
        options.retry_delay = self.retry_delay_ms.map(Duration::from_millis).unwrap_or(Duration::ZERO);
        options.warn_statuses = self.warn_statuses.unwrap_or_default();
        options.debug_dump = self.debug_dump.unwrap_or(false);
        if let Some(title) = self.app_title {
            options.app_title = title;
        }
        options.error_code_offset = self.error_code_offset.unwrap_or(0);

        Ok(options)
    }
}

/// Endpoint layer with per-method layers below it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    #[serde(flatten)]
    pub options: OptionLayer,
    pub methods: BTreeMap<String, OptionLayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    #[serde(flatten)]
    pub options: OptionLayer,
    pub endpoints: BTreeMap<String, EndpointConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub options: OptionLayer,
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Parsed operations file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub defaults: OptionLayer,
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// Operations file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

impl ConfigFile {
    /// Load from a file, detecting the format from its extension
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, format, path)
    }

    /// Parse content in the given format; `path` is only used in errors
    pub fn parse(content: &str, format: ConfigFormat, path: &Path) -> ConfigResult<Self> {
        let parse_error = |reason: String| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        }
    }
}

/// Resolves request options for operations declared in a [`ConfigFile`]
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    file: ConfigFile,
}

impl ConfigResolver {
    pub fn new(file: ConfigFile) -> Self {
        Self { file }
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        ConfigFile::from_file(path).map(Self::new)
    }

    /// The layers that apply to an operation, outermost first
    pub fn layers(&self, operation: &Operation) -> ConfigResult<Vec<&OptionLayer>> {
        let provider = self
            .file
            .providers
            .get(&operation.provider)
            .ok_or_else(|| ConfigError::UnknownProvider {
                provider: operation.provider.clone(),
            })?;
        let service = provider
            .services
            .get(&operation.service)
            .ok_or_else(|| ConfigError::UnknownService {
                provider: operation.provider.clone(),
                service: operation.service.clone(),
            })?;
        let endpoint = service
            .endpoints
            .get(&operation.endpoint)
            .ok_or_else(|| ConfigError::UnknownEndpoint {
                provider: operation.provider.clone(),
                service: operation.service.clone(),
                endpoint: operation.endpoint.clone(),
            })?;

        let mut layers = vec![&self.file.defaults, &provider.options, &service.options, &endpoint.options];
        for (name, layer) in &endpoint.methods {
            let method = HttpMethod::parse(name).ok_or_else(|| ConfigError::InvalidMethod {
                method: name.clone(),
            })?;
            if method == operation.method {
                layers.push(layer);
            }
        }
        Ok(layers)
    }

    /// Fully merged options for one operation, with an optional per-call override on top
    pub fn resolve(&self, operation: Operation, overrides: Option<&OptionLayer>) -> ConfigResult<RequestOptions> {
        let mut layers = self.layers(&operation)?;
        layers.extend(overrides);
        let merged = OptionLayer::merged(layers);
        tracing::debug!(operation = %operation, "Resolved request options");
        merged.into_options(operation)
    }

    /// Every configured operation, one per declared method (GET when none is declared)
    pub fn operations(&self) -> Vec<Operation> {
        let mut operations = Vec::new();
        for (provider_name, provider) in &self.file.providers {
            for (service_name, service) in &provider.services {
                for (endpoint_name, endpoint) in &service.endpoints {
                    let methods: Vec<HttpMethod> = if endpoint.methods.is_empty() {
                        vec![HttpMethod::Get]
                    } else {
                        endpoint.methods.keys().filter_map(|m| HttpMethod::parse(m)).collect()
                    };
                    operations.extend(
                        methods
                            .into_iter()
                            .map(|m| Operation::new(provider_name, service_name, endpoint_name, m)),
                    );
                }
            }
        }
        operations
    }
}
