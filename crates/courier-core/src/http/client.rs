//! reqwest-backed transport adapter
//!
//! One [`HttpTransport`] (and therefore one connection pool) serves every
//! operation; per-request settings such as the timeout travel with the
//! [`TransportRequest`]. Applications that need differently configured
//! clients keep their own map of transports and pick one per call.

use crate::http::error::{fault_from_request_error, fault_from_url_error};
use crate::http::outcome::{decode_body, Fault, FaultKind, TransportOutcome, TransportRequest};
use crate::http::Transport;
use crate::types::HttpMethod;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Redirects followed before failing with "too many redirects"
    pub max_redirects: usize,
    /// Whether to validate TLS certificates
    pub validate_tls: bool,
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_redirects: 5,
            validate_tls: true,
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Transport adapter speaking HTTP/JSON through reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Create a new transport
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(!config.validate_tls)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(anyhow::Error::new(e)),
            })?;

        Ok(Self { client })
    }

    /// Create with default configuration
    pub fn with_default_config() -> Result<Self> {
        Self::new(HttpTransportConfig::default())
    }

    async fn execute(&self, request: &TransportRequest) -> TransportOutcome {
        let url = match build_url(request) {
            Ok(url) => url,
            Err(fault) => return TransportOutcome::failed(fault),
        };

        tracing::debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return TransportOutcome::failed(fault_from_request_error(&e)),
        };

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let content_type = headers.get("content-type").cloned();

        let raw = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return TransportOutcome {
                    status,
                    body: serde_json::Value::Null,
                    content_type,
                    headers,
                    headers_recorded: true,
                    fault: Some(fault_from_request_error(&e)),
                }
            }
        };

        let (body, decode_fault) = decode_body(
            status,
            content_type.as_deref(),
            &raw,
            request.expect_content_type.as_deref(),
            request.require_body,
        );

        // A 5xx is a server error whatever the body looked like
        let fault = if status >= 500 {
            Some(Fault::new(FaultKind::ServerError, format!("remote answered {}", status)).with_code(status as i64))
        } else {
            decode_fault
        };

        TransportOutcome {
            status,
            body,
            content_type,
            headers,
            headers_recorded: true,
            fault,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &TransportRequest) -> TransportOutcome {
        self.execute(request).await
    }
}

/// Base address + configured path + escaped argument segments + query
pub fn build_url(request: &TransportRequest) -> std::result::Result<Url, Fault> {
    let mut url = Url::parse(&request.base_url).map_err(|e| fault_from_url_error(&e, &request.base_url))?;

    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            Fault::new(
                FaultKind::MalformedTarget,
                format!("base address '{}' cannot carry a path", request.base_url),
            )
        })?;
        segments.pop_if_empty();
        segments.extend(request.path.split('/').filter(|s| !s.is_empty()));
        segments.extend(request.segments.iter().map(String::as_str));
    }

    if !request.query.is_empty() {
        url.query_pairs_mut().extend_pairs(request.query.iter());
    }

    Ok(url)
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
    }
}
