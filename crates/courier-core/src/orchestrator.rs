//! Request lifecycle
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! [`Orchestrator::execute`] decides between the abort, mock, cache and
//! network paths, runs the transport with at most one retry, classifies the
//! outcome, validates it and writes the cache. Whatever happens it returns a
//! well-formed [`ResponseEnvelope`].

use crate::catalog::{ErrorCategory, ErrorCode};
use crate::classifier::{classify, Classification};
use crate::error::Severity;
use crate::http::{
    Fault, RetryDecision, RetryPolicy, Transport, TransportOutcome, TransportRequest,
};
use crate::logging::{log_event, LogContext, LogVariables};
use crate::mock::{MockResolver, MockStore};
use crate::response::{ResponseEnvelope, Validated};
use crate::store::{MemoryStore, Store};
use crate::text::{error_variables, CatalogText, TextResolver};
use crate::types::{Arguments, RequestOptions};
use crate::validation::{RuleSet, RuleSetStore, ValidationEngine, ValidationReport};
use crate::{log_vars, Error, Result};
use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Shared response cache
pub type ResponseStore = dyn Store<ResponseEnvelope>;

/// The request execution engine
///
/// Cheap to clone; every collaborator is behind an `Arc`. There is no request
/// coalescing: concurrent misses on one cache key each reach the network and
/// the last write wins.
#[derive(Clone)]
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    responses: Arc<ResponseStore>,
    validation: ValidationEngine,
    mocks: MockResolver,
    text: Arc<dyn TextResolver>,
}

impl Orchestrator {
    /// Engine with in-memory stores and the English message table
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            responses: Arc::new(MemoryStore::<ResponseEnvelope>::named("responses")),
            validation: ValidationEngine::new(Arc::new(MemoryStore::<Arc<dyn RuleSet>>::named("rule-sets"))),
            mocks: MockResolver::new(Arc::new(MemoryStore::<Value>::named("mocks"))),
            text: Arc::new(CatalogText::english()),
        }
    }

    pub fn with_response_cache(mut self, store: Arc<ResponseStore>) -> Self {
        self.responses = store;
        self
    }

    pub fn with_rule_cache(mut self, store: Arc<RuleSetStore>) -> Self {
        self.validation = ValidationEngine::new(store);
        self
    }

    pub fn with_mock_cache(mut self, store: Arc<MockStore>) -> Self {
        self.mocks = MockResolver::new(store);
        self
    }

    pub fn with_text_resolver(mut self, text: Arc<dyn TextResolver>) -> Self {
        self.text = text;
        self
    }

    /// Run one request to completion
    ///
    /// Errors and panics raised by collaborators end in a `local-algo` 500.
    pub async fn execute(&self, options: &RequestOptions, args: &Arguments) -> ResponseEnvelope {
        match AssertUnwindSafe(self.try_execute(options, args)).catch_unwind().await {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(e)) => self.internal_failure(
                options,
                log_vars!("error" => e.to_string(), "debug" => format!("{:?}", e)),
            ),
            Err(panic) => self.internal_failure(
                options,
                log_vars!("error" => panic_message(panic.as_ref()), "panic" => true),
            ),
        }
    }

    fn internal_failure(&self, options: &RequestOptions, variables: LogVariables) -> ResponseEnvelope {
        let operation = options.operation.id();
        log_event(
            Severity::Critical,
            "Request produced no usable envelope",
            None,
            &variables,
            LogContext::new(&operation, "execute"),
        );
        let mut envelope = ResponseEnvelope::failure(500, 500, ErrorCode::LocalAlgo, options.error_code_offset);
        envelope.body.message = self.message(ErrorCode::LocalAlgo, options);
        envelope
    }

    async fn try_execute(&self, options: &RequestOptions, args: &Arguments) -> Result<ResponseEnvelope> {
        let operation = options.operation.id();

        if let Some(code) = options.preflight_error {
            let mut envelope = ResponseEnvelope::failure(500, 500, code, options.error_code_offset);
            self.report(&mut envelope, code, None, None, options, LogContext::new(&operation, "preflight"));
            return Ok(envelope);
        }

        if options.mock.is_active() {
            return self.serve_mock(options, &operation).and_then(ensure_consistent);
        }

        if options.cache.enabled && !options.cache.refresh {
            if let Some(envelope) = self.read_cache(options, &operation) {
                return Ok(envelope);
            }
        }

        let outcome = self.send(options, args, &operation).await;
        if options.debug_dump {
            log_event(
                Severity::Debug,
                "Transport outcome",
                outcome.fault.as_ref(),
                &log_vars!(
                    "status" => outcome.status,
                    "content_type" => outcome.content_type.clone(),
                    "headers" => outcome.headers.clone(),
                    "payload" => outcome.body.clone(),
                ),
                LogContext::new(&operation, "dump"),
            );
        }

        let Classification { mut envelope, code, detail } = classify(&outcome, options);
        if !code.is_none() {
            self.report(
                &mut envelope,
                code,
                outcome.fault.as_ref(),
                detail,
                options,
                LogContext::new(&operation, "classify"),
            );
            return ensure_consistent(envelope);
        }

        if options.validation.enabled {
            let context = LogContext::new(&operation, "validate");
            match self.validation.validate(
                &options.operation,
                &envelope.body.payload,
                &options.validation,
                &options.rule_paths,
            ) {
                Ok(ValidationReport { passed: true, .. }) => envelope.validated = Validated::Passed,
                Ok(report) => {
                    envelope.downgrade(502, ErrorCode::ResponseValidation, options.error_code_offset);
                    envelope.validated = Validated::Failed;
                    let detail = report
                        .failures
                        .iter()
                        .flat_map(|record| record.violations.iter().map(ToString::to_string))
                        .collect::<Vec<_>>()
                        .join("; ");
                    self.report(&mut envelope, ErrorCode::ResponseValidation, None, Some(detail), options, context);
                    return ensure_consistent(envelope);
                }
                Err(e) => {
                    envelope.downgrade(500, ErrorCode::LocalConfiguration, options.error_code_offset);
                    envelope.validated = Validated::Failed;
                    self.report(
                        &mut envelope,
                        ErrorCode::LocalConfiguration,
                        None,
                        Some(e.to_string()),
                        options,
                        context,
                    );
                    return ensure_consistent(envelope);
                }
            }
        }

        if options.cache.enabled {
            self.write_cache(options, &envelope, &operation);
        }

        ensure_consistent(envelope)
    }

    fn serve_mock(&self, options: &RequestOptions, operation: &str) -> Result<ResponseEnvelope> {
        let context = LogContext::new(operation, "mock");
        match self.mocks.resolve(options) {
            Ok(Classification { mut envelope, code, detail }) => {
                if !code.is_none() {
                    self.report(&mut envelope, code, None, detail, options, context);
                }
                Ok(envelope)
            }
            Err(e) if e.is_configuration() => {
                let code = ErrorCode::LocalConfiguration;
                let mut envelope = ResponseEnvelope::failure(500, 500, code, options.error_code_offset);
                self.report(&mut envelope, code, None, Some(e.to_string()), options, context);
                Ok(envelope)
            }
            Err(e) => Err(e),
        }
    }

    fn read_cache(&self, options: &RequestOptions, operation: &str) -> Option<ResponseEnvelope> {
        let key = options.cache_key();
        match self.responses.get(&key) {
            Ok(Some(envelope)) => {
                tracing::debug!(operation, key = %key, "Response cache hit");
                Some(envelope)
            }
            Ok(None) => None,
            Err(e) => {
                log_event(
                    Severity::Error,
                    "Response cache read failed",
                    None,
                    &log_vars!("key" => key, "error" => e.to_string()),
                    LogContext::new(operation, "cache-read"),
                );
                None
            }
        }
    }

    fn write_cache(&self, options: &RequestOptions, envelope: &ResponseEnvelope, operation: &str) {
        let key = options.cache_key();
        if let Err(e) = self.responses.set(&key, envelope.clone(), Some(options.cache.ttl)) {
            log_event(
                Severity::Error,
                "Response cache write failed",
                None,
                &log_vars!("key" => key, "error" => e.to_string()),
                LogContext::new(operation, "cache-write"),
            );
        }
    }

    /// One attempt, plus a single retry after a delay for transient outcomes
    async fn send(&self, options: &RequestOptions, args: &Arguments, operation: &str) -> TransportOutcome {
        let request = transport_request(options, args);
        let mut retry = RetryPolicy::new(options.retry_delay).handler();

        let outcome = self.transport.send(&request).await;
        match retry.should_retry(&outcome) {
            RetryDecision::NoRetry => outcome,
            RetryDecision::Retry { delay } => {
                log_event(
                    Severity::Warning,
                    "Transient failure, retrying once",
                    outcome.fault.as_ref(),
                    &log_vars!("status" => outcome.status, "delay_ms" => delay.as_millis() as u64),
                    LogContext::new(operation, "retry"),
                );
                tokio::time::sleep(delay).await;
                self.transport.reset();
                self.transport.send(&request).await
            }
        }
    }

    /// Log a classified failure and fill in its user-facing message
    fn report(
        &self,
        envelope: &mut ResponseEnvelope,
        code: ErrorCode,
        fault: Option<&Fault>,
        detail: Option<String>,
        options: &RequestOptions,
        context: LogContext<'_>,
    ) {
        let severity = if code.category() == Some(ErrorCategory::RemoteStatus)
            && options.warn_statuses.contains(&envelope.status)
        {
            Severity::Warning
        } else {
            Severity::Error
        };

        log_event(
            severity,
            &format!("Request failed: {}", code),
            fault,
            &log_vars!(
                "code" => code.name(),
                "status" => envelope.status,
                "original_status" => envelope.body.status,
                "detail" => detail,
            ),
            context,
        );

        envelope.body.message = self.message(code, options);
    }

    fn message(&self, code: ErrorCode, options: &RequestOptions) -> String {
        self.text
            .resolve(&code.message_key(), &error_variables(code, &options.app_title))
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

/// Everything the transport needs from the options and call arguments
pub fn transport_request(options: &RequestOptions, args: &Arguments) -> TransportRequest {
    TransportRequest {
        method: options.operation.method,
        base_url: options.base_url.clone(),
        path: options.path.clone(),
        segments: args.segments.clone(),
        query: args.query.clone(),
        body: args.body.clone(),
        headers: options.headers.clone(),
        timeout: options.timeout,
        expect_content_type: options.expect_content_type.clone(),
        require_body: options.require_body,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn ensure_consistent(envelope: ResponseEnvelope) -> Result<ResponseEnvelope> {
    if envelope.is_consistent() {
        Ok(envelope)
    } else {
        Err(Error::internal(format!(
            "envelope reports success with status {} and code {}",
            envelope.status, envelope.body.code
        )))
    }
}
