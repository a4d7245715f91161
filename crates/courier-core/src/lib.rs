//! Courier Core - request orchestration and outcome classification
//!
//! This crate issues outbound HTTP requests and turns every possible result
//! (network fault, unreadable body, unexpected status, failed response
//! validation) into one uniform [`ResponseEnvelope`].
//!
//! # Main Components
//!
//! - **Orchestrator**: cache, mock or network path, single bounded retry, cache write
//! - **Classifier**: decision table from transport fault or HTTP status to an [`ErrorCode`]
//! - **Validation**: named rule sets tried in order, first pass wins
//! - **Mocks**: canned responses loaded from artifacts
//! - **Config**: layered operations file producing [`RequestOptions`]
//!
//! # Example
//!
//! ```no_run
//! use courier_core::{Arguments, HttpMethod, HttpTransport, Operation, Orchestrator, RequestOptions};
//! use std::sync::Arc;
//!
//! async fn example() -> courier_core::Result<()> {
//!     let engine = Orchestrator::new(Arc::new(HttpTransport::with_default_config()?));
//!     let operation = Operation::new("acme", "users", "lookup", HttpMethod::Get);
//!     let options = RequestOptions::new(operation, "https://api.acme.test").with_path("v1/users");
//!
//!     let envelope = engine.execute(&options, &Arguments::new().segment("42")).await;
//!     println!("{} {}", envelope.status, envelope.body.success);
//!     Ok(())
//! }
//! ```

pub mod artifacts;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod mock;
pub mod orchestrator;
pub mod response;
pub mod store;
pub mod text;
pub mod types;
pub mod validation;

// Re-export main types for convenience
pub use catalog::{ErrorCategory, ErrorCode};
pub use classifier::{classify, Classification};
pub use config::{ConfigFile, ConfigResolver, OptionLayer};
pub use error::{ArtifactError, ConfigError, Error, Result, Severity, StoreError};
pub use http::{Fault, FaultKind, HttpTransport, HttpTransportConfig, Transport, TransportOutcome, TransportRequest};
pub use mock::MockResolver;
pub use orchestrator::Orchestrator;
pub use response::{ResponseBody, ResponseEnvelope, Validated};
pub use store::{MemoryStore, Store};
pub use text::{CatalogText, TextResolver};
pub use types::{
    Arguments, ArtifactPaths, CachePolicy, CacheScope, HttpMethod, MockPolicy, NotFoundPolicy,
    Operation, RequestOptions, ValidationPolicy,
};
pub use validation::{ValidationEngine, ValidationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
