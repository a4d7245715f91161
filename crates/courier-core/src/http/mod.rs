//! Transport layer
//!
//! This module provides:
//! - The [`Transport`] adapter contract the orchestrator calls
//! - Transport outcomes and the fault taxonomy adapters report
//! - A reqwest-backed adapter
//! - The single-shot retry policy

pub mod client;
pub mod error;
pub mod outcome;
pub mod retry;

use async_trait::async_trait;

pub use client::{HttpTransport, HttpTransportConfig};
pub use outcome::{decode_body, Fault, FaultKind, TransportOutcome, TransportRequest};
pub use retry::{RetryDecision, RetryHandler, RetryPolicy};

/// Performs one network attempt
///
/// Adapters never fail: every problem is reported as a [`Fault`] inside the
/// returned [`TransportOutcome`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> TransportOutcome;

    /// Called before a retry so stateful adapters can drop per-attempt state
    fn reset(&self) {}
}
