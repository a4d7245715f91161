//! Single-shot retry for transient failures
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! A request gets at most one retry: after a 503 or a connection-level fault,
//! and only when a non-zero delay is configured.

use std::time::Duration;
use crate::http::outcome::TransportOutcome;

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Delay before the retry; zero disables retrying
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Start tracking one request
    pub fn handler(&self) -> RetryHandler {
        RetryHandler {
            policy: *self,
            attempts: 0,
        }
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration },
    /// Do not retry the request
    NoRetry,
}

/// Per-request retry state
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryHandler {
    /// Record an attempt and decide whether another one follows
    pub fn should_retry(&mut self, outcome: &TransportOutcome) -> RetryDecision {
        self.attempts += 1;

        if self.attempts > 1 || !self.policy.is_enabled() || !outcome.is_transient() {
            return RetryDecision::NoRetry;
        }

        RetryDecision::Retry {
            delay: self.policy.delay,
        }
    }

    /// Attempts recorded so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
