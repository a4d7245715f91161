//! Response validation against named rule sets
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! Variants are tried in declared order and the first one that accepts the
//! payload wins. Every variant is loaded before any is evaluated, so a
//! missing or broken rule set aborts validation without a partial pass.

pub mod rules;

use crate::artifacts::ArtifactLoader;
use crate::store::Store;
use crate::types::{ArtifactPaths, Operation, ValidationPolicy};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use rules::{RuleSet, SchemaRuleSet, Violation};

/// Shared rule-set cache
pub type RuleSetStore = dyn Store<Arc<dyn RuleSet>>;

/// Violations of one rejecting variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailingRecord {
    pub variant: String,
    pub violations: Vec<Violation>,
}

/// Outcome of validating one payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub passing_variant: Option<String>,
    /// Variants that rejected the payload before one passed, in order
    pub failures: Vec<FailingRecord>,
}

/// Runs rule sets against response payloads
#[derive(Clone)]
pub struct ValidationEngine {
    cache: Arc<RuleSetStore>,
}

impl ValidationEngine {
    pub fn new(cache: Arc<RuleSetStore>) -> Self {
        Self { cache }
    }

    /// Validate `data` against the policy's variants
    ///
    /// Returns `Err` only for configuration problems: a rule set that is
    /// missing, duplicated or does not compile.
    pub fn validate(
        &self,
        operation: &Operation,
        data: &Value,
        policy: &ValidationPolicy,
        paths: &ArtifactPaths,
    ) -> Result<ValidationReport> {
        let loader = ArtifactLoader::new(paths.clone());
        let rule_sets = policy
            .variants()
            .into_iter()
            .map(|variant| {
                let rules = self.rule_set(operation, &variant, policy.no_cache, &loader)?;
                Ok((variant, rules))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut report = ValidationReport::default();
        for (variant, rules) in rule_sets {
            let violations = rules.violations(data);
            if violations.is_empty() {
                tracing::debug!(operation = %operation, variant = %variant, "Response accepted by rule set");
                report.passed = true;
                report.passing_variant = Some(variant);
                break;
            }
            report.failures.push(FailingRecord { variant, violations });
        }

        Ok(report)
    }

    /// Fetch a compiled rule set from the cache, loading it on a miss
    fn rule_set(
        &self,
        operation: &Operation,
        variant: &str,
        no_cache: bool,
        loader: &ArtifactLoader,
    ) -> Result<Arc<dyn RuleSet>> {
        let key = operation.variant_key(variant);

        if !no_cache {
            match self.cache.get(&key) {
                Ok(Some(rules)) => return Ok(rules),
                Ok(None) => {}
                Err(e) => tracing::error!(key = %key, error = %e, "Rule-set cache read failed, loading artifact"),
            }
        }

        let schema = loader.load(&key)?;
        let rules: Arc<dyn RuleSet> = Arc::new(SchemaRuleSet::compile(key.clone(), &schema)?);

        if !no_cache {
            if let Err(e) = self.cache.set(&key, Arc::clone(&rules), None) {
                tracing::error!(key = %key, error = %e, "Rule-set cache write failed");
            }
        }

        Ok(rules)
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine").finish_non_exhaustive()
    }
}
