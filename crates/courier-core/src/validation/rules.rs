//! Rule sets
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! The rule language is opaque to the engine: a [`RuleSet`] only has to list
//! the violations a payload produces. [`SchemaRuleSet`] reads rule-set
//! artifacts as JSON Schema documents.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One rule a payload broke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule-set variant the violation came from
    pub rule: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule '{}' violated: {}", self.rule, self.message)
    }
}

/// A compiled, reusable set of rules
pub trait RuleSet: Send + Sync {
    /// Name the rule set was loaded under
    fn name(&self) -> &str;

    /// Every violation `data` produces; empty means the payload passes
    fn violations(&self, data: &Value) -> Vec<Violation>;

    fn accepts(&self, data: &Value) -> bool {
        self.violations(data).is_empty()
    }
}

/// Rule set backed by a JSON Schema document
pub struct SchemaRuleSet {
    name: String,
    validator: jsonschema::Validator,
}

impl SchemaRuleSet {
    /// Compile a schema; a schema that does not compile is a configuration error
    pub fn compile(name: impl Into<String>, schema: &Value) -> Result<Self> {
        let name = name.into();
        let validator = jsonschema::validator_for(schema).map_err(|e| {
            Error::configuration(format!("Rule set '{}' is not a valid schema: {}", name, e))
        })?;
        Ok(Self { name, validator })
    }
}

impl fmt::Debug for SchemaRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRuleSet").field("name", &self.name).finish_non_exhaustive()
    }
}

impl RuleSet for SchemaRuleSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn violations(&self, data: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(data)
            .map(|e| Violation {
                rule: self.name.clone(),
                message: e.to_string(),
            })
            .collect()
    }

    fn accepts(&self, data: &Value) -> bool {
        self.validator.is_valid(data)
    }
}
