//! Request Field Validation
//!
//! Declarative presence checks attached to typed request structs.
//!
//! # Policy
//! - Every declared rule runs; violations are collected, never short-circuited
//! - A missing field, a JSON `null` and an empty string are the same violation
//! - Numbers and booleans always count as present
//! - No type coercion, range checks, or cross-field checks
//!
//! Violations serialize as `{"value", "msg", "param", "location"}`, the shape
//! existing REST clients of this API parse.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};

/// Where a validated value was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// Request body (JSON or form)
    Body,
    /// Path parameter
    Params,
    /// Query string parameter
    Query,
}

/// A scalar request value as supplied by the client
///
/// Strings, numbers and booleans are accepted; anything else fails body decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    /// String value (every form-encoded value lands here)
    Text(String),
    /// JSON number, kept with its original precision
    Number(serde_json::Number),
    /// JSON boolean
    Flag(bool),
}

impl FieldValue {
    /// True when the value carries no characters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Number(_) | Self::Flag(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A presence + non-empty rule for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Field name as it appears in the request
    pub field: &'static str,
    /// Name used in the violation message
    pub label: &'static str,
    /// Where the field is read from
    pub location: Location,
}

impl Rule {
    /// Require `field` to be present and non-empty
    #[must_use]
    pub const fn non_empty(field: &'static str, location: Location) -> Self {
        Self { field, label: field, location }
    }

    /// Report violations under a different name than the field itself
    #[must_use]
    pub const fn labelled(self, label: &'static str) -> Self {
        Self { label, ..self }
    }

    /// Check a value against this rule
    #[must_use]
    pub fn check(&self, value: Option<&FieldValue>) -> Option<Violation> {
        match value {
            Some(value) if !value.is_empty() => None,
            _ => Some(self.violation(value)),
        }
    }

    /// Build the violation this rule reports for `value`
    #[must_use]
    pub fn violation(&self, value: Option<&FieldValue>) -> Violation {
        Violation {
            value: value.cloned(),
            msg: format!("{} cannot be empty", self.label),
            param: self.field.to_string(),
            location: self.location,
        }
    }
}

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    /// The offending value; omitted when the field was missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,

    /// Human-readable message
    pub msg: String,

    /// Field name
    pub param: String,

    /// Where the field was read from
    pub location: Location,
}

/// Typed requests that declare validation rules
pub trait Validate {
    /// Declared rules, in order, each paired with the value it inspects
    fn checks(&self) -> Vec<(Rule, Option<&FieldValue>)>;

    /// Run every rule and collect the violations
    fn violations(&self) -> Vec<Violation> {
        self.checks()
            .into_iter()
            .filter_map(|(rule, value)| rule.check(value))
            .collect()
    }

    /// Fail with [`DeskError::Validation`] if any rule is violated
    fn validate(&self) -> Result<()> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(DeskError::validation(violations))
        }
    }
}
