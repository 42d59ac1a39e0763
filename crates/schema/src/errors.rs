//! Field-keyed validation errors.

use std::collections::BTreeMap;

use serde::Serialize;

/// Validation outcome for a whole document: one message per failing field.
///
/// Message strings are part of the wire contract (clients match on them),
/// so they are fixed here and never reworded at the call site:
/// - missing required field: `is required`
/// - unexpected key `foo`: `foo is not allowed key`
/// - coercion failure: `value can't be converted to int` (and analogous
///   wording per type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: {}", self.summary())
    }
}

impl std::error::Error for FieldErrors {}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`. The first message per field wins.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn required(&mut self, field: &str) {
        self.push(field, "is required");
    }

    pub fn not_allowed(&mut self, field: &str) {
        self.push(field, format!("{field} is not allowed key"));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `{field: message, ...}` mapping as a JSON object.
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.errors).unwrap_or_default()
    }

    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.required("id");
        errors.push("id", "value can't be converted to int");
        assert_eq!(errors.get("id"), Some("is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn serializes_as_flat_mapping() {
        let mut errors = FieldErrors::new();
        errors.required("id");
        errors.not_allowed("foo");
        assert_eq!(
            errors.as_json(),
            serde_json::json!({"id": "is required", "foo": "foo is not allowed key"})
        );
    }
}
