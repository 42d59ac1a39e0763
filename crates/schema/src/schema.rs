//! Schema definition, compilation, and validation/coercion.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::FieldErrors;

// ─────────────────────────────────────────────────────────────────────────────
// Field kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Expected type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Int,
    Float,
    Bool,
    String,
}

impl Kind {
    fn conversion_error(self) -> &'static str {
        match self {
            Kind::Int => "value can't be converted to int",
            Kind::Float => "value can't be converted to float",
            Kind::Bool => "value can't be converted to bool",
            Kind::String => "value is not a string",
        }
    }

    /// Coerce a JSON value to this kind. Strings holding a parseable value
    /// coerce (`"1"` is an acceptable Int), mirroring permissive converter
    /// semantics on the query-string side.
    fn coerce_json(self, value: &Value) -> Result<Value, &'static str> {
        match self {
            Kind::Int => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
                Value::String(s) => self.coerce_str(s),
                _ => Err(self.conversion_error()),
            },
            Kind::Float => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::String(s) => self.coerce_str(s),
                _ => Err(self.conversion_error()),
            },
            Kind::Bool => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) => self.coerce_str(s),
                _ => Err(self.conversion_error()),
            },
            Kind::String => match value {
                Value::String(_) => Ok(value.clone()),
                _ => Err(self.conversion_error()),
            },
        }
    }

    /// Coerce a raw string (query-string value) to this kind.
    fn coerce_str(self, raw: &str) -> Result<Value, &'static str> {
        match self {
            Kind::Int => raw
                .parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|_| self.conversion_error()),
            Kind::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| self.conversion_error()),
            Kind::Bool => match raw {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(self.conversion_error()),
            },
            Kind::String => Ok(Value::String(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Field {
    kind: Kind,
    required: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Schema builder
// ─────────────────────────────────────────────────────────────────────────────

/// Declarative shape description: field name → kind + required-ness.
///
/// Built once per route and compiled before use:
///
/// ```
/// use jetway_schema::{Kind, Schema};
///
/// let compiled = Schema::new().field("id", Kind::Int).compile();
/// assert!(compiled.validate(&serde_json::json!({"id": "1"})).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required field.
    pub fn field(mut self, name: impl Into<String>, kind: Kind) -> Self {
        self.fields.insert(name.into(), Field { kind, required: true });
        self
    }

    /// Declare an optional field.
    pub fn optional(mut self, name: impl Into<String>, kind: Kind) -> Self {
        self.fields.insert(name.into(), Field { kind, required: false });
        self
    }

    /// Freeze the schema for per-request use. The builder is typed, so
    /// compilation itself cannot fail.
    pub fn compile(self) -> Compiled {
        Compiled { fields: self.fields }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiled schema
// ─────────────────────────────────────────────────────────────────────────────

/// A frozen schema, shared read-only across all requests to a route.
#[derive(Debug, Clone, Default)]
pub struct Compiled {
    fields: BTreeMap<String, Field>,
}

impl Compiled {
    /// A schema with no declared fields accepts nothing but is treated as
    /// "no validation" by callers that opt into that behavior.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate and coerce a JSON document. Input must be a JSON object;
    /// unknown keys are rejected, required keys must be present, and every
    /// failing field is reported (not just the first).
    pub fn validate(&self, value: &Value) -> Result<Value, FieldErrors> {
        let Some(object) = value.as_object() else {
            let mut errors = FieldErrors::new();
            errors.push("value", "value is not a dict");
            return Err(errors);
        };

        let mut errors = FieldErrors::new();
        let mut coerced = Map::new();

        for (name, field) in &self.fields {
            match object.get(name) {
                None if field.required => errors.required(name),
                None => {}
                Some(raw) => match field.kind.coerce_json(raw) {
                    Ok(value) => {
                        coerced.insert(name.clone(), value);
                    }
                    Err(message) => errors.push(name, message),
                },
            }
        }

        for key in object.keys() {
            if !self.fields.contains_key(key) {
                errors.not_allowed(key);
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(coerced))
        } else {
            Err(errors)
        }
    }

    /// Validate and coerce string pairs (query-string parameters). For a
    /// repeated key the last occurrence wins.
    pub fn validate_pairs<I, K, V>(&self, pairs: I) -> Result<Value, FieldErrors>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut raw: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in pairs {
            raw.insert(key.as_ref().to_string(), value.as_ref().to_string());
        }

        let mut errors = FieldErrors::new();
        let mut coerced = Map::new();

        for (name, field) in &self.fields {
            match raw.get(name) {
                None if field.required => errors.required(name),
                None => {}
                Some(value) => match field.kind.coerce_str(value) {
                    Ok(value) => {
                        coerced.insert(name.clone(), value);
                    }
                    Err(message) => errors.push(name, message),
                },
            }
        }

        for key in raw.keys() {
            if !self.fields.contains_key(key) {
                errors.not_allowed(key);
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(coerced))
        } else {
            Err(errors)
        }
    }
}
