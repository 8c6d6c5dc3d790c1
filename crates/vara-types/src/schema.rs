//! Value schemas
//!
//! `ValueSchema` is the serializable structural validator behind
//! schema-based runtime types: a tree of kinds matched recursively against
//! a value. Schemas come from three places — written directly, inferred
//! from an example value, or deserialized from cached metadata.
//!
//! Matching is total: `matches` never panics and never raises, it only
//! answers yes or no. Extra object keys are permitted; a schema constrains
//! the fields it names.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Structural schema for a host value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValueSchema {
    /// Matches every value
    Any,

    /// Matches only null
    Null,

    /// Matches booleans
    Bool,

    /// Matches numbers, optionally range-bounded (inclusive)
    Number {
        /// Inclusive lower bound
        #[serde(skip_serializing_if = "Option::is_none", default)]
        min: Option<f64>,
        /// Inclusive upper bound
        #[serde(skip_serializing_if = "Option::is_none", default)]
        max: Option<f64>,
    },

    /// Matches strings
    String,

    /// Matches arrays whose every element matches the element schema
    Array {
        /// Element schema
        element: Box<ValueSchema>,
    },

    /// Matches plain objects carrying at least the named fields
    Object {
        /// Field name / field schema pairs
        fields: Vec<(String, ValueSchema)>,
    },
}

impl ValueSchema {
    /// Unbounded number schema
    pub fn number() -> Self {
        ValueSchema::Number {
            min: None,
            max: None,
        }
    }

    /// Number schema with an inclusive range
    pub fn number_range(min: f64, max: f64) -> Self {
        ValueSchema::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Array schema over an element schema
    pub fn array(element: ValueSchema) -> Self {
        ValueSchema::Array {
            element: Box::new(element),
        }
    }

    /// Object schema from field pairs
    pub fn object(fields: Vec<(String, ValueSchema)>) -> Self {
        ValueSchema::Object { fields }
    }

    /// Match a value against this schema
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueSchema::Any => true,
            ValueSchema::Null => value.is_null(),
            ValueSchema::Bool => value.is_bool(),
            ValueSchema::Number { min, max } => match value.as_number() {
                Some(n) => {
                    min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi)
                }
                None => false,
            },
            ValueSchema::String => value.is_string(),
            ValueSchema::Array { element } => match value.as_array() {
                Some(items) => items.iter().all(|item| element.matches(item)),
                None => false,
            },
            ValueSchema::Object { fields } => match value.as_object() {
                Some(map) => fields.iter().all(|(name, schema)| {
                    map.get(name).is_some_and(|field| schema.matches(field))
                }),
                None => false,
            },
        }
    }

    /// Human-readable description of this schema.
    ///
    /// Used when a runtime type is built from a schema alone: a bounded
    /// number reads `"number (0-100)"`, an array reads `"string[]"`, an
    /// object reads out its shape.
    pub fn describe(&self) -> String {
        match self {
            ValueSchema::Any => "any".to_string(),
            ValueSchema::Null => "null".to_string(),
            ValueSchema::Bool => "boolean".to_string(),
            ValueSchema::Number { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => format!("number ({}-{})", lo, hi),
                (Some(lo), None) => format!("number (>={})", lo),
                (None, Some(hi)) => format!("number (<={})", hi),
                (None, None) => "number".to_string(),
            },
            ValueSchema::String => "string".to_string(),
            ValueSchema::Array { element } => format!("{}[]", element.describe()),
            ValueSchema::Object { fields } => {
                if fields.is_empty() {
                    "object".to_string()
                } else {
                    let inner: Vec<String> = fields
                        .iter()
                        .map(|(name, schema)| format!("{}: {}", name, schema.describe()))
                        .collect();
                    format!("{{{}}}", inner.join(", "))
                }
            }
        }
    }

    /// Infer a schema from an example value.
    ///
    /// Array element schemas come from the first element (empty arrays
    /// infer `any` elements); object fields are inferred per key in sorted
    /// order so the derived description is stable. Functions, classes and
    /// other non-data values infer `any`.
    pub fn infer(example: &Value) -> Self {
        match example {
            Value::Null => ValueSchema::Null,
            Value::Bool(_) => ValueSchema::Bool,
            Value::Number(_) => ValueSchema::number(),
            Value::String(_) => ValueSchema::String,
            Value::Array(items) => match items.first() {
                Some(first) => ValueSchema::array(ValueSchema::infer(first)),
                None => ValueSchema::array(ValueSchema::Any),
            },
            Value::Object(map) => {
                let mut names: Vec<&String> = map.keys().collect();
                names.sort();
                let fields = names
                    .into_iter()
                    .map(|name| {
                        (name.clone(), ValueSchema::infer(&map[name]))
                    })
                    .collect();
                ValueSchema::Object { fields }
            }
            _ => ValueSchema::Any,
        }
    }
}
