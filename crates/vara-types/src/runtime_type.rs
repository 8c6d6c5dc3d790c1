//! Runtime types
//!
//! A `RuntimeType` pairs a human-readable description with a total check
//! over arbitrary values. It is the live (non-serializable) form of a type:
//! created once by generated code or by hand, then reused across many
//! validations without mutation.
//!
//! Construction mirrors the source language's `Type(...)` forms:
//!
//! - description + custom predicate
//! - description + schema
//! - schema only (the description is derived from the schema)
//! - description + example value (a schema is inferred from the example,
//!   and the example doubles as the default until one is supplied)

use crate::schema::ValueSchema;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A total predicate over host values
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Where a runtime type's check comes from
#[derive(Clone)]
enum CheckSource {
    /// Custom predicate
    Predicate(Predicate),
    /// Structural schema match
    Schema(ValueSchema),
}

/// An immutable runtime type: description plus total check.
///
/// `check` is pure and never raises; combinators build new types out of
/// existing ones rather than mutating them.
#[derive(Clone)]
pub struct RuntimeType {
    description: String,
    source: CheckSource,
    example: Option<Value>,
    default: Option<Value>,
    literals: Option<Vec<Value>>,
}

impl RuntimeType {
    /// Create a type from a description and a custom predicate
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            source: CheckSource::Predicate(Arc::new(predicate)),
            example: None,
            default: None,
            literals: None,
        }
    }

    /// Create a type from a description and a schema
    pub fn with_schema(description: impl Into<String>, schema: ValueSchema) -> Self {
        Self {
            description: description.into(),
            source: CheckSource::Schema(schema),
            example: None,
            default: None,
            literals: None,
        }
    }

    /// Create a type from a schema alone, deriving the description
    pub fn from_schema(schema: ValueSchema) -> Self {
        Self {
            description: schema.describe(),
            source: CheckSource::Schema(schema),
            example: None,
            default: None,
            literals: None,
        }
    }

    /// Create a type from an example value.
    ///
    /// The schema is inferred from the example's shape; the example also
    /// becomes the default until [`with_default`](Self::with_default)
    /// replaces it.
    pub fn from_example(description: impl Into<String>, example: Value) -> Self {
        let schema = ValueSchema::infer(&example);
        Self {
            description: description.into(),
            source: CheckSource::Schema(schema),
            example: Some(example.clone()),
            default: Some(example),
            literals: None,
        }
    }

    /// Attach an example value (builder style)
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Attach a default value (builder style)
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Attach the literal list exposed by value-enumeration unions
    pub(crate) fn with_literals(mut self, literals: Vec<Value>) -> Self {
        self.literals = Some(literals);
        self
    }

    /// Check a value against this type
    pub fn check(&self, value: &Value) -> bool {
        match &self.source {
            CheckSource::Predicate(predicate) => predicate(value),
            CheckSource::Schema(schema) => schema.matches(value),
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The attached example value, if any
    pub fn example(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    /// The attached default value, if any
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Literal values of a value-enumeration union, if this is one
    pub fn literals(&self) -> Option<&[Value]> {
        self.literals.as_deref()
    }

    /// The underlying schema, when this type is schema-backed
    pub fn schema(&self) -> Option<&ValueSchema> {
        match &self.source {
            CheckSource::Schema(schema) => Some(schema),
            CheckSource::Predicate(_) => None,
        }
    }
}

impl fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeType")
            .field("description", &self.description)
            .field(
                "source",
                &match &self.source {
                    CheckSource::Predicate(_) => "predicate",
                    CheckSource::Schema(_) => "schema",
                },
            )
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_type() {
        let even = RuntimeType::new("even number", |v| {
            v.as_number().is_some_and(|n| n.fract() == 0.0 && (n as i64) % 2 == 0)
        });
        assert_eq!(even.description(), "even number");
        assert!(even.check(&Value::Number(4.0)));
        assert!(!even.check(&Value::Number(3.0)));
        assert!(!even.check(&Value::string("4")));
    }

    #[test]
    fn test_schema_type() {
        let t = RuntimeType::with_schema("percentage", ValueSchema::number_range(0.0, 100.0));
        assert!(t.check(&Value::Number(55.0)));
        assert!(!t.check(&Value::Number(101.0)));
    }

    #[test]
    fn test_from_schema_derives_description() {
        let t = RuntimeType::from_schema(ValueSchema::number_range(1.0, 5.0));
        assert_eq!(t.description(), "number (1-5)");
    }

    #[test]
    fn test_from_example_infers_and_defaults() {
        let t = RuntimeType::from_example("point", Value::object([
            ("x", Value::Number(0.0)),
            ("y", Value::Number(0.0)),
        ]));
        assert!(t.check(&Value::object([
            ("x", Value::Number(3.0)),
            ("y", Value::Number(4.0)),
        ])));
        assert!(!t.check(&Value::object([("x", Value::Number(3.0))])));
        // The example doubles as the default
        assert!(t.default_value().is_some());
        assert_eq!(t.example(), t.default_value());
    }

    #[test]
    fn test_with_default_overrides_example_default() {
        let t = RuntimeType::from_example("count", Value::Number(1.0))
            .with_default(Value::Number(0.0));
        assert_eq!(t.default_value(), Some(&Value::Number(0.0)));
        assert_eq!(t.example(), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_check_is_total() {
        let t = RuntimeType::new("anything", |_| true);
        for v in [
            Value::Undefined,
            Value::Null,
            Value::Bool(true),
            Value::Number(f64::NAN),
            Value::string(""),
            Value::array([]),
        ] {
            assert!(t.check(&v));
        }
    }
}
