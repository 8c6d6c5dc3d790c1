//! Type combinators
//!
//! Value transformers over [`RuntimeType`]: each takes existing types and
//! returns a new one, leaving the inputs untouched. Descriptions compose
//! the same way the checks do, so diagnostics stay readable
//! (`"number or null"`, `"string | number"`, `"point[]"`).

use crate::equality::is;
use crate::runtime_type::RuntimeType;
use crate::value::Value;

/// Accept the inner type's values or null
pub fn nullable(inner: &RuntimeType) -> RuntimeType {
    let description = format!("{} or null", inner.description());
    let inner = inner.clone();
    RuntimeType::new(description, move |value| {
        value.is_null() || inner.check(value)
    })
}

/// Accept the inner type's values, null, or the absent-value sentinel
pub fn optional(inner: &RuntimeType) -> RuntimeType {
    let description = format!("{} (optional)", inner.description());
    let inner = inner.clone();
    RuntimeType::new(description, move |value| {
        value.is_nullish() || inner.check(value)
    })
}

/// Accept a value when any member type accepts it
pub fn union(members: &[RuntimeType]) -> RuntimeType {
    let description = members
        .iter()
        .map(|member| member.description().to_string())
        .collect::<Vec<_>>()
        .join(" | ");
    let members: Vec<RuntimeType> = members.to_vec();
    RuntimeType::new(description, move |value| {
        members.iter().any(|member| member.check(value))
    })
}

/// Accept exactly the listed literal values (set membership by [`is`]).
///
/// This is the enumeration form of a union — `union_of("direction",
/// [Value::string("north"), Value::string("south")])` — with the literal
/// list kept on the type for introspection.
pub fn union_of(description: impl Into<String>, literals: Vec<Value>) -> RuntimeType {
    let members = literals.clone();
    RuntimeType::new(description, move |value| {
        members.iter().any(|literal| is(literal, value))
    })
    .with_literals(literals)
}

/// Accept arrays whose every element satisfies the inner type
pub fn array_of(inner: &RuntimeType) -> RuntimeType {
    let description = format!("{}[]", inner.description());
    let inner = inner.clone();
    RuntimeType::new(description, move |value| match value.as_array() {
        Some(items) => items.iter().all(|item| inner.check(item)),
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_type() -> RuntimeType {
        RuntimeType::new("number", |v| v.is_number())
    }

    fn string_type() -> RuntimeType {
        RuntimeType::new("string", |v| v.is_string())
    }

    #[test]
    fn test_nullable() {
        let t = nullable(&number_type());
        assert_eq!(t.description(), "number or null");
        assert!(t.check(&Value::Number(1.0)));
        assert!(t.check(&Value::Null));
        assert!(!t.check(&Value::Undefined));
        assert!(!t.check(&Value::string("1")));
    }

    #[test]
    fn test_optional() {
        let t = optional(&string_type());
        assert_eq!(t.description(), "string (optional)");
        assert!(t.check(&Value::string("x")));
        assert!(t.check(&Value::Null));
        assert!(t.check(&Value::Undefined));
        assert!(!t.check(&Value::Number(1.0)));
    }

    #[test]
    fn test_union() {
        let t = union(&[number_type(), string_type()]);
        assert_eq!(t.description(), "number | string");
        assert!(t.check(&Value::Number(1.0)));
        assert!(t.check(&Value::string("x")));
        assert!(!t.check(&Value::Bool(true)));
    }

    #[test]
    fn test_union_of_literals() {
        let t = union_of(
            "direction",
            vec![Value::string("north"), Value::string("south")],
        );
        assert!(t.check(&Value::string("north")));
        assert!(t.check(&Value::string("south")));
        assert!(!t.check(&Value::string("east")));
        assert!(!t.check(&Value::Number(0.0)));
        // Literal list is exposed for introspection
        assert_eq!(t.literals().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_array_of() {
        let t = array_of(&number_type());
        assert_eq!(t.description(), "number[]");
        assert!(t.check(&Value::array([Value::Number(1.0), Value::Number(2.0)])));
        assert!(t.check(&Value::array([])));
        assert!(!t.check(&Value::array([Value::Number(1.0), Value::Null])));
        assert!(!t.check(&Value::Number(1.0)));
    }

    #[test]
    fn test_combinators_compose() {
        let t = array_of(&nullable(&number_type()));
        assert_eq!(t.description(), "number or null[]");
        assert!(t.check(&Value::array([Value::Number(1.0), Value::Null])));
        assert!(!t.check(&Value::array([Value::string("x")])));
    }
}
