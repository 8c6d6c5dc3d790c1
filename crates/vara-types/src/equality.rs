//! Structural equality
//!
//! The host's native equality operators coerce types; `is`/`is_not` replace
//! them with deep structural comparison under fixed rules:
//!
//! 1. A value exposing the reserved `"@equals"` protocol key (left operand
//!    checked first, then the right) delegates the comparison; the result
//!    is interpreted by host truthiness.
//! 2. A conventional `Equals` method delegates the same way.
//! 3. Otherwise primitives compare by value and reference types (functions,
//!    classes, instances, errors) by allocation identity.
//! 4. Null and undefined are mutually equal but distinct from every other
//!    value.
//! 5. Differing basic types are never equal — no coercion.
//! 6. Arrays compare by length then element-wise.
//! 7. Plain objects compare by key set (order-independent) then by value.
//!
//! Values are owned trees, so the recursion is bounded by value depth and
//! needs no cycle guard. NaN equals NaN, keeping `is` reflexive.

use crate::value::{HostFn, Value};

/// Reserved protocol key consulted before any structural comparison
pub const EQUALS_PROTOCOL: &str = "@equals";

/// Conventional equality method consulted after the protocol key
const EQUALS_METHOD: &str = "Equals";

/// Deep structural equality
pub fn is(a: &Value, b: &Value) -> bool {
    // Delegation: protocol key first, then the conventional method, left
    // operand before right in both rounds.
    if let Some(delegate) = equality_delegate(a, EQUALS_PROTOCOL) {
        return invoke_delegate(&delegate, a, b);
    }
    if let Some(delegate) = equality_delegate(b, EQUALS_PROTOCOL) {
        return invoke_delegate(&delegate, b, a);
    }
    if let Some(delegate) = equality_delegate(a, EQUALS_METHOD) {
        return invoke_delegate(&delegate, a, b);
    }
    if let Some(delegate) = equality_delegate(b, EQUALS_METHOD) {
        return invoke_delegate(&delegate, b, a);
    }

    match (a, b) {
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else {
                x == y
            }
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(ax, bx)| is(ax, bx))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, val)| y.get(key).is_some_and(|other| is(val, other)))
        }
        (Value::Function(x), Value::Function(y)) => std::sync::Arc::ptr_eq(x, y),
        (Value::Class(x), Value::Class(y)) => std::sync::Arc::ptr_eq(x, y),
        (Value::Instance(x), Value::Instance(y)) => std::sync::Arc::ptr_eq(x, y),
        (Value::Error(x), Value::Error(y)) => std::sync::Arc::ptr_eq(x, y),
        _ => false,
    }
}

/// Strict negation of [`is`]
pub fn is_not(a: &Value, b: &Value) -> bool {
    !is(a, b)
}

/// Find an equality delegate on a value.
///
/// Plain objects expose delegates as function-valued keys; instances expose
/// them as fields first, then as class methods (walking the parent chain).
fn equality_delegate(value: &Value, name: &str) -> Option<HostFn> {
    match value {
        Value::Object(map) => match map.get(name) {
            Some(Value::Function(f)) => Some(f.func.clone()),
            _ => None,
        },
        Value::Instance(instance) => {
            if let Some(Value::Function(f)) = instance.fields.get(name) {
                return Some(f.func.clone());
            }
            instance.class.lookup_method(name)
        }
        _ => None,
    }
}

/// Invoke a delegate with the receiver as leading argument.
///
/// The delegated result is interpreted by host truthiness; a delegate that
/// raises compares unequal so `is` stays total.
fn invoke_delegate(delegate: &HostFn, receiver: &Value, other: &Value) -> bool {
    match delegate(&[receiver.clone(), other.clone()]) {
        Ok(result) => result.is_truthy(),
        Err(_) => false,
    }
}

/// Ordered type-name chain for a value, own tag first.
///
/// Instances list their class ancestry then the generic base `"object"`;
/// primitives, arrays, functions, classes and errors chain directly to
/// `"object"`; null and undefined stand alone.
pub fn type_name_chain(value: &Value) -> Vec<String> {
    match value {
        Value::Undefined => vec!["undefined".to_string()],
        Value::Null => vec!["null".to_string()],
        Value::Object(_) => vec!["object".to_string()],
        Value::Instance(instance) => {
            let mut chain = instance.class.name_chain();
            chain.push("object".to_string());
            chain
        }
        other => vec![other.type_name().to_string(), "object".to_string()],
    }
}

/// Check whether a value's type-name chain contains `name`.
///
/// This is the native-type membership test: `is_native_type(v, "Point")`
/// holds for instances of `Point` or any subclass, and every non-nullish
/// value satisfies the generic base `"object"`.
pub fn is_native_type(value: &Value, name: &str) -> bool {
    type_name_chain(value).iter().any(|entry| entry == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ClassValue, InstanceValue};
    use rustc_hash::FxHashMap;
    use std::sync::Arc;

    #[test]
    fn test_is_primitives() {
        assert!(is(&Value::Number(1.0), &Value::Number(1.0)));
        assert!(is(&Value::string("a"), &Value::string("a")));
        assert!(is(&Value::Bool(true), &Value::Bool(true)));
        assert!(!is(&Value::Number(1.0), &Value::Number(2.0)));
    }

    #[test]
    fn test_is_no_coercion() {
        assert!(!is(&Value::Number(0.0), &Value::Bool(false)));
        assert!(!is(&Value::Number(1.0), &Value::string("1")));
        assert!(!is(&Value::string(""), &Value::Bool(false)));
    }

    #[test]
    fn test_is_nullish_equality() {
        assert!(is(&Value::Null, &Value::Undefined));
        assert!(is(&Value::Undefined, &Value::Null));
        assert!(is(&Value::Null, &Value::Null));
        assert!(!is(&Value::Null, &Value::Number(0.0)));
        assert!(!is(&Value::Undefined, &Value::string("")));
    }

    #[test]
    fn test_is_nan_reflexive() {
        assert!(is(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn test_is_nested_arrays() {
        let a = Value::array([
            Value::Number(1.0),
            Value::array([Value::Number(2.0), Value::Number(3.0)]),
        ]);
        let b = Value::array([
            Value::Number(1.0),
            Value::array([Value::Number(2.0), Value::Number(3.0)]),
        ]);
        assert!(is(&a, &b));

        let c = Value::array([
            Value::Number(1.0),
            Value::array([Value::Number(2.0), Value::Number(4.0)]),
        ]);
        assert!(!is(&a, &c));
    }

    #[test]
    fn test_is_array_length_mismatch() {
        let a = Value::array([Value::Number(1.0)]);
        let b = Value::array([Value::Number(1.0), Value::Number(2.0)]);
        assert!(!is(&a, &b));
    }

    #[test]
    fn test_is_objects_key_set() {
        let a = Value::object([("a", Value::Number(1.0))]);
        let b = Value::object([("a", Value::Number(1.0))]);
        assert!(is(&a, &b));

        let c = Value::object([("a", Value::Number(1.0)), ("b", Value::Undefined)]);
        assert!(!is(&a, &c), "key-count mismatch must not compare equal");

        let d = Value::object([("b", Value::Number(1.0))]);
        assert!(!is(&a, &d));
    }

    #[test]
    fn test_is_delegation_protocol() {
        // An object that claims equality with any number
        let always = Value::object([(
            EQUALS_PROTOCOL,
            Value::native(|args| Ok(Value::Bool(matches!(args.get(1), Some(Value::Number(_)))))),
        )]);
        assert!(is(&always, &Value::Number(7.0)));
        assert!(!is(&always, &Value::string("7")));
        // Right operand delegates too
        assert!(is(&Value::Number(7.0), &always));
    }

    #[test]
    fn test_is_delegation_equals_method() {
        let class = Arc::new(ClassValue::new("Wrapper").with_method("Equals", |args| {
            let target = args.first().map(|r| r.get_property("target"));
            Ok(Value::Bool(
                matches!((target, args.get(1)), (Some(t), Some(other)) if is(&t, other)),
            ))
        }));
        let mut fields = FxHashMap::default();
        fields.insert("target".to_string(), Value::Number(5.0));
        let wrapper = Value::Instance(Arc::new(InstanceValue::new(class, fields)));

        assert!(is(&wrapper, &Value::Number(5.0)));
        assert!(!is(&wrapper, &Value::Number(6.0)));
    }

    #[test]
    fn test_is_delegate_fault_means_unequal() {
        let faulty = Value::object([(
            EQUALS_PROTOCOL,
            Value::native(|_| Err(anyhow::anyhow!("boom"))),
        )]);
        assert!(!is(&faulty, &Value::Number(1.0)));
    }

    #[test]
    fn test_is_not() {
        assert!(is_not(&Value::Number(1.0), &Value::Number(2.0)));
        assert!(!is_not(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn test_function_identity() {
        let f = Value::function("f", |_| Ok(Value::Null));
        assert!(is(&f, &f.clone()));
        let g = Value::function("f", |_| Ok(Value::Null));
        assert!(!is(&f, &g));
    }

    #[test]
    fn test_type_name_chain() {
        assert_eq!(type_name_chain(&Value::Number(1.0)), vec!["number", "object"]);
        assert_eq!(type_name_chain(&Value::Null), vec!["null"]);
        assert_eq!(type_name_chain(&Value::object([("a", Value::Null)])), vec!["object"]);

        let base = Arc::new(ClassValue::new("Shape"));
        let tri = Arc::new(ClassValue::with_parent("Triangle", base));
        let v = Value::Instance(Arc::new(InstanceValue::new(tri, FxHashMap::default())));
        assert_eq!(type_name_chain(&v), vec!["Triangle", "Shape", "object"]);
    }

    #[test]
    fn test_is_native_type() {
        let base = Arc::new(ClassValue::new("Shape"));
        let tri = Arc::new(ClassValue::with_parent("Triangle", base));
        let v = Value::Instance(Arc::new(InstanceValue::new(tri, FxHashMap::default())));

        assert!(is_native_type(&v, "Triangle"));
        assert!(is_native_type(&v, "Shape"));
        assert!(is_native_type(&v, "object"));
        assert!(!is_native_type(&v, "Circle"));

        assert!(is_native_type(&Value::Number(1.0), "number"));
        assert!(is_native_type(&Value::Number(1.0), "object"));
        assert!(!is_native_type(&Value::Null, "object"));
    }
}
