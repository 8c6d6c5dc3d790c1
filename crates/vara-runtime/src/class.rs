//! Class wrapping
//!
//! A class value normally requires explicit construction. `wrap_class`
//! rebuilds it as plain-callable construct sugar while keeping everything
//! observable about the original: the display name, every static member,
//! the ancestor chain, and the `ClassId` identity that membership tests
//! key on. Values produced through either route are indistinguishable.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use vara_types::{ClassValue, ContractError, InstanceValue, Value};

use crate::instance::Runtime;
use crate::logger;

/// Ancestor-chain membership test by class identity.
///
/// Non-instance values are members of nothing.
pub fn instance_of(value: &Value, class: &ClassValue) -> bool {
    let instance = match value.as_instance() {
        Some(instance) => instance,
        None => return false,
    };
    let mut current: Option<&Arc<ClassValue>> = Some(&instance.class);
    while let Some(ancestor) = current {
        if ancestor.id == class.id {
            return true;
        }
        current = ancestor.parent.as_ref();
    }
    false
}

impl Runtime {
    /// Construct an instance of a class.
    ///
    /// The constructor produces the instance's field object; a class
    /// without one yields an empty instance. A constructor fault converts
    /// to an error value, and an error value produced by the constructor
    /// itself flows out unchanged.
    pub fn construct(&self, class: &Arc<ClassValue>, args: &[Value]) -> Value {
        let fields = match &class.constructor {
            Some(ctor) => match ctor(args) {
                Ok(Value::Object(fields)) => fields,
                Ok(Value::Undefined) | Ok(Value::Null) => FxHashMap::default(),
                Ok(Value::Error(error)) => return Value::Error(error),
                Ok(other) => {
                    let error = ContractError::new(format!(
                        "constructor of `{}` must produce a field object, got {}",
                        class.name,
                        other.type_name()
                    ))
                    .with_path(format!("{}()", class.name));
                    return Value::Error(Arc::new(error));
                }
                Err(fault) => {
                    let error = ContractError::from_fault(format!("{}()", class.name), fault);
                    return Value::Error(Arc::new(error));
                }
            },
            None => FxHashMap::default(),
        };
        Value::Instance(Arc::new(InstanceValue::new(Arc::clone(class), fields)))
    }

    /// Make a class plain-callable, preserving its observable contract.
    ///
    /// The rebuilt value carries the same `ClassId`, name, parent chain,
    /// constructor, statics and method table; only `callable` changes.
    /// Instances made via [`Runtime::call`] on the result and via
    /// [`Runtime::construct`] on the original are members of the same
    /// classes. A non-class input is returned unchanged with a diagnostic.
    pub fn wrap_class(&self, class: &Value) -> Value {
        let original = match class.as_class() {
            Some(class) => class,
            None => {
                logger::warn(&format!(
                    "wrap_class: expected a class, got {}",
                    class.type_name()
                ));
                return class.clone();
            }
        };
        Value::Class(Arc::new(ClassValue {
            id: original.id,
            name: original.name.clone(),
            parent: original.parent.clone(),
            constructor: original.constructor.clone(),
            statics: original.statics.clone(),
            methods: original.methods.clone(),
            callable: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_class() -> Arc<ClassValue> {
        Arc::new(
            ClassValue::new("Point")
                .with_constructor(|args| {
                    Ok(Value::object([
                        ("x", args.first().cloned().unwrap_or(Value::Number(0.0))),
                        ("y", args.get(1).cloned().unwrap_or(Value::Number(0.0))),
                    ]))
                })
                .with_static("origin_label", Value::string("0,0")),
        )
    }

    #[test]
    fn test_construct_builds_instance_fields() {
        let runtime = Runtime::new();
        let point = runtime.construct(&point_class(), &[Value::Number(3.0), Value::Number(4.0)]);
        assert_eq!(point.type_name(), "Point");
        assert_eq!(point.get_property("x"), Value::Number(3.0));
        assert_eq!(point.get_property("y"), Value::Number(4.0));
    }

    #[test]
    fn test_construct_without_constructor() {
        let runtime = Runtime::new();
        let marker = Arc::new(ClassValue::new("Marker"));
        let instance = runtime.construct(&marker, &[]);
        assert_eq!(instance.type_name(), "Marker");
        assert!(instance.get_property("anything").is_undefined());
    }

    #[test]
    fn test_constructor_fault_becomes_error_value() {
        let runtime = Runtime::new();
        let class = Arc::new(
            ClassValue::new("Fallible").with_constructor(|_| Err(anyhow::anyhow!("no parts"))),
        );
        let result = runtime.construct(&class, &[]);
        let error = result.as_error().unwrap();
        assert_eq!(error.message, "no parts");
        assert_eq!(error.path.as_deref(), Some("Fallible()"));
        assert!(error.cause.is_some());
    }

    #[test]
    fn test_constructor_bad_shape_is_rejected() {
        let runtime = Runtime::new();
        let class = Arc::new(
            ClassValue::new("Odd").with_constructor(|_| Ok(Value::Number(7.0))),
        );
        let result = runtime.construct(&class, &[]);
        assert!(result.is_error());
    }

    #[test]
    fn test_instance_of_walks_ancestry() {
        let runtime = Runtime::new();
        let shape = Arc::new(ClassValue::new("Shape"));
        let polygon = Arc::new(ClassValue::with_parent("Polygon", Arc::clone(&shape)));
        let triangle = Arc::new(ClassValue::with_parent("Triangle", Arc::clone(&polygon)));

        let value = runtime.construct(&triangle, &[]);
        assert!(instance_of(&value, &triangle));
        assert!(instance_of(&value, &polygon));
        assert!(instance_of(&value, &shape));

        let other = Arc::new(ClassValue::new("Circle"));
        assert!(!instance_of(&value, &other));
        assert!(!instance_of(&Value::Number(1.0), &shape));
    }

    #[test]
    fn test_wrap_class_preserves_identity_and_statics() {
        let runtime = Runtime::new();
        let original = point_class();
        let wrapped = runtime.wrap_class(&Value::Class(Arc::clone(&original)));

        let rebuilt = wrapped.as_class().unwrap();
        assert_eq!(rebuilt.id, original.id);
        assert_eq!(rebuilt.name, "Point");
        assert!(rebuilt.callable);
        assert_eq!(
            wrapped.get_property("origin_label"),
            Value::string("0,0")
        );
    }

    #[test]
    fn test_wrap_class_non_class_returns_unchanged() {
        let runtime = Runtime::new();
        let not_a_class = Value::string("Point");
        assert_eq!(runtime.wrap_class(&not_a_class), Value::string("Point"));
    }

    #[test]
    fn test_both_construction_routes_share_membership() {
        let runtime = Runtime::new();
        let base = Arc::new(ClassValue::new("Entity"));
        let user = Arc::new(ClassValue::with_parent("User", Arc::clone(&base)));

        let explicit = runtime.construct(&user, &[]);
        let wrapped = runtime.wrap_class(&Value::Class(Arc::clone(&user)));
        let via_call = runtime.call(&wrapped, &[]).unwrap();

        for value in [&explicit, &via_call] {
            assert!(instance_of(value, &user));
            assert!(instance_of(value, &base));
        }
    }

    #[test]
    fn test_unwrapped_class_is_not_plain_callable() {
        let runtime = Runtime::new();
        let class = Value::Class(point_class());
        assert!(runtime.call(&class, &[]).is_err());
    }
}
