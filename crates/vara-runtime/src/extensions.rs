//! Extension method registry
//!
//! Lets user code retroactively attach methods to built-in or class
//! values without touching their definitions. Each runtime instance owns
//! one table of `type name -> method name -> implementation`; lookup for
//! a receiver walks its type-name chain (own tag, class ancestors, then
//! the generic base `"object"`) and falls back to the catch-all table
//! under the generic base before giving up.
//!
//! Registration is additive and last-write-wins per
//! `(type name, method name)` pair.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use vara_types::equality::type_name_chain;
use vara_types::error::is_error_value;
use vara_types::{ContractError, HostFn, Value};

use crate::instance::Runtime;

/// Name every chain ends at; also the catch-all table
pub const GENERIC_BASE: &str = "object";

/// Per-instance table of extension methods
pub struct ExtensionRegistry {
    tables: FxHashMap<String, FxHashMap<String, HostFn>>,
}

impl ExtensionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tables: FxHashMap::default(),
        }
    }

    /// Register a method under a type name, replacing any previous binding
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        func: HostFn,
    ) {
        self.tables
            .entry(type_name.into())
            .or_default()
            .insert(method.into(), func);
    }

    /// Exact lookup, no chain walking
    pub fn lookup(&self, type_name: &str, method: &str) -> Option<HostFn> {
        self.tables.get(type_name)?.get(method).cloned()
    }

    /// Resolve a method for a receiver value.
    ///
    /// Walks the receiver's type-name chain and returns the first hit;
    /// when the chain misses entirely and did not already include the
    /// generic base (null and undefined chains do not), tries the
    /// catch-all table.
    pub fn resolve(&self, receiver: &Value, method: &str) -> Option<HostFn> {
        let chain = type_name_chain(receiver);
        for name in &chain {
            if let Some(found) = self.lookup(name, method) {
                return Some(found);
            }
        }
        if !chain.iter().any(|name| name == GENERIC_BASE) {
            return self.lookup(GENERIC_BASE, method);
        }
        None
    }

    /// Number of type names with at least one method
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if no methods are registered
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Remove every registered method
    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Register an extension method on this instance.
    ///
    /// `type_name` is matched against receivers' type-name chains: a
    /// built-in tag (`"number"`, `"array"`), a class name, or the generic
    /// base `"object"` for a catch-all.
    pub fn extend(
        &self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
    ) {
        self.state
            .extensions
            .write()
            .register(type_name, method, Arc::new(func));
    }

    /// Resolve an extension method for a receiver, without calling it
    pub fn resolve_extension(&self, receiver: &Value, method: &str) -> Option<HostFn> {
        self.state.extensions.read().resolve(receiver, method)
    }

    /// Invoke an extension method with the receiver as leading argument.
    ///
    /// An error-valued receiver passes through unchanged. An unresolvable
    /// method produces a method-not-found error value; a fault raised by
    /// the implementation is converted, never propagated.
    pub fn call_extension(&self, receiver: &Value, method: &str, args: &[Value]) -> Value {
        if is_error_value(receiver) {
            return receiver.clone();
        }
        let resolved = match self.resolve_extension(receiver, method) {
            Some(func) => func,
            None => {
                let error = ContractError::new(format!(
                    "no extension method `{}` for type `{}`",
                    method,
                    receiver.type_name()
                ))
                .with_path(format!("{}.{}", receiver.type_name(), method));
                return Value::Error(Arc::new(error));
            }
        };

        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(receiver.clone());
        call_args.extend_from_slice(args);
        match resolved(&call_args) {
            Ok(value) => value,
            Err(fault) => Value::Error(Arc::new(ContractError::from_fault(
                format!("{}.{}", receiver.type_name(), method),
                fault,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vara_types::value::ClassValue;
    use vara_types::value::InstanceValue;

    fn constant(value: Value) -> HostFn {
        Arc::new(move |_args: &[Value]| Ok(value.clone()))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ExtensionRegistry::new();
        assert!(registry.is_empty());
        registry.register("number", "double", constant(Value::Number(2.0)));
        assert!(registry.lookup("number", "double").is_some());
        assert!(registry.lookup("number", "triple").is_none());
        assert!(registry.lookup("string", "double").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = ExtensionRegistry::new();
        registry.register("number", "tag", constant(Value::string("first")));
        registry.register("number", "tag", constant(Value::string("second")));
        let resolved = registry.lookup("number", "tag").unwrap();
        assert_eq!(resolved(&[]).unwrap(), Value::string("second"));
    }

    #[test]
    fn test_primitive_chain_reaches_catch_all() {
        let mut registry = ExtensionRegistry::new();
        registry.register("object", "inspect", constant(Value::string("generic")));
        // "number" has no entry; the chain ends at the generic base
        let resolved = registry.resolve(&Value::Number(1.0), "inspect").unwrap();
        assert_eq!(resolved(&[]).unwrap(), Value::string("generic"));
    }

    #[test]
    fn test_own_tag_beats_catch_all() {
        let mut registry = ExtensionRegistry::new();
        registry.register("object", "inspect", constant(Value::string("generic")));
        registry.register("number", "inspect", constant(Value::string("numeric")));
        let resolved = registry.resolve(&Value::Number(1.0), "inspect").unwrap();
        assert_eq!(resolved(&[]).unwrap(), Value::string("numeric"));
    }

    #[test]
    fn test_instance_resolves_through_ancestry() {
        let base = Arc::new(ClassValue::new("Shape"));
        let derived = Arc::new(ClassValue::with_parent("Circle", Arc::clone(&base)));
        let receiver = Value::Instance(Arc::new(InstanceValue::new(
            derived,
            rustc_hash::FxHashMap::default(),
        )));

        let mut registry = ExtensionRegistry::new();
        registry.register("Shape", "area", constant(Value::Number(0.0)));
        assert!(registry.resolve(&receiver, "area").is_some());

        registry.register("Circle", "area", constant(Value::Number(1.0)));
        let own = registry.resolve(&receiver, "area").unwrap();
        assert_eq!(own(&[]).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_nullish_uses_only_catch_all() {
        let mut registry = ExtensionRegistry::new();
        registry.register("object", "describe", constant(Value::string("generic")));
        assert!(registry.resolve(&Value::Null, "describe").is_some());
        assert!(registry.resolve(&Value::Undefined, "describe").is_some());

        registry.register("null", "describe", constant(Value::string("nullish")));
        let own = registry.resolve(&Value::Null, "describe").unwrap();
        assert_eq!(own(&[]).unwrap(), Value::string("nullish"));
    }

    #[test]
    fn test_resolution_miss() {
        let registry = ExtensionRegistry::new();
        assert!(registry.resolve(&Value::Number(1.0), "anything").is_none());
    }

    #[test]
    fn test_call_extension_receiver_first() {
        let runtime = Runtime::new();
        runtime.extend("number", "plus", |args: &[Value]| {
            let receiver = args[0].as_number().unwrap_or(0.0);
            let addend = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
            Ok(Value::Number(receiver + addend))
        });
        let result = runtime.call_extension(&Value::Number(2.0), "plus", &[Value::Number(3.0)]);
        assert_eq!(result, Value::Number(5.0));
    }

    #[test]
    fn test_call_extension_method_not_found() {
        let runtime = Runtime::new();
        let result = runtime.call_extension(&Value::Number(2.0), "missing", &[]);
        match result {
            Value::Error(error) => {
                assert!(error.message.contains("missing"));
                assert_eq!(error.path.as_deref(), Some("number.missing"));
            }
            other => panic!("expected error value, got {:?}", other),
        }
    }

    #[test]
    fn test_call_extension_error_receiver_passes_through() {
        let runtime = Runtime::new();
        runtime.extend("object", "touch", |_args: &[Value]| {
            Ok(Value::string("touched"))
        });
        let error = Value::Error(Arc::new(ContractError::new("upstream")));
        let result = runtime.call_extension(&error, "touch", &[]);
        assert_eq!(result, error);
    }

    #[test]
    fn test_call_extension_fault_converted() {
        let runtime = Runtime::new();
        runtime.extend("number", "explode", |_args: &[Value]| {
            Err(anyhow::anyhow!("boom"))
        });
        let result = runtime.call_extension(&Value::Number(1.0), "explode", &[]);
        match result {
            Value::Error(error) => {
                assert_eq!(error.message, "boom");
                assert!(error.cause.is_some());
            }
            other => panic!("expected error value, got {:?}", other),
        }
    }
}
