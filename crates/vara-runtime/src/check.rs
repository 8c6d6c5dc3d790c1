//! Validation engine
//!
//! `check_type` matches one value against a declared type; `validate_args`
//! matches an argument bag against parameter metadata. Both live on the
//! runtime handle because `ref` descriptors resolve through the instance's
//! type registry.
//!
//! Error values are never inspected: a value that is already an error
//! short-circuits straight back to the caller, preserving its identity.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use vara_types::error::is_error_value;
use vara_types::{ContractError, FunctionMeta, TypeDescriptor, TypeSpec, Value};

use crate::instance::Runtime;
use crate::logger;

/// Diagnostic path for a function's parameter (`Some`) or return (`None`),
/// prefixed with `file:line:` when the metadata carries a source location.
pub(crate) fn diagnostic_path(meta: &FunctionMeta, display: &str, param: Option<&str>) -> String {
    let prefix = match &meta.source {
        Some(source) => format!("{}:{}:", source.file, source.line),
        None => String::new(),
    };
    match param {
        Some(param) => format!("{}{}.{}", prefix, display, param),
        None => format!("{}{}()", prefix, display),
    }
}

impl Runtime {
    /// Check one value against a declared type.
    ///
    /// An error value fails immediately with itself (propagation
    /// short-circuit; the `Arc` identity is preserved). String names apply
    /// the built-in equivalences: `"any"` always passes, `"number"`
    /// accepts any numeric value, `"integer"` additionally requires
    /// whole-number-ness; anything else is plain tag equality.
    pub fn check_type(
        &self,
        value: &Value,
        expected: &TypeSpec,
        path: &str,
    ) -> Result<(), Arc<ContractError>> {
        if let Value::Error(error) = value {
            return Err(Arc::clone(error));
        }
        if let Some(tagged) = ContractError::from_tagged_value(value) {
            return Err(Arc::new(tagged));
        }

        match expected {
            TypeSpec::Runtime(ty) => {
                if ty.check(value) {
                    Ok(())
                } else {
                    Err(Arc::new(ContractError::type_mismatch(
                        path,
                        ty.description(),
                        value.type_name(),
                    )))
                }
            }
            TypeSpec::Name(name) => self.check_named(value, name, path),
            TypeSpec::Descriptor(descriptor) => self.check_descriptor(value, descriptor, path),
        }
    }

    fn check_named(
        &self,
        value: &Value,
        name: &str,
        path: &str,
    ) -> Result<(), Arc<ContractError>> {
        let ok = match name {
            "any" => true,
            "number" => value.is_number(),
            "integer" => value
                .as_number()
                .is_some_and(|n| n.fract() == 0.0),
            tag => value.type_name() == tag,
        };
        if ok {
            Ok(())
        } else {
            Err(Arc::new(ContractError::type_mismatch(
                path,
                name,
                value.type_name(),
            )))
        }
    }

    fn check_descriptor(
        &self,
        value: &Value,
        descriptor: &TypeDescriptor,
        path: &str,
    ) -> Result<(), Arc<ContractError>> {
        let mismatch = || {
            Err(Arc::new(ContractError::type_mismatch(
                path,
                descriptor.describe(),
                value.type_name(),
            )))
        };
        match descriptor {
            TypeDescriptor::Any => Ok(()),
            TypeDescriptor::String => {
                if value.is_string() {
                    Ok(())
                } else {
                    mismatch()
                }
            }
            TypeDescriptor::Number => {
                if value.is_number() {
                    Ok(())
                } else {
                    mismatch()
                }
            }
            TypeDescriptor::Boolean => {
                if value.is_bool() {
                    Ok(())
                } else {
                    mismatch()
                }
            }
            TypeDescriptor::Null => {
                if value.is_null() {
                    Ok(())
                } else {
                    mismatch()
                }
            }
            TypeDescriptor::Array { items } => match value.as_array() {
                Some(elements) => {
                    for (index, element) in elements.iter().enumerate() {
                        let element_path = format!("{}[{}]", path, index);
                        self.check_descriptor(element, items, &element_path)?;
                    }
                    Ok(())
                }
                None => mismatch(),
            },
            TypeDescriptor::Object { shape } => match value.as_object() {
                Some(fields) => {
                    for (name, field_descriptor) in shape {
                        let field = fields.get(name).cloned().unwrap_or(Value::Undefined);
                        let field_path = format!("{}.{}", path, name);
                        self.check_descriptor(&field, field_descriptor, &field_path)?;
                    }
                    Ok(())
                }
                None => mismatch(),
            },
            TypeDescriptor::Union { members } => {
                let matched = members
                    .iter()
                    .any(|member| self.check_descriptor(value, member, path).is_ok());
                if matched {
                    Ok(())
                } else {
                    mismatch()
                }
            }
            TypeDescriptor::Ref { ref_name } => match self.lookup_type(ref_name) {
                Some(ty) => self.check_type(value, &TypeSpec::Runtime(ty), path),
                None => {
                    // Unresolved refs degrade to skip, never a hard failure
                    logger::warn(&format!(
                        "unresolved type ref `{}` at {}; skipping validation",
                        ref_name, path
                    ));
                    Ok(())
                }
            },
        }
    }

    /// Validate a named argument bag against parameter metadata.
    ///
    /// Parameters are visited in declaration order; the first failure
    /// wins. An error-valued argument returns immediately; a required
    /// absent parameter (with no declared default) is a missing-parameter
    /// error; an optional absent parameter skips type checking entirely.
    pub fn validate_args(
        &self,
        args: &FxHashMap<String, Value>,
        meta: &FunctionMeta,
        func_name: Option<&str>,
    ) -> Result<(), Arc<ContractError>> {
        let display = func_name.unwrap_or_else(|| meta.display_name());
        for param in &meta.params {
            let path = diagnostic_path(meta, display, Some(&param.name));
            let bound = args.get(&param.name);

            if let Some(value) = bound {
                if is_error_value(value) {
                    return self.check_type(value, &param.spec, &path);
                }
            }

            let absent = matches!(bound, None | Some(Value::Undefined));
            if absent {
                if param.required && param.default.is_none() {
                    let mut error = ContractError::missing_param(&path, &param.name)
                        .with_expected(param.spec.describe());
                    if let Some(loc) = param.loc {
                        error = error.with_loc(loc);
                    }
                    return Err(Arc::new(error));
                }
                // Absent but optional or defaulted: absence is valid
                continue;
            }

            if let Some(value) = bound {
                if let Err(error) = self.check_type(value, &param.spec, &path) {
                    return Err(attach_loc(error, param.loc));
                }
            }
        }
        Ok(())
    }
}

/// Attach a parameter's source span to a freshly built error.
///
/// Forwarded error values never reach this point, so cloning here cannot
/// break pass-through identity.
pub(crate) fn attach_loc(
    error: Arc<ContractError>,
    loc: Option<vara_types::Span>,
) -> Arc<ContractError> {
    match (loc, &error.loc) {
        (Some(span), None) => {
            let mut enriched = (*error).clone();
            enriched.loc = Some(span);
            Arc::new(enriched)
        }
        _ => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vara_types::{ParamMeta, RuntimeType, Span};

    fn named_args<const N: usize>(pairs: [(&str, Value); N]) -> FxHashMap<String, Value> {
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    #[test]
    fn test_runtime_type_check() {
        let runtime = Runtime::new();
        let positive = TypeSpec::Runtime(RuntimeType::new("positive number", |v: &Value| {
            v.as_number().is_some_and(|n| n > 0.0)
        }));
        assert!(runtime
            .check_type(&Value::Number(2.0), &positive, "f.x")
            .is_ok());

        let error = runtime
            .check_type(&Value::Number(-2.0), &positive, "f.x")
            .unwrap_err();
        assert_eq!(error.expected.as_deref(), Some("positive number"));
        assert_eq!(error.actual.as_deref(), Some("number"));
        assert_eq!(error.path.as_deref(), Some("f.x"));
    }

    #[test]
    fn test_name_equivalences() {
        let runtime = Runtime::new();
        let check = |value: &Value, name: &str| {
            runtime
                .check_type(value, &TypeSpec::from(name), "f.x")
                .is_ok()
        };
        assert!(check(&Value::Null, "any"));
        assert!(check(&Value::Number(1.5), "number"));
        assert!(check(&Value::Number(3.0), "integer"));
        assert!(!check(&Value::Number(1.5), "integer"));
        assert!(!check(&Value::string("3"), "integer"));
        assert!(check(&Value::string("x"), "string"));
        assert!(!check(&Value::Number(1.0), "string"));
        assert!(check(&Value::array([]), "array"));
        assert!(!check(&Value::array([]), "object"));
    }

    #[test]
    fn test_error_value_short_circuits_with_identity() {
        let runtime = Runtime::new();
        let original = Arc::new(ContractError::new("upstream"));
        let result = runtime.check_type(
            &Value::Error(Arc::clone(&original)),
            &TypeSpec::from("number"),
            "f.x",
        );
        let forwarded = result.unwrap_err();
        assert!(Arc::ptr_eq(&original, &forwarded));
    }

    #[test]
    fn test_descriptor_structural() {
        let runtime = Runtime::new();
        let point = TypeSpec::Descriptor(TypeDescriptor::Object {
            shape: vec![
                ("x".to_string(), TypeDescriptor::Number),
                ("y".to_string(), TypeDescriptor::Number),
            ],
        });
        let good = Value::object([
            ("x", Value::Number(1.0)),
            ("y", Value::Number(2.0)),
            ("label", Value::string("extra keys allowed")),
        ]);
        assert!(runtime.check_type(&good, &point, "f.p").is_ok());

        let bad = Value::object([("x", Value::Number(1.0)), ("y", Value::string("2"))]);
        let error = runtime.check_type(&bad, &point, "f.p").unwrap_err();
        assert_eq!(error.path.as_deref(), Some("f.p.y"));
    }

    #[test]
    fn test_descriptor_array_element_paths() {
        let runtime = Runtime::new();
        let numbers = TypeSpec::Descriptor(TypeDescriptor::Array {
            items: Box::new(TypeDescriptor::Number),
        });
        let bad = Value::array([Value::Number(1.0), Value::string("two")]);
        let error = runtime.check_type(&bad, &numbers, "f.xs").unwrap_err();
        assert_eq!(error.path.as_deref(), Some("f.xs[1]"));
    }

    #[test]
    fn test_descriptor_union() {
        let runtime = Runtime::new();
        let id = TypeSpec::Descriptor(TypeDescriptor::Union {
            members: vec![TypeDescriptor::String, TypeDescriptor::Number],
        });
        assert!(runtime.check_type(&Value::string("a"), &id, "f.id").is_ok());
        assert!(runtime.check_type(&Value::Number(1.0), &id, "f.id").is_ok());
        let error = runtime.check_type(&Value::Bool(true), &id, "f.id").unwrap_err();
        assert_eq!(error.expected.as_deref(), Some("string | number"));
    }

    #[test]
    fn test_unresolved_ref_skips_validation() {
        let runtime = Runtime::new();
        let spec = TypeSpec::Descriptor(TypeDescriptor::Ref {
            ref_name: "Unregistered".to_string(),
        });
        // Degrades to skip, whatever the value is
        assert!(runtime.check_type(&Value::Bool(true), &spec, "f.x").is_ok());
    }

    #[test]
    fn test_resolved_ref_checks() {
        let runtime = Runtime::new();
        runtime.register_type(
            "Port",
            RuntimeType::new("port number", |v: &Value| {
                v.as_number()
                    .is_some_and(|n| n >= 0.0 && n <= 65535.0 && n.fract() == 0.0)
            }),
        );
        let spec = TypeSpec::Descriptor(TypeDescriptor::Ref {
            ref_name: "Port".to_string(),
        });
        assert!(runtime.check_type(&Value::Number(8080.0), &spec, "f.p").is_ok());
        let error = runtime
            .check_type(&Value::Number(-1.0), &spec, "f.p")
            .unwrap_err();
        assert_eq!(error.expected.as_deref(), Some("port number"));
    }

    #[test]
    fn test_validate_args_passes() {
        let runtime = Runtime::new();
        let meta = FunctionMeta::new()
            .with_name("add")
            .with_param(ParamMeta::required("x", "number"))
            .with_param(ParamMeta::required("y", "number"));
        let args = named_args([("x", Value::Number(1.0)), ("y", Value::Number(2.0))]);
        assert!(runtime.validate_args(&args, &meta, None).is_ok());
    }

    #[test]
    fn test_validate_args_first_error_wins() {
        let runtime = Runtime::new();
        let meta = FunctionMeta::new()
            .with_name("add")
            .with_param(ParamMeta::required("x", "number"))
            .with_param(ParamMeta::required("y", "number"));
        let args = named_args([("x", Value::string("1")), ("y", Value::Bool(true))]);
        let error = runtime.validate_args(&args, &meta, None).unwrap_err();
        // Declaration order decides which failure reports
        assert_eq!(error.path.as_deref(), Some("add.x"));
    }

    #[test]
    fn test_validate_args_missing_required() {
        let runtime = Runtime::new();
        let meta = FunctionMeta::new()
            .with_name("greet")
            .with_param(ParamMeta::required("name", "string").with_loc(Span::new(0, 4)));
        let error = runtime
            .validate_args(&named_args([]), &meta, None)
            .unwrap_err();
        assert_eq!(error.message, "missing required parameter `name`");
        assert_eq!(error.path.as_deref(), Some("greet.name"));
        assert_eq!(error.expected.as_deref(), Some("string"));
        assert_eq!(error.loc, Some(Span::new(0, 4)));
    }

    #[test]
    fn test_validate_args_optional_absent_skips() {
        let runtime = Runtime::new();
        let meta = FunctionMeta::new()
            .with_name("greet")
            .with_param(ParamMeta::optional("salutation", "string"));
        assert!(runtime.validate_args(&named_args([]), &meta, None).is_ok());
        // Explicit undefined counts as absent
        let args = named_args([("salutation", Value::Undefined)]);
        assert!(runtime.validate_args(&args, &meta, None).is_ok());
        // Present but wrong still fails
        let args = named_args([("salutation", Value::Number(1.0))]);
        assert!(runtime.validate_args(&args, &meta, None).is_err());
    }

    #[test]
    fn test_validate_args_defaulted_absent_skips() {
        let runtime = Runtime::new();
        let meta = FunctionMeta::new().with_name("page").with_param(
            ParamMeta::required("limit", "number").with_default(Value::Number(10.0)),
        );
        assert!(runtime.validate_args(&named_args([]), &meta, None).is_ok());
    }

    #[test]
    fn test_validate_args_error_argument_returns_immediately() {
        let runtime = Runtime::new();
        let meta = FunctionMeta::new()
            .with_name("f")
            .with_param(ParamMeta::required("a", "number"))
            .with_param(ParamMeta::required("b", "number"));
        let upstream = Arc::new(ContractError::new("upstream"));
        // Second parameter also invalid, but the error argument wins
        let args = named_args([
            ("a", Value::Error(Arc::clone(&upstream))),
            ("b", Value::string("nope")),
        ]);
        let error = runtime.validate_args(&args, &meta, None).unwrap_err();
        assert!(Arc::ptr_eq(&upstream, &error));
    }

    #[test]
    fn test_validate_args_func_name_override() {
        let runtime = Runtime::new();
        let meta = FunctionMeta::new().with_param(ParamMeta::required("x", "number"));
        let error = runtime
            .validate_args(&named_args([]), &meta, Some("renamed"))
            .unwrap_err();
        assert_eq!(error.path.as_deref(), Some("renamed.x"));
    }

    #[test]
    fn test_validate_args_loc_attached_to_mismatch() {
        let runtime = Runtime::new();
        let meta = FunctionMeta::new()
            .with_name("f")
            .with_param(ParamMeta::required("x", "number").with_loc(Span::new(4, 9)));
        let args = named_args([("x", Value::string("one"))]);
        let error = runtime.validate_args(&args, &meta, None).unwrap_err();
        assert_eq!(error.loc, Some(Span::new(4, 9)));
    }
}
