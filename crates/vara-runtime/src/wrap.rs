//! Wrapping engine
//!
//! `wrap` is the central state machine of the contract layer. It has two
//! phases:
//!
//! - **Build phase** (once, at wrap time): attach the frozen metadata and
//!   decide whether a guard is needed at all. When none is, the original
//!   callable is returned untouched — the zero-overhead escape hatch for
//!   hot paths.
//! - **Call phase** (every invocation): unsafe-scope bypass, per-call
//!   input/output decision, first-argument error pass-through, convention
//!   detection, collect-all input validation, the debug-stack frame, the
//!   fault boundary, and output validation.
//!
//! Faults only ever travel one way here: a raised native fault becomes an
//! error value. The engine never raises on its own behalf; its failures
//! are returned as `Value::Error`.

use std::sync::Arc;

use vara_types::error::{compose_errors, is_error_value};
use vara_types::{ContractError, FunctionMeta, FunctionValue, HostFn, Value};

use crate::check::{attach_loc, diagnostic_path};
use crate::config::SafetyLevel;
use crate::instance::Runtime;
use crate::logger;

/// Per-call validation decision under one safety level.
///
/// Per-function flags override the level; the per-return flags on
/// `ReturnMeta` join the function-level return flags. A function without a
/// declared return type never validates outputs.
fn validation_plan(meta: &FunctionMeta, level: SafetyLevel) -> (bool, bool) {
    let inputs = if meta.always_validate {
        true
    } else if meta.never_validate {
        false
    } else {
        level.validates_inputs()
    };
    let outputs = match &meta.returns {
        Some(ret) => {
            if ret.always_validate || meta.always_validate_return {
                true
            } else if ret.never_validate || meta.never_validate_return {
                false
            } else {
                level.validates_returns()
            }
        }
        None => false,
    };
    (inputs, outputs)
}

/// Pops the debug frame on every exit path out of the guarded call
struct FrameGuard<'a> {
    runtime: &'a Runtime,
    active: bool,
}

impl<'a> FrameGuard<'a> {
    fn push(runtime: &'a Runtime, active: bool, name: &str) -> Self {
        if active {
            runtime.push_frame(name);
        }
        FrameGuard { runtime, active }
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            self.runtime.pop_frame();
        }
    }
}

impl Runtime {
    /// Wrap a function value with its contract metadata.
    ///
    /// The metadata is attached for introspection in every case. A guard
    /// is installed only when this function could validate under the
    /// wrap-time configuration: polymorphic dispatchers never get one, and
    /// a function with nothing to check under the current level (and no
    /// always-validate flags) keeps its original callable unchanged.
    /// Raising the safety level later does not retro-guard functions
    /// wrapped without one.
    ///
    /// A non-function input is returned unchanged with a diagnostic.
    pub fn wrap(&self, function: &Value, meta: FunctionMeta) -> Value {
        let inner = match function.as_function() {
            Some(f) => Arc::clone(f),
            None => {
                logger::warn(&format!(
                    "wrap: expected a function, got {}",
                    function.type_name()
                ));
                return function.clone();
            }
        };

        let config = self.config();
        let display = inner
            .name
            .clone()
            .or_else(|| meta.name.clone())
            .unwrap_or_else(|| "anonymous".to_string());

        if config.require_return_types && !meta.polymorphic && meta.returns.is_none() {
            logger::warn(&format!(
                "function `{}` wrapped without a declared return type",
                display
            ));
        }

        let (inputs, outputs) = validation_plan(&meta, config.safety);
        let guard_needed = !meta.polymorphic && (inputs || outputs);
        let meta = Arc::new(meta);

        if !guard_needed {
            return Value::Function(Arc::new(FunctionValue {
                name: inner.name.clone(),
                meta: Some(meta),
                func: Arc::clone(&inner.func),
            }));
        }

        let runtime = self.clone();
        let original = Arc::clone(&inner.func);
        let guard_meta = Arc::clone(&meta);
        let guard: HostFn = Arc::new(move |args: &[Value]| {
            guarded_call(&runtime, &original, &guard_meta, &display, args)
        });

        Value::Function(Arc::new(FunctionValue {
            name: inner.name.clone(),
            meta: Some(meta),
            func: guard,
        }))
    }

    /// Invoke a callable value.
    ///
    /// Functions are applied directly. A class made callable by
    /// [`wrap_class`](Runtime::wrap_class) constructs an instance; an
    /// un-wrapped class raises a fault, as does any non-callable value.
    pub fn call(&self, callee: &Value, args: &[Value]) -> Result<Value, anyhow::Error> {
        match callee {
            Value::Function(function) => (function.func)(args),
            Value::Class(class) => {
                if class.callable {
                    Ok(self.construct(class, args))
                } else {
                    Err(anyhow::anyhow!(
                        "class `{}` cannot be called without construction",
                        class.name
                    ))
                }
            }
            other => Err(anyhow::anyhow!("`{}` is not callable", other.type_name())),
        }
    }
}

fn guarded_call(
    runtime: &Runtime,
    original: &HostFn,
    meta: &FunctionMeta,
    display: &str,
    args: &[Value],
) -> Result<Value, anyhow::Error> {
    // Unsafe scope: straight to invocation, no checks, no stack frame
    if runtime.in_unsafe_scope() {
        return original(args);
    }

    let config = runtime.config();
    let (need_inputs, need_outputs) = validation_plan(meta, config.safety);
    if !need_inputs && !need_outputs {
        return original(args);
    }

    // An error arriving as the first argument wins over everything else
    if let Some(first) = args.first() {
        if is_error_value(first) {
            return Ok(first.clone());
        }
    }

    if need_inputs {
        if let Some(error) = validate_inputs(runtime, meta, display, args, config.debug) {
            return Ok(Value::Error(error));
        }
    }

    let _frame = FrameGuard::push(runtime, config.debug, display);
    let mut result = match original(args) {
        Ok(value) => value,
        Err(fault) => {
            let mut error =
                ContractError::from_fault(diagnostic_path(meta, display, None), fault);
            if config.debug {
                error = error.with_call_stack(runtime.stack());
            }
            return Ok(Value::Error(Arc::new(error)));
        }
    };

    if need_outputs && !is_error_value(&result) {
        if let Some(ret) = &meta.returns {
            if let Some(defaults) = &ret.defaults {
                if let Value::Object(fields) = &mut result {
                    for (key, value) in defaults {
                        fields.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
            let path = diagnostic_path(meta, display, None);
            if let Err(error) = runtime.check_type(&result, &ret.spec, &path) {
                let error = if config.debug {
                    Arc::new((*error).clone().with_call_stack(runtime.stack()))
                } else {
                    error
                };
                return Ok(Value::Error(error));
            }
        }
    }

    Ok(result)
}

/// Validate every declared parameter, collecting all failures.
///
/// A single plain non-array object argument is decoded as named
/// arguments; anything else binds positionally. Error-valued arguments
/// are forwarded as failures untouched, so a lone one keeps its identity
/// through `compose_errors`.
fn validate_inputs(
    runtime: &Runtime,
    meta: &FunctionMeta,
    display: &str,
    args: &[Value],
    debug: bool,
) -> Option<Arc<ContractError>> {
    let named = match args {
        [Value::Object(fields)] => Some(fields),
        _ => None,
    };

    let mut failures: Vec<Arc<ContractError>> = Vec::new();
    let mut forwarded = 0usize;
    for (index, param) in meta.params.iter().enumerate() {
        let bound = match named {
            Some(fields) => fields.get(&param.name),
            None => args.get(index),
        };
        let path = diagnostic_path(meta, display, Some(&param.name));

        if let Some(value) = bound {
            if is_error_value(value) {
                match value {
                    Value::Error(error) => failures.push(Arc::clone(error)),
                    tagged => {
                        if let Some(error) = ContractError::from_tagged_value(tagged) {
                            failures.push(Arc::new(error));
                        }
                    }
                }
                forwarded += 1;
                continue;
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
                failures.push(Arc::new(error));
            }
            continue;
        }

        if let Some(value) = bound {
            if let Err(error) = runtime.check_type(value, &param.spec, &path) {
                failures.push(attach_loc(error, param.loc));
            }
        }
    }

    if failures.is_empty() {
        return None;
    }

    // A lone forwarded error must come back unchanged
    let pass_through = failures.len() == 1 && forwarded == 1;
    let composed = compose_errors(failures, Some(display));
    if debug && !pass_through {
        return Some(Arc::new(
            (*composed).clone().with_call_stack(runtime.stack()),
        ));
    }
    Some(composed)
}
