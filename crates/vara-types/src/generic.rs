//! Parameterized type families
//!
//! A [`GenericType`] is a factory: it declares ordered parameters (each
//! optionally carrying a default), a description template, and a predicate
//! that receives the value together with the resolved per-parameter checks.
//! [`GenericType::instantiate`] binds concrete arguments and produces an
//! ordinary [`RuntimeType`].
//!
//! Design notes:
//! - Arguments resolve the same way `Type(...)` arguments do: a ready
//!   runtime type is used as-is, a schema validates structurally, and a
//!   bare example value has its schema inferred.
//! - Omitted trailing arguments fall back to their parameter's default;
//!   a parameter with no default must be supplied.
//! - Description templates substitute whole parameter-name tokens; a
//!   parameter name occurring inside a longer word is left alone.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::runtime_type::{Predicate, RuntimeType};
use crate::schema::ValueSchema;
use crate::value::Value;

/// A resolved per-parameter check handed to a generic predicate
pub type TypeCheckFn = Predicate;

/// Predicate of a generic family: the value plus one check per parameter
pub type GenericPredicate = Arc<dyn Fn(&Value, &[TypeCheckFn]) -> bool + Send + Sync>;

/// Errors raised when instantiating a generic type
#[derive(Debug, Error)]
pub enum GenericTypeError {
    /// More arguments than declared parameters
    #[error("generic type `{template}` takes at most {expected} type argument(s), got {given}")]
    TooManyArguments {
        /// Description template of the family
        template: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        given: usize,
    },

    /// A parameter with no default was not supplied
    #[error("generic type `{template}` is missing an argument for parameter `{param}`")]
    MissingArgument {
        /// Description template of the family
        template: String,
        /// Name of the unbound parameter
        param: String,
    },
}

/// One type argument to [`GenericType::instantiate`]
#[derive(Clone)]
pub enum GenericArg {
    /// A ready runtime type, used as-is
    Type(RuntimeType),
    /// A schema, validated structurally
    Schema(ValueSchema),
    /// A bare example value; its schema is inferred
    Example(Value),
}

impl GenericArg {
    fn resolve(self) -> RuntimeType {
        match self {
            GenericArg::Type(t) => t,
            GenericArg::Schema(schema) => RuntimeType::from_schema(schema),
            GenericArg::Example(example) => {
                RuntimeType::from_schema(ValueSchema::infer(&example)).with_example(example)
            }
        }
    }
}

impl From<RuntimeType> for GenericArg {
    fn from(t: RuntimeType) -> Self {
        GenericArg::Type(t)
    }
}

impl From<ValueSchema> for GenericArg {
    fn from(schema: ValueSchema) -> Self {
        GenericArg::Schema(schema)
    }
}

impl From<Value> for GenericArg {
    fn from(example: Value) -> Self {
        GenericArg::Example(example)
    }
}

/// A declared parameter of a generic family
#[derive(Clone)]
pub struct GenericParam {
    name: String,
    default: Option<GenericArg>,
}

impl GenericParam {
    /// Parameter that must be supplied at instantiation
    pub fn required(name: impl Into<String>) -> Self {
        GenericParam {
            name: name.into(),
            default: None,
        }
    }

    /// Parameter that falls back to `default` when omitted
    pub fn with_default(name: impl Into<String>, default: impl Into<GenericArg>) -> Self {
        GenericParam {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    /// Parameter name (also the token substituted in the template)
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A parameterized type family
#[derive(Clone)]
pub struct GenericType {
    template: String,
    params: Vec<GenericParam>,
    check: GenericPredicate,
}

impl GenericType {
    /// Build a family from a description template, its parameters, and the
    /// predicate applied to `(value, resolved_checks)`.
    pub fn new(
        template: impl Into<String>,
        params: Vec<GenericParam>,
        check: impl Fn(&Value, &[TypeCheckFn]) -> bool + Send + Sync + 'static,
    ) -> Self {
        GenericType {
            template: template.into(),
            params,
            check: Arc::new(check),
        }
    }

    /// Description template with unsubstituted parameter tokens
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Declared parameters, in order
    pub fn params(&self) -> &[GenericParam] {
        &self.params
    }

    /// Bind concrete arguments and produce a [`RuntimeType`].
    ///
    /// Arguments bind positionally. Omitted trailing parameters use their
    /// defaults; a missing argument for a defaultless parameter is an error,
    /// as is supplying more arguments than parameters.
    pub fn instantiate(
        &self,
        args: impl IntoIterator<Item = GenericArg>,
    ) -> Result<RuntimeType, GenericTypeError> {
        let args: Vec<GenericArg> = args.into_iter().collect();
        if args.len() > self.params.len() {
            return Err(GenericTypeError::TooManyArguments {
                template: self.template.clone(),
                expected: self.params.len(),
                given: args.len(),
            });
        }

        let mut supplied = args.into_iter();
        let mut resolved: Vec<RuntimeType> = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let bound = match supplied.next() {
                Some(arg) => arg.resolve(),
                None => match &param.default {
                    Some(default) => default.clone().resolve(),
                    None => {
                        return Err(GenericTypeError::MissingArgument {
                            template: self.template.clone(),
                            param: param.name.clone(),
                        });
                    }
                },
            };
            resolved.push(bound);
        }

        let description = substitute_tokens(&self.template, &self.params, &resolved);

        let checks: Vec<TypeCheckFn> = resolved
            .into_iter()
            .map(|bound| Arc::new(move |value: &Value| bound.check(value)) as TypeCheckFn)
            .collect();
        let check = Arc::clone(&self.check);
        Ok(RuntimeType::new(description, move |value| {
            check(value, &checks)
        }))
    }
}

/// Substitute parameter-name tokens in `template` with the descriptions of
/// the types bound to them.
///
/// A token is a maximal identifier run; a run that names no parameter is
/// kept, and a parameter name inside a longer word never matches. Single
/// pass over the template, so a bound description is never rescanned for
/// later parameters.
fn substitute_tokens(template: &str, params: &[GenericParam], bound: &[RuntimeType]) -> String {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find(is_ident) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail.find(|c: char| !is_ident(c)).unwrap_or(tail.len());
        let token = &tail[..end];
        match params.iter().position(|param| param.name == token) {
            Some(i) => out.push_str(bound[i].description()),
            None => out.push_str(token),
        }
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

impl fmt::Debug for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericType")
            .field("template", &self.template)
            .field(
                "params",
                &self.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ============================================================================
// Prebuilt families
// ============================================================================

/// Exact two-element `(T, U)` sequence
pub static PAIR: Lazy<GenericType> = Lazy::new(|| {
    GenericType::new(
        "pair<T, U>",
        vec![GenericParam::required("T"), GenericParam::required("U")],
        |value, checks| match value.as_array() {
            Some(items) => items.len() == 2 && checks[0](&items[0]) && checks[1](&items[1]),
            None => false,
        },
    )
});

/// Keyed collection whose every value satisfies `V`
pub static RECORD: Lazy<GenericType> = Lazy::new(|| {
    GenericType::new(
        "record<V>",
        vec![GenericParam::required("V")],
        |value, checks| match value.as_object() {
            Some(fields) => fields.values().all(|field| checks[0](field)),
            None => false,
        },
    )
});
