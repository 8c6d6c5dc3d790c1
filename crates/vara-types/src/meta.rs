//! Function and parameter metadata
//!
//! The metadata producer (transpiler or hand-written host code) describes
//! each function's contract with a [`FunctionMeta`]: ordered parameters,
//! an optional return contract, and per-function safety flags. The
//! wrapping engine reads this once at wrap time; after a function is
//! wrapped its metadata is frozen for the function's lifetime.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::descriptor::TypeDescriptor;
use crate::runtime_type::RuntimeType;
use crate::value::Value;

/// Character span inside the declaring source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Offset of the first character
    pub start: usize,
    /// Offset one past the last character
    pub end: usize,
}

impl Span {
    /// Create a span from start/end offsets
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

/// Declaring file and line, used to prefix diagnostic paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Source file name
    pub file: String,
    /// 1-based line of the declaration
    pub line: u32,
}

impl SourceInfo {
    /// Create source info from a file name and line
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        SourceInfo {
            file: file.into(),
            line,
        }
    }
}

/// How a parameter or return type is specified
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// Built-in type name, matched by tag with the standard equivalences
    Name(String),
    /// Live runtime type
    Runtime(RuntimeType),
    /// Serializable descriptor, validated structurally
    Descriptor(TypeDescriptor),
}

impl TypeSpec {
    /// Brand check: is this a live runtime type (not a name or descriptor)
    pub fn is_runtime_type(&self) -> bool {
        matches!(self, TypeSpec::Runtime(_))
    }

    /// Description used in mismatch diagnostics
    pub fn describe(&self) -> String {
        match self {
            TypeSpec::Name(name) => name.clone(),
            TypeSpec::Runtime(ty) => ty.description().to_string(),
            TypeSpec::Descriptor(descriptor) => descriptor.describe(),
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        TypeSpec::Name(name.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(name: String) -> Self {
        TypeSpec::Name(name)
    }
}

impl From<RuntimeType> for TypeSpec {
    fn from(ty: RuntimeType) -> Self {
        TypeSpec::Runtime(ty)
    }
}

impl From<TypeDescriptor> for TypeSpec {
    fn from(descriptor: TypeDescriptor) -> Self {
        TypeSpec::Descriptor(descriptor)
    }
}

/// Contract of one declared parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub spec: TypeSpec,
    /// Whether the parameter must be supplied
    pub required: bool,
    /// Substituted when the parameter is absent
    pub default: Option<Value>,
    /// Span of the declaration, for tooling
    pub loc: Option<Span>,
}

impl ParamMeta {
    /// Parameter that must be present on every call
    pub fn required(name: impl Into<String>, spec: impl Into<TypeSpec>) -> Self {
        ParamMeta {
            name: name.into(),
            spec: spec.into(),
            required: true,
            default: None,
            loc: None,
        }
    }

    /// Parameter that may be omitted
    pub fn optional(name: impl Into<String>, spec: impl Into<TypeSpec>) -> Self {
        ParamMeta {
            required: false,
            ..ParamMeta::required(name, spec)
        }
    }

    /// Value substituted when the parameter is absent
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Attach the declaration span
    pub fn with_loc(mut self, loc: Span) -> Self {
        self.loc = Some(loc);
        self
    }
}

/// Contract of the return value
#[derive(Debug, Clone)]
pub struct ReturnMeta {
    /// Declared return type
    pub spec: TypeSpec,
    /// Validate the return even when the global level would skip it
    pub always_validate: bool,
    /// Never validate the return, whatever the global level says
    pub never_validate: bool,
    /// Field defaults merged into object results before checking
    pub defaults: Option<FxHashMap<String, Value>>,
}

impl ReturnMeta {
    /// Return contract with no overrides
    pub fn new(spec: impl Into<TypeSpec>) -> Self {
        ReturnMeta {
            spec: spec.into(),
            always_validate: false,
            never_validate: false,
            defaults: None,
        }
    }

    /// Force return validation for this function
    pub fn with_always_validate(mut self) -> Self {
        self.always_validate = true;
        self
    }

    /// Suppress return validation for this function
    pub fn with_never_validate(mut self) -> Self {
        self.never_validate = true;
        self
    }

    /// Field defaults merged into object results before checking
    pub fn with_defaults<K: Into<String>>(
        mut self,
        defaults: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        self.defaults = Some(
            defaults
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        );
        self
    }
}

/// Full contract of a function, attached to the function value itself
#[derive(Debug, Clone, Default)]
pub struct FunctionMeta {
    /// Display name, used in diagnostics
    pub name: Option<String>,
    /// Declared parameters, in declaration order
    pub params: Vec<ParamMeta>,
    /// Return contract, when declared
    pub returns: Option<ReturnMeta>,
    /// Validate inputs even when the global level would skip them
    pub always_validate: bool,
    /// Never validate inputs, whatever the global level says
    pub never_validate: bool,
    /// Validate the return even when the global level would skip it
    pub always_validate_return: bool,
    /// Never validate the return, whatever the global level says
    pub never_validate_return: bool,
    /// Dispatcher that performs its own routing and validation; wrapping
    /// attaches metadata but never installs a guard
    pub polymorphic: bool,
    /// Declaring file and line, prefixed onto diagnostic paths
    pub source: Option<SourceInfo>,
}

impl FunctionMeta {
    /// Empty contract: no declared parameters, no overrides
    pub fn new() -> Self {
        FunctionMeta::default()
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append one declared parameter
    pub fn with_param(mut self, param: ParamMeta) -> Self {
        self.params.push(param);
        self
    }

    /// Replace the declared parameter list
    pub fn with_params(mut self, params: Vec<ParamMeta>) -> Self {
        self.params = params;
        self
    }

    /// Set the return contract
    pub fn with_returns(mut self, returns: ReturnMeta) -> Self {
        self.returns = Some(returns);
        self
    }

    /// Force input validation for this function
    pub fn with_always_validate(mut self) -> Self {
        self.always_validate = true;
        self
    }

    /// Suppress input validation for this function
    pub fn with_never_validate(mut self) -> Self {
        self.never_validate = true;
        self
    }

    /// Force return validation for this function
    pub fn with_always_validate_return(mut self) -> Self {
        self.always_validate_return = true;
        self
    }

    /// Suppress return validation for this function
    pub fn with_never_validate_return(mut self) -> Self {
        self.never_validate_return = true;
        self
    }

    /// Mark the function as a self-routing dispatcher; no guard is installed
    pub fn with_polymorphic(mut self) -> Self {
        self.polymorphic = true;
        self
    }

    /// Attach the declaring file and line
    pub fn with_source(mut self, file: impl Into<String>, line: u32) -> Self {
        self.source = Some(SourceInfo::new(file, line));
        self
    }

    /// Look up a declared parameter by name
    pub fn param(&self, name: &str) -> Option<&ParamMeta> {
        self.params.iter().find(|param| param.name == name)
    }

    /// Name used in diagnostics
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}
