//! Host value model
//!
//! Vara compiles to a dynamically-typed host; this module is the Rust-side
//! representation of that host's values. On top of the JSON-like core
//! (null/undefined-aware, JavaScript truthiness) it carries first-class
//! functions, classes and class instances, plus the contract-error value
//! that the wrapping engine propagates instead of raising.
//!
//! # Design notes
//!
//! - **Owned tree**: arrays and objects own their children, so values form
//!   a tree and cyclic structures are unrepresentable.
//! - **Undefined vs. null**: `Undefined` is the absent-value sentinel
//!   (missing property, missing argument); `Null` is an explicit value.
//! - **Errors are values**: a `Value::Error` flows through calls like any
//!   other value; only the wrapping engine constructs or converts them.

use crate::error::ContractError;
use crate::meta::FunctionMeta;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A host function: takes the argument slice, returns a value or a raised
/// native fault.
///
/// The `Err` side models a *thrown* fault crossing the host boundary — the
/// wrapping engine converts it into a `Value::Error`. The monadic error
/// path (an error travelling as data) uses `Ok(Value::Error(..))`.
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value, anyhow::Error> + Send + Sync>;

/// Unique identifier for a class definition.
///
/// Class identity survives `wrap_class`: a wrapped class shares the same
/// `ClassId` as the original, so membership tests treat both as the same
/// class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u64);

impl ClassId {
    /// Allocate a new unique class ID
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        ClassId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ClassId {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime representation of host values
#[derive(Clone)]
pub enum Value {
    /// Absent-value sentinel (missing property, missing argument)
    Undefined,

    /// Explicit null
    Null,

    /// Boolean (true/false)
    Bool(bool),

    /// Number (always f64, following the host's numeric model)
    Number(f64),

    /// String
    String(String),

    /// Array of values
    Array(Vec<Value>),

    /// Plain object (string-keyed map)
    Object(FxHashMap<String, Value>),

    /// Callable function, possibly carrying contract metadata
    Function(Arc<FunctionValue>),

    /// Class definition
    Class(Arc<ClassValue>),

    /// Instance of a class
    Instance(Arc<InstanceValue>),

    /// Contract error travelling as data
    Error(Arc<ContractError>),
}

/// A callable host function value.
///
/// Contract metadata is attached by the wrapping engine and frozen for the
/// function's lifetime; introspection tools read it from here without
/// re-deriving it.
pub struct FunctionValue {
    /// Function display name, if any
    pub name: Option<String>,

    /// Attached contract metadata (set by `wrap`, immutable afterwards)
    pub meta: Option<Arc<FunctionMeta>>,

    /// The callable itself
    pub func: HostFn,
}

impl FunctionValue {
    /// Create a named function value with no metadata
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Some(name.into()),
            meta: None,
            func: Arc::new(func),
        }
    }

    /// Create an anonymous function value with no metadata
    pub fn anonymous(
        func: impl Fn(&[Value]) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: None,
            meta: None,
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("has_meta", &self.meta.is_some())
            .finish()
    }
}

/// A class definition value.
///
/// Identity is the `ClassId`, not the allocation: `wrap_class` rebuilds the
/// value but keeps the ID, so `instance_of` works across both.
pub struct ClassValue {
    /// Class identity
    pub id: ClassId,

    /// Class display name
    pub name: String,

    /// Parent class (None for root classes)
    pub parent: Option<Arc<ClassValue>>,

    /// Constructor producing the instance's field object (None = no fields)
    pub constructor: Option<HostFn>,

    /// Static members (class-level values)
    pub statics: FxHashMap<String, Value>,

    /// Instance method table
    pub methods: FxHashMap<String, HostFn>,

    /// Whether the class may be invoked as a plain call (set by `wrap_class`)
    pub callable: bool,
}

impl ClassValue {
    /// Create a new root class with a fresh identity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ClassId::new(),
            name: name.into(),
            parent: None,
            constructor: None,
            statics: FxHashMap::default(),
            methods: FxHashMap::default(),
            callable: false,
        }
    }

    /// Create a new class extending a parent
    pub fn with_parent(name: impl Into<String>, parent: Arc<ClassValue>) -> Self {
        Self {
            id: ClassId::new(),
            name: name.into(),
            parent: Some(parent),
            constructor: None,
            statics: FxHashMap::default(),
            methods: FxHashMap::default(),
            callable: false,
        }
    }

    /// Set the constructor (builder style)
    pub fn with_constructor(
        mut self,
        func: impl Fn(&[Value]) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(func));
        self
    }

    /// Add a static member (builder style)
    pub fn with_static(mut self, name: impl Into<String>, value: Value) -> Self {
        self.statics.insert(name.into(), value);
        self
    }

    /// Add an instance method (builder style)
    pub fn with_method(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Arc::new(func));
        self
    }

    /// Look up an instance method, walking the parent chain
    pub fn lookup_method(&self, name: &str) -> Option<HostFn> {
        if let Some(f) = self.methods.get(name) {
            return Some(f.clone());
        }
        match &self.parent {
            Some(parent) => parent.lookup_method(name),
            None => None,
        }
    }

    /// Ordered ancestor names, own name first
    pub fn name_chain(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        let mut current = self.parent.clone();
        while let Some(class) = current {
            names.push(class.name.clone());
            current = class.parent.clone();
        }
        names
    }
}

impl fmt::Debug for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassValue")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .field("callable", &self.callable)
            .finish()
    }
}

/// An instance of a class
#[derive(Debug)]
pub struct InstanceValue {
    /// The class this value is an instance of
    pub class: Arc<ClassValue>,

    /// Field values
    pub fields: FxHashMap<String, Value>,
}

impl InstanceValue {
    /// Create an instance with the given fields
    pub fn new(class: Arc<ClassValue>, fields: FxHashMap<String, Value>) -> Self {
        Self { class, fields }
    }

    /// Get a field value, `Undefined` when missing
    pub fn get_field(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or(Value::Undefined)
    }
}

impl Value {
    /// Create a number value
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create an array value
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    /// Create a plain object value from key/value pairs
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create a named function value
    pub fn function(
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
    ) -> Self {
        Value::Function(Arc::new(FunctionValue::new(name, func)))
    }

    /// Create an anonymous function value
    pub fn native(
        func: impl Fn(&[Value]) -> Result<Value, anyhow::Error> + Send + Sync + 'static,
    ) -> Self {
        Value::Function(Arc::new(FunctionValue::anonymous(func)))
    }

    /// Get the fixed type tag for this value.
    ///
    /// Unlike a generic dynamic `typeof`, null and undefined are their own
    /// tags, arrays are their own tag, and class instances report their
    /// class name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(i) => &i.class.name,
            Value::Error(_) => "error",
        }
    }

    /// Check if this is the absent-value sentinel
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is null or undefined
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Check if this is a boolean
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Check if this is a number
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Check if this is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Check if this is a plain object
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check if this is a function
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Check if this is a contract error value
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the boolean if this is a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the number if this is a Number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the elements if this is an Array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the field map if this is a plain Object
    pub fn as_object(&self) -> Option<&FxHashMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Get the function if this is a Function
    pub fn as_function(&self) -> Option<&Arc<FunctionValue>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Get the class if this is a Class
    pub fn as_class(&self) -> Option<&Arc<ClassValue>> {
        match self {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Get the instance if this is an Instance
    pub fn as_instance(&self) -> Option<&Arc<InstanceValue>> {
        match self {
            Value::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Get the contract error if this is an Error
    pub fn as_error(&self) -> Option<&Arc<ContractError>> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Get a property from an object, instance field, or class static.
    ///
    /// Returns `Undefined` when the property is missing or the value has no
    /// properties.
    pub fn get_property(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Undefined),
            Value::Instance(i) => i.get_field(key),
            Value::Class(c) => c.statics.get(key).cloned().unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        }
    }

    /// Convert to a boolean following host truthiness rules.
    ///
    /// Falsy: null, undefined, false, 0, NaN, "". Error values are falsy so
    /// that a propagated error never passes a truth test. Everything else
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Error(_) => false,
            Value::Array(_)
            | Value::Object(_)
            | Value::Function(_)
            | Value::Class(_)
            | Value::Instance(_) => true,
        }
    }
}

/// Fixed type tag of a value (free-function form of [`Value::type_name`])
pub fn type_of(value: &Value) -> &str {
    value.type_name()
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(map) => f.debug_tuple("Object").field(map).finish(),
            Value::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Value::Class(class) => f.debug_tuple("Class").field(class).finish(),
            Value::Instance(i) => write!(f, "Instance({})", i.class.name),
            Value::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Array(items) => write!(f, "[Array({})]", items.len()),
            Value::Object(_) => write!(f, "[Object]"),
            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "[Function: {}]", name),
                None => write!(f, "[Function: anonymous]"),
            },
            Value::Class(c) => write!(f, "[Class: {}]", c.name),
            Value::Instance(i) => write!(f, "[{} instance]", i.class.name),
            Value::Error(e) => write!(f, "[Error: {}]", e.message),
        }
    }
}

/// Strict per-variant structural equality.
///
/// `Null` and `Undefined` are distinct here; NaN equals NaN so values are
/// reflexively equal. Reference types (functions, classes, instances,
/// errors) compare by allocation identity. The richer equality with the
/// delegation protocol and nullish equivalence lives in
/// [`crate::equality::is`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Arc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}
