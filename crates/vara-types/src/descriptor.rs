//! Serializable type descriptors
//!
//! A [`TypeDescriptor`] is the form type information takes when it must
//! cross a serialization boundary (cached metadata, emitted source text)
//! where a live [`RuntimeType`] closure cannot travel. Descriptors are
//! plain data; the validation engine interprets them structurally and
//! resolves `ref` kinds through a [`TypeRegistry`] at check time.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::runtime_type::RuntimeType;

/// Serializable description of an expected type shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDescriptor {
    /// Any string
    String,
    /// Any number
    Number,
    /// Any boolean
    Boolean,
    /// Only the null sentinel
    Null,
    /// Accepts everything
    Any,
    /// Array whose every element matches `items`
    Array {
        /// Element descriptor
        items: Box<TypeDescriptor>,
    },
    /// Object with named fields, each matching its descriptor
    Object {
        /// Field names and their descriptors
        shape: Vec<(String, TypeDescriptor)>,
    },
    /// Accepts when any member accepts
    Union {
        /// Variant descriptors, tried in order
        members: Vec<TypeDescriptor>,
    },
    /// Named reference resolved through a [`TypeRegistry`]
    Ref {
        /// Registered type name
        #[serde(rename = "refName")]
        ref_name: String,
    },
}

impl TypeDescriptor {
    /// Human-readable form used in mismatch diagnostics
    pub fn describe(&self) -> String {
        match self {
            TypeDescriptor::String => "string".to_string(),
            TypeDescriptor::Number => "number".to_string(),
            TypeDescriptor::Boolean => "boolean".to_string(),
            TypeDescriptor::Null => "null".to_string(),
            TypeDescriptor::Any => "any".to_string(),
            TypeDescriptor::Array { items } => format!("{}[]", items.describe()),
            TypeDescriptor::Object { shape } => {
                if shape.is_empty() {
                    "object".to_string()
                } else {
                    let inner: Vec<String> = shape
                        .iter()
                        .map(|(name, field)| format!("{}: {}", name, field.describe()))
                        .collect();
                    format!("{{{}}}", inner.join(", "))
                }
            }
            TypeDescriptor::Union { members } => members
                .iter()
                .map(TypeDescriptor::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            TypeDescriptor::Ref { ref_name } => ref_name.clone(),
        }
    }
}

/// Registry backing `ref` descriptor resolution
///
/// Populated by the metadata producer with named runtime types; the
/// validation engine looks names up when it encounters a
/// [`TypeDescriptor::Ref`].
pub struct TypeRegistry {
    types: FxHashMap<String, RuntimeType>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: FxHashMap::default(),
        }
    }

    /// Register a named type, replacing any previous binding
    pub fn register(&mut self, name: impl Into<String>, ty: RuntimeType) {
        self.types.insert(name.into(), ty);
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<RuntimeType> {
        self.types.get(name).cloned()
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
