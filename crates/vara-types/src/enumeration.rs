//! Enumerated types
//!
//! An [`EnumType`] maps declaration-ordered member names to concrete values
//! (numeric and string domains both supported) and answers membership via
//! structural equality. Lookup is bidirectional: name to value and value
//! back to name. Duplicate values are accepted; reverse lookup is then
//! last-write-wins.

use crate::equality::is;
use crate::runtime_type::RuntimeType;
use crate::value::Value;

/// A named set of concrete values with bidirectional lookup
#[derive(Debug, Clone)]
pub struct EnumType {
    description: String,
    members: Vec<(String, Value)>,
}

impl EnumType {
    /// Build an enum from `(name, value)` members, kept in declaration order
    pub fn new<K: Into<String>>(
        description: impl Into<String>,
        members: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        EnumType {
            description: description.into(),
            members: members
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Member pairs in declaration order
    pub fn members(&self) -> &[(String, Value)] {
        &self.members
    }

    /// True when the value equals any member value
    pub fn check(&self, value: &Value) -> bool {
        self.members.iter().any(|(_, member)| is(member, value))
    }

    /// Value mapped to `name`, if declared
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, value)| value)
    }

    /// Name mapped to `value`. With duplicate values the latest
    /// declaration wins.
    pub fn name_of(&self, value: &Value) -> Option<&str> {
        self.members
            .iter()
            .rev()
            .find(|(_, member)| is(member, value))
            .map(|(name, _)| name.as_str())
    }

    /// Member names in declaration order
    pub fn keys(&self) -> Vec<&str> {
        self.members.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Member values in declaration order
    pub fn values(&self) -> Vec<&Value> {
        self.members.iter().map(|(_, value)| value).collect()
    }

    /// View the enum as a [`RuntimeType`] with its members as literals
    pub fn as_runtime_type(&self) -> RuntimeType {
        let members = self.members.clone();
        let literals: Vec<Value> = members.iter().map(|(_, value)| value.clone()).collect();
        RuntimeType::new(self.description.clone(), move |value| {
            members.iter().any(|(_, member)| is(member, value))
        })
        .with_literals(literals)
    }
}
