//! Contract error values
//!
//! Validation failures are data, not control flow: a [`ContractError`]
//! travels through calls as an ordinary [`Value::Error`] and callers
//! receiving one simply forward it. One internal representation covers
//! both historical shapes; [`ContractError::to_tagged_value`] renders the
//! legacy `{"$error": true, ...}` plain object for consumers that still
//! pattern-match on it.
//!
//! Design notes:
//! - `compose_errors` with a single error returns that error untouched,
//!   so pass-through preserves value identity for the common case.
//! - `cause` keeps the converted native fault alive for inspection after
//!   the wrapping engine has turned it into an error value.

use std::sync::Arc;

use thiserror::Error;

use crate::meta::Span;
use crate::value::Value;

/// Key marking the legacy tagged-object error shape
pub const ERROR_TAG: &str = "$error";

/// A contract violation, carried as a value
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ContractError {
    /// Human-readable description of the violation
    pub message: String,
    /// Where it happened: `func.param` for arguments, `func()` for returns
    pub path: Option<String>,
    /// Description of the expected type
    pub expected: Option<String>,
    /// Tag of the value actually seen
    pub actual: Option<String>,
    /// Source span carried through from parameter metadata
    pub loc: Option<Span>,
    /// Upstream native fault this error was converted from
    pub cause: Option<Arc<anyhow::Error>>,
    /// Member errors when this is a composite
    pub errors: Vec<Arc<ContractError>>,
    /// Call-stack snapshot captured in debug mode
    pub call_stack: Vec<String>,
}

impl ContractError {
    /// Bare error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        ContractError {
            message: message.into(),
            path: None,
            expected: None,
            actual: None,
            loc: None,
            cause: None,
            errors: Vec::new(),
            call_stack: Vec::new(),
        }
    }

    /// Required parameter absent from a call
    pub fn missing_param(path: impl Into<String>, param: &str) -> Self {
        ContractError::new(format!("missing required parameter `{}`", param))
            .with_path(path)
    }

    /// Value did not satisfy the declared type
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let expected = expected.into();
        let actual = actual.into();
        ContractError::new(format!("{}: expected {}, got {}", path, expected, actual))
            .with_path(path)
            .with_expected(expected)
            .with_actual(actual)
    }

    /// Native fault converted into an error value
    pub fn from_fault(path: impl Into<String>, fault: anyhow::Error) -> Self {
        ContractError::new(fault.to_string())
            .with_path(path)
            .with_cause(fault)
    }

    /// Attach a diagnostic path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach the expected-type description
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Attach the actual-value description
    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    /// Attach a source span
    pub fn with_loc(mut self, loc: Span) -> Self {
        self.loc = Some(loc);
        self
    }

    /// Attach the upstream fault
    pub fn with_cause(mut self, cause: anyhow::Error) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attach a call-stack snapshot
    pub fn with_call_stack(mut self, call_stack: Vec<String>) -> Self {
        self.call_stack = call_stack;
        self
    }

    /// True when this wraps more than one underlying failure
    pub fn is_composite(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Render the legacy `{"$error": true, ...}` plain-object shape
    pub fn to_tagged_value(&self) -> Value {
        let mut fields: Vec<(String, Value)> = vec![
            (ERROR_TAG.to_string(), Value::Bool(true)),
            ("message".to_string(), Value::string(&self.message)),
        ];
        if let Some(path) = &self.path {
            fields.push(("path".to_string(), Value::string(path)));
        }
        if let Some(expected) = &self.expected {
            fields.push(("expected".to_string(), Value::string(expected)));
        }
        if let Some(actual) = &self.actual {
            fields.push(("actual".to_string(), Value::string(actual)));
        }
        if let Some(loc) = &self.loc {
            fields.push((
                "loc".to_string(),
                Value::object([
                    ("start", Value::Number(loc.start as f64)),
                    ("end", Value::Number(loc.end as f64)),
                ]),
            ));
        }
        if let Some(cause) = &self.cause {
            fields.push(("cause".to_string(), Value::string(cause.to_string())));
        }
        if !self.errors.is_empty() {
            let members: Vec<Value> = self
                .errors
                .iter()
                .map(|member| member.to_tagged_value())
                .collect();
            fields.push(("errors".to_string(), Value::array(members)));
        }
        Value::object(fields)
    }

    /// Parse the legacy tagged-object shape back into a [`ContractError`]
    pub fn from_tagged_value(value: &Value) -> Option<ContractError> {
        let fields = value.as_object()?;
        if !fields.get(ERROR_TAG).is_some_and(Value::is_truthy) {
            return None;
        }

        let read_str = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let mut error = ContractError::new(read_str("message").unwrap_or_default());
        error.path = read_str("path");
        error.expected = read_str("expected");
        error.actual = read_str("actual");
        if let Some(loc) = fields.get("loc").and_then(Value::as_object) {
            if let (Some(start), Some(end)) = (
                loc.get("start").and_then(Value::as_number),
                loc.get("end").and_then(Value::as_number),
            ) {
                error.loc = Some(Span::new(start as usize, end as usize));
            }
        }
        if let Some(cause) = read_str("cause") {
            error.cause = Some(Arc::new(anyhow::anyhow!(cause)));
        }
        if let Some(members) = fields.get("errors").and_then(Value::as_array) {
            error.errors = members
                .iter()
                .filter_map(ContractError::from_tagged_value)
                .map(Arc::new)
                .collect();
        }
        Some(error)
    }
}

/// Recognize an error in either representation
pub fn is_error_value(value: &Value) -> bool {
    match value {
        Value::Error(_) => true,
        Value::Object(fields) => fields.get(ERROR_TAG).is_some_and(Value::is_truthy),
        _ => false,
    }
}

/// Merge simultaneous failures into one error value.
///
/// A single failure passes through unchanged, keeping its identity. More
/// than one builds a composite whose message lists the failing parameter
/// names in declaration order and whose `errors` field holds the
/// originals.
pub fn compose_errors(
    mut errors: Vec<Arc<ContractError>>,
    func_name: Option<&str>,
) -> Arc<ContractError> {
    match errors.len() {
        0 => Arc::new(ContractError::new("contract violation")),
        1 => errors.remove(0),
        _ => {
            let names: Vec<String> = errors.iter().map(|error| param_label(error)).collect();
            let message = match func_name {
                Some(func) => format!("{}(): invalid arguments: {}", func, names.join(", ")),
                None => format!("invalid arguments: {}", names.join(", ")),
            };
            let mut composite = ContractError::new(message);
            composite.path = func_name.map(str::to_string);
            composite.errors = errors;
            Arc::new(composite)
        }
    }
}

/// Parameter name a failure refers to, best-effort from its path
fn param_label(error: &ContractError) -> String {
    match &error.path {
        Some(path) => match path.rsplit_once('.') {
            Some((_, param)) => param.to_string(),
            None => path.clone(),
        },
        None => "<unknown>".to_string(),
    }
}
