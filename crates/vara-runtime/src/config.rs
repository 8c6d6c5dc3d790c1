//! Runtime configuration
//!
//! The safety policy and diagnostics switches of one runtime instance.
//! Configuration is read on every wrapped call; it is only mutated
//! through an explicit [`ConfigUpdate`], never by the engine itself.

use serde::{Deserialize, Serialize};

use crate::stack::DEFAULT_MAX_STACK_SIZE;

/// Global validation level.
///
/// Per-function flags on [`vara_types::FunctionMeta`] always override
/// this; the level only decides what happens for unmarked functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    /// No validation for unmarked functions
    None,
    /// Validate inputs only
    Inputs,
    /// Validate inputs and declared return types
    All,
}

impl SafetyLevel {
    /// Does this level validate arguments of unmarked functions
    pub fn validates_inputs(&self) -> bool {
        !matches!(self, SafetyLevel::None)
    }

    /// Does this level validate declared returns of unmarked functions
    pub fn validates_returns(&self) -> bool {
        matches!(self, SafetyLevel::All)
    }
}

/// Per-instance runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// Capture call-stack snapshots on errors
    pub debug: bool,
    /// Global validation level
    pub safety: SafetyLevel,
    /// Warn at wrap time when a function declares no return type
    pub require_return_types: bool,
    /// Retention bound of the debug call stack
    pub max_stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            debug: false,
            safety: SafetyLevel::All,
            require_return_types: false,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
        }
    }
}

/// Partial configuration change: only the set fields are applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    /// New debug switch, if changing
    pub debug: Option<bool>,
    /// New safety level, if changing
    pub safety: Option<SafetyLevel>,
    /// New return-type requirement, if changing
    pub require_return_types: Option<bool>,
    /// New stack retention bound, if changing
    pub max_stack_size: Option<usize>,
}

impl ConfigUpdate {
    /// Empty update (applying it changes nothing)
    pub fn new() -> Self {
        ConfigUpdate::default()
    }

    /// Set the debug switch
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Set the safety level
    pub fn with_safety(mut self, safety: SafetyLevel) -> Self {
        self.safety = Some(safety);
        self
    }

    /// Set the return-type requirement
    pub fn with_require_return_types(mut self, require: bool) -> Self {
        self.require_return_types = Some(require);
        self
    }

    /// Set the stack retention bound
    pub fn with_max_stack_size(mut self, size: usize) -> Self {
        self.max_stack_size = Some(size);
        self
    }

    /// Apply the set fields onto `config`, leaving the rest untouched
    pub fn apply(&self, config: &mut RuntimeConfig) {
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if let Some(safety) = self.safety {
            config.safety = safety;
        }
        if let Some(require) = self.require_return_types {
            config.require_return_types = require;
        }
        if let Some(size) = self.max_stack_size {
            config.max_stack_size = size;
        }
    }
}
