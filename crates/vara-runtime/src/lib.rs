//! Vara runtime contract enforcement
//!
//! The execution side of the contract layer:
//! - Validation engine (`check_type`, `validate_args`)
//! - Function wrapping with the zero-overhead escape hatch
//! - Class wrapping (plain-callable construction sugar)
//! - Extension registry (retroactive methods on type names)
//! - Bounded debug call stack and unsafe-scope nesting
//! - Isolated runtime instances plus the versioned shared instance
//!
//! Most code talks to a [`Runtime`] handle; the free functions at the
//! crate root ([`configure`], [`get_stack`], ...) bind to the process-wide
//! shared instance.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod check;
pub mod class;
pub mod config;
pub mod extensions;
pub mod instance;
pub mod logger;
pub mod stack;
pub mod wrap;

pub use class::instance_of;
pub use config::{ConfigUpdate, RuntimeConfig, SafetyLevel};
pub use extensions::{ExtensionRegistry, GENERIC_BASE};
pub use instance::{
    configure, create_runtime, get_config, get_stack, install_shared, reset_runtime, shared,
    Runtime, RuntimeId, UnsafeScope,
};
pub use stack::{CallStack, DEFAULT_MAX_STACK_SIZE};
