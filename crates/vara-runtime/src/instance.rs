//! Runtime instances
//!
//! Each [`Runtime`] is an isolated contract-enforcement environment with
//! its own:
//! - Configuration (safety level, debug switch, stack bound)
//! - Debug call stack
//! - Unsafe-scope nesting depth
//! - Extension registry and named-type registry
//!
//! Instances never interact. One process-wide *shared* instance exists as
//! a convenience binding over the same factory; components that cannot
//! coordinate library versions negotiate ownership of it through
//! [`install_shared`].
//!
//! The engine models a single logical thread of control per instance:
//! call-stack pushes and pops happen in strict call/return order. Hosts
//! running concurrent logical threads should give each its own instance.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use semver::Version;

use vara_types::{RuntimeType, TypeRegistry};

use crate::config::{ConfigUpdate, RuntimeConfig};
use crate::extensions::ExtensionRegistry;
use crate::logger;
use crate::stack::CallStack;

/// Unique identifier for a runtime instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeId(u64);

impl RuntimeId {
    /// Allocate a new unique runtime ID
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        RuntimeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for RuntimeId {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned by one runtime instance
pub(crate) struct RuntimeState {
    pub(crate) id: RuntimeId,
    pub(crate) config: RwLock<RuntimeConfig>,
    pub(crate) stack: Mutex<CallStack>,
    pub(crate) unsafe_depth: AtomicUsize,
    pub(crate) extensions: RwLock<ExtensionRegistry>,
    pub(crate) types: RwLock<TypeRegistry>,
}

/// Handle to a runtime instance.
///
/// Cloning is cheap and every clone addresses the same underlying state;
/// full isolation requires a new instance from [`Runtime::new`].
#[derive(Clone)]
pub struct Runtime {
    pub(crate) state: Arc<RuntimeState>,
}

impl Runtime {
    /// Create a fully isolated instance with the default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a fully isolated instance with a specific configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        let stack = CallStack::with_max_size(config.max_stack_size);
        Runtime {
            state: Arc::new(RuntimeState {
                id: RuntimeId::new(),
                config: RwLock::new(config),
                stack: Mutex::new(stack),
                unsafe_depth: AtomicUsize::new(0),
                extensions: RwLock::new(ExtensionRegistry::new()),
                types: RwLock::new(TypeRegistry::new()),
            }),
        }
    }

    /// Get the instance ID
    pub fn id(&self) -> RuntimeId {
        self.state.id
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Apply a partial configuration change.
    ///
    /// A changed stack bound takes effect immediately, evicting the oldest
    /// retained frames if the bound shrank.
    pub fn configure(&self, update: &ConfigUpdate) {
        let max_stack_size = {
            let mut config = self.state.config.write();
            update.apply(&mut config);
            config.max_stack_size
        };
        self.state.stack.lock().set_max_size(max_stack_size);
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> RuntimeConfig {
        self.state.config.read().clone()
    }

    /// Restore the pristine state: default configuration, empty call
    /// stack, zero unsafe depth, no extensions, no registered types.
    pub fn reset(&self) {
        let defaults = RuntimeConfig::default();
        let max_stack_size = defaults.max_stack_size;
        *self.state.config.write() = defaults;
        {
            let mut stack = self.state.stack.lock();
            stack.clear();
            stack.set_max_size(max_stack_size);
        }
        self.state.unsafe_depth.store(0, Ordering::Relaxed);
        self.state.extensions.write().clear();
        *self.state.types.write() = TypeRegistry::new();
    }

    // ========================================================================
    // Debug call stack
    // ========================================================================

    /// Retained call-stack frames in push order (oldest first)
    pub fn stack(&self) -> Vec<String> {
        self.state.stack.lock().snapshot()
    }

    pub(crate) fn push_frame(&self, name: &str) {
        self.state.stack.lock().push(name);
    }

    pub(crate) fn pop_frame(&self) {
        self.state.stack.lock().pop();
    }

    // ========================================================================
    // Unsafe scoping
    // ========================================================================

    /// Enter an unsafe scope; validation is suppressed until every entry
    /// has been matched by an exit.
    pub fn enter_unsafe(&self) {
        self.state.unsafe_depth.fetch_add(1, Ordering::Relaxed);
    }

    /// Exit an unsafe scope. Exiting at depth zero is a no-op, so cleanup
    /// code may call this without tracking whether entry happened.
    pub fn exit_unsafe(&self) {
        let _ = self
            .state
            .unsafe_depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |depth| {
                depth.checked_sub(1)
            });
    }

    /// Current unsafe nesting depth
    pub fn unsafe_depth(&self) -> usize {
        self.state.unsafe_depth.load(Ordering::Relaxed)
    }

    /// Is validation currently suppressed by an unsafe scope
    pub fn in_unsafe_scope(&self) -> bool {
        self.unsafe_depth() > 0
    }

    /// Enter an unsafe scope that exits when the guard drops
    pub fn unsafe_scope(&self) -> UnsafeScope {
        self.enter_unsafe();
        UnsafeScope {
            runtime: self.clone(),
        }
    }

    // ========================================================================
    // Named types
    // ========================================================================

    /// Register a named type for `ref` descriptor resolution
    pub fn register_type(&self, name: impl Into<String>, ty: RuntimeType) {
        self.state.types.write().register(name, ty);
    }

    /// Look up a registered named type
    pub fn lookup_type(&self, name: &str) -> Option<RuntimeType> {
        self.state.types.read().get(name)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.state.id)
            .field("unsafe_depth", &self.unsafe_depth())
            .finish()
    }
}

/// Guard returned by [`Runtime::unsafe_scope`]; exits the scope on drop
pub struct UnsafeScope {
    runtime: Runtime,
}

impl Drop for UnsafeScope {
    fn drop(&mut self) {
        self.runtime.exit_unsafe();
    }
}

// ============================================================================
// Shared instance
// ============================================================================

/// Version this build installs the shared instance under
const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

struct SharedSlot {
    runtime: Runtime,
    version: String,
}

impl SharedSlot {
    fn fresh(version: &str) -> Self {
        SharedSlot {
            runtime: Runtime::new(),
            version: version.to_string(),
        }
    }
}

static SHARED: Lazy<Mutex<SharedSlot>> =
    Lazy::new(|| Mutex::new(SharedSlot::fresh(RUNTIME_VERSION)));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negotiation {
    Keep,
    Replace,
    ReplaceCrossMajor,
    ReplaceMalformedPrior,
}

/// Decide whether an incoming installation displaces the prior one.
///
/// Newer versions win. Same-major replacement is routine; cross-major
/// replacement is flagged as potentially incompatible. A prior slot
/// without a parseable version is overwritten unconditionally, while a
/// malformed incoming version never wins against a valid one.
fn negotiate(prior: &str, incoming: &str) -> Negotiation {
    let incoming = match Version::parse(incoming) {
        Ok(version) => version,
        Err(_) => return Negotiation::Keep,
    };
    let prior = match Version::parse(prior) {
        Ok(version) => version,
        Err(_) => return Negotiation::ReplaceMalformedPrior,
    };
    if incoming <= prior {
        Negotiation::Keep
    } else if incoming.major == prior.major {
        Negotiation::Replace
    } else {
        Negotiation::ReplaceCrossMajor
    }
}

/// The process-wide shared instance (installed lazily on first use)
pub fn shared() -> Runtime {
    SHARED.lock().runtime.clone()
}

/// Negotiate installation of a shared instance under `version`.
///
/// Returns the handle that owns the slot after negotiation: the existing
/// instance when it wins, a fresh one when the incoming version does.
pub fn install_shared(version: &str) -> Runtime {
    let mut slot = SHARED.lock();
    match negotiate(&slot.version, version) {
        Negotiation::Keep => {}
        Negotiation::Replace => {
            logger::info(&format!(
                "shared runtime {} superseded by {}",
                slot.version, version
            ));
            *slot = SharedSlot::fresh(version);
        }
        Negotiation::ReplaceCrossMajor => {
            logger::warn(&format!(
                "shared runtime {} superseded by {} across a major version; \
                 contracts wrapped by the old install keep its behavior",
                slot.version, version
            ));
            *slot = SharedSlot::fresh(version);
        }
        Negotiation::ReplaceMalformedPrior => {
            logger::warn(&format!(
                "shared runtime version `{}` is not valid semver; reinstalling as {}",
                slot.version, version
            ));
            *slot = SharedSlot::fresh(version);
        }
    }
    slot.runtime.clone()
}

// ============================================================================
// Shared-instance convenience bindings
// ============================================================================

/// Apply a partial configuration change to the shared instance
pub fn configure(update: &ConfigUpdate) {
    shared().configure(update);
}

/// Snapshot of the shared instance's configuration
pub fn get_config() -> RuntimeConfig {
    shared().config()
}

/// Retained call-stack frames of the shared instance
pub fn get_stack() -> Vec<String> {
    shared().stack()
}

/// Restore the shared instance to its pristine state
pub fn reset_runtime() {
    shared().reset();
}

/// Create a fully isolated instance (never interacts with the shared one)
pub fn create_runtime() -> Runtime {
    Runtime::new()
}
