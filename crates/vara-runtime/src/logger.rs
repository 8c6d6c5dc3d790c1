//! Runtime diagnostics logging
//!
//! Leveled writers for the contract layer's own diagnostics: unresolved
//! type refs, safety-policy notices, shared-instance version negotiation.
//! Every line carries the `vara` tag so embedding hosts can filter it
//! from their own output. Debug and info go to stdout, warnings and
//! errors to stderr.

/// Log a debug message to stdout
pub fn debug(message: &str) {
    println!("[vara:debug] {}", message);
}

/// Log an info message to stdout
pub fn info(message: &str) {
    println!("[vara] {}", message);
}

/// Log a warning message to stderr
pub fn warn(message: &str) {
    eprintln!("[vara:warn] {}", message);
}

/// Log an error message to stderr
pub fn error(message: &str) {
    eprintln!("[vara:error] {}", message);
}
