//! Bounded debug call stack
//!
//! A ring of function display names maintained by the wrapping engine
//! around each guarded call. Once the bound is exceeded the oldest
//! entries are silently evicted, so deep or runaway recursion trades the
//! earliest frames for bounded memory instead of growing without limit.
//! Popping an empty stack is a no-op, which keeps cleanup on every exit
//! path safe even when the matching push never happened.

use std::collections::VecDeque;

/// Default retention bound, shared with [`crate::config::RuntimeConfig`]
pub const DEFAULT_MAX_STACK_SIZE: usize = 100;

/// Bounded ring of call-frame names
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: VecDeque<String>,
    max_size: usize,
}

impl CallStack {
    /// Create a stack with the default retention bound
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_STACK_SIZE)
    }

    /// Create a stack retaining at most `max_size` frames
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(max_size.min(128)),
            max_size,
        }
    }

    /// Push a frame name, evicting the oldest entries past the bound
    #[inline]
    pub fn push(&mut self, name: impl Into<String>) {
        self.frames.push_back(name.into());
        while self.frames.len() > self.max_size {
            self.frames.pop_front();
        }
    }

    /// Pop the most recent frame; empty stacks stay empty
    #[inline]
    pub fn pop(&mut self) -> Option<String> {
        self.frames.pop_back()
    }

    /// Number of retained frames
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if no frames are retained
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current retention bound
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the retention bound, evicting oldest frames if shrinking
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.frames.len() > self.max_size {
            self.frames.pop_front();
        }
    }

    /// Drop every retained frame
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Retained frames in push order (oldest first)
    pub fn snapshot(&self) -> Vec<String> {
        self.frames.iter().cloned().collect()
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut stack = CallStack::new();
        stack.push("outer");
        stack.push("inner");
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().as_deref(), Some("inner"));
        assert_eq!(stack.pop().as_deref(), Some("outer"));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_on_empty_is_noop() {
        let mut stack = CallStack::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let mut stack = CallStack::with_max_size(3);
        for name in ["a", "b", "c", "d", "e"] {
            stack.push(name);
        }
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.snapshot(), vec!["c", "d", "e"]);
    }

    #[test]
    fn test_set_max_size_shrinks() {
        let mut stack = CallStack::with_max_size(5);
        for name in ["a", "b", "c", "d"] {
            stack.push(name);
        }
        stack.set_max_size(2);
        assert_eq!(stack.snapshot(), vec!["c", "d"]);
        assert_eq!(stack.max_size(), 2);

        // Growing back does not resurrect evicted frames
        stack.set_max_size(5);
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_zero_bound_retains_nothing() {
        let mut stack = CallStack::with_max_size(0);
        stack.push("ghost");
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_snapshot_preserves_remaining_order() {
        let mut stack = CallStack::with_max_size(10);
        stack.push("main");
        stack.push("handler");
        stack.push("leaf");
        stack.pop();
        assert_eq!(stack.snapshot(), vec!["main", "handler"]);
    }

    #[test]
    fn test_clear() {
        let mut stack = CallStack::new();
        stack.push("x");
        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.max_size(), 100);
    }
}
