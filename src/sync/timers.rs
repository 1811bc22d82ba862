//! Keyed debounce-timer bookkeeping.
//!
//! The controller owns the actual `setTimeout` handles; this map tracks
//! which block has a pending deadline, so the re-arm and teardown rules
//! can be tested without a browser event loop.

use std::collections::HashMap;

/// Pending timeout handles keyed by block id. Arming a key hands back the
/// handle it replaces so the caller can clear that timeout; every other
/// key keeps its deadline.
#[derive(Default)]
pub(crate) struct TimerBook {
    pending: HashMap<String, i32>,
}

impl TimerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly armed timer. Returns the handle of the timer it
    /// supersedes, if any.
    pub fn arm(&mut self, id: &str, handle: i32) -> Option<i32> {
        self.pending.insert(id.to_string(), handle)
    }

    /// Drop one key's deadline, returning the handle to clear.
    pub fn disarm(&mut self, id: &str) -> Option<i32> {
        self.pending.remove(id)
    }

    /// Drop every deadline, returning all handles to clear.
    pub fn drain(&mut self) -> Vec<i32> {
        self.pending.drain().map(|(_, h)| h).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearming_one_block_leaves_other_deadlines_alone() {
        let mut book = TimerBook::new();
        assert_eq!(book.arm("a", 1), None);
        assert_eq!(book.arm("b", 2), None);

        // A new edit on "a" resets only "a"'s timer.
        assert_eq!(book.arm("a", 3), Some(1));
        assert_eq!(book.disarm("b"), Some(2));
        assert_eq!(book.disarm("a"), Some(3));
    }

    #[test]
    fn disarm_is_idempotent() {
        let mut book = TimerBook::new();
        book.arm("a", 1);
        assert_eq!(book.disarm("a"), Some(1));
        assert_eq!(book.disarm("a"), None);
    }

    #[test]
    fn drain_hands_back_every_handle() {
        let mut book = TimerBook::new();
        book.arm("a", 1);
        book.arm("b", 2);

        let mut handles = book.drain();
        handles.sort_unstable();
        assert_eq!(handles, vec![1, 2]);
        assert!(book.drain().is_empty());
    }
}
