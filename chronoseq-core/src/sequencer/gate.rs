//! Read-validation sequence counter
//!
//! Even values mean no merge is in progress, odd values mean a merge is
//! draining the ready set. Readers capture the value before scanning and
//! compare it afterwards; any change invalidates the scan.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct SequenceGate {
    seq: AtomicU64,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current sequence number
    pub fn current(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Check that a captured value is still valid for reading
    pub fn validate(&self, seq: u64) -> bool {
        seq % 2 == 0 && self.current() == seq
    }

    /// Mark a merge as started; a counter left odd by a failed merge is reused
    pub fn begin_merge(&self) -> u64 {
        match self
            .seq
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |seq| {
                (seq % 2 == 0).then_some(seq + 1)
            }) {
            Ok(prev) => prev + 1,
            Err(current) => current,
        }
    }

    /// Mark the running merge as completed
    pub fn end_merge(&self) -> u64 {
        let prev = self.seq.fetch_add(1, Ordering::SeqCst);
        debug_assert!(prev % 2 == 1, "merge completed without being started");
        prev + 1
    }

    /// Invalidate every captured value without changing parity
    pub fn advance(&self) -> u64 {
        self.seq.fetch_add(2, Ordering::SeqCst) + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_bracket() {
        let gate = SequenceGate::new();
        let seq = gate.current();
        assert!(gate.validate(seq));

        assert_eq!(gate.begin_merge(), 1);
        assert!(!gate.validate(seq));
        assert!(!gate.validate(gate.current()));

        assert_eq!(gate.end_merge(), 2);
        assert!(gate.validate(2));
        assert!(!gate.validate(seq));
    }

    #[test]
    fn test_failed_merge_keeps_odd_state() {
        let gate = SequenceGate::new();
        assert_eq!(gate.begin_merge(), 1);
        // retry after a failure reuses the odd value
        assert_eq!(gate.begin_merge(), 1);
        assert_eq!(gate.end_merge(), 2);
    }

    #[test]
    fn test_advance_keeps_parity() {
        let gate = SequenceGate::new();
        assert_eq!(gate.advance(), 2);
        gate.begin_merge();
        assert_eq!(gate.advance(), 5);
        assert_eq!(gate.end_merge(), 6);
    }
}
