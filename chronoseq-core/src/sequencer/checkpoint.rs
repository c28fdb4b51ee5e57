//! Checkpoint window tracking
//!
//! Progress is driven entirely by observed timestamps: a sample whose
//! checkpoint id (`timestamp / window_size`) is larger than the current one
//! closes the current checkpoint, and samples older than
//! `top_timestamp - window_size` are rejected as late writes.

use crate::{Result, SeqError, Timestamp};

/// Outcome of admitting a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Sample belongs to the open checkpoint
    Accept,
    /// Sample opens the given checkpoint; active runs must be sealed first
    Checkpoint(u64),
}

/// Highest timestamp seen and the checkpoint it falls into
#[derive(Debug, Clone)]
pub(crate) struct CheckpointState {
    window_size: u64,
    top_timestamp: Timestamp,
    checkpoint: u64,
}

impl CheckpointState {
    pub fn new(window_size: u64) -> Self {
        Self {
            window_size,
            top_timestamp: 0,
            checkpoint: 0,
        }
    }

    pub fn top_timestamp(&self) -> Timestamp {
        self.top_timestamp
    }

    pub fn checkpoint(&self) -> u64 {
        self.checkpoint
    }

    /// Oldest timestamp still accepted
    pub fn lower_bound(&self) -> Timestamp {
        self.top_timestamp.saturating_sub(self.window_size)
    }

    /// Checkpoint id = ⌊timestamp / window_size⌋
    pub fn checkpoint_of(&self, ts: Timestamp) -> u64 {
        ts / self.window_size
    }

    /// First timestamp of a checkpoint
    pub fn checkpoint_start(&self, checkpoint: u64) -> Timestamp {
        checkpoint.saturating_mul(self.window_size)
    }

    /// Classify a timestamp without changing state
    pub fn admit(&self, ts: Timestamp) -> Result<Admission> {
        if ts < self.top_timestamp {
            let lower_bound = self.lower_bound();
            if ts < lower_bound {
                return Err(SeqError::LateWrite {
                    timestamp: ts,
                    lower_bound,
                });
            }
            return Ok(Admission::Accept);
        }

        let checkpoint = self.checkpoint_of(ts);
        if checkpoint > self.checkpoint {
            Ok(Admission::Checkpoint(checkpoint))
        } else {
            Ok(Admission::Accept)
        }
    }

    /// Record an admitted timestamp
    pub fn commit(&mut self, ts: Timestamp, admission: Admission) {
        self.top_timestamp = self.top_timestamp.max(ts);
        if let Admission::Checkpoint(checkpoint) = admission {
            self.checkpoint = self.checkpoint.max(checkpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe(state: &mut CheckpointState, ts: Timestamp) -> Result<Admission> {
        let admission = state.admit(ts)?;
        state.commit(ts, admission);
        Ok(admission)
    }

    #[test]
    fn test_window_progress() {
        let mut state = CheckpointState::new(100);

        assert_eq!(observe(&mut state, 50).unwrap(), Admission::Accept);
        assert_eq!(observe(&mut state, 30).unwrap(), Admission::Accept);
        assert_eq!(state.top_timestamp(), 50);

        assert_eq!(observe(&mut state, 150).unwrap(), Admission::Checkpoint(1));
        assert_eq!(state.checkpoint(), 1);
        assert_eq!(state.lower_bound(), 50);

        let err = observe(&mut state, 10).unwrap_err();
        assert!(matches!(
            err,
            SeqError::LateWrite {
                timestamp: 10,
                lower_bound: 50
            }
        ));
        assert_eq!(state.top_timestamp(), 150);
    }

    #[test]
    fn test_lower_bound_is_inclusive() {
        let mut state = CheckpointState::new(100);
        observe(&mut state, 150).unwrap();
        assert!(observe(&mut state, 50).is_ok());
        assert!(observe(&mut state, 49).is_err());
    }

    #[test]
    fn test_checkpoint_jumps() {
        let mut state = CheckpointState::new(10);
        assert_eq!(observe(&mut state, 5).unwrap(), Admission::Accept);
        assert_eq!(observe(&mut state, 95).unwrap(), Admission::Checkpoint(9));
        assert_eq!(observe(&mut state, 99).unwrap(), Admission::Accept);
        assert_eq!(state.checkpoint_start(9), 90);
        assert_eq!(state.checkpoint_of(99), 9);
    }

    #[test]
    fn test_monotonic() {
        let mut state = CheckpointState::new(1000);
        let mut last = (0, 0);
        for ts in [10, 5000, 4500, 4001, 9000, 8500, 12_000] {
            let _ = observe(&mut state, ts);
            let now = (state.top_timestamp(), state.checkpoint());
            assert!(now >= last);
            last = now;
        }
    }
}
