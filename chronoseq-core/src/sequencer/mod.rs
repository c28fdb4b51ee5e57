//! Sequencer - reorders out-of-order samples and checkpoints them
//!
//! Producers whose clocks are slightly out of sync may deliver samples out
//! of timestamp order. The sequencer accepts them, filters out late writes,
//! keeps the rest in sorted runs and, once a checkpoint window closes, hands
//! the sealed runs to a k-way merge that writes them to a page target.
//! Readers search the buffered data concurrently and validate their scan
//! against a sequence counter instead of locking out merges.

mod checkpoint;
mod engine;
mod gate;
mod locks;
mod runs;

pub use engine::{AddOutcome, MergeStats, Sequencer, SequencerStats};
pub use runs::SortedRun;

use crate::{Result, SeqError};
use serde::{Deserialize, Serialize};

/// Sequencer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Checkpoint window, in timestamp units
    pub window_size: u64,
    /// Maximum entries grouped in one chunk by `merge_and_compress`
    pub compression_threshold: usize,
    /// Spin iterations on a busy shard lock before blocking
    pub lock_spin_limit: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            window_size: crate::config::DEFAULT_WINDOW_SIZE,
            compression_threshold: crate::config::DEFAULT_COMPRESSION_THRESHOLD,
            lock_spin_limit: crate::config::RUN_LOCK_BUSY_COUNT,
        }
    }
}

impl SequencerConfig {
    /// Create a configuration with the given window and default limits
    pub fn with_window(window_size: u64) -> Self {
        Self {
            window_size,
            ..Default::default()
        }
    }

    /// Check that the configuration can drive a sequencer
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SeqError::Config("window_size must be positive".into()));
        }
        if self.compression_threshold == 0 {
            return Err(SeqError::Config(
                "compression_threshold must be positive".into(),
            ));
        }
        Ok(())
    }
}
