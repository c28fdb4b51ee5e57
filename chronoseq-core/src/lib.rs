//! Chronoseq Core - Out-of-Order Write Buffer for Time-Series Storage
//!
//! Producers with slightly skewed clocks deliver samples out of timestamp
//! order. Chronoseq accepts them into a short time window, keeps them sorted
//! in memory and hands fully ordered data to the page writer once a window
//! closes.
//!
//! # Architecture
//!
//! - **Run table**: patience-sorted runs, each guarded by one of 256 shard locks
//! - **Checkpoints**: window tracking driven by observed timestamps; late
//!   writes are rejected
//! - **Merge**: k-way merge of sealed runs in natural or chunk order
//! - **Read validation**: an odd/even sequence counter that lets searches run
//!   without blocking merges
//!
//! ```
//! use chronoseq_core::{Entry, MemoryPage, SearchQuery, Sequencer, SequencerConfig, TimeRange};
//!
//! let seq = Sequencer::new(SequencerConfig::with_window(100)).unwrap();
//! seq.add(Entry::value(50, 1, 1.0)).unwrap();
//! seq.add(Entry::value(30, 1, 2.0)).unwrap();
//!
//! let (_, sequence) = seq.get_window();
//! let mut results = Vec::new();
//! seq.search(&mut results, &SearchQuery::new(TimeRange::all()), sequence).unwrap();
//! assert_eq!(results[0].timestamp, 30);
//!
//! let mut page = MemoryPage::unbounded();
//! seq.close(&mut page).unwrap();
//! ```

pub mod cursor;
pub mod merge;
pub mod page;
pub mod sequencer;

mod entry;
mod error;
mod types;

pub use cursor::{LimitCursor, ResultCursor};
pub use entry::{CursorResult, Entry, Payload, PayloadKind};
pub use error::{PageError, Result, SeqError};
pub use merge::{KWayMerge, MergeOrder};
pub use page::{ChunkHeader, MemoryPage, PageResult, PageWriter};
pub use sequencer::{AddOutcome, MergeStats, Sequencer, SequencerConfig, SequencerStats, SortedRun};
pub use types::*;

/// Chronoseq version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod config {
    /// Checkpoint window, in timestamp units
    pub const DEFAULT_WINDOW_SIZE: u64 = 10_000;

    /// Maximum entries per chunk written by `merge_and_compress`
    pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1000;

    /// Upper bound of the spin backoff on a busy shard lock
    pub const RUN_LOCK_MAX_BACKOFF: usize = 0x100;

    /// Spin attempts on a busy shard lock before blocking
    pub const RUN_LOCK_BUSY_COUNT: usize = 0xFFF;

    /// Mask selecting the shard of a run index
    pub const RUN_LOCK_FLAGS_MASK: usize = 0x0FF;

    /// Number of shard locks
    pub const RUN_LOCK_FLAGS_SIZE: usize = 0x100;
}
