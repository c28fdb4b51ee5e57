//! Error types for Chronoseq

use crate::Timestamp;
use thiserror::Error;

/// Result type alias for Chronoseq operations
pub type Result<T> = std::result::Result<T, SeqError>;

/// Chronoseq error types
#[derive(Error, Debug)]
pub enum SeqError {
    /// Sample arrived after its checkpoint window was closed
    #[error("Late write: timestamp {timestamp} is older than window lower bound {lower_bound}")]
    LateWrite {
        timestamp: Timestamp,
        lower_bound: Timestamp,
    },

    /// A merge raced with the operation; re-snapshot the window and retry
    #[error("Busy: sequencer was modified concurrently")]
    Busy,

    /// Page target rejected the merge output
    #[error("Page error: {0}")]
    Page(#[from] PageError),

    /// Nothing is ready to be merged
    #[error("No data ready to merge")]
    NoData,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SeqError {
    /// Check if the caller may retry the same operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, SeqError::Busy)
    }

    /// Check if the error must be escalated to the engine's owner
    pub fn is_fatal(&self) -> bool {
        matches!(self, SeqError::Page(_))
    }

    /// Check if the error is a rejected late write
    pub fn is_late_write(&self) -> bool {
        matches!(self, SeqError::LateWrite { .. })
    }
}

/// Status reported by a page target
#[derive(Error, Debug)]
pub enum PageError {
    /// Page cannot hold the data
    #[error("Page out of space: needed {needed} bytes, {available} available")]
    OutOfSpace { needed: usize, available: usize },

    /// Target stopped accepting entries
    #[error("Page target closed")]
    Closed,

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
