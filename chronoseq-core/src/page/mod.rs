//! Page-append contract
//!
//! The sequencer never owns a page format. Merged output is handed to a
//! [`PageWriter`], either one entry at a time or as chunk headers grouping
//! up to `compression_threshold` entries in chunk order.

mod chunk;
mod memory;

pub use chunk::ChunkHeader;
pub use memory::MemoryPage;

use crate::error::PageError;
use crate::Entry;

/// Result type returned by page targets
pub type PageResult<T> = std::result::Result<T, PageError>;

/// Destination of merged entries
pub trait PageWriter {
    /// Append a single entry
    fn append(&mut self, entry: &Entry) -> PageResult<()>;

    /// Signal that a new chunk starts
    fn begin_chunk(&mut self) -> PageResult<()> {
        Ok(())
    }

    /// Hand over a completed chunk
    fn complete_chunk(&mut self, header: &ChunkHeader) -> PageResult<()>;
}

impl<W: PageWriter + ?Sized> PageWriter for &mut W {
    fn append(&mut self, entry: &Entry) -> PageResult<()> {
        (**self).append(entry)
    }

    fn begin_chunk(&mut self) -> PageResult<()> {
        (**self).begin_chunk()
    }

    fn complete_chunk(&mut self, header: &ChunkHeader) -> PageResult<()> {
        (**self).complete_chunk(header)
    }
}
