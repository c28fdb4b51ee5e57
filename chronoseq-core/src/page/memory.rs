//! In-memory page target

use super::{ChunkHeader, PageResult, PageWriter};
use crate::error::PageError;
use crate::Entry;
use std::io;

/// Page target that keeps merged output in memory
///
/// Space is charged with [`Entry::size_bound`], so a page sized from
/// `Sequencer::get_space_estimate` never runs out of space.
#[derive(Debug, Default)]
pub struct MemoryPage {
    capacity: usize,
    used: usize,
    entries: Vec<Entry>,
    chunks: Vec<ChunkHeader>,
    open_chunks: usize,
    fail_after: Option<usize>,
    writes: usize,
}

impl MemoryPage {
    /// Create a page holding up to `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Create a page without a space limit
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Fail every write after the first `writes` with an IO error
    pub fn with_failure_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Stop injecting failures
    pub fn heal(&mut self) {
        self.fail_after = None;
    }

    /// Entries appended one by one, in arrival order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Completed chunks, in arrival order
    pub fn chunks(&self) -> &[ChunkHeader] {
        &self.chunks
    }

    /// Every row of every completed chunk, flattened
    pub fn chunk_entries(&self) -> Vec<Entry> {
        self.chunks.iter().flat_map(|c| c.entries()).collect()
    }

    /// Bytes charged so far
    pub fn used(&self) -> usize {
        self.used
    }

    /// Chunks begun but not yet completed
    pub fn open_chunks(&self) -> usize {
        self.open_chunks
    }

    fn charge(&mut self, needed: usize) -> PageResult<()> {
        if let Some(limit) = self.fail_after {
            if self.writes >= limit {
                return Err(PageError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "injected page failure",
                )));
            }
        }

        let available = self.capacity.saturating_sub(self.used);
        if needed > available {
            return Err(PageError::OutOfSpace { needed, available });
        }

        self.writes += 1;
        self.used += needed;
        Ok(())
    }
}

impl PageWriter for MemoryPage {
    fn append(&mut self, entry: &Entry) -> PageResult<()> {
        self.charge(entry.size_bound())?;
        self.entries.push(*entry);
        Ok(())
    }

    fn begin_chunk(&mut self) -> PageResult<()> {
        self.open_chunks += 1;
        Ok(())
    }

    fn complete_chunk(&mut self, header: &ChunkHeader) -> PageResult<()> {
        self.charge(header.size_bound())?;
        self.open_chunks = self.open_chunks.saturating_sub(1);
        self.chunks.push(header.clone());
        Ok(())
    }
}
