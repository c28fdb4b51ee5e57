//! Destinations for drained runs

use crate::cursor::ResultCursor;
use crate::error::PageError;
use crate::page::{ChunkHeader, PageResult, PageWriter};
use crate::Entry;

/// Consumer of a merged stream
pub(crate) trait MergeSink {
    fn consume(&mut self, entry: &Entry) -> PageResult<()>;

    /// Flush anything still buffered
    fn finish(&mut self) -> PageResult<()> {
        Ok(())
    }

    /// Chunks handed over so far
    fn chunks(&self) -> usize {
        0
    }
}

/// Groups entries into chunks of at most `threshold` rows
pub(crate) struct ChunkSink<'w, W: PageWriter + ?Sized> {
    target: &'w mut W,
    header: ChunkHeader,
    threshold: usize,
    chunks: usize,
}

impl<'w, W: PageWriter + ?Sized> ChunkSink<'w, W> {
    pub fn new(target: &'w mut W, threshold: usize) -> Self {
        Self {
            target,
            header: ChunkHeader::with_capacity(threshold),
            threshold: threshold.max(1),
            chunks: 0,
        }
    }

    fn complete(&mut self) -> PageResult<()> {
        self.target.complete_chunk(&self.header)?;
        self.header.clear();
        self.chunks += 1;
        Ok(())
    }
}

impl<W: PageWriter + ?Sized> MergeSink for ChunkSink<'_, W> {
    fn consume(&mut self, entry: &Entry) -> PageResult<()> {
        if self.header.is_empty() {
            self.target.begin_chunk()?;
        }
        entry.add_to_header(&mut self.header);
        if self.header.len() >= self.threshold {
            self.complete()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> PageResult<()> {
        if !self.header.is_empty() {
            self.complete()?;
        }
        Ok(())
    }

    fn chunks(&self) -> usize {
        self.chunks
    }
}

/// Appends entries one at a time
pub(crate) struct AppendSink<'w, W: PageWriter + ?Sized> {
    target: &'w mut W,
}

impl<'w, W: PageWriter + ?Sized> AppendSink<'w, W> {
    pub fn new(target: &'w mut W) -> Self {
        Self { target }
    }
}

impl<W: PageWriter + ?Sized> MergeSink for AppendSink<'_, W> {
    fn consume(&mut self, entry: &Entry) -> PageResult<()> {
        self.target.append(entry)
    }
}

/// Reports entries to a result cursor
///
/// Once the cursor asks to stop, the next entry is refused with
/// [`PageError::Closed`] so that no entry is dropped silently.
pub(crate) struct CursorSink<'c, C: ResultCursor + ?Sized> {
    cursor: &'c mut C,
    stopped: bool,
}

impl<'c, C: ResultCursor + ?Sized> CursorSink<'c, C> {
    pub fn new(cursor: &'c mut C) -> Self {
        Self {
            cursor,
            stopped: false,
        }
    }
}

impl<C: ResultCursor + ?Sized> MergeSink for CursorSink<'_, C> {
    fn consume(&mut self, entry: &Entry) -> PageResult<()> {
        if self.stopped {
            return Err(PageError::Closed);
        }
        self.stopped = !self.cursor.put(entry.to_result());
        Ok(())
    }

    fn finish(&mut self) -> PageResult<()> {
        self.cursor.complete();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::LimitCursor;
    use crate::page::MemoryPage;

    #[test]
    fn test_chunk_sink_splits_on_threshold() {
        let mut page = MemoryPage::unbounded();
        let mut sink = ChunkSink::new(&mut page, 2);
        for ts in 0..5 {
            sink.consume(&Entry::value(ts, 1, 0.0)).unwrap();
        }
        sink.finish().unwrap();
        assert_eq!(sink.chunks(), 3);

        let sizes: Vec<_> = page.chunks().iter().map(ChunkHeader::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(page.open_chunks(), 0);
    }

    #[test]
    fn test_chunk_sink_empty_finish() {
        let mut page = MemoryPage::unbounded();
        let mut sink = ChunkSink::new(&mut page, 4);
        sink.finish().unwrap();
        assert_eq!(sink.chunks(), 0);
        assert!(page.chunks().is_empty());
    }

    #[test]
    fn test_cursor_sink_refuses_after_stop() {
        let mut cursor = LimitCursor::new(1);
        let mut sink = CursorSink::new(&mut cursor);
        sink.consume(&Entry::value(1, 1, 0.0)).unwrap();

        let err = sink.consume(&Entry::value(2, 1, 0.0)).unwrap_err();
        assert!(matches!(err, PageError::Closed));
        assert_eq!(cursor.results().len(), 1);
    }
}
