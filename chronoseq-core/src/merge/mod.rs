//! K-way merge of sorted runs
//!
//! Runs are merged through a binary heap holding one cursor per run. Equal
//! keys are emitted in run order (lower run index first when ascending), so
//! the output is deterministic for a given list of runs.

mod heap;
mod sink;

pub use heap::KWayMerge;
pub(crate) use sink::{AppendSink, ChunkSink, CursorSink, MergeSink};

use crate::Entry;
use std::borrow::Cow;

/// Total order used to merge runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeOrder {
    /// (timestamp, series id)
    #[default]
    Natural,
    /// (series id, timestamp), groups each series contiguously
    Chunk,
}

impl MergeOrder {
    /// Sort key of an entry under this order
    #[inline]
    pub fn key(self, entry: &Entry) -> (u64, u64) {
        match self {
            MergeOrder::Natural => entry.natural_key(),
            MergeOrder::Chunk => entry.chunk_key(),
        }
    }

    /// Arrange a naturally ordered run for merging under this order
    ///
    /// Sealed runs are never reordered in place; chunk order works on a copy.
    pub fn arrange(self, run: &[Entry]) -> Cow<'_, [Entry]> {
        match self {
            MergeOrder::Natural => Cow::Borrowed(run),
            MergeOrder::Chunk => {
                let mut sorted = run.to_vec();
                sorted.sort_by_key(Entry::chunk_key);
                Cow::Owned(sorted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, SeriesId, Timestamp};

    fn keys(entries: Vec<&Entry>) -> Vec<(Timestamp, SeriesId)> {
        entries.into_iter().map(Entry::natural_key).collect()
    }

    fn sample_runs() -> (Vec<Entry>, Vec<Entry>) {
        (
            vec![Entry::value(1, 5, 0.0), Entry::value(3, 5, 0.0)],
            vec![Entry::value(2, 1, 0.0)],
        )
    }

    #[test]
    fn test_natural_order_merge() {
        let (a, b) = sample_runs();
        let merged: Vec<_> =
            KWayMerge::new(vec![&a[..], &b[..]], MergeOrder::Natural, Direction::Forward).collect();
        assert_eq!(keys(merged), vec![(1, 5), (2, 1), (3, 5)]);
    }

    #[test]
    fn test_chunk_order_merge() {
        let (a, b) = sample_runs();
        let a = MergeOrder::Chunk.arrange(&a);
        let b = MergeOrder::Chunk.arrange(&b);
        let merged: Vec<_> =
            KWayMerge::new(vec![&a[..], &b[..]], MergeOrder::Chunk, Direction::Forward).collect();
        assert_eq!(keys(merged), vec![(2, 1), (1, 5), (3, 5)]);
    }

    #[test]
    fn test_arrange_chunk_order() {
        let run = vec![
            Entry::value(1, 9, 0.0),
            Entry::value(2, 3, 0.0),
            Entry::value(3, 9, 0.0),
            Entry::value(4, 3, 0.0),
        ];
        let arranged = MergeOrder::Chunk.arrange(&run);
        let ids: Vec<_> = arranged.iter().map(|e| e.chunk_key()).collect();
        assert_eq!(ids, vec![(3, 2), (3, 4), (9, 1), (9, 3)]);

        assert!(matches!(MergeOrder::Natural.arrange(&run), Cow::Borrowed(_)));
    }
}
