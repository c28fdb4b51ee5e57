//! Heap-driven merge iterator

use super::MergeOrder;
use crate::{Direction, Entry};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Cursor into one run, ordered so that `BinaryHeap` pops the next output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapItem {
    key: (u64, u64),
    run: usize,
    pos: usize,
    descending: bool,
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = (self.key, self.run).cmp(&(other.key, other.run));
        // BinaryHeap is a max-heap
        if self.descending {
            ord
        } else {
            ord.reverse()
        }
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Iterator merging runs sorted by `order`
///
/// With [`Direction::Backward`] every run is walked from its end and the
/// output is the exact reverse of the forward merge.
pub struct KWayMerge<'a> {
    runs: Vec<&'a [Entry]>,
    heap: BinaryHeap<HeapItem>,
    order: MergeOrder,
    direction: Direction,
}

impl<'a> KWayMerge<'a> {
    /// Create a merge over runs that are each sorted by `order`
    pub fn new(runs: Vec<&'a [Entry]>, order: MergeOrder, direction: Direction) -> Self {
        debug_assert!(runs
            .iter()
            .all(|run| run.windows(2).all(|w| order.key(&w[0]) <= order.key(&w[1]))));

        let mut merge = Self {
            heap: BinaryHeap::with_capacity(runs.len()),
            runs,
            order,
            direction,
        };
        for run in 0..merge.runs.len() {
            let len = merge.runs[run].len();
            if len > 0 {
                let pos = match direction {
                    Direction::Forward => 0,
                    Direction::Backward => len - 1,
                };
                merge.push(run, pos);
            }
        }
        merge
    }

    /// Number of runs not yet exhausted
    pub fn pending_runs(&self) -> usize {
        self.heap.len()
    }

    fn push(&mut self, run: usize, pos: usize) {
        let entry = &self.runs[run][pos];
        self.heap.push(HeapItem {
            key: self.order.key(entry),
            run,
            pos,
            descending: self.direction == Direction::Backward,
        });
    }
}

impl<'a> Iterator for KWayMerge<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let top = self.heap.pop()?;
        let run = self.runs[top.run];

        let next = match self.direction {
            Direction::Forward => Some(top.pos + 1).filter(|&p| p < run.len()),
            Direction::Backward => top.pos.checked_sub(1),
        };
        if let Some(pos) = next {
            self.push(top.run, pos);
        }

        Some(&run[top.pos])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining: usize = self
            .heap
            .iter()
            .map(|item| match self.direction {
                Direction::Forward => self.runs[item.run].len() - item.pos,
                Direction::Backward => item.pos + 1,
            })
            .sum();
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(keys: &[(u64, u64)]) -> Vec<Entry> {
        keys.iter().map(|&(ts, id)| Entry::value(ts, id, 0.0)).collect()
    }

    #[test]
    fn test_empty_runs() {
        let a = run(&[]);
        let b = run(&[(1, 1)]);
        let mut merge = KWayMerge::new(vec![&a[..], &b[..]], MergeOrder::Natural, Direction::Forward);
        assert_eq!(merge.pending_runs(), 1);
        assert_eq!(merge.size_hint(), (1, Some(1)));
        assert_eq!(merge.next().map(Entry::natural_key), Some((1, 1)));
        assert!(merge.next().is_none());
    }

    #[test]
    fn test_ties_follow_run_order() {
        let a = vec![Entry::value(5, 1, 1.0)];
        let b = vec![Entry::value(5, 1, 2.0)];
        let c = vec![Entry::value(5, 1, 3.0)];

        let forward: Vec<_> =
            KWayMerge::new(vec![&a[..], &b[..], &c[..]], MergeOrder::Natural, Direction::Forward)
                .map(|e| e.payload())
                .collect();
        assert_eq!(
            forward,
            vec![
                crate::Payload::Value(1.0),
                crate::Payload::Value(2.0),
                crate::Payload::Value(3.0)
            ]
        );
    }

    #[test]
    fn test_backward_is_reverse_of_forward() {
        let a = run(&[(1, 1), (4, 2), (4, 3), (9, 1)]);
        let b = run(&[(2, 2), (4, 2), (8, 8)]);
        let c = run(&[(0, 7)]);

        let mut forward: Vec<_> =
            KWayMerge::new(vec![&a[..], &b[..], &c[..]], MergeOrder::Natural, Direction::Forward)
                .map(|e| e as *const Entry)
                .collect();
        let backward: Vec<_> =
            KWayMerge::new(vec![&a[..], &b[..], &c[..]], MergeOrder::Natural, Direction::Backward)
                .map(|e| e as *const Entry)
                .collect();

        forward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(backward.len(), 8);
    }
}
