//! Columnar accumulator for a chunk of merged entries

use crate::entry::{Payload, PayloadKind};
use crate::{Entry, SeriesId, Timestamp};

/// Chunk header filled by [`Entry::add_to_header`]
///
/// Blob references and inline values are kept in separate columns; `kinds`
/// records which column each row draws from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkHeader {
    series_ids: Vec<SeriesId>,
    timestamps: Vec<Timestamp>,
    kinds: Vec<PayloadKind>,
    offsets: Vec<u32>,
    lengths: Vec<u32>,
    values: Vec<f64>,
}

impl ChunkHeader {
    /// Create an empty header
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with capacity hint
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series_ids: Vec::with_capacity(capacity),
            timestamps: Vec::with_capacity(capacity),
            kinds: Vec::with_capacity(capacity),
            offsets: Vec::new(),
            lengths: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, timestamp: Timestamp, series_id: SeriesId, payload: Payload) {
        self.series_ids.push(series_id);
        self.timestamps.push(timestamp);
        self.kinds.push(payload.kind());
        match payload {
            Payload::Blob { offset, length } => {
                self.offsets.push(offset);
                self.lengths.push(length);
            }
            Payload::Value(value) => self.values.push(value),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.series_ids.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.series_ids.is_empty()
    }

    pub fn series_ids(&self) -> &[SeriesId] {
        &self.series_ids
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn lengths(&self) -> &[u32] {
        &self.lengths
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Rebuild the rows in insertion order
    pub fn entries(&self) -> Vec<Entry> {
        let mut blobs = self.offsets.iter().zip(&self.lengths);
        let mut values = self.values.iter();
        let mut out = Vec::with_capacity(self.len());

        for ((&ts, &id), kind) in self.timestamps.iter().zip(&self.series_ids).zip(&self.kinds) {
            let entry = match kind {
                PayloadKind::Blob => blobs
                    .next()
                    .map(|(&offset, &length)| Entry::blob(ts, id, offset, length)),
                PayloadKind::Value => values.next().map(|&v| Entry::value(ts, id, v)),
            };
            // columns are filled together in push
            if let Some(entry) = entry {
                out.push(entry);
            }
        }
        out
    }

    /// Worst-case serialized size of the rows
    pub fn size_bound(&self) -> usize {
        self.kinds.iter().map(|kind| kind.size_bound()).sum()
    }

    /// Remove all rows, keeping allocations
    pub fn clear(&mut self) {
        self.series_ids.clear();
        self.timestamps.clear();
        self.kinds.clear();
        self.offsets.clear();
        self.lengths.clear();
        self.values.clear();
    }
}
