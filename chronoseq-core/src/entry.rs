//! Timestamped entries buffered by the sequencer

use crate::page::ChunkHeader;
use crate::{SeriesId, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Upper bound of a varint-encoded `u64`
const MAX_VARINT_U64: usize = 10;

/// Upper bound of a varint-encoded `u32`
const MAX_VARINT_U32: usize = 5;

/// Payload of an entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Reference to a blob stored outside the sequencer
    Blob { offset: u32, length: u32 },
    /// Inline numeric sample
    Value(f64),
}

/// Payload discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    Blob,
    Value,
}

impl PayloadKind {
    /// Worst-case number of bytes needed to persist an entry of this kind
    pub fn size_bound(self) -> usize {
        // tag + timestamp + series id
        let key = 1 + 2 * MAX_VARINT_U64;
        match self {
            PayloadKind::Blob => key + 2 * MAX_VARINT_U32,
            PayloadKind::Value => key + std::mem::size_of::<f64>(),
        }
    }
}

impl Payload {
    /// Get the discriminant
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Blob { .. } => PayloadKind::Blob,
            Payload::Value(_) => PayloadKind::Value,
        }
    }
}

/// A single sample keyed by (timestamp, series id)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    timestamp: Timestamp,
    series_id: SeriesId,
    payload: Payload,
}

impl Entry {
    /// Create an entry referencing an external blob
    pub fn blob(timestamp: Timestamp, series_id: SeriesId, offset: u32, length: u32) -> Self {
        Self {
            timestamp,
            series_id,
            payload: Payload::Blob { offset, length },
        }
    }

    /// Create an entry carrying an inline value
    pub fn value(timestamp: Timestamp, series_id: SeriesId, value: f64) -> Self {
        Self {
            timestamp,
            series_id,
            payload: Payload::Value(value),
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn series_id(&self) -> SeriesId {
        self.series_id
    }

    pub fn payload(&self) -> Payload {
        self.payload
    }

    /// Check if the payload references an external blob
    pub fn is_blob(&self) -> bool {
        matches!(self.payload, Payload::Blob { .. })
    }

    /// Sort key in natural order
    #[inline]
    pub fn natural_key(&self) -> (Timestamp, SeriesId) {
        (self.timestamp, self.series_id)
    }

    /// Sort key in chunk order
    #[inline]
    pub fn chunk_key(&self) -> (SeriesId, Timestamp) {
        (self.series_id, self.timestamp)
    }

    /// Compare by (timestamp, series id)
    #[inline]
    pub fn natural_cmp(&self, other: &Entry) -> Ordering {
        self.natural_key().cmp(&other.natural_key())
    }

    /// Compare by (series id, timestamp)
    #[inline]
    pub fn chunk_cmp(&self, other: &Entry) -> Ordering {
        self.chunk_key().cmp(&other.chunk_key())
    }

    /// Convert to the record handed to result cursors
    pub fn to_result(&self) -> CursorResult {
        CursorResult {
            timestamp: self.timestamp,
            series_id: self.series_id,
            payload: self.payload,
        }
    }

    /// Append this entry to a chunk header
    pub fn add_to_header(&self, header: &mut ChunkHeader) {
        header.push(self.timestamp, self.series_id, self.payload);
    }

    /// Worst-case number of bytes needed to persist this entry
    pub fn size_bound(&self) -> usize {
        self.payload.kind().size_bound()
    }
}

/// Record delivered to a result cursor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorResult {
    pub timestamp: Timestamp,
    pub series_id: SeriesId,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_accessors() {
        let blob = Entry::blob(100, 7, 4096, 32);
        assert!(blob.is_blob());
        assert_eq!(blob.timestamp(), 100);
        assert_eq!(blob.series_id(), 7);
        assert_eq!(blob.payload().kind(), PayloadKind::Blob);

        let value = Entry::value(100, 7, 1.5);
        assert!(!value.is_blob());
        assert_eq!(value.payload(), Payload::Value(1.5));
    }

    #[test]
    fn test_orderings() {
        let a = Entry::value(1, 5, 0.0);
        let b = Entry::value(2, 1, 0.0);

        assert_eq!(a.natural_cmp(&b), Ordering::Less);
        assert_eq!(a.chunk_cmp(&b), Ordering::Greater);

        let c = Entry::value(1, 6, 0.0);
        assert_eq!(a.natural_cmp(&c), Ordering::Less);
        assert_eq!(a.natural_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn test_to_result() {
        let entry = Entry::blob(10, 3, 128, 16);
        let result = entry.to_result();
        assert_eq!(result.timestamp, 10);
        assert_eq!(result.series_id, 3);
        assert_eq!(
            result.payload,
            Payload::Blob {
                offset: 128,
                length: 16
            }
        );
    }

    #[test]
    fn test_add_to_header() {
        let mut header = ChunkHeader::new();
        Entry::blob(1, 2, 3, 4).add_to_header(&mut header);
        Entry::value(5, 6, 7.0).add_to_header(&mut header);

        assert_eq!(header.len(), 2);
        assert_eq!(header.series_ids(), &[2, 6]);
        assert_eq!(header.timestamps(), &[1, 5]);
    }

    #[test]
    fn test_size_bound() {
        assert!(Entry::blob(0, 0, 0, 0).size_bound() >= 8 + 8 + 4 + 4);
        assert!(Entry::value(0, 0, 0.0).size_bound() >= 8 + 8 + 8);
    }
}
