//! Core types for Chronoseq

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Timestamp in the storage engine's time unit
pub type Timestamp = u64;

/// Identifier of a time series
pub type SeriesId = u64;

/// Time range for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start timestamp (inclusive)
    pub start: Timestamp,
    /// End timestamp (inclusive)
    pub end: Timestamp,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Range covering every timestamp
    pub fn all() -> Self {
        Self::new(Timestamp::MIN, Timestamp::MAX)
    }

    /// Check if a timestamp is within the range
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Check if two ranges overlap
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// Check if the range contains no timestamps
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Order in which search results are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Ascending (timestamp, series id)
    #[default]
    Forward,
    /// Descending (timestamp, series id)
    Backward,
}

/// Search predicate over buffered entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Inclusive timestamp range
    pub range: TimeRange,
    /// Series to include, `None` matches every series
    pub series: Option<HashSet<SeriesId>>,
    /// Delivery order
    pub direction: Direction,
}

impl SearchQuery {
    /// Query every series within a time range
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            series: None,
            direction: Direction::Forward,
        }
    }

    /// Restrict the query to a set of series
    pub fn with_series(mut self, ids: impl IntoIterator<Item = SeriesId>) -> Self {
        self.series = Some(ids.into_iter().collect());
        self
    }

    /// Set the delivery order
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Check if a series passes the id filter
    pub fn matches_series(&self, id: SeriesId) -> bool {
        self.series.as_ref().map_or(true, |ids| ids.contains(&id))
    }

    /// Check if a sample passes both filters
    pub fn matches(&self, ts: Timestamp, id: SeriesId) -> bool {
        self.range.contains(ts) && self.matches_series(id)
    }
}
