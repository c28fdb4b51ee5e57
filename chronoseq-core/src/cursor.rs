//! Result cursors fed by `Sequencer::search` and the legacy merge

use crate::CursorResult;

/// Sink receiving matched entries one at a time
///
/// `put` always takes the record it is given. Returning `false` asks for no
/// further records; the producer never calls `put` again for that operation.
pub trait ResultCursor {
    /// Deliver a record; returns whether more records are wanted
    fn put(&mut self, result: CursorResult) -> bool;

    /// Called once after the last record of a successful operation
    fn complete(&mut self) {}
}

impl ResultCursor for Vec<CursorResult> {
    fn put(&mut self, result: CursorResult) -> bool {
        self.push(result);
        true
    }
}

impl<C: ResultCursor + ?Sized> ResultCursor for &mut C {
    fn put(&mut self, result: CursorResult) -> bool {
        (**self).put(result)
    }

    fn complete(&mut self) {
        (**self).complete()
    }
}

/// Cursor that stops delivery after `limit` records
///
/// Every `put` takes its record, so at least one record is kept.
#[derive(Debug)]
pub struct LimitCursor {
    limit: usize,
    results: Vec<CursorResult>,
    completed: bool,
}

impl LimitCursor {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            results: Vec::new(),
            completed: false,
        }
    }

    pub fn results(&self) -> &[CursorResult] {
        &self.results
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn into_results(self) -> Vec<CursorResult> {
        self.results
    }
}

impl ResultCursor for LimitCursor {
    fn put(&mut self, result: CursorResult) -> bool {
        self.results.push(result);
        self.results.len() < self.limit
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entry;

    #[test]
    fn test_limit_cursor() {
        let mut cursor = LimitCursor::new(2);
        assert!(cursor.put(Entry::value(1, 1, 1.0).to_result()));
        assert!(!cursor.put(Entry::value(2, 1, 1.0).to_result()));
        cursor.complete();

        assert!(cursor.is_complete());
        assert_eq!(cursor.results().len(), 2);
    }

    #[test]
    fn test_zero_limit_keeps_the_first_record() {
        let mut cursor = LimitCursor::new(0);
        assert!(!cursor.put(Entry::value(1, 1, 1.0).to_result()));
        assert_eq!(cursor.into_results().len(), 1);
    }
}
