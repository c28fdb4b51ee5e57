//! Sequencer - ingestion, checkpointing, merge and optimistic search

use super::gate::SequenceGate;
use super::runs::RunTable;
use super::SequencerConfig;
use crate::cursor::ResultCursor;
use crate::merge::{AppendSink, ChunkSink, CursorSink, KWayMerge, MergeOrder, MergeSink};
use crate::page::PageWriter;
use crate::{Direction, Entry, Result, SearchQuery, SeqError, Timestamp};
use parking_lot::Mutex;
use std::borrow::Cow;
use tracing::{debug, info, warn};

/// Outcome of a successful `add`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// The entry opened a new checkpoint and the previous runs were sealed
    pub checkpoint_created: bool,
}

/// Outcome of a drain of the ready set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Ready runs drained
    pub runs: usize,
    /// Entries written
    pub entries: usize,
    /// Chunks completed (zero outside `merge_and_compress`)
    pub chunks: usize,
    /// Sequence number once the merge finished
    pub sequence: u64,
}

/// Sequencer statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerStats {
    pub active_runs: usize,
    pub ready_runs: usize,
    pub active_entries: usize,
    pub ready_entries: usize,
    pub top_timestamp: Timestamp,
    pub checkpoint: u64,
    pub sequence: u64,
    pub space_estimate: u64,
}

/// Write buffer that accepts out-of-order samples
///
/// All methods take `&self`; share the sequencer between writer, reader and
/// merge threads with an `Arc`.
pub struct Sequencer {
    config: SequencerConfig,
    table: RunTable,
    gate: SequenceGate,
    merge_lock: Mutex<()>,
}

impl Sequencer {
    /// Create a new sequencer
    pub fn new(config: SequencerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            table: RunTable::new(config.window_size, config.lock_spin_limit),
            gate: SequenceGate::new(),
            merge_lock: Mutex::new(()),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Add a sample; its timestamp may be out of order
    ///
    /// Samples older than the window lower bound are rejected with
    /// [`SeqError::LateWrite`] and dropped.
    pub fn add(&self, entry: Entry) -> Result<AddOutcome> {
        match self.table.add(entry, &self.gate) {
            Ok(checkpoint_created) => Ok(AddOutcome { checkpoint_created }),
            Err(e) => {
                debug!(
                    "Rejected sample of series {} at {}: {}",
                    entry.series_id(),
                    entry.timestamp(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Seal every active run for merging, whether or not its window closed.
    /// Returns the new sequence number.
    pub fn reset(&self) -> u64 {
        let sealed = self.table.seal(&self.gate);
        let sequence = self.gate.current();
        debug!("Reset sealed {} runs, sequence {}", sealed, sequence);
        sequence
    }

    /// Window lower bound and the sequence number to pass to [`search`](Self::search)
    pub fn get_window(&self) -> (Timestamp, u64) {
        self.table.window(&self.gate)
    }

    /// Bytes needed to persist everything buffered; may overshoot, never undershoots
    pub fn get_space_estimate(&self) -> u64 {
        self.table.space_estimate()
    }

    /// Search buffered samples
    ///
    /// `sequence_number` must come from [`get_window`](Self::get_window). If a
    /// merge or seal happened since, nothing is delivered and
    /// [`SeqError::Busy`] is returned; take a new window and retry. Returns
    /// the number of results handed to the cursor; delivery stops after the
    /// cursor's `put` returns `false`.
    pub fn search<C: ResultCursor + ?Sized>(
        &self,
        cursor: &mut C,
        query: &SearchQuery,
        sequence_number: u64,
    ) -> Result<usize> {
        if !self.gate.validate(sequence_number) {
            debug!("Search rejected, sequence {} is stale", sequence_number);
            return Err(SeqError::Busy);
        }

        let ready = self.table.ready();
        let active = self.table.collect_active(query);

        if !self.gate.validate(sequence_number) {
            debug!("Search aborted, sequencer changed during scan");
            return Err(SeqError::Busy);
        }

        let (start, end) = (query.range.start, query.range.end);
        let mut runs: Vec<&[Entry]> = ready
            .iter()
            .map(|run| run.time_slice(start, end))
            .collect();
        runs.extend(active.iter().map(Vec::as_slice));

        let mut delivered = 0;
        for entry in KWayMerge::new(runs, MergeOrder::Natural, query.direction) {
            if !query.matches_series(entry.series_id()) {
                continue;
            }
            let more = cursor.put(entry.to_result());
            delivered += 1;
            if !more {
                break;
            }
        }
        cursor.complete();

        Ok(delivered)
    }

    /// Merge all ready runs in chunk order and write them as chunks of at
    /// most `compression_threshold` entries
    pub fn merge_and_compress<W: PageWriter + ?Sized>(&self, target: &mut W) -> Result<MergeStats> {
        let mut sink = ChunkSink::new(target, self.config.compression_threshold);
        self.drain(MergeOrder::Chunk, &mut sink)
    }

    /// Merge all ready runs in natural order, appending entries one by one
    pub fn compact<W: PageWriter + ?Sized>(&self, target: &mut W) -> Result<MergeStats> {
        let mut sink = AppendSink::new(target);
        self.drain(MergeOrder::Natural, &mut sink)
    }

    /// Merge all ready runs in natural order into a result cursor
    ///
    /// Uncompressed path kept for callers that still consume cursors.
    pub fn merge<C: ResultCursor + ?Sized>(&self, cursor: &mut C) -> Result<MergeStats> {
        let mut sink = CursorSink::new(cursor);
        self.drain(MergeOrder::Natural, &mut sink)
    }

    /// Seal everything and write it to `target`
    pub fn close<W: PageWriter + ?Sized>(&self, target: &mut W) -> Result<MergeStats> {
        self.reset();
        match self.merge_and_compress(target) {
            Err(SeqError::NoData) => Ok(MergeStats {
                sequence: self.gate.current(),
                ..Default::default()
            }),
            other => other,
        }
    }

    /// Get sequencer statistics
    pub fn stats(&self) -> SequencerStats {
        let counters = self.table.counters();
        SequencerStats {
            active_runs: counters.active_runs,
            ready_runs: counters.ready_runs,
            active_entries: counters.active_entries,
            ready_entries: counters.ready_entries,
            top_timestamp: counters.top_timestamp,
            checkpoint: counters.checkpoint,
            sequence: self.gate.current(),
            space_estimate: self.table.space_estimate(),
        }
    }

    fn drain(&self, order: MergeOrder, sink: &mut dyn MergeSink) -> Result<MergeStats> {
        let _merge = self.merge_lock.try_lock().ok_or(SeqError::Busy)?;

        let ready = self.table.ready();
        if ready.is_empty() {
            return Err(SeqError::NoData);
        }

        let sequence = self.gate.begin_merge();
        info!(
            "Merging {} ready runs in {:?} order, sequence {}",
            ready.len(),
            order,
            sequence
        );

        let arranged: Vec<Cow<'_, [Entry]>> = ready.iter().map(|run| order.arrange(run)).collect();
        let runs = arranged.iter().map(|run| &run[..]).collect();

        let mut entries = 0;
        let written = KWayMerge::new(runs, order, Direction::Forward)
            .try_for_each(|entry| {
                entries += 1;
                sink.consume(entry)
            })
            .and_then(|_| sink.finish());

        if let Err(e) = written {
            warn!(
                "Merge of {} runs failed after {} entries, ready runs kept: {}",
                ready.len(),
                entries,
                e
            );
            return Err(e.into());
        }

        let sequence = self.table.release_ready(ready.len(), &self.gate);
        info!(
            "Merged {} entries from {} runs, sequence {}",
            entries,
            ready.len(),
            sequence
        );

        Ok(MergeStats {
            runs: ready.len(),
            entries,
            chunks: sink.chunks(),
            sequence,
        })
    }
}
