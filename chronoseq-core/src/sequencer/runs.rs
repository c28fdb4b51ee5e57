//! Run table: active sorted runs, sealed runs and their locks
//!
//! Active runs are patience-sorted: a new entry is appended to the first run
//! whose last element is not greater than the entry, so every run stays
//! sorted in natural order with append-only writes. The run tops are kept
//! under the structural lock in descending order, which makes the choice a
//! binary search. Run contents live in the shard locks (`run i` in shard
//! `i & 0xFF`, slot `i >> 8`); writers leave the structural lock before
//! taking the shard lock.

use super::checkpoint::{Admission, CheckpointState};
use super::gate::SequenceGate;
use super::locks::{shard_of, slot_of, ShardLocks};
use crate::config::RUN_LOCK_MAX_BACKOFF;
use crate::{Entry, Result, SearchQuery, SeriesId, Timestamp};
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Sealed run, immutable once published
#[derive(Debug)]
pub struct SortedRun {
    entries: Box<[Entry]>,
    size_bound: u64,
}

impl SortedRun {
    pub(crate) fn seal(entries: Vec<Entry>) -> Self {
        let size_bound = entries.iter().map(|e| e.size_bound() as u64).sum();
        Self {
            entries: entries.into_boxed_slice(),
            size_bound,
        }
    }

    /// Worst-case bytes needed to persist the run
    pub fn size_bound(&self) -> u64 {
        self.size_bound
    }

    /// Entries within an inclusive time range
    pub fn time_slice(&self, start: Timestamp, end: Timestamp) -> &[Entry] {
        time_slice(&self.entries, start, end)
    }
}

impl Deref for SortedRun {
    type Target = [Entry];

    fn deref(&self) -> &[Entry] {
        &self.entries
    }
}

/// Sub-slice of a naturally ordered run covering `[start, end]`
pub(crate) fn time_slice(run: &[Entry], start: Timestamp, end: Timestamp) -> &[Entry] {
    if start > end {
        return &[];
    }
    let lo = run.partition_point(|e| e.timestamp() < start);
    let hi = run.partition_point(|e| e.timestamp() <= end);
    &run[lo..hi.max(lo)]
}

/// Contents of one shard
#[derive(Debug, Default)]
pub(crate) struct Shard {
    runs: Vec<Vec<Entry>>,
}

impl Shard {
    /// Insert into run `slot`, keeping it sorted in natural order
    fn insert(&mut self, slot: usize, entry: Entry) {
        if self.runs.len() <= slot {
            self.runs.resize_with(slot + 1, Vec::new);
        }
        let run = &mut self.runs[slot];
        let key = entry.natural_key();
        // appends reserved together for one run may land out of order
        if run.last().map_or(true, |last| last.natural_key() <= key) {
            run.push(entry);
        } else {
            let pos = run.partition_point(|e| e.natural_key() <= key);
            run.insert(pos, entry);
        }
    }
}

/// State guarded by the structural lock
struct TableState {
    /// Largest key reserved for each active run, descending
    tops: Vec<(Timestamp, SeriesId)>,
    ready: Vec<Arc<SortedRun>>,
    checkpoint: CheckpointState,
    active_entries: usize,
}

/// Run chosen for an entry that has not been written yet
pub(crate) struct Reservation<'a> {
    ix: usize,
    entry: Entry,
    pending: &'a AtomicUsize,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Counters reported by `Sequencer::stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TableCounters {
    pub active_runs: usize,
    pub ready_runs: usize,
    pub active_entries: usize,
    pub ready_entries: usize,
    pub top_timestamp: Timestamp,
    pub checkpoint: u64,
}

pub(crate) struct RunTable {
    state: Mutex<TableState>,
    shards: ShardLocks<Shard>,
    /// Reservations not yet written to their shard
    pending: AtomicUsize,
    /// Worst-case bytes of everything buffered; only changed under `state`
    space_estimate: AtomicU64,
}

impl RunTable {
    pub fn new(window_size: u64, spin_limit: usize) -> Self {
        Self {
            state: Mutex::new(TableState {
                tops: Vec::new(),
                ready: Vec::new(),
                checkpoint: CheckpointState::new(window_size),
                active_entries: 0,
            }),
            shards: ShardLocks::new(spin_limit),
            pending: AtomicUsize::new(0),
            space_estimate: AtomicU64::new(0),
        }
    }

    /// Upper bound of the bytes needed to persist all buffered entries
    pub fn space_estimate(&self) -> u64 {
        self.space_estimate.load(Ordering::Acquire)
    }

    /// Admit an entry, sealing the active runs first if it opens a new
    /// checkpoint. Returns whether a checkpoint was created.
    ///
    /// The structural lock is held only to pick the run; the entry is
    /// written under the run's shard lock alone.
    pub fn add(&self, entry: Entry, gate: &SequenceGate) -> Result<bool> {
        let (reservation, created) = {
            let mut state = self.state.lock();

            let admission = state.checkpoint.admit(entry.timestamp())?;
            if let Admission::Checkpoint(checkpoint) = admission {
                let sealed = self.seal_locked(&mut state, gate);
                info!(
                    "Checkpoint {} (from {}) opened at timestamp {}, sealed {} runs",
                    checkpoint,
                    state.checkpoint.checkpoint_start(checkpoint),
                    entry.timestamp(),
                    sealed
                );
            }
            state.checkpoint.commit(entry.timestamp(), admission);

            let reservation = self.reserve_locked(&mut state, entry);
            (reservation, matches!(admission, Admission::Checkpoint(_)))
        };

        self.append(reservation);
        Ok(created)
    }

    /// Move every active run to the ready set. Returns the number of runs moved.
    pub fn seal(&self, gate: &SequenceGate) -> usize {
        let mut state = self.state.lock();
        self.seal_locked(&mut state, gate)
    }

    fn seal_locked(&self, state: &mut TableState, gate: &SequenceGate) -> usize {
        // readers holding an older sequence number must not trust the move
        gate.advance();

        let count = state.tops.len();
        if count == 0 {
            return 0;
        }
        self.wait_for_appends();

        let mut per_shard: Vec<_> = (0..self.shards.len().min(count))
            .map(|shard| std::mem::take(&mut self.shards.write(shard).runs).into_iter())
            .collect();

        for ix in 0..count {
            if let Some(run) = per_shard[shard_of(ix)].next() {
                if !run.is_empty() {
                    state.ready.push(Arc::new(SortedRun::seal(run)));
                }
            }
        }

        state.tops.clear();
        state.active_entries = 0;
        count
    }

    /// Pick the first run whose top is not greater than the entry, or open a
    /// new one
    fn reserve_locked(&self, state: &mut TableState, entry: Entry) -> Reservation<'_> {
        let key = entry.natural_key();
        let ix = state.tops.partition_point(|top| *top > key);
        if ix == state.tops.len() {
            state.tops.push(key);
        } else {
            state.tops[ix] = key;
        }

        state.active_entries += 1;
        self.space_estimate.fetch_add(entry.size_bound() as u64, Ordering::AcqRel);
        self.pending.fetch_add(1, Ordering::AcqRel);
        Reservation {
            ix,
            entry,
            pending: &self.pending,
        }
    }

    fn append(&self, reservation: Reservation<'_>) {
        let mut shard = self.shards.write(shard_of(reservation.ix));
        shard.insert(slot_of(reservation.ix), reservation.entry);
    }

    /// Spin until every reservation is written; called under the structural
    /// lock, so no new reservation can start
    fn wait_for_appends(&self) {
        let mut backoff = 1usize;
        while self.pending.load(Ordering::Acquire) > 0 {
            if backoff < RUN_LOCK_MAX_BACKOFF {
                for _ in 0..backoff {
                    std::hint::spin_loop();
                }
                backoff *= 2;
            } else {
                std::thread::yield_now();
            }
        }
    }

    /// Copy the part of every active run that falls in the query's time
    /// range, in run order
    ///
    /// All shards are read-locked together, so a series written in order is
    /// never seen with a later entry but without an earlier one.
    pub fn collect_active(&self, query: &SearchQuery) -> Vec<Vec<Entry>> {
        let (start, end) = (query.range.start, query.range.end);
        let shards = self.shards.read_all();
        let slots = shards.iter().map(|shard| shard.runs.len()).max().unwrap_or(0);

        let mut out = Vec::new();
        for slot in 0..slots {
            for shard in &shards {
                if let Some(run) = shard.runs.get(slot) {
                    let part = time_slice(run, start, end);
                    if !part.is_empty() {
                        out.push(part.to_vec());
                    }
                }
            }
        }
        out
    }

    /// Sealed runs awaiting merge
    pub fn ready(&self) -> Vec<Arc<SortedRun>> {
        self.state.lock().ready.clone()
    }

    /// Drop the first `count` ready runs after a successful merge and close
    /// the merge bracket
    pub fn release_ready(&self, count: usize, gate: &SequenceGate) -> u64 {
        let mut state = self.state.lock();
        let count = count.min(state.ready.len());
        let released: u64 = state.ready.drain(..count).map(|run| run.size_bound()).sum();
        let _ = self
            .space_estimate
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |space| {
                Some(space.saturating_sub(released))
            });
        gate.end_merge()
    }

    /// Window lower bound and sequence number, read together
    pub fn window(&self, gate: &SequenceGate) -> (Timestamp, u64) {
        let state = self.state.lock();
        (state.checkpoint.lower_bound(), gate.current())
    }

    pub fn counters(&self) -> TableCounters {
        let state = self.state.lock();
        TableCounters {
            active_runs: state.tops.len(),
            ready_runs: state.ready.len(),
            active_entries: state.active_entries,
            ready_entries: state.ready.iter().map(|run| run.len()).sum(),
            top_timestamp: state.checkpoint.top_timestamp(),
            checkpoint: state.checkpoint.checkpoint(),
        }
    }

    #[cfg(test)]
    pub(crate) fn shards(&self) -> &ShardLocks<Shard> {
        &self.shards
    }
}
