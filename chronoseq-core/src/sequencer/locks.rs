//! Fixed table of shard read/write locks

use crate::config::{RUN_LOCK_FLAGS_MASK, RUN_LOCK_FLAGS_SIZE, RUN_LOCK_MAX_BACKOFF};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shard index of a run
#[inline]
pub(crate) fn shard_of(run_ix: usize) -> usize {
    run_ix & RUN_LOCK_FLAGS_MASK
}

/// Slot of a run inside its shard
#[inline]
pub(crate) fn slot_of(run_ix: usize) -> usize {
    run_ix / RUN_LOCK_FLAGS_SIZE
}

/// `RUN_LOCK_FLAGS_SIZE` locks, each owning the data of its shard
///
/// Writers spin with exponential backoff for up to `spin_limit` iterations
/// before falling back to a blocking acquisition.
pub(crate) struct ShardLocks<T> {
    shards: Box<[RwLock<T>]>,
    spin_limit: usize,
}

impl<T: Default> ShardLocks<T> {
    pub fn new(spin_limit: usize) -> Self {
        let shards = (0..RUN_LOCK_FLAGS_SIZE)
            .map(|_| RwLock::new(T::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards, spin_limit }
    }
}

impl<T> ShardLocks<T> {
    /// Number of shards
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Shared access to a shard
    pub fn read(&self, shard: usize) -> RwLockReadGuard<'_, T> {
        self.shards[shard].read()
    }

    /// Shared access to every shard at once, acquired in shard order
    ///
    /// Appends finished before the last guard is taken are all visible;
    /// none that starts afterwards is.
    pub fn read_all(&self) -> Vec<RwLockReadGuard<'_, T>> {
        self.shards.iter().map(|lock| lock.read()).collect()
    }

    /// Exclusive access to a shard, spinning before blocking
    pub fn write(&self, shard: usize) -> RwLockWriteGuard<'_, T> {
        let lock = &self.shards[shard];
        let mut spins = 0usize;
        let mut backoff = 1usize;

        while spins < self.spin_limit {
            if let Some(guard) = lock.try_write() {
                return guard;
            }
            for _ in 0..backoff {
                std::hint::spin_loop();
            }
            spins += backoff;
            backoff = (backoff * 2).min(RUN_LOCK_MAX_BACKOFF);
        }

        lock.write()
    }
}
