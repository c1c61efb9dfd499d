//! Chassis store: double-buffered snapshot publication.
//!
//! Broadcast and query paths read the full 9×14 grid many times per second
//! while the collector commits at most once per tick, so reads must never
//! block. The store keeps the active generation behind an atomic pointer
//! ([`arc_swap::ArcSwap`]): readers load it wait-free and work on a frozen
//! snapshot; the single writer builds the next generation off to the side
//! and swaps it in with one release store.
//!
//! A reader that loaded the previous generation keeps it alive through its
//! `Arc` for as long as it needs; an in-flight read can never observe a
//! later commit mid-write. After a commit, every new read observes the
//! post-commit grid; there is no torn state in between.
//!
//! # Writer discipline
//!
//! Exactly one task (the collector) may call [`ChassisStore::commit`].
//! Commits from a single writer are totally ordered; if a second writer is
//! ever introduced, commits must be serialised externally.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::domain::{Chassis, ChassisGrid};

/// Lock-free published view of the chassis fleet.
pub struct ChassisStore {
    active: ArcSwap<ChassisGrid>,
}

impl Default for ChassisStore {
    fn default() -> Self {
        Self {
            active: ArcSwap::from_pointee(ChassisGrid::default()),
        }
    }
}

impl ChassisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the startup topology.
    ///
    /// Call once, before any reader or the writer starts.
    pub fn initialize(&self, grid: ChassisGrid) {
        self.active.store(Arc::new(grid));
    }

    /// Publish a new generation. Single writer only.
    ///
    /// Readers observe either the pre-commit or the post-commit grid,
    /// never a mix of the two.
    pub fn commit(&self, grid: ChassisGrid) {
        self.active.store(Arc::new(grid));
    }

    /// The current snapshot, wait-free.
    ///
    /// The returned `Arc` is frozen: later commits do not affect it.
    pub fn snapshot(&self) -> Arc<ChassisGrid> {
        self.active.load_full()
    }

    /// Copy of every initialised chassis, in chassis-number order.
    pub fn get_all(&self) -> Vec<Chassis> {
        self.snapshot().iter_initialized().cloned().collect()
    }

    /// Copy of the chassis with the given 1-based number.
    pub fn find_by_number(&self, number: u8) -> Option<Chassis> {
        self.snapshot().by_number(number).cloned()
    }

    /// Copy of the chassis hosting the board with the given address.
    pub fn find_by_board_address(&self, address: &str) -> Option<Chassis> {
        self.snapshot().by_board_address(address).cloned()
    }

    pub fn count_total_boards(&self) -> usize {
        self.snapshot().count_total_boards()
    }

    pub fn count_normal_boards(&self) -> usize {
        self.snapshot().count_normal_boards()
    }

    pub fn count_abnormal_boards(&self) -> usize {
        self.snapshot().count_abnormal_boards()
    }

    pub fn count_offline_boards(&self) -> usize {
        self.snapshot().count_offline_boards()
    }

    pub fn count_total_tasks(&self) -> usize {
        self.snapshot().count_tasks()
    }
}
