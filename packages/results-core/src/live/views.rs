use std::sync::{Mutex, MutexGuard, PoisonError};

use common::ContestId;
use tokio::sync::watch;
use tracing::debug;

use crate::aggregation::EntryListing;
use crate::live::ViewKind;
use crate::ranking::RankedEntry;

/// What a reader saw in a view slot.
///
/// `version` must be handed back to the matching `store_*` call so that an
/// invalidation arriving during the recompute is not lost.
#[derive(Debug, Clone)]
pub struct ViewSnapshot<V> {
    pub value: Option<V>,
    pub version: u64,
    pub fresh: bool,
}

impl<V> ViewSnapshot<V> {
    /// The cached value if nothing invalidated it since it was stored.
    pub fn fresh_value(self) -> Option<V> {
        if self.fresh { self.value } else { None }
    }
}

/// Last-known-good value with versioned staleness.
#[derive(Debug)]
struct ViewSlot<V> {
    version: u64,
    fresh_version: Option<u64>,
    /// Version the held value was computed from, or the version it was cleared at.
    value_version: u64,
    value: Option<V>,
}

impl<V> Default for ViewSlot<V> {
    fn default() -> Self {
        Self {
            version: 0,
            fresh_version: None,
            value_version: 0,
            value: None,
        }
    }
}

impl<V: Clone> ViewSlot<V> {
    fn snapshot(&self) -> ViewSnapshot<V> {
        ViewSnapshot {
            value: self.value.clone(),
            version: self.version,
            fresh: self.fresh_version == Some(self.version),
        }
    }

    // A value computed from a since-invalidated version is still kept, as it
    // is newer than what the slot holds. It is only fresh if the version held.
    fn store(&mut self, version: u64, value: V) -> bool {
        if version < self.value_version {
            return false;
        }
        self.value = Some(value);
        self.value_version = version;
        if version == self.version {
            self.fresh_version = Some(version);
        }
        true
    }

    fn invalidate(&mut self) {
        self.version += 1;
    }

    fn clear(&mut self) {
        self.version += 1;
        self.fresh_version = None;
        self.value = None;
        self.value_version = self.version;
    }
}

#[derive(Debug, Default)]
struct Slots {
    contest_id: Option<ContestId>,
    results: ViewSlot<Vec<RankedEntry>>,
    entries: ViewSlot<Vec<EntryListing>>,
}

/// Cached views of one contest, shared between a watcher and its readers.
///
/// Invalidation marks views stale but never drops their value; the previous
/// value keeps being served until a recompute replaces it.
#[derive(Debug)]
pub struct ContestViews {
    slots: Mutex<Slots>,
    invalidations: watch::Sender<u64>,
}

impl Default for ContestViews {
    fn default() -> Self {
        Self::new()
    }
}

impl ContestViews {
    /// Views not bound to any contest. Nothing is cached until [`Self::reset`].
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            invalidations: watch::channel(0).0,
        }
    }

    pub fn for_contest(contest_id: ContestId) -> Self {
        let views = Self::new();
        views.reset(contest_id);
        views
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contest_id(&self) -> Option<ContestId> {
        self.slots().contest_id
    }

    /// Drop every cached value and bind the views to `contest_id`.
    pub fn reset(&self, contest_id: ContestId) {
        let mut slots = self.slots();
        slots.contest_id = Some(contest_id);
        slots.results.clear();
        slots.entries.clear();
        debug!(contest_id, "Views reset");
    }

    /// Mark `kinds` stale if the views are bound to `contest_id`.
    pub fn invalidate(&self, contest_id: ContestId, kinds: &[ViewKind]) -> bool {
        if kinds.is_empty() {
            return false;
        }
        {
            let mut slots = self.slots();
            if slots.contest_id != Some(contest_id) {
                return false;
            }
            for kind in kinds {
                match kind {
                    ViewKind::Results => slots.results.invalidate(),
                    ViewKind::Entries => slots.entries.invalidate(),
                }
            }
        }
        self.invalidations.send_modify(|count| *count += 1);
        true
    }

    /// Number of invalidations so far.
    pub fn invalidation_count(&self) -> u64 {
        *self.invalidations.borrow()
    }

    /// Notified on every invalidation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.invalidations.subscribe()
    }

    pub fn results(&self, contest_id: ContestId) -> ViewSnapshot<Vec<RankedEntry>> {
        let slots = self.slots();
        Self::bound(&slots, contest_id, &slots.results)
    }

    pub fn entries(&self, contest_id: ContestId) -> ViewSnapshot<Vec<EntryListing>> {
        let slots = self.slots();
        Self::bound(&slots, contest_id, &slots.entries)
    }

    /// Record recomputed results. Returns whether the value was kept.
    pub fn store_results(
        &self,
        contest_id: ContestId,
        version: u64,
        value: Vec<RankedEntry>,
    ) -> bool {
        let mut slots = self.slots();
        slots.contest_id == Some(contest_id) && slots.results.store(version, value)
    }

    /// Record a recomputed entry listing. Returns whether the value was kept.
    pub fn store_entries(
        &self,
        contest_id: ContestId,
        version: u64,
        value: Vec<EntryListing>,
    ) -> bool {
        let mut slots = self.slots();
        slots.contest_id == Some(contest_id) && slots.entries.store(version, value)
    }

    fn bound<V: Clone>(
        slots: &Slots,
        contest_id: ContestId,
        slot: &ViewSlot<V>,
    ) -> ViewSnapshot<V> {
        if slots.contest_id == Some(contest_id) {
            slot.snapshot()
        } else {
            ViewSnapshot {
                value: None,
                version: slot.version,
                fresh: false,
            }
        }
    }
}
