//! The scheduler's in-memory registry: a due-time map ordered for the
//! dispatcher to pop the next deadline, plus an idle map for schedules
//! that are registered but not currently armed (just created, or
//! retired after their last repeat fired).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::clock::monotonic_next_ns;
use crate::schedule::Schedule;

/// Due-time ordering key. Ties (two schedules due at the exact same
/// nanosecond) are broken by `order`, a process-wide monotonic counter
/// bumped every time a key is minted — the +1ns scheme the scheduler
/// spec calls for, generalized here to an explicit tie-break field
/// rather than literally perturbing the timestamp by a nanosecond.
/// `Ord`'s lexicographic tuple derive gives FIFO order among equal
/// deadlines for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct DueKey {
    due_ns: u64,
    order: u64,
}

impl DueKey {
    pub(crate) fn new(due_ns: u64) -> DueKey {
        DueKey {
            due_ns,
            order: monotonic_next_ns(),
        }
    }

    pub(crate) fn due_ns(&self) -> u64 {
        self.due_ns
    }
}

/// Holds every schedule a scheduler owns, split by whether it currently
/// has an armed deadline.
#[derive(Default)]
pub(crate) struct Registry {
    due: BTreeMap<DueKey, Arc<Schedule>>,
    idle: HashMap<u64, Arc<Schedule>>,
    keys_by_id: HashMap<u64, DueKey>,
}

impl Registry {
    pub(crate) fn new() -> Registry {
        Registry::default()
    }

    /// Registers a freshly created schedule in the idle set.
    pub(crate) fn insert_idle(&mut self, schedule: Arc<Schedule>) {
        self.idle.insert(schedule.id(), schedule);
    }

    /// Moves a schedule into the due map at `due_ns`, minting a fresh
    /// tie-break key. A schedule already armed is re-keyed: its previous
    /// due entry is removed first.
    pub(crate) fn arm(&mut self, schedule: Arc<Schedule>, due_ns: u64) {
        let id = schedule.id();
        if let Some(old_key) = self.keys_by_id.remove(&id) {
            self.due.remove(&old_key);
        }
        self.idle.remove(&id);
        let key = DueKey::new(due_ns);
        self.keys_by_id.insert(id, key);
        schedule.set_scheduled(true);
        self.due.insert(key, schedule);
    }

    /// Moves a schedule back to idle (exhausted repeats, or deleted while
    /// waiting and re-added idle by the caller — callers choose).
    pub(crate) fn disarm(&mut self, id: u64) -> Option<Arc<Schedule>> {
        let key = self.keys_by_id.remove(&id)?;
        let schedule = self.due.remove(&key)?;
        schedule.set_scheduled(false);
        self.idle.insert(id, Arc::clone(&schedule));
        Some(schedule)
    }

    /// Removes a schedule from both maps entirely (used by `delete`).
    pub(crate) fn remove(&mut self, id: u64) -> Option<Arc<Schedule>> {
        if let Some(key) = self.keys_by_id.remove(&id) {
            self.due.remove(&key)
        } else {
            self.idle.remove(&id)
        }
    }

    pub(crate) fn get(&self, id: u64) -> Option<Arc<Schedule>> {
        if let Some(key) = self.keys_by_id.get(&id) {
            self.due.get(key).cloned()
        } else {
            self.idle.get(&id).cloned()
        }
    }

    /// The earliest armed deadline, if any are armed.
    pub(crate) fn earliest(&self) -> Option<(DueKey, Arc<Schedule>)> {
        self.due
            .iter()
            .next()
            .map(|(key, schedule)| (*key, Arc::clone(schedule)))
    }

    /// Pops the schedule at exactly `key`, if it is still there (it may
    /// have been deleted or reset out from under the dispatcher between
    /// peeking and popping, which is why this takes the exact key rather
    /// than "the earliest").
    pub(crate) fn pop(&mut self, key: DueKey) -> Option<Arc<Schedule>> {
        let schedule = self.due.remove(&key)?;
        self.keys_by_id.remove(&schedule.id());
        Some(schedule)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.due.is_empty() && self.idle.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.due.len() + self.idle.len()
    }

    /// All schedules, due and idle, in no particular order. Used on
    /// scheduler teardown to drop every `Arc<Schedule>` the registry
    /// holds (which in turn runs each schedule's `free_fn` once its last
    /// reference goes away).
    pub(crate) fn drain_all(&mut self) -> Vec<Arc<Schedule>> {
        let mut all: Vec<Arc<Schedule>> = self.due.values().cloned().collect();
        all.extend(self.idle.values().cloned());
        self.due.clear();
        self.idle.clear();
        self.keys_by_id.clear();
        all
    }
}
