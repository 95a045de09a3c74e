//! Timer record storage

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard,
    },
};
use thiserror::Error;
use tracing::debug;

use super::{TimerId, TimerState};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("timer store lock poisoned: {0}")]
    Poisoned(String),
}

/// Holds timer records keyed by id.
///
/// `load` and `save` are plain reads and writes; callers that mutate a
/// record are responsible for serializing access per id.
pub trait Store: Send + Sync {
    /// Insert a new stopped timer under a freshly assigned id
    fn create(&self, label: String) -> Result<TimerState, StoreError>;

    /// Fetch a copy of a timer, `None` if the id does not exist
    fn load(&self, id: TimerId) -> Result<Option<TimerState>, StoreError>;

    /// Write a timer back
    fn save(&self, timer: &TimerState) -> Result<(), StoreError>;

    /// All timers ordered by id
    fn list(&self) -> Result<Vec<TimerState>, StoreError>;

    /// Remove a timer, returning whether it existed
    fn delete(&self, id: TimerId) -> Result<bool, StoreError>;
}

/// In-process store; ids start at 1 and are never reused
#[derive(Debug)]
pub struct MemoryStore {
    timers: Mutex<BTreeMap<TimerId, TimerState>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn timers(&self) -> Result<MutexGuard<'_, BTreeMap<TimerId, TimerState>>, StoreError> {
        self.timers
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn create(&self, label: String) -> Result<TimerState, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let timer = TimerState::new(id, label);
        self.timers()?.insert(id, timer.clone());
        debug!("Stored new timer {}", id);
        Ok(timer)
    }

    fn load(&self, id: TimerId) -> Result<Option<TimerState>, StoreError> {
        Ok(self.timers()?.get(&id).cloned())
    }

    fn save(&self, timer: &TimerState) -> Result<(), StoreError> {
        self.timers()?.insert(timer.id(), timer.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<TimerState>, StoreError> {
        Ok(self.timers()?.values().cloned().collect())
    }

    fn delete(&self, id: TimerId) -> Result<bool, StoreError> {
        Ok(self.timers()?.remove(&id).is_some())
    }
}
