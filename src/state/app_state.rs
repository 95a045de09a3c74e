//! Main application state management

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    Clock, MemoryStore, Store, StoreError, SystemClock, TimerId, TimerSnapshot, TimerState,
};

/// Errors surfaced by timer operations
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("timer {0} not found")]
    NotFound(TimerId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Main application state: timer records plus the locks that serialize them
pub struct AppState {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    /// One lock per timer id with a request in flight
    timer_locks: Mutex<HashMap<TimerId, Arc<Mutex<()>>>>,
    /// Label given to timers created without a name
    pub default_label: String,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create an AppState backed by an in-memory store and the system clock
    pub fn new(port: u16, host: String, default_label: String) -> Self {
        Self::with_backends(
            port,
            host,
            default_label,
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
        )
    }

    /// Create an AppState over an explicit store and clock
    pub fn with_backends(
        port: u16,
        host: String,
        default_label: String,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            timer_locks: Mutex::new(HashMap::new()),
            default_label,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a timer; a missing or blank label falls back to the default
    pub fn create_timer(&self, label: Option<String>) -> Result<TimerSnapshot, TimerError> {
        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.default_label.clone());

        let timer = self.store.create(label)?;
        info!("Created timer {} ({})", timer.id(), timer.label());
        self.record_action("create", timer.id());
        Ok(timer.snapshot(self.clock.now()))
    }

    /// All timers with their elapsed time derived now
    pub fn list_timers(&self) -> Result<Vec<TimerSnapshot>, TimerError> {
        let now = self.clock.now();
        Ok(self
            .store
            .list()?
            .iter()
            .map(|timer| timer.snapshot(now))
            .collect())
    }

    pub fn get_timer(&self, id: TimerId) -> Result<TimerSnapshot, TimerError> {
        let timer = self.load(id)?;
        Ok(timer.snapshot(self.clock.now()))
    }

    /// Open a session; already-running timers are returned unchanged
    pub fn start_timer(&self, id: TimerId) -> Result<TimerSnapshot, TimerError> {
        self.update_timer(id, "start", |timer, now| {
            let started = timer.start(now);
            if started {
                info!("Timer {} started", id);
            } else {
                debug!("Timer {} already running, start ignored", id);
            }
            started
        })
    }

    /// Close the open session; stopped timers are returned unchanged
    pub fn stop_timer(&self, id: TimerId) -> Result<TimerSnapshot, TimerError> {
        self.update_timer(id, "stop", |timer, now| match timer.stop(now) {
            Some(session_ms) => {
                info!(
                    "Timer {} stopped after {}ms (total {}ms)",
                    id,
                    session_ms,
                    timer.accumulated_ms()
                );
                true
            }
            None => {
                debug!("Timer {} already stopped, stop ignored", id);
                false
            }
        })
    }

    /// Elapsed milliseconds including any open session
    pub fn current_elapsed(&self, id: TimerId) -> Result<u64, TimerError> {
        let timer = self.load(id)?;
        Ok(timer.current_elapsed(self.clock.now()))
    }

    pub fn rename_timer(&self, id: TimerId, label: String) -> Result<TimerSnapshot, TimerError> {
        self.update_timer(id, "rename", |timer, _| {
            info!("Timer {} renamed from {:?} to {:?}", id, timer.label(), label);
            timer.rename(label);
            true
        })
    }

    pub fn delete_timer(&self, id: TimerId) -> Result<(), TimerError> {
        self.with_timer_lock(id, || {
            if !self.store.delete(id)? {
                return Err(TimerError::NotFound(id));
            }
            Ok(())
        })?;

        info!("Deleted timer {}", id);
        self.record_action("delete", id);
        Ok(())
    }

    /// Total and running timer counts
    pub fn timer_counts(&self) -> Result<(usize, usize), TimerError> {
        let timers = self.store.list()?;
        let running = timers.iter().filter(|t| t.is_running()).count();
        Ok((timers.len(), running))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn load(&self, id: TimerId) -> Result<TimerState, TimerError> {
        self.store.load(id)?.ok_or(TimerError::NotFound(id))
    }

    /// Load, transition and save one timer under its id lock.
    ///
    /// `apply` returns whether the record changed; unchanged records are not
    /// written back.
    fn update_timer<F>(
        &self,
        id: TimerId,
        action: &str,
        apply: F,
    ) -> Result<TimerSnapshot, TimerError>
    where
        F: FnOnce(&mut TimerState, DateTime<Utc>) -> bool,
    {
        let snapshot = self.with_timer_lock(id, || {
            let mut timer = self.load(id)?;
            let now = self.clock.now();
            if apply(&mut timer, now) {
                self.store.save(&timer)?;
            }
            Ok(timer.snapshot(now))
        })?;

        self.record_action(action, id);
        Ok(snapshot)
    }

    fn with_timer_lock<T, F>(&self, id: TimerId, f: F) -> Result<T, TimerError>
    where
        F: FnOnce() -> Result<T, TimerError>,
    {
        // Neither lock can be left half-updated by a panic, so poisoning is ignored
        let lock = {
            let mut locks = self.timer_locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(id).or_default())
        };

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        // Handles are cloned and dropped only under the table lock, so the
        // last one out sees the table's handle alone and removes it
        let mut locks = self.timer_locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks.get(&id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&id);
        }

        result
    }

    fn record_action(&self, action: &str, id: TimerId) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(format!("{} {}", action, id));
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(self.clock.now());
        } else {
            warn!("Failed to record last action time");
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("clock", &self.clock)
            .field("default_label", &self.default_label)
            .field("port", &self.port)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
