//! Timer state structure and stopwatch transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identifier assigned by the store when a timer is created
pub type TimerId = u64;

/// Whether a session is currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    /// Open session and the instant it began
    Running { since: DateTime<Utc> },
}

impl Phase {
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::Running { .. })
    }
}

/// Stopwatch state for one tracked player.
///
/// Only completed sessions are stored in `accumulated_ms`. While running, the
/// visible time is derived from the session start on every read and nothing
/// is committed until `stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    id: TimerId,
    label: String,
    accumulated_ms: u64,
    phase: Phase,
}

impl TimerState {
    /// Create a stopped timer with no accumulated time
    pub fn new(id: TimerId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            accumulated_ms: 0,
            phase: Phase::Stopped,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Instant the open session began, if any
    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        match self.phase {
            Phase::Running { since } => Some(since),
            Phase::Stopped => None,
        }
    }

    /// Open a session at `now`.
    ///
    /// Returns `false` without touching anything if already running.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_running() {
            return false;
        }
        self.phase = Phase::Running { since: now };
        true
    }

    /// Close the open session at `now` and commit its length.
    ///
    /// Returns the credited milliseconds, or `None` if already stopped.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<u64> {
        let Phase::Running { since } = self.phase else {
            return None;
        };
        let delta = (now - since).num_milliseconds();
        if delta < 0 {
            warn!(
                "Clock regression of {}ms on timer {}, clamping session to zero",
                -delta, self.id
            );
        }
        let session_ms = u64::try_from(delta).unwrap_or(0);
        self.accumulated_ms = self.accumulated_ms.saturating_add(session_ms);
        self.phase = Phase::Stopped;
        Some(session_ms)
    }

    /// Committed time plus the open session measured up to `now`
    pub fn current_elapsed(&self, now: DateTime<Utc>) -> u64 {
        match self.phase {
            Phase::Running { since } => self
                .accumulated_ms
                .saturating_add(session_ms(since, now)),
            Phase::Stopped => self.accumulated_ms,
        }
    }

    /// Change the display name; timer fields are untouched
    pub fn rename(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Point-in-time view with the elapsed time derived at `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        TimerSnapshot {
            id: self.id,
            name: self.label.clone(),
            elapsed_time: self.accumulated_ms,
            is_running: self.is_running(),
            start_time: self.session_start().map(|since| since.timestamp_millis()),
            current_time: self.current_elapsed(now),
        }
    }
}

// A clock that moved backwards yields a zero-length session
fn session_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - since).num_milliseconds()).unwrap_or(0)
}

/// Externally visible view of a timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub id: TimerId,
    pub name: String,
    /// Committed milliseconds from completed sessions
    pub elapsed_time: u64,
    pub is_running: bool,
    /// Epoch milliseconds of the open session's start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// Derived milliseconds including the open session
    pub current_time: u64,
}
