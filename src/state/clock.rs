//! Clock sources used to stamp timer sessions

use std::{fmt::Debug, sync::Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Source of the current instant
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Lets tests pin sessions to exact instants, e.g. start at 1000ms and stop
/// at 2000ms, or move backwards to exercise regression handling.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock reading `millis` since the Unix epoch
    pub fn at_millis(millis: i64) -> Self {
        Self {
            now: Mutex::new(millis_to_datetime(millis)),
        }
    }

    /// Jump to `millis` since the Unix epoch
    pub fn set_millis(&self, millis: i64) {
        if let Ok(mut now) = self.now.lock() {
            *now = millis_to_datetime(millis);
        }
    }

    /// Move forward (or backward, for negative values) by `millis`
    pub fn advance_ms(&self, millis: i64) {
        if let Ok(mut now) = self.now.lock() {
            *now += Duration::milliseconds(millis);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}
