//! State management module
//!
//! This module contains the timer state machine, its clock and store
//! collaborators, and the shared application state that serializes access.

pub mod app_state;
pub mod clock;
pub mod store;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, TimerError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{MemoryStore, Store, StoreError};
pub use timer_state::{Phase, TimerId, TimerSnapshot, TimerState};
