//! Player Timer - An HTTP server that tracks per-player stopwatch time
//!
//! Each player owns a timer that accumulates running time across start/stop
//! cycles. Time is committed on stop; while running it is derived from the
//! session start on every read, so no background ticker is needed.

pub mod config;
pub mod state;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, TimerSnapshot, TimerState};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
