//! # Utility Modules
//!
//! Wrapping tick arithmetic shared by the GPIO decoders, and logging helpers.

pub mod logging;
pub mod tick;

pub use logging::{log_frame_hex, LogThrottle};
pub use tick::{interval, TickTracker};
