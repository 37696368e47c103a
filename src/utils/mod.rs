//! Utilities module for logging, error handling, and helper functions
//!
//! This module provides:
//! - Structured logging with tracing (stderr only)
//! - Error handling types
//! - Numeric helpers shared by the ranking and mock paths

pub mod error;
pub mod logging;

// Re-export main types for convenience
pub use error::{PlantVillageError, Result, ResultExt};
pub use logging::{init_logging, LogConfig, LogLevel};

/// Round to two decimal places, half away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a duration in milliseconds for log lines
pub fn format_millis(duration: std::time::Duration) -> String {
    format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
}
