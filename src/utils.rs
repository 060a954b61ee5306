//! Small helpers shared across modules

use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in milliseconds
pub fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current timestamp in seconds
pub fn current_time_secs() -> u64 {
    current_time_ms() / 1000
}

/// Micro-second timestamp used as JSON-RPC id by the venue's own clients
pub fn current_time_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
