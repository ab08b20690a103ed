//! ID generation utilities for Cadence
//!
//! Provides functions for generating unique identifiers for executions and
//! decisions, and the epoch-millisecond clock used across all records.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// Generate a unique execution ID
///
/// Format: `exec-{timestamp_ms}-{random_hex}`
/// Example: `exec-1738300800123-a1b2`
pub fn generate_execution_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("exec-{}-{:04x}", timestamp, random)
}

/// Generate a decision ID for a gate approval/rejection record
///
/// Format: `dec-{timestamp_ms}-{random_hex}`
pub fn generate_decision_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("dec-{}-{:04x}", timestamp, random)
}
