//! Append-only execution log types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Which part of the lifecycle a log entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Phase,
    Skill,
    Gate,
    System,
}

/// One entry in an execution's append-only log
///
/// The engine clamps timestamps so the log is monotonically non-decreasing
/// regardless of clock jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Severity
    pub level: LogLevel,
    /// Lifecycle category
    pub category: LogCategory,
    /// What happened
    pub message: String,
    /// Entry-specific payload data
    #[serde(default)]
    pub context: Value,
}

impl LogEntry {
    /// Create an entry at the given timestamp
    pub fn new(
        timestamp: i64,
        level: LogLevel,
        category: LogCategory,
        message: impl Into<String>,
        context: Value,
    ) -> Self {
        Self {
            timestamp,
            level,
            category,
            message: message.into(),
            context,
        }
    }
}
