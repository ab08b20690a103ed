//! Terminal execution snapshots for archival
//!
//! When an execution reaches `completed` or `failed`, the engine exposes a
//! full immutable image of its record. What the archival collaborator does
//! with it afterwards is not the engine's concern; the only contract is
//! that a snapshot survives a serialization round-trip structurally equal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::record::ExecutionRecord;
use crate::error::Result;
use crate::id::now_ms;

/// Immutable export of a terminal execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    /// When the snapshot was captured, epoch milliseconds
    pub exported_at: i64,
    /// Same instant rendered for humans
    pub exported_at_utc: String,
    /// The full execution record: phases, skills, gates, log
    pub record: ExecutionRecord,
}

impl ExecutionSnapshot {
    /// Capture a snapshot of a record
    pub fn capture(record: ExecutionRecord) -> Self {
        let exported_at = now_ms();
        let exported_at_utc = DateTime::<Utc>::from_timestamp_millis(exported_at)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        Self {
            exported_at,
            exported_at_utc,
            record,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstruct from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
