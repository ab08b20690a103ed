//! Durable archive for terminal execution snapshots
//!
//! Snapshots are append-only: an execution is archived once it reaches a
//! terminal status, and later reads return the most recently archived
//! snapshot for an id. The JSONL backend groups snapshots by loop id, one
//! file per loop.

pub mod jsonl;

pub use jsonl::JsonlArchive;

use std::sync::Mutex;

use crate::engine::snapshot::ExecutionSnapshot;
use crate::error::{CadenceError, Result};

/// Sink for archived snapshots
pub trait ArchiveSink: Send + Sync {
    /// Append a snapshot to the archive
    fn archive(&self, snapshot: &ExecutionSnapshot) -> Result<()>;

    /// Most recently archived snapshot for an execution, if any
    fn load(&self, execution_id: &str) -> Result<Option<ExecutionSnapshot>>;

    /// Distinct execution ids present in the archive
    fn execution_ids(&self) -> Result<Vec<String>>;
}

/// In-memory archive for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryArchive {
    snapshots: Mutex<Vec<ExecutionSnapshot>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveSink for MemoryArchive {
    fn archive(&self, snapshot: &ExecutionSnapshot) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .lock()
            .map_err(|e| CadenceError::Storage(e.to_string()))?;
        snapshots.push(snapshot.clone());
        Ok(())
    }

    fn load(&self, execution_id: &str) -> Result<Option<ExecutionSnapshot>> {
        let snapshots = self
            .snapshots
            .lock()
            .map_err(|e| CadenceError::Storage(e.to_string()))?;
        Ok(snapshots
            .iter()
            .rev()
            .find(|s| s.record.execution.id == execution_id)
            .cloned())
    }

    fn execution_ids(&self) -> Result<Vec<String>> {
        let snapshots = self
            .snapshots
            .lock()
            .map_err(|e| CadenceError::Storage(e.to_string()))?;
        let mut ids: Vec<String> = snapshots
            .iter()
            .map(|s| s.record.execution.id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
