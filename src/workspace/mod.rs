//! Artifact workspace capability interface
//!
//! Guarantee evaluation never touches the filesystem directly; it goes
//! through this small read-only capability so the evaluator can run against
//! an in-memory fake in tests. Workspaces are written by skill performers
//! and remediation workers outside the engine, so every read reflects the
//! workspace at call time; nothing is cached.

mod fs;
mod memory;

pub use fs::FsWorkspace;
pub use memory::MemoryWorkspace;

use serde_json::Value;

use crate::error::Result;

/// Read-only view of the produced-artifact workspace
pub trait Workspace: Send + Sync {
    /// Paths of artifacts matching a glob pattern, sorted for determinism
    fn matching(&self, pattern: &str) -> Result<Vec<String>>;

    /// Text content of an artifact, or None if it does not exist
    fn read_text(&self, path: &str) -> Result<Option<String>>;

    /// Structured content of an artifact (JSON, or YAML by extension),
    /// or None if it does not exist
    fn read_structured(&self, path: &str) -> Result<Option<Value>>;
}

/// Parse artifact text as JSON, or YAML when the path says so.
pub(crate) fn parse_structured(path: &str, text: &str) -> Result<Value> {
    if path.ends_with(".yaml") || path.ends_with(".yml") {
        Ok(serde_yaml::from_str(text)?)
    } else {
        Ok(serde_json::from_str(text)?)
    }
}
