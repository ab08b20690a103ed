//! In-memory workspace fake for tests and simulations.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::Value;

use super::{Workspace, parse_structured};
use crate::error::{CadenceError, Result};

/// Workspace backed by an in-memory path → content map
///
/// Writable so tests can model asynchronous artifact production between
/// supervisor retries.
#[derive(Default)]
pub struct MemoryWorkspace {
    files: RwLock<BTreeMap<String, String>>,
}

impl MemoryWorkspace {
    /// Create an empty workspace
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workspace pre-loaded with files
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let ws = Self::new();
        for (path, content) in files {
            ws.write(path, content);
        }
        ws
    }

    /// Write or overwrite an artifact
    pub fn write(&self, path: &str, content: &str) {
        self.files
            .write()
            .expect("workspace lock poisoned")
            .insert(path.to_string(), content.to_string());
    }

    /// Remove an artifact
    pub fn remove(&self, path: &str) {
        self.files
            .write()
            .expect("workspace lock poisoned")
            .remove(path);
    }
}

impl Workspace for MemoryWorkspace {
    fn matching(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| CadenceError::Workspace(format!("bad pattern {}: {}", pattern, e)))?;
        let files = self.files.read().map_err(|e| CadenceError::Workspace(e.to_string()))?;
        // BTreeMap iteration keeps results sorted
        Ok(files
            .keys()
            .filter(|path| pattern.matches(path))
            .cloned()
            .collect())
    }

    fn read_text(&self, path: &str) -> Result<Option<String>> {
        let files = self.files.read().map_err(|e| CadenceError::Workspace(e.to_string()))?;
        Ok(files.get(path).cloned())
    }

    fn read_structured(&self, path: &str) -> Result<Option<Value>> {
        match self.read_text(path)? {
            Some(text) => Ok(Some(parse_structured(path, &text)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_files_and_matching() {
        let ws = MemoryWorkspace::with_files(&[
            ("docs/plan.md", "# Plan"),
            ("docs/spec.md", "# Spec"),
            ("out/report.json", "{}"),
        ]);
        let matches = ws.matching("docs/*.md").unwrap();
        assert_eq!(matches, vec!["docs/plan.md", "docs/spec.md"]);
    }

    #[test]
    fn test_read_text() {
        let ws = MemoryWorkspace::with_files(&[("notes.txt", "hello")]);
        assert_eq!(ws.read_text("notes.txt").unwrap().as_deref(), Some("hello"));
        assert!(ws.read_text("missing.txt").unwrap().is_none());
    }

    #[test]
    fn test_write_is_visible_to_later_reads() {
        let ws = MemoryWorkspace::new();
        assert!(ws.matching("*.md").unwrap().is_empty());

        ws.write("plan.md", "# Plan");
        assert_eq!(ws.matching("*.md").unwrap(), vec!["plan.md"]);
    }

    #[test]
    fn test_remove() {
        let ws = MemoryWorkspace::with_files(&[("plan.md", "# Plan")]);
        ws.remove("plan.md");
        assert!(ws.read_text("plan.md").unwrap().is_none());
    }

    #[test]
    fn test_read_structured_yaml() {
        let ws = MemoryWorkspace::with_files(&[("config.yaml", "threshold: 0.8\n")]);
        let value = ws.read_structured("config.yaml").unwrap().unwrap();
        assert_eq!(value["threshold"], 0.8);
    }
}
