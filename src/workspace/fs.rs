//! Filesystem-backed workspace rooted at a directory.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{Workspace, parse_structured};
use crate::error::{CadenceError, Result};

/// Workspace over a real directory of produced artifacts
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    /// Create a workspace rooted at the given directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Workspace for FsWorkspace {
    fn matching(&self, pattern: &str) -> Result<Vec<String>> {
        let full_pattern = self.root.join(pattern);
        let full_pattern = full_pattern
            .to_str()
            .ok_or_else(|| CadenceError::Workspace(format!("non-utf8 pattern: {}", pattern)))?;

        let mut matches = Vec::new();
        let paths = glob::glob(full_pattern)
            .map_err(|e| CadenceError::Workspace(format!("bad pattern {}: {}", pattern, e)))?;
        for entry in paths {
            let path =
                entry.map_err(|e| CadenceError::Workspace(format!("glob error: {}", e)))?;
            if path.is_file() {
                let relative = path.strip_prefix(&self.root).unwrap_or(&path);
                matches.push(relative.to_string_lossy().to_string());
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn read_text(&self, path: &str) -> Result<Option<String>> {
        let full = self.absolute(path);
        if !full.is_file() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(full)?))
    }

    fn read_structured(&self, path: &str) -> Result<Option<Value>> {
        match self.read_text(path)? {
            Some(text) => Ok(Some(parse_structured(path, &text)?)),
            None => Ok(None),
        }
    }
}
