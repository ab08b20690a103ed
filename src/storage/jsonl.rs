//! JSONL-backed snapshot archive

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::ArchiveSink;
use crate::engine::snapshot::ExecutionSnapshot;
use crate::error::{CadenceError, Result};

/// Appends snapshots as JSON lines, one file per loop id
pub struct JsonlArchive {
    base_path: PathBuf,
}

impl JsonlArchive {
    /// Create an archive rooted at the given directory
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn loop_path(&self, loop_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", loop_id))
    }

    fn read_file(path: &Path) -> Result<Vec<ExecutionSnapshot>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut snapshots = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                snapshots.push(serde_json::from_str(&line)?);
            }
        }
        Ok(snapshots)
    }

    fn archive_files(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl ArchiveSink for JsonlArchive {
    fn archive(&self, snapshot: &ExecutionSnapshot) -> Result<()> {
        if !snapshot.record.execution.status.is_terminal() {
            return Err(CadenceError::Storage(format!(
                "execution {} is not terminal; refusing to archive",
                snapshot.record.execution.id
            )));
        }
        let path = self.loop_path(&snapshot.record.execution.loop_id);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", serde_json::to_string(snapshot)?)?;
        Ok(())
    }

    fn load(&self, execution_id: &str) -> Result<Option<ExecutionSnapshot>> {
        for path in self.archive_files()? {
            let found = Self::read_file(&path)?
                .into_iter()
                .rev()
                .find(|s| s.record.execution.id == execution_id);
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    fn execution_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for path in self.archive_files()? {
            for snapshot in Self::read_file(&path)? {
                ids.push(snapshot.record.execution.id);
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::definition::{LoopDefinition, Phase, SkillRef};
    use crate::domain::execution::{AutonomyLevel, ExecutionContext, ExecutionStatus};
    use crate::engine::ExecutionEngine;
    use crate::storage::MemoryArchive;
    use tempfile::TempDir;

    fn definition(loop_id: &str) -> LoopDefinition {
        LoopDefinition {
            id: loop_id.to_string(),
            name: "Archive loop".to_string(),
            phases: vec![Phase {
                id: "p1".to_string(),
                name: "Only".to_string(),
                skills: vec![SkillRef {
                    id: "s1".to_string(),
                    name: "Work".to_string(),
                    required: true,
                    content_handle: None,
                }],
                gate: None,
                fail_policy: Default::default(),
            }],
        }
    }

    fn terminal_snapshot(loop_id: &str) -> ExecutionSnapshot {
        let mut engine = ExecutionEngine::new();
        let exec = engine
            .start(
                &definition(loop_id),
                ExecutionContext::default(),
                AutonomyLevel::Manual,
            )
            .unwrap();
        engine.fail(&exec.id, "deadline missed").unwrap();
        engine.export_snapshot(&exec.id).unwrap()
    }

    #[test]
    fn test_archive_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let archive = JsonlArchive::new(temp.path()).unwrap();
        let snapshot = terminal_snapshot("loop-a");

        archive.archive(&snapshot).unwrap();
        let loaded = archive.load(&snapshot.record.execution.id).unwrap();

        assert_eq!(loaded, Some(snapshot));
    }

    #[test]
    fn test_load_missing_returns_none() {
        let temp = TempDir::new().unwrap();
        let archive = JsonlArchive::new(temp.path()).unwrap();
        assert_eq!(archive.load("exec-nope").unwrap(), None);
    }

    #[test]
    fn test_snapshots_group_by_loop() {
        let temp = TempDir::new().unwrap();
        let archive = JsonlArchive::new(temp.path()).unwrap();

        archive.archive(&terminal_snapshot("loop-a")).unwrap();
        archive.archive(&terminal_snapshot("loop-b")).unwrap();

        assert!(temp.path().join("loop-a.jsonl").is_file());
        assert!(temp.path().join("loop-b.jsonl").is_file());
        assert_eq!(archive.execution_ids().unwrap().len(), 2);
    }

    #[test]
    fn test_refuses_non_terminal_snapshot() {
        let temp = TempDir::new().unwrap();
        let archive = JsonlArchive::new(temp.path()).unwrap();

        let mut snapshot = terminal_snapshot("loop-a");
        snapshot.record.execution.status = ExecutionStatus::Active;

        assert!(archive.archive(&snapshot).is_err());
    }

    #[test]
    fn test_persists_across_instances() {
        let temp = TempDir::new().unwrap();
        let snapshot = terminal_snapshot("loop-a");

        {
            let archive = JsonlArchive::new(temp.path()).unwrap();
            archive.archive(&snapshot).unwrap();
        }
        {
            let archive = JsonlArchive::new(temp.path()).unwrap();
            let loaded = archive.load(&snapshot.record.execution.id).unwrap();
            assert!(loaded.is_some());
        }
    }

    #[test]
    fn test_memory_archive_latest_wins() {
        let archive = MemoryArchive::new();
        let first = terminal_snapshot("loop-a");
        let mut second = first.clone();
        second.exported_at += 1;

        archive.archive(&first).unwrap();
        archive.archive(&second).unwrap();

        let loaded = archive.load(&first.record.execution.id).unwrap().unwrap();
        assert_eq!(loaded.exported_at, second.exported_at);
    }
}
