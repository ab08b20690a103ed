//! Execution record and related types
//!
//! An Execution is one live run of a LoopDefinition: it owns the current
//! phase pointer, overall status, and the autonomy level that decides how
//! far gates may be passed without a human.

use serde::{Deserialize, Serialize};

use crate::id::{generate_execution_id, now_ms};

/// A single run of a loop definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Execution {
    /// Unique identifier ("exec-1738300800123-a1b2")
    pub id: String,

    /// The loop definition this execution was started from
    pub loop_id: String,

    /// Current status
    pub status: ExecutionStatus,

    /// The phase currently being worked
    pub current_phase_id: String,

    /// How far gates may be passed without a human
    pub autonomy: AutonomyLevel,

    /// Opaque organization/system/module identifiers
    pub context: ExecutionContext,

    //=== Timestamps ===
    pub started_at: i64,
    pub updated_at: i64,
}

/// Status of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Created but not yet started
    Pending,
    /// Actively progressing through phases
    Active,
    /// User-initiated pause (resumable)
    Paused,
    /// All phases done, final gate approved
    Completed,
    /// Unrecoverable terminal error
    Failed,
}

impl ExecutionStatus {
    /// Returns true if the execution accepts no further mutating commands
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// Degree of unattended gate-passing allowed for an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutonomyLevel {
    /// Automatic gates run unattended; AutoIfConfigured resolves to automatic
    Full,
    /// Automatic gates run unattended; AutoIfConfigured resolves to manual
    Supervised,
    /// Every gate waits for a human
    Manual,
}

/// Opaque identifiers carried along for the driving client's benefit;
/// the engine never interprets them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionContext {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
}

impl Execution {
    /// Create a new active execution at the given first phase
    pub fn new(
        loop_id: &str,
        first_phase_id: &str,
        autonomy: AutonomyLevel,
        context: ExecutionContext,
    ) -> Self {
        let now = now_ms();
        Self {
            id: generate_execution_id(),
            loop_id: loop_id.to_string(),
            status: ExecutionStatus::Active,
            current_phase_id: first_phase_id.to_string(),
            autonomy,
            context,
            started_at: now,
            updated_at: now,
        }
    }

    /// Update the timestamp
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_status_is_terminal() {
        assert!(ExecutionStatus::Completed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Active.is_terminal());
        assert!(!ExecutionStatus::Paused.is_terminal());
    }

    #[test]
    fn test_new_execution_starts_active_at_first_phase() {
        let exec = Execution::new(
            "loop-001",
            "p1",
            AutonomyLevel::Full,
            ExecutionContext::default(),
        );
        assert!(exec.id.starts_with("exec-"));
        assert_eq!(exec.loop_id, "loop-001");
        assert_eq!(exec.status, ExecutionStatus::Active);
        assert_eq!(exec.current_phase_id, "p1");
        assert_eq!(exec.autonomy, AutonomyLevel::Full);
        assert!(exec.started_at > 0);
        assert_eq!(exec.started_at, exec.updated_at);
    }

    #[test]
    fn test_touch_updates_timestamp() {
        let mut exec = Execution::new(
            "loop-001",
            "p1",
            AutonomyLevel::Manual,
            ExecutionContext::default(),
        );
        let original = exec.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        exec.touch();
        assert!(exec.updated_at >= original);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_autonomy_serialization() {
        assert_eq!(
            serde_json::to_string(&AutonomyLevel::Full).unwrap(),
            "\"full\""
        );
        assert_eq!(
            serde_json::to_string(&AutonomyLevel::Supervised).unwrap(),
            "\"supervised\""
        );
        assert_eq!(
            serde_json::to_string(&AutonomyLevel::Manual).unwrap(),
            "\"manual\""
        );
    }

    #[test]
    fn test_execution_serialization_roundtrip() {
        let exec = Execution::new(
            "loop-001",
            "p1",
            AutonomyLevel::Supervised,
            ExecutionContext {
                organization: Some("acme".to_string()),
                system: Some("billing".to_string()),
                module: None,
            },
        );
        let json = serde_json::to_string(&exec).unwrap();
        let parsed: Execution = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, exec);
    }
}
