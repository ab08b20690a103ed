//! Error types for Cadence
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Cadence
#[derive(Debug, Error)]
pub enum CadenceError {
    /// Malformed command input; never mutates state
    #[error("Validation error: {0}")]
    Validation(String),

    /// Command is not valid for the current status
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Loop definition failed the structural re-check at start
    #[error("Malformed loop definition: {0}")]
    MalformedLoop(String),

    /// Execution not found in the engine
    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    /// Skill id does not exist anywhere in the execution
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// Skill is already in a terminal state and its gate is not rejected
    #[error("Skill already terminal: {0}")]
    SkillAlreadyTerminal(String),

    /// Skill exists but does not belong to the current phase
    #[error("Phase mismatch: skill {skill_id} belongs to phase {phase_id}, current phase is {current_phase_id}")]
    PhaseMismatch {
        skill_id: String,
        phase_id: String,
        current_phase_id: String,
    },

    /// Gate id does not match any gate in the execution
    #[error("Gate not found: {0}")]
    GateNotFound(String),

    /// Archival/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Workspace read error
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error (definitions, config)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_not_found_error() {
        let err = CadenceError::ExecutionNotFound("exec-001".to_string());
        assert_eq!(err.to_string(), "Execution not found: exec-001");
    }

    #[test]
    fn test_state_conflict_error() {
        let err = CadenceError::StateConflict("cannot advance past unapproved gate".to_string());
        assert_eq!(
            err.to_string(),
            "State conflict: cannot advance past unapproved gate"
        );
    }

    #[test]
    fn test_phase_mismatch_error() {
        let err = CadenceError::PhaseMismatch {
            skill_id: "s2".to_string(),
            phase_id: "p2".to_string(),
            current_phase_id: "p1".to_string(),
        };
        assert!(err.to_string().contains("s2"));
        assert!(err.to_string().contains("belongs to phase p2"));
        assert!(err.to_string().contains("current phase is p1"));
    }

    #[test]
    fn test_malformed_loop_error() {
        let err = CadenceError::MalformedLoop("duplicate phase id: p1".to_string());
        assert_eq!(
            err.to_string(),
            "Malformed loop definition: duplicate phase id: p1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CadenceError = io_err.into();
        assert!(matches!(err, CadenceError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: CadenceError = json_err.into();
        assert!(matches!(err, CadenceError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(CadenceError::Validation("empty reason".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
