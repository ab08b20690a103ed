//! Skill instance tracking
//!
//! A SkillInstance is the engine's record of one unit of work. The work
//! itself happens outside the engine; an external actor reports it back as
//! completed, failed, or skipped.

use serde::{Deserialize, Serialize};

use crate::domain::definition::SkillRef;
use crate::id::now_ms;

/// Runtime record of a single skill within an execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillInstance {
    /// Skill identifier from the definition
    pub id: String,
    /// Human-readable name from the definition
    pub name: String,
    /// Whether the phase requires this skill to reach a terminal state
    pub required: bool,
    /// Current status
    pub status: SkillStatus,
    /// Set when the skill first leaves `pending`
    pub started_at: Option<i64>,
    /// Set when the skill reaches a terminal state
    pub completed_at: Option<i64>,
    /// Reported result; present for completed and failed skills
    pub outcome: Option<SkillOutcome>,
    /// Non-empty reason; present iff status is `skipped`
    pub skip_reason: Option<String>,
    /// Number of reworks after a gate rejection (0 for first pass)
    #[serde(default)]
    pub revision: u32,
}

/// Status of a skill instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillStatus {
    /// Not yet reported on
    Pending,
    /// Reported in progress
    Active,
    /// Reported done with an outcome
    Completed,
    /// Deliberately not performed; carries a reason, produces no deliverable
    Skipped,
    /// Reported failed with an outcome
    Failed,
}

impl SkillStatus {
    /// Returns true if the skill has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SkillStatus::Completed | SkillStatus::Skipped | SkillStatus::Failed
        )
    }
}

/// Reported result of a performed skill
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SkillOutcome {
    /// Whether the performer considers the work successful
    pub success: bool,
    /// Quality score in 0..=1
    pub score: f64,
}

impl SkillInstance {
    /// Instantiate a pending skill from its definition reference
    pub fn from_ref(skill_ref: &SkillRef) -> Self {
        Self {
            id: skill_ref.id.clone(),
            name: skill_ref.name.clone(),
            required: skill_ref.required,
            status: SkillStatus::Pending,
            started_at: None,
            completed_at: None,
            outcome: None,
            skip_reason: None,
            revision: 0,
        }
    }

    /// Record a completion or failure outcome
    pub fn record_outcome(&mut self, outcome: SkillOutcome) {
        let now = now_ms();
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        // Rework of an already-terminal skill layers a new revision on top
        if self.status.is_terminal() {
            self.revision += 1;
        }
        self.status = if outcome.success {
            SkillStatus::Completed
        } else {
            SkillStatus::Failed
        };
        self.outcome = Some(outcome);
        self.skip_reason = None;
        self.completed_at = Some(now);
    }

    /// Record a skip with its reason
    pub fn record_skip(&mut self, reason: &str) {
        let now = now_ms();
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.status = SkillStatus::Skipped;
        self.skip_reason = Some(reason.to_string());
        self.outcome = None;
        self.completed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ref() -> SkillRef {
        SkillRef {
            id: "s1".to_string(),
            name: "Write design doc".to_string(),
            required: true,
            content_handle: None,
        }
    }

    #[test]
    fn test_skill_status_is_terminal() {
        assert!(SkillStatus::Completed.is_terminal());
        assert!(SkillStatus::Skipped.is_terminal());
        assert!(SkillStatus::Failed.is_terminal());
        assert!(!SkillStatus::Pending.is_terminal());
        assert!(!SkillStatus::Active.is_terminal());
    }

    #[test]
    fn test_from_ref_starts_pending() {
        let skill = SkillInstance::from_ref(&sample_ref());
        assert_eq!(skill.id, "s1");
        assert_eq!(skill.status, SkillStatus::Pending);
        assert!(skill.required);
        assert!(skill.started_at.is_none());
        assert!(skill.outcome.is_none());
        assert_eq!(skill.revision, 0);
    }

    #[test]
    fn test_record_outcome_success() {
        let mut skill = SkillInstance::from_ref(&sample_ref());
        skill.record_outcome(SkillOutcome {
            success: true,
            score: 0.9,
        });
        assert_eq!(skill.status, SkillStatus::Completed);
        assert!(skill.started_at.is_some());
        assert!(skill.completed_at.is_some());
        assert_eq!(skill.outcome.unwrap().score, 0.9);
        assert_eq!(skill.revision, 0);
    }

    #[test]
    fn test_record_outcome_failure() {
        let mut skill = SkillInstance::from_ref(&sample_ref());
        skill.record_outcome(SkillOutcome {
            success: false,
            score: 0.2,
        });
        assert_eq!(skill.status, SkillStatus::Failed);
    }

    #[test]
    fn test_rework_bumps_revision() {
        let mut skill = SkillInstance::from_ref(&sample_ref());
        skill.record_outcome(SkillOutcome {
            success: true,
            score: 0.5,
        });
        skill.record_outcome(SkillOutcome {
            success: true,
            score: 0.95,
        });
        assert_eq!(skill.revision, 1);
        assert_eq!(skill.outcome.unwrap().score, 0.95);
    }

    #[test]
    fn test_record_skip_sets_reason() {
        let mut skill = SkillInstance::from_ref(&sample_ref());
        skill.record_skip("blocked by external dependency");
        assert_eq!(skill.status, SkillStatus::Skipped);
        assert_eq!(
            skill.skip_reason.as_deref(),
            Some("blocked by external dependency")
        );
        assert!(skill.outcome.is_none());
    }

    #[test]
    fn test_skill_serialization_roundtrip() {
        let mut skill = SkillInstance::from_ref(&sample_ref());
        skill.record_outcome(SkillOutcome {
            success: true,
            score: 1.0,
        });
        let json = serde_json::to_string(&skill).unwrap();
        let parsed: SkillInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, skill);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SkillStatus::Skipped).unwrap(),
            "\"skipped\""
        );
        assert_eq!(
            serde_json::to_string(&SkillStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
