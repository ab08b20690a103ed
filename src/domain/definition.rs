//! Loop definition types
//!
//! A LoopDefinition is the read-only template an execution walks through:
//! ordered phases, each phase listing skills and an optional trailing gate.
//! Definitions are supplied by an external composer; the engine re-checks
//! structural integrity at `start` but never interprets skill content.

use serde::{Deserialize, Serialize};

use crate::domain::gate::GateSpec;
use crate::error::{CadenceError, Result};

/// A multi-phase workflow template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopDefinition {
    /// Unique definition identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Ordered phases; execution walks them front to back
    pub phases: Vec<Phase>,
}

/// An ordered stage within a loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Unique phase identifier within the definition
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Skills performed in this phase
    pub skills: Vec<SkillRef>,
    /// Optional trailing gate that must be approved before advancing
    #[serde(default)]
    pub gate: Option<GateSpec>,
    /// Whether failed skills satisfy phase completion
    #[serde(default)]
    pub fail_policy: FailPolicy,
}

/// How a phase treats `failed` skills when checking completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailPolicy {
    /// Failed counts as terminal; the phase can complete around it
    #[default]
    Tolerate,
    /// Failed skills block phase completion until reworked
    Block,
}

/// Reference to a unit of work performed by an external actor
///
/// The content behind `content_handle` is opaque natural-language
/// instruction material; the engine never parses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRef {
    /// Unique skill identifier within the definition
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Whether this skill must reach a terminal state for phase completion
    #[serde(default = "default_required")]
    pub required: bool,
    /// Opaque handle to external instruction content
    #[serde(default)]
    pub content_handle: Option<String>,
}

fn default_required() -> bool {
    true
}

impl LoopDefinition {
    /// Parse a definition from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load and parse a definition from a YAML file
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Structural integrity check: non-empty ordered phases, unique ids,
    /// non-empty skill lists. Primary validation is the composer's job;
    /// this is the engine's re-check at `start`.
    pub fn validate(&self) -> Result<()> {
        if self.phases.is_empty() {
            return Err(CadenceError::MalformedLoop(format!(
                "loop {} has no phases",
                self.id
            )));
        }

        let mut phase_ids = std::collections::HashSet::new();
        let mut skill_ids = std::collections::HashSet::new();
        let mut gate_ids = std::collections::HashSet::new();

        for phase in &self.phases {
            if !phase_ids.insert(phase.id.as_str()) {
                return Err(CadenceError::MalformedLoop(format!(
                    "duplicate phase id: {}",
                    phase.id
                )));
            }
            if phase.skills.is_empty() {
                return Err(CadenceError::MalformedLoop(format!(
                    "phase {} has no skills",
                    phase.id
                )));
            }
            for skill in &phase.skills {
                if !skill_ids.insert(skill.id.as_str()) {
                    return Err(CadenceError::MalformedLoop(format!(
                        "duplicate skill id: {}",
                        skill.id
                    )));
                }
            }
            if let Some(gate) = &phase.gate {
                if !gate_ids.insert(gate.id.as_str()) {
                    return Err(CadenceError::MalformedLoop(format!(
                        "duplicate gate id: {}",
                        gate.id
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gate::ApprovalPolicy;

    fn two_phase_definition() -> LoopDefinition {
        LoopDefinition {
            id: "loop-001".to_string(),
            name: "Feature loop".to_string(),
            phases: vec![
                Phase {
                    id: "p1".to_string(),
                    name: "Design".to_string(),
                    skills: vec![SkillRef {
                        id: "s1".to_string(),
                        name: "Write design doc".to_string(),
                        required: true,
                        content_handle: Some("skills/design.md".to_string()),
                    }],
                    gate: Some(GateSpec {
                        id: "g1".to_string(),
                        name: "Design review".to_string(),
                        policy: ApprovalPolicy::Manual,
                        guarantees: vec![],
                    }),
                    fail_policy: FailPolicy::Tolerate,
                },
                Phase {
                    id: "p2".to_string(),
                    name: "Build".to_string(),
                    skills: vec![SkillRef {
                        id: "s2".to_string(),
                        name: "Implement".to_string(),
                        required: true,
                        content_handle: None,
                    }],
                    gate: None,
                    fail_policy: FailPolicy::Block,
                },
            ],
        }
    }

    #[test]
    fn test_validate_passes_for_well_formed_definition() {
        assert!(two_phase_definition().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_phases() {
        let def = LoopDefinition {
            id: "loop-empty".to_string(),
            name: "Empty".to_string(),
            phases: vec![],
        };
        let err = def.validate().unwrap_err();
        assert!(matches!(err, CadenceError::MalformedLoop(_)));
    }

    #[test]
    fn test_validate_rejects_duplicate_phase_ids() {
        let mut def = two_phase_definition();
        def.phases[1].id = "p1".to_string();
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate phase id"));
    }

    #[test]
    fn test_validate_rejects_duplicate_skill_ids() {
        let mut def = two_phase_definition();
        def.phases[1].skills[0].id = "s1".to_string();
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate skill id"));
    }

    #[test]
    fn test_validate_rejects_phase_without_skills() {
        let mut def = two_phase_definition();
        def.phases[0].skills.clear();
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("has no skills"));
    }

    #[test]
    fn test_from_yaml_applies_defaults() {
        let yaml = r#"
id: loop-yaml
name: From YAML
phases:
  - id: p1
    name: Only phase
    skills:
      - id: s1
        name: Do the thing
"#;
        let def = LoopDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.phases.len(), 1);
        assert!(def.phases[0].skills[0].required);
        assert!(def.phases[0].gate.is_none());
        assert_eq!(def.phases[0].fail_policy, FailPolicy::Tolerate);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let def = two_phase_definition();
        let json = serde_json::to_string(&def).unwrap();
        let parsed: LoopDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, def.id);
        assert_eq!(parsed.phases.len(), 2);
        assert_eq!(parsed.phases[1].fail_policy, FailPolicy::Block);
    }
}
