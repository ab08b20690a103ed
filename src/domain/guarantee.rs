//! Guarantee types
//!
//! A guarantee is a declarative rule deciding whether a gate's evidence
//! requirement is met. Kind-specific parameters stay as raw JSON here; the
//! evaluation module parses them per kind and fails closed on anything it
//! does not understand.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declarative validation rule attached to a gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guarantee {
    /// Unique guarantee identifier within the gate
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What category of check this is
    pub kind: GuaranteeKind,
    /// Whether a failure blocks the gate; optional guarantees only audit
    #[serde(default = "default_required")]
    pub required: bool,
    /// Kind-specific parameters, parsed at evaluation time
    #[serde(default)]
    pub spec: Value,
}

fn default_required() -> bool {
    true
}

/// Categories of guarantee checks
///
/// Unrecognized kinds deserialize to `Unknown` and always evaluate to a
/// fail-closed result rather than an error or a guessed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuaranteeKind {
    /// Artifacts must exist matching a pattern and minimum count
    Deliverable,
    /// An existing artifact must satisfy structural checks
    Content,
    /// A numeric metric from a structured artifact must meet a threshold
    Quality,
    /// An opaque marker artifact must exist
    StepProof,
    /// Anything the evaluator does not support
    #[serde(other)]
    Unknown,
}

/// Result of evaluating one guarantee against a workspace snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuaranteeResult {
    /// Which guarantee was evaluated
    pub guarantee_id: String,
    /// Whether the guarantee holds
    pub passed: bool,
    /// Human-readable trace of what was checked
    pub evidence: String,
}

impl GuaranteeResult {
    /// A passing result with its evidence trace
    pub fn pass(guarantee_id: &str, evidence: impl Into<String>) -> Self {
        Self {
            guarantee_id: guarantee_id.to_string(),
            passed: true,
            evidence: evidence.into(),
        }
    }

    /// A failing result with its evidence trace
    pub fn fail(guarantee_id: &str, evidence: impl Into<String>) -> Self {
        Self {
            guarantee_id: guarantee_id.to_string(),
            passed: false,
            evidence: evidence.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarantee_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&GuaranteeKind::Deliverable).unwrap(),
            "\"deliverable\""
        );
        assert_eq!(
            serde_json::to_string(&GuaranteeKind::StepProof).unwrap(),
            "\"step_proof\""
        );
    }

    #[test]
    fn test_unknown_kind_deserializes() {
        let kind: GuaranteeKind = serde_json::from_str("\"llm_judge\"").unwrap();
        assert_eq!(kind, GuaranteeKind::Unknown);
    }

    #[test]
    fn test_guarantee_defaults() {
        let json = r#"{"id": "g1", "name": "Plan exists", "kind": "deliverable"}"#;
        let guarantee: Guarantee = serde_json::from_str(json).unwrap();
        assert!(guarantee.required);
        assert!(guarantee.spec.is_null());
    }

    #[test]
    fn test_result_constructors() {
        let pass = GuaranteeResult::pass("g1", "found 2 artifacts matching docs/*.md");
        assert!(pass.passed);
        assert_eq!(pass.guarantee_id, "g1");

        let fail = GuaranteeResult::fail("g2", "no artifact matching out/report.json");
        assert!(!fail.passed);
        assert!(fail.evidence.contains("report.json"));
    }

    #[test]
    fn test_guarantee_serialization_roundtrip() {
        let guarantee = Guarantee {
            id: "g1".to_string(),
            name: "Coverage threshold".to_string(),
            kind: GuaranteeKind::Quality,
            required: true,
            spec: serde_json::json!({
                "path": "coverage.json",
                "metric": "/totals/line_rate",
                "op": "gte",
                "threshold": 0.8
            }),
        };
        let json = serde_json::to_string(&guarantee).unwrap();
        let parsed: Guarantee = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, guarantee);
    }
}
