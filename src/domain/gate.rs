//! Gate types
//!
//! A gate is the checkpoint trailing a phase: it must be approved, by
//! policy or by a human, before the execution may advance. The definition
//! side is `GateSpec`; `Gate` is the runtime record with status and the
//! decision trace.

use serde::{Deserialize, Serialize};

use crate::domain::execution::AutonomyLevel;
use crate::domain::guarantee::Guarantee;
use crate::id::{generate_decision_id, now_ms};

/// Gate as declared in a loop definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSpec {
    /// Unique gate identifier within the definition
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Who may approve this gate
    #[serde(default)]
    pub policy: ApprovalPolicy,
    /// Evidence rules checked before unattended approval
    #[serde(default)]
    pub guarantees: Vec<Guarantee>,
}

/// Approval policy for a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// A human must approve
    #[default]
    Manual,
    /// The autonomous supervisor attempts unattended approval
    Automatic,
    /// Automatic under full autonomy, manual otherwise; resolved at start
    AutoIfConfigured,
}

impl ApprovalPolicy {
    /// Collapse `AutoIfConfigured` against the execution's autonomy level.
    /// Resolution happens once at `start`; the runtime gate carries only
    /// `Manual` or `Automatic`.
    pub fn resolve(self, autonomy: AutonomyLevel) -> ApprovalPolicy {
        match self {
            ApprovalPolicy::AutoIfConfigured => match autonomy {
                AutonomyLevel::Full => ApprovalPolicy::Automatic,
                AutonomyLevel::Supervised | AutonomyLevel::Manual => ApprovalPolicy::Manual,
            },
            other => other,
        }
    }
}

/// Status of a runtime gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateStatus {
    /// Awaiting a decision
    Pending,
    /// Autonomous attempts exhausted; waiting on a human
    PendingHuman,
    /// Approved; the phase may advance
    Approved,
    /// Rejected by a human; the phase stays active for rework
    Rejected,
}

/// Who made a gate decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Approver {
    /// A named human
    Human { name: String },
    /// The autonomous supervisor
    Supervisor,
}

/// Record of who decided a gate and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Unique decision identifier
    pub id: String,
    /// Who decided
    pub approver: Approver,
    /// Whether the decision was an approval
    pub approved: bool,
    /// Why, in the decider's words
    pub reason: String,
    /// Unix timestamp in milliseconds
    pub decided_at: i64,
}

impl Decision {
    /// Record a human approval
    pub fn human_approval(approver: &str, reason: &str) -> Self {
        Self {
            id: generate_decision_id(),
            approver: Approver::Human {
                name: approver.to_string(),
            },
            approved: true,
            reason: reason.to_string(),
            decided_at: now_ms(),
        }
    }

    /// Record a human rejection
    pub fn human_rejection(approver: &str, reason: &str) -> Self {
        Self {
            id: generate_decision_id(),
            approver: Approver::Human {
                name: approver.to_string(),
            },
            approved: false,
            reason: reason.to_string(),
            decided_at: now_ms(),
        }
    }

    /// Record an unattended approval by the supervisor; kept distinct from
    /// human approval for audit
    pub fn auto_approval(reason: &str) -> Self {
        Self {
            id: generate_decision_id(),
            approver: Approver::Supervisor,
            approved: true,
            reason: reason.to_string(),
            decided_at: now_ms(),
        }
    }
}

/// Runtime gate within an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Gate identifier from the definition
    pub id: String,
    /// Human-readable name from the definition
    pub name: String,
    /// Resolved approval policy (never `AutoIfConfigured`)
    pub policy: ApprovalPolicy,
    /// Current status
    pub status: GateStatus,
    /// Evidence rules from the definition
    pub guarantees: Vec<Guarantee>,
    /// Decisions in the order they were made; last one is authoritative
    pub decisions: Vec<Decision>,
}

impl Gate {
    /// Build a pending runtime gate, resolving the policy against the
    /// execution's autonomy level
    pub fn from_spec(spec: &GateSpec, autonomy: AutonomyLevel) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            policy: spec.policy.resolve(autonomy),
            status: GateStatus::Pending,
            guarantees: spec.guarantees.clone(),
            decisions: Vec::new(),
        }
    }

    /// Whether the gate blocks phase advancement
    pub fn blocks_advancement(&self) -> bool {
        self.status != GateStatus::Approved
    }

    /// Whether a human rejection is on record. The supervisor must never
    /// override one; only a human approval clears it.
    pub fn human_rejection_on_record(&self) -> bool {
        self.decisions
            .iter()
            .any(|d| !d.approved && matches!(d.approver, Approver::Human { .. }))
            && self.status == GateStatus::Rejected
    }
}
