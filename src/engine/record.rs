//! Runtime record of one execution
//!
//! An ExecutionRecord is everything the engine knows about a run: the
//! execution header, per-phase skill instances and gates materialized from
//! the definition at start, and the append-only log. It is the unit that
//! gets snapshotted for archival.

use serde::{Deserialize, Serialize};

use crate::domain::definition::{FailPolicy, LoopDefinition, Phase};
use crate::domain::execution::Execution;
use crate::domain::gate::Gate;
use crate::domain::log::LogEntry;
use crate::domain::skill::{SkillInstance, SkillStatus};

/// Full mutable state of one execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Execution header (status, current phase, autonomy, context)
    pub execution: Execution,
    /// Phase states in definition order
    pub phases: Vec<PhaseState>,
    /// Append-only log, monotonically ordered by timestamp
    pub log: Vec<LogEntry>,
}

/// Runtime state of one phase within an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    /// Phase identifier from the definition
    pub id: String,
    /// Human-readable name from the definition
    pub name: String,
    /// How failed skills are treated for completion
    pub fail_policy: FailPolicy,
    /// Skill instances in definition order
    pub skills: Vec<SkillInstance>,
    /// Trailing gate, if the phase has one
    pub gate: Option<Gate>,
    /// Latched by `complete_phase`; cleared when the gate is rejected
    pub completed: bool,
}

impl PhaseState {
    /// Materialize a pending phase state from its definition
    pub fn from_phase(phase: &Phase, autonomy: crate::domain::execution::AutonomyLevel) -> Self {
        Self {
            id: phase.id.clone(),
            name: phase.name.clone(),
            fail_policy: phase.fail_policy,
            skills: phase.skills.iter().map(SkillInstance::from_ref).collect(),
            gate: phase.gate.as_ref().map(|g| Gate::from_spec(g, autonomy)),
            completed: false,
        }
    }

    /// Required skills that have not reached an acceptable terminal state.
    /// `failed` is acceptable only under the tolerate policy.
    pub fn unfinished_required_skills(&self) -> Vec<&SkillInstance> {
        self.skills
            .iter()
            .filter(|s| s.required)
            .filter(|s| match s.status {
                SkillStatus::Completed | SkillStatus::Skipped => false,
                SkillStatus::Failed => self.fail_policy == FailPolicy::Block,
                SkillStatus::Pending | SkillStatus::Active => true,
            })
            .collect()
    }
}

impl ExecutionRecord {
    /// Build a fresh record from a validated definition
    pub fn new(execution: Execution, definition: &LoopDefinition) -> Self {
        let autonomy = execution.autonomy;
        Self {
            execution,
            phases: definition
                .phases
                .iter()
                .map(|p| PhaseState::from_phase(p, autonomy))
                .collect(),
            log: Vec::new(),
        }
    }

    /// Index of the current phase
    pub fn current_phase_index(&self) -> usize {
        self.phases
            .iter()
            .position(|p| p.id == self.execution.current_phase_id)
            .unwrap_or(0)
    }

    /// The current phase state
    pub fn current_phase(&self) -> &PhaseState {
        &self.phases[self.current_phase_index()]
    }

    /// Locate a skill anywhere in the execution: (phase index, skill index)
    pub fn find_skill(&self, skill_id: &str) -> Option<(usize, usize)> {
        for (pi, phase) in self.phases.iter().enumerate() {
            if let Some(si) = phase.skills.iter().position(|s| s.id == skill_id) {
                return Some((pi, si));
            }
        }
        None
    }

    /// Locate a gate by id: phase index
    pub fn find_gate(&self, gate_id: &str) -> Option<usize> {
        self.phases
            .iter()
            .position(|p| p.gate.as_ref().is_some_and(|g| g.id == gate_id))
    }
}
