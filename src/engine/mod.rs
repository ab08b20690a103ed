//! Execution engine
//!
//! Owns the lifecycle of runs: phase progression, skill status tracking,
//! gate lifecycle, pause/resume, and the append-only event log. Every
//! command is a synchronous request/response operation that is fully
//! validated before any state write, so a failed command never leaves a
//! partial mutation behind.

pub mod record;
pub mod snapshot;

pub use record::{ExecutionRecord, PhaseState};
pub use snapshot::ExecutionSnapshot;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};

use crate::domain::definition::LoopDefinition;
use crate::domain::execution::{
    AutonomyLevel, Execution, ExecutionContext, ExecutionStatus,
};
use crate::domain::gate::{ApprovalPolicy, Decision, GateStatus};
use crate::domain::log::{LogCategory, LogEntry, LogLevel};
use crate::domain::skill::SkillOutcome;
use crate::error::{CadenceError, Result};
use crate::id::now_ms;

/// Cooperative pause flag shared between the engine and an in-flight
/// supervisor loop. The supervisor checks it before each retry or
/// remediation step and aborts into `pending-human` when it is set.
#[derive(Debug, Clone)]
pub struct PauseSignal(Arc<AtomicBool>);

impl PauseSignal {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Whether the owning execution is paused
    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, paused: bool) {
        self.0.store(paused, Ordering::SeqCst);
    }
}

/// The execution engine: command surface over in-memory execution records
#[derive(Default)]
pub struct ExecutionEngine {
    records: HashMap<String, ExecutionRecord>,
    pause_flags: HashMap<String, PauseSignal>,
}

impl ExecutionEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new execution from a definition, active at the first phase.
    /// The definition is defensively re-checked; a structurally invalid one
    /// fails with `MalformedLoop` and nothing is created.
    pub fn start(
        &mut self,
        definition: &LoopDefinition,
        context: ExecutionContext,
        autonomy: AutonomyLevel,
    ) -> Result<Execution> {
        definition.validate()?;

        let first_phase_id = &definition.phases[0].id;
        let execution = Execution::new(&definition.id, first_phase_id, autonomy, context);
        let mut record = ExecutionRecord::new(execution.clone(), definition);

        Self::append_log(
            &mut record,
            LogLevel::Info,
            LogCategory::System,
            format!(
                "execution {} started from loop {} at phase {}",
                execution.id, definition.id, first_phase_id
            ),
            json!({ "loop_id": definition.id, "phase_id": first_phase_id }),
        );

        self.pause_flags
            .insert(execution.id.clone(), PauseSignal::new());
        self.records.insert(execution.id.clone(), record);
        Ok(execution)
    }

    /// Read-only view of an execution's full state
    pub fn get_state(&self, execution_id: &str) -> Result<&ExecutionRecord> {
        self.records
            .get(execution_id)
            .ok_or_else(|| CadenceError::ExecutionNotFound(execution_id.to_string()))
    }

    /// Pause flag observed by the supervisor loop for this execution
    pub fn pause_signal(&self, execution_id: &str) -> Result<PauseSignal> {
        self.pause_flags
            .get(execution_id)
            .cloned()
            .ok_or_else(|| CadenceError::ExecutionNotFound(execution_id.to_string()))
    }

    /// Report a skill completed or failed with its outcome
    pub fn complete_skill(
        &mut self,
        execution_id: &str,
        skill_id: &str,
        outcome: SkillOutcome,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&outcome.score) {
            return Err(CadenceError::Validation(format!(
                "skill score must be in 0..=1, got {}",
                outcome.score
            )));
        }

        let record = self.record_mut(execution_id)?;
        Self::require_active(record)?;
        let (pi, si) = Self::locate_current_phase_skill(record, skill_id)?;

        record.phases[pi].skills[si].record_outcome(outcome);
        let status = record.phases[pi].skills[si].status;
        let revision = record.phases[pi].skills[si].revision;

        Self::append_log(
            record,
            LogLevel::Info,
            LogCategory::Skill,
            format!("skill {} reported {:?}", skill_id, status),
            json!({
                "skill_id": skill_id,
                "success": outcome.success,
                "score": outcome.score,
                "revision": revision,
            }),
        );
        Ok(())
    }

    /// Mark a skill deliberately skipped; the reason must be non-empty.
    /// Skipped skills satisfy phase progression but produce no deliverable,
    /// so downstream evidence checks can still fail.
    pub fn skip_skill(&mut self, execution_id: &str, skill_id: &str, reason: &str) -> Result<()> {
        if reason.trim().is_empty() {
            return Err(CadenceError::Validation(
                "skip reason must be non-empty".to_string(),
            ));
        }

        let record = self.record_mut(execution_id)?;
        Self::require_active(record)?;
        let (pi, si) = Self::locate_current_phase_skill(record, skill_id)?;

        record.phases[pi].skills[si].record_skip(reason);

        Self::append_log(
            record,
            LogLevel::Info,
            LogCategory::Skill,
            format!("skill {} skipped: {}", skill_id, reason),
            json!({ "skill_id": skill_id, "reason": reason }),
        );
        Ok(())
    }

    /// Latch the current phase as completed. Requires every required skill
    /// to be in an acceptable terminal state per the phase's fail policy.
    /// A trailing gate still blocks `advance_phase` until approved.
    pub fn complete_phase(&mut self, execution_id: &str) -> Result<()> {
        let record = self.record_mut(execution_id)?;
        Self::require_active(record)?;

        let pi = record.current_phase_index();
        let phase = &record.phases[pi];
        if phase.completed {
            return Err(CadenceError::StateConflict(format!(
                "phase {} is already completed",
                phase.id
            )));
        }

        let unfinished: Vec<String> = phase
            .unfinished_required_skills()
            .iter()
            .map(|s| s.id.clone())
            .collect();
        if !unfinished.is_empty() {
            return Err(CadenceError::StateConflict(format!(
                "phase {} has unfinished required skills: {}",
                phase.id,
                unfinished.join(", ")
            )));
        }

        let phase_id = phase.id.clone();
        record.phases[pi].completed = true;
        Self::append_log(
            record,
            LogLevel::Info,
            LogCategory::Phase,
            format!("phase {} completed", phase_id),
            json!({ "phase_id": phase_id }),
        );
        Ok(())
    }

    /// Advance to the next phase, or to the terminal `completed` status if
    /// the current phase was last. Never advances past an unapproved gate:
    /// the attempt returns `StateConflict` and state is unchanged.
    pub fn advance_phase(&mut self, execution_id: &str) -> Result<()> {
        let record = self.record_mut(execution_id)?;
        Self::require_active(record)?;

        let pi = record.current_phase_index();
        let phase = &record.phases[pi];
        if !phase.completed {
            return Err(CadenceError::StateConflict(format!(
                "phase {} is not completed",
                phase.id
            )));
        }
        if let Some(gate) = &phase.gate {
            if gate.blocks_advancement() {
                return Err(CadenceError::StateConflict(format!(
                    "gate {} is not approved (status: {:?})",
                    gate.id, gate.status
                )));
            }
        }

        let from_phase = phase.id.clone();
        if pi + 1 < record.phases.len() {
            let to_phase = record.phases[pi + 1].id.clone();
            record.execution.current_phase_id = to_phase.clone();
            Self::append_log(
                record,
                LogLevel::Info,
                LogCategory::Phase,
                format!("advanced from phase {} to {}", from_phase, to_phase),
                json!({ "from": from_phase, "to": to_phase }),
            );
        } else {
            record.execution.status = ExecutionStatus::Completed;
            Self::append_log(
                record,
                LogLevel::Info,
                LogCategory::System,
                format!("execution completed at final phase {}", from_phase),
                json!({ "final_phase": from_phase }),
            );
        }
        Ok(())
    }

    /// Human approval of the current phase's gate
    pub fn approve_gate(
        &mut self,
        execution_id: &str,
        gate_id: &str,
        approver: &str,
        reason: &str,
    ) -> Result<()> {
        if approver.trim().is_empty() {
            return Err(CadenceError::Validation(
                "approver must be non-empty".to_string(),
            ));
        }

        let record = self.record_mut(execution_id)?;
        Self::require_active(record)?;
        let pi = Self::locate_current_phase_gate(record, gate_id)?;

        let gate = record.phases[pi]
            .gate
            .as_ref()
            .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))?;
        if gate.status == GateStatus::Approved {
            return Err(CadenceError::StateConflict(format!(
                "gate {} is already approved",
                gate_id
            )));
        }

        let decision = Decision::human_approval(approver, reason);
        if let Some(gate) = record.phases[pi].gate.as_mut() {
            gate.decisions.push(decision);
            gate.status = GateStatus::Approved;
        }
        Self::append_log(
            record,
            LogLevel::Info,
            LogCategory::Gate,
            format!("gate {} approved by {}", gate_id, approver),
            json!({ "gate_id": gate_id, "approver": approver, "reason": reason }),
        );
        Ok(())
    }

    /// Human rejection of the current phase's gate. The phase stays active
    /// and its completion latch is cleared; skill outputs survive and
    /// affected skills may be re-completed (layering a new revision).
    pub fn reject_gate(
        &mut self,
        execution_id: &str,
        gate_id: &str,
        approver: &str,
        reason: &str,
    ) -> Result<()> {
        if reason.trim().is_empty() {
            return Err(CadenceError::Validation(
                "rejection reason must be non-empty".to_string(),
            ));
        }

        let record = self.record_mut(execution_id)?;
        Self::require_active(record)?;
        let pi = Self::locate_current_phase_gate(record, gate_id)?;

        let gate = record.phases[pi]
            .gate
            .as_ref()
            .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))?;
        match gate.status {
            GateStatus::Approved => {
                return Err(CadenceError::StateConflict(format!(
                    "gate {} is already approved",
                    gate_id
                )));
            }
            GateStatus::Rejected => {
                return Err(CadenceError::StateConflict(format!(
                    "gate {} is already rejected",
                    gate_id
                )));
            }
            GateStatus::Pending | GateStatus::PendingHuman => {}
        }

        let decision = Decision::human_rejection(approver, reason);
        if let Some(gate) = record.phases[pi].gate.as_mut() {
            gate.decisions.push(decision);
            gate.status = GateStatus::Rejected;
        }
        record.phases[pi].completed = false;
        Self::append_log(
            record,
            LogLevel::Warn,
            LogCategory::Gate,
            format!("gate {} rejected by {}: {}", gate_id, approver, reason),
            json!({ "gate_id": gate_id, "approver": approver, "reason": reason }),
        );
        Ok(())
    }

    /// Unattended approval by the supervisor. Only automatic gates qualify,
    /// and a human rejection on record is never overridden. Recorded as a
    /// distinct auto-approved event for audit.
    pub fn auto_approve_gate(
        &mut self,
        execution_id: &str,
        gate_id: &str,
        reason: &str,
    ) -> Result<()> {
        let record = self.record_mut(execution_id)?;
        Self::require_active(record)?;
        let pi = Self::locate_current_phase_gate(record, gate_id)?;

        let gate = record.phases[pi]
            .gate
            .as_ref()
            .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))?;
        if gate.policy != ApprovalPolicy::Automatic {
            return Err(CadenceError::StateConflict(format!(
                "gate {} is not automatic",
                gate_id
            )));
        }
        match gate.status {
            GateStatus::Approved => {
                return Err(CadenceError::StateConflict(format!(
                    "gate {} is already approved",
                    gate_id
                )));
            }
            GateStatus::Rejected => {
                return Err(CadenceError::StateConflict(format!(
                    "gate {} was rejected by a human; the supervisor cannot override",
                    gate_id
                )));
            }
            GateStatus::Pending | GateStatus::PendingHuman => {}
        }

        let decision = Decision::auto_approval(reason);
        if let Some(gate) = record.phases[pi].gate.as_mut() {
            gate.decisions.push(decision);
            gate.status = GateStatus::Approved;
        }
        Self::append_log(
            record,
            LogLevel::Info,
            LogCategory::Gate,
            format!("gate {} auto-approved: {}", gate_id, reason),
            json!({ "gate_id": gate_id, "reason": reason, "auto": true }),
        );
        Ok(())
    }

    /// Park a gate at `pending-human` after autonomous attempts exhaust or
    /// abort. Allowed while paused, since a pause-triggered abort escalates
    /// the gate it interrupted.
    pub fn escalate_gate(
        &mut self,
        execution_id: &str,
        gate_id: &str,
        reason: &str,
    ) -> Result<()> {
        let record = self.record_mut(execution_id)?;
        if record.execution.status.is_terminal() {
            return Err(CadenceError::StateConflict(format!(
                "execution {} is terminal",
                execution_id
            )));
        }
        let pi = Self::locate_current_phase_gate(record, gate_id)?;

        let gate = record.phases[pi]
            .gate
            .as_ref()
            .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))?;
        match gate.status {
            GateStatus::Approved | GateStatus::Rejected => {
                return Err(CadenceError::StateConflict(format!(
                    "gate {} is already decided",
                    gate_id
                )));
            }
            GateStatus::Pending | GateStatus::PendingHuman => {}
        }

        if let Some(gate) = record.phases[pi].gate.as_mut() {
            gate.status = GateStatus::PendingHuman;
        }
        Self::append_log(
            record,
            LogLevel::Warn,
            LogCategory::Gate,
            format!("gate {} escalated to human: {}", gate_id, reason),
            json!({ "gate_id": gate_id, "reason": reason }),
        );
        Ok(())
    }

    /// Pause the execution and signal any in-flight supervisor loop
    pub fn pause(&mut self, execution_id: &str) -> Result<()> {
        let record = self.record_mut(execution_id)?;
        if record.execution.status != ExecutionStatus::Active {
            return Err(CadenceError::StateConflict(format!(
                "cannot pause execution in status {:?}",
                record.execution.status
            )));
        }
        record.execution.status = ExecutionStatus::Paused;
        Self::append_log(
            record,
            LogLevel::Info,
            LogCategory::System,
            "execution paused".to_string(),
            Value::Null,
        );
        if let Some(flag) = self.pause_flags.get(execution_id) {
            flag.set(true);
        }
        Ok(())
    }

    /// Resume a paused execution. An auto-approval attempt aborted by the
    /// pause is not restarted; the driving client re-triggers it explicitly.
    pub fn resume(&mut self, execution_id: &str) -> Result<()> {
        let record = self.record_mut(execution_id)?;
        if record.execution.status != ExecutionStatus::Paused {
            return Err(CadenceError::StateConflict(format!(
                "cannot resume execution in status {:?}",
                record.execution.status
            )));
        }
        record.execution.status = ExecutionStatus::Active;
        Self::append_log(
            record,
            LogLevel::Info,
            LogCategory::System,
            "execution resumed".to_string(),
            Value::Null,
        );
        if let Some(flag) = self.pause_flags.get(execution_id) {
            flag.set(false);
        }
        Ok(())
    }

    /// Mark an execution failed with an unrecoverable error
    pub fn fail(&mut self, execution_id: &str, reason: &str) -> Result<()> {
        let record = self.record_mut(execution_id)?;
        if record.execution.status.is_terminal() {
            return Err(CadenceError::StateConflict(format!(
                "execution {} is already terminal",
                execution_id
            )));
        }
        record.execution.status = ExecutionStatus::Failed;
        Self::append_log(
            record,
            LogLevel::Error,
            LogCategory::System,
            format!("execution failed: {}", reason),
            json!({ "reason": reason }),
        );
        Ok(())
    }

    /// Export the full immutable snapshot of a terminal execution for the
    /// archival collaborator
    pub fn export_snapshot(&self, execution_id: &str) -> Result<ExecutionSnapshot> {
        let record = self.get_state(execution_id)?;
        if !record.execution.status.is_terminal() {
            return Err(CadenceError::StateConflict(format!(
                "execution {} is not terminal; snapshot export requires completed or failed",
                execution_id
            )));
        }
        Ok(ExecutionSnapshot::capture(record.clone()))
    }

    //=== internals ===

    fn record_mut(&mut self, execution_id: &str) -> Result<&mut ExecutionRecord> {
        self.records
            .get_mut(execution_id)
            .ok_or_else(|| CadenceError::ExecutionNotFound(execution_id.to_string()))
    }

    fn require_active(record: &ExecutionRecord) -> Result<()> {
        match record.execution.status {
            ExecutionStatus::Active => Ok(()),
            status => Err(CadenceError::StateConflict(format!(
                "execution {} is {:?}; command requires active",
                record.execution.id, status
            ))),
        }
    }

    /// Validate a skill command target: skill exists, belongs to the
    /// current phase, and is not terminal unless the phase's gate was
    /// rejected (which re-opens skills for rework).
    fn locate_current_phase_skill(
        record: &ExecutionRecord,
        skill_id: &str,
    ) -> Result<(usize, usize)> {
        let (pi, si) = record
            .find_skill(skill_id)
            .ok_or_else(|| CadenceError::UnknownSkill(skill_id.to_string()))?;
        let current = record.current_phase_index();
        if pi != current {
            return Err(CadenceError::PhaseMismatch {
                skill_id: skill_id.to_string(),
                phase_id: record.phases[pi].id.clone(),
                current_phase_id: record.phases[current].id.clone(),
            });
        }
        let phase = &record.phases[pi];
        if phase.skills[si].status.is_terminal() {
            let gate_rejected = phase
                .gate
                .as_ref()
                .is_some_and(|g| g.status == GateStatus::Rejected);
            if !gate_rejected {
                return Err(CadenceError::SkillAlreadyTerminal(skill_id.to_string()));
            }
        }
        Ok((pi, si))
    }

    fn locate_current_phase_gate(record: &ExecutionRecord, gate_id: &str) -> Result<usize> {
        let pi = record
            .find_gate(gate_id)
            .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))?;
        let current = record.current_phase_index();
        if pi != current {
            return Err(CadenceError::StateConflict(format!(
                "gate {} does not trail the current phase {}",
                gate_id, record.phases[current].id
            )));
        }
        Ok(pi)
    }

    /// Append a log entry with a timestamp clamped to be non-decreasing,
    /// mirrored through the process logger.
    fn append_log(
        record: &mut ExecutionRecord,
        level: LogLevel,
        category: LogCategory,
        message: String,
        context: Value,
    ) {
        let last = record.log.last().map(|e| e.timestamp).unwrap_or(0);
        let ts = now_ms().max(last);
        match level {
            LogLevel::Info => log::info!("[{}] {}", record.execution.id, message),
            LogLevel::Warn => log::warn!("[{}] {}", record.execution.id, message),
            LogLevel::Error => log::error!("[{}] {}", record.execution.id, message),
        }
        record.log.push(LogEntry::new(ts, level, category, message, context));
        record.execution.updated_at = ts;
    }
}
