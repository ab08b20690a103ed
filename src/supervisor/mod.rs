//! Autonomous gate-passing supervisor
//!
//! Policy layer above an automatic gate's decision point: evaluate the
//! gate's guarantees, retry on failure with a fixed delay, delegate one
//! bounded remediation attempt to an external worker, and escalate to a
//! human when everything is exhausted. The supervisor never force-approves
//! a gate against unresolved required guarantees; escalation is the only
//! fallback path.

pub mod traits;

pub use traits::{
    AttemptKind, AttemptRecord, EscalationEvent, NoOpNotifier, NoOpRemediationWorker, Notifier,
    RemediationStatus, RemediationWorker,
};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::gate::{ApprovalPolicy, Gate, GateStatus};
use crate::engine::ExecutionEngine;
use crate::error::{CadenceError, Result};
use crate::evaluation::{GateEvaluation, evaluate_gate};
use crate::id::now_ms;
use crate::workspace::Workspace;

/// Timing and retry knobs for the supervisor loop
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Retries after the initial evaluation
    pub max_retries: u32,
    /// Fixed delay between retries
    pub retry_delay: Duration,
    /// Bounded wait for the remediation worker
    pub remediation_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(10),
            remediation_timeout: Duration::from_secs(120),
        }
    }
}

/// How one supervisor run over a gate ended
#[derive(Debug, Clone, PartialEq)]
pub enum SupervisorOutcome {
    /// All required guarantees passed; the gate was auto-approved
    AutoApproved { attempts: Vec<AttemptRecord> },
    /// Attempts exhausted; the gate is pending-human and a notification
    /// was emitted
    Escalated(EscalationEvent),
    /// A pause signal interrupted the loop; the gate is pending-human and
    /// no notification was emitted. Resume does not restart the loop.
    Aborted { gate_id: String },
}

/// Drives unattended approval for automatic gates
pub struct AutoSupervisor {
    engine: Arc<Mutex<ExecutionEngine>>,
    workspace: Arc<dyn Workspace>,
    worker: Arc<dyn RemediationWorker>,
    notifier: Arc<dyn Notifier>,
    config: SupervisorConfig,
    /// Gate keys with a run in flight; at most one cycle per gate
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Releases the single-flight reservation when a run exits, on any path
struct FlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl FlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, key: &str) -> Result<Self> {
        let mut guard = set
            .lock()
            .map_err(|e| CadenceError::StateConflict(format!("in-flight lock poisoned: {}", e)))?;
        if !guard.insert(key.to_string()) {
            return Err(CadenceError::StateConflict(format!(
                "an auto-approval cycle is already in flight for {}",
                key
            )));
        }
        Ok(Self {
            set: Arc::clone(set),
            key: key.to_string(),
        })
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.set.lock() {
            guard.remove(&self.key);
        }
    }
}

impl AutoSupervisor {
    /// Create a supervisor over a shared engine, workspace, and collaborators
    pub fn new(
        engine: Arc<Mutex<ExecutionEngine>>,
        workspace: Arc<dyn Workspace>,
        worker: Arc<dyn RemediationWorker>,
        notifier: Arc<dyn Notifier>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            engine,
            workspace,
            worker,
            notifier,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Run one auto-approval cycle for a gate: evaluate, retry, remediate
    /// once, then escalate. Observes the execution's pause signal before
    /// each step and aborts into `pending-human`.
    pub async fn auto_approve(
        &self,
        execution_id: &str,
        gate_id: &str,
    ) -> Result<SupervisorOutcome> {
        let key = format!("{}/{}", execution_id, gate_id);
        let _flight = FlightGuard::acquire(&self.in_flight, &key)?;

        let pause = {
            let engine = self.lock_engine()?;
            let record = engine.get_state(execution_id)?;
            let pi = record
                .find_gate(gate_id)
                .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))?;
            let gate = record.phases[pi]
                .gate
                .as_ref()
                .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))?;
            Self::ensure_eligible(gate)?;
            engine.pause_signal(execution_id)?
        };

        let mut attempts: Vec<AttemptRecord> = Vec::new();

        // Initial evaluation
        let mut gate = self.fresh_gate(execution_id, gate_id)?;
        let mut eval = evaluate_gate(&gate, self.workspace.as_ref());
        Self::push_attempt(&mut attempts, AttemptKind::Initial, &eval);
        if eval.passed {
            return self.approve(execution_id, gate_id, attempts);
        }

        // Bounded retries with a fixed delay, re-evaluating fresh each time
        // to absorb asynchronous completion of upstream work
        for _ in 0..self.config.max_retries {
            if pause.is_paused() {
                return self.abort(execution_id, gate_id).await;
            }
            tokio::time::sleep(self.config.retry_delay).await;
            if pause.is_paused() {
                return self.abort(execution_id, gate_id).await;
            }

            gate = self.fresh_gate(execution_id, gate_id)?;
            eval = evaluate_gate(&gate, self.workspace.as_ref());
            Self::push_attempt(&mut attempts, AttemptKind::Retry, &eval);
            if eval.passed {
                return self.approve(execution_id, gate_id, attempts);
            }
        }

        // One remediation attempt scoped to the missing deliverables
        if pause.is_paused() {
            return self.abort(execution_id, gate_id).await;
        }
        let missing = eval.failed_required(&gate.guarantees);
        log::info!(
            "[{}] invoking remediation worker for gate {} ({} missing guarantee(s))",
            execution_id,
            gate_id,
            missing.len()
        );
        match tokio::time::timeout(
            self.config.remediation_timeout,
            self.worker.remediate(execution_id, gate_id, &missing),
        )
        .await
        {
            Ok(Ok(RemediationStatus::Done)) => {
                log::info!("[{}] remediation worker reported done", execution_id);
            }
            Ok(Ok(RemediationStatus::Failed)) => {
                log::warn!("[{}] remediation worker reported failure", execution_id);
            }
            Ok(Err(e)) => {
                log::warn!("[{}] remediation worker errored: {}", execution_id, e);
            }
            Err(_) => {
                log::warn!(
                    "[{}] remediation worker timed out after {:?}",
                    execution_id,
                    self.config.remediation_timeout
                );
            }
        }

        // Exactly one post-remediation re-check, whatever the worker said
        if pause.is_paused() {
            return self.abort(execution_id, gate_id).await;
        }
        gate = self.fresh_gate(execution_id, gate_id)?;
        eval = evaluate_gate(&gate, self.workspace.as_ref());
        Self::push_attempt(&mut attempts, AttemptKind::PostRemediation, &eval);
        if eval.passed {
            return self.approve(execution_id, gate_id, attempts);
        }

        // Exhausted: escalate with the full failure context
        let event = EscalationEvent {
            execution_id: execution_id.to_string(),
            gate_id: gate_id.to_string(),
            failed_guarantees: eval.failed_required(&gate.guarantees),
            attempts,
        };
        self.lock_engine()?
            .escalate_gate(execution_id, gate_id, "autonomous attempts exhausted")?;
        self.notifier.escalate(event.clone()).await?;
        Ok(SupervisorOutcome::Escalated(event))
    }

    //=== internals ===

    fn lock_engine(&self) -> Result<MutexGuard<'_, ExecutionEngine>> {
        self.engine
            .lock()
            .map_err(|e| CadenceError::StateConflict(format!("engine lock poisoned: {}", e)))
    }

    fn ensure_eligible(gate: &Gate) -> Result<()> {
        if gate.policy != ApprovalPolicy::Automatic {
            return Err(CadenceError::StateConflict(format!(
                "gate {} is not automatic; the supervisor does not apply",
                gate.id
            )));
        }
        match gate.status {
            GateStatus::Approved => Err(CadenceError::StateConflict(format!(
                "gate {} is already approved",
                gate.id
            ))),
            GateStatus::Rejected => Err(CadenceError::StateConflict(format!(
                "gate {} was rejected by a human; the supervisor cannot override",
                gate.id
            ))),
            GateStatus::Pending | GateStatus::PendingHuman => Ok(()),
        }
    }

    /// Re-read the gate from the engine; every evaluation works against the
    /// live definition rather than a cached copy
    fn fresh_gate(&self, execution_id: &str, gate_id: &str) -> Result<Gate> {
        let engine = self.lock_engine()?;
        let record = engine.get_state(execution_id)?;
        let pi = record
            .find_gate(gate_id)
            .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))?;
        record.phases[pi]
            .gate
            .clone()
            .ok_or_else(|| CadenceError::GateNotFound(gate_id.to_string()))
    }

    fn push_attempt(attempts: &mut Vec<AttemptRecord>, kind: AttemptKind, eval: &GateEvaluation) {
        attempts.push(AttemptRecord {
            attempt: attempts.len() as u32 + 1,
            kind,
            passed: eval.passed,
            results: eval.results.clone(),
            at: now_ms(),
        });
    }

    fn approve(
        &self,
        execution_id: &str,
        gate_id: &str,
        attempts: Vec<AttemptRecord>,
    ) -> Result<SupervisorOutcome> {
        let reason = format!(
            "all required guarantees passed on attempt {}",
            attempts.len()
        );
        self.lock_engine()?
            .auto_approve_gate(execution_id, gate_id, &reason)?;
        Ok(SupervisorOutcome::AutoApproved { attempts })
    }

    async fn abort(&self, execution_id: &str, gate_id: &str) -> Result<SupervisorOutcome> {
        log::warn!(
            "[{}] auto-approval of gate {} aborted by pause",
            execution_id,
            gate_id
        );
        self.lock_engine()?
            .escalate_gate(execution_id, gate_id, "auto-approval aborted by pause")?;
        Ok(SupervisorOutcome::Aborted {
            gate_id: gate_id.to_string(),
        })
    }
}
