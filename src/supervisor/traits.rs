//! Collaborator interfaces for the autonomous supervisor
//!
//! The supervisor delegates artifact production to an external remediation
//! worker and escalation delivery to an external notifier. Both are opaque
//! async collaborators; no-op implementations exist for tests and for
//! running without either wired up.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::guarantee::GuaranteeResult;
use crate::error::Result;

/// Terminal status reported by a remediation worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationStatus {
    /// Worker believes the missing deliverables were produced
    Done,
    /// Worker gave up
    Failed,
}

/// External delegated agent scoped to produce exactly the deliverables the
/// failed guarantees identified as missing
#[async_trait]
pub trait RemediationWorker: Send + Sync {
    /// Attempt remediation; the supervisor bounds the wait with a timeout
    async fn remediate(
        &self,
        execution_id: &str,
        gate_id: &str,
        missing: &[GuaranteeResult],
    ) -> Result<RemediationStatus>;
}

/// One guarantee-evaluation attempt in the supervisor's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt: u32,
    /// What phase of the algorithm this attempt belonged to
    pub kind: AttemptKind,
    /// Whether all required guarantees passed
    pub passed: bool,
    /// Every guarantee result from this attempt
    pub results: Vec<GuaranteeResult>,
    /// Unix timestamp in milliseconds
    pub at: i64,
}

/// Which step of the supervisor algorithm produced an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    /// First evaluation on entry
    Initial,
    /// Re-evaluation after the fixed inter-retry delay
    Retry,
    /// The single re-check after remediation
    PostRemediation,
}

/// Escalation payload handed to the notification collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationEvent {
    pub execution_id: String,
    pub gate_id: String,
    /// Required guarantees still failing at exhaustion, with evidence
    pub failed_guarantees: Vec<GuaranteeResult>,
    /// Full attempt history, remediation re-check included
    pub attempts: Vec<AttemptRecord>,
}

/// Receives escalation events; delivery mechanics are outside the core
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn escalate(&self, event: EscalationEvent) -> Result<()>;
}

/// Worker that never remediates anything
pub struct NoOpRemediationWorker;

#[async_trait]
impl RemediationWorker for NoOpRemediationWorker {
    async fn remediate(
        &self,
        _execution_id: &str,
        _gate_id: &str,
        _missing: &[GuaranteeResult],
    ) -> Result<RemediationStatus> {
        Ok(RemediationStatus::Failed)
    }
}

/// Notifier that drops events on the floor
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn escalate(&self, _event: EscalationEvent) -> Result<()> {
        Ok(())
    }
}
