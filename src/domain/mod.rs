//! Domain types for Cadence
//!
//! This module contains all core domain types:
//! - LoopDefinition: the read-only multi-phase workflow template
//! - Execution: one live run of a definition
//! - SkillInstance: engine-side record of an externally performed unit of work
//! - Gate: checkpoint with approval policy, status, and decision trace
//! - Guarantee: declarative evidence rule with its evaluation result
//! - LogEntry: append-only audit log entries

pub mod definition;
pub mod execution;
pub mod gate;
pub mod guarantee;
pub mod log;
pub mod skill;

pub use definition::{FailPolicy, LoopDefinition, Phase, SkillRef};
pub use execution::{AutonomyLevel, Execution, ExecutionContext, ExecutionStatus};
pub use gate::{ApprovalPolicy, Approver, Decision, Gate, GateSpec, GateStatus};
pub use guarantee::{Guarantee, GuaranteeKind, GuaranteeResult};
pub use log::{LogCategory, LogEntry, LogLevel};
pub use skill::{SkillInstance, SkillOutcome, SkillStatus};
