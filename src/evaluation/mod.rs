//! Guarantee evaluation
//!
//! Interprets declarative guarantee rules against a workspace of produced
//! artifacts and answers whether a gate's required evidence exists.

pub mod evaluator;
pub mod specs;

pub use evaluator::{GateEvaluation, aggregate_for_gate, evaluate, evaluate_gate};
pub use specs::{CompareOp, ContentSpec, DeliverableSpec, QualitySpec, StepProofSpec};
