//! Typed parameter structs for each guarantee kind
//!
//! Guarantee specs travel as raw JSON in the definition; they are parsed
//! into these structs at evaluation time. A spec that does not parse makes
//! its guarantee fail closed, it never aborts evaluation.

use serde::{Deserialize, Serialize};

/// Parameters for a `deliverable` guarantee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverableSpec {
    /// Glob pattern the artifacts must match
    pub pattern: String,
    /// Minimum number of matching artifacts
    #[serde(default = "default_min_count")]
    pub min_count: usize,
}

fn default_min_count() -> usize {
    1
}

/// Parameters for a `content` guarantee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSpec {
    /// Artifact path to inspect
    pub path: String,
    /// Minimum size in bytes
    #[serde(default)]
    pub min_bytes: Option<usize>,
    /// Markdown section headings that must appear as whole lines
    #[serde(default)]
    pub required_sections: Vec<String>,
    /// Top-level keys that must exist when the artifact is structured
    #[serde(default)]
    pub required_keys: Vec<String>,
}

/// Parameters for a `quality` guarantee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySpec {
    /// Structured artifact path to read the metric from
    pub path: String,
    /// JSON pointer to the metric value (e.g. "/totals/line_rate")
    pub metric: String,
    /// Comparison operator
    pub op: CompareOp,
    /// Threshold to compare against
    pub threshold: f64,
}

/// Parameters for a `step_proof` guarantee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepProofSpec {
    /// Path of the opaque marker artifact
    pub marker: String,
}

/// Comparison operators for quality metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
}

impl CompareOp {
    /// Apply the comparison: `metric <op> threshold`
    pub fn holds(&self, metric: f64, threshold: f64) -> bool {
        match self {
            CompareOp::Gte => metric >= threshold,
            CompareOp::Gt => metric > threshold,
            CompareOp::Lte => metric <= threshold,
            CompareOp::Lt => metric < threshold,
            CompareOp::Eq => metric == threshold,
        }
    }

    /// Operator symbol for evidence traces
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Gte => ">=",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
        }
    }
}
