//! Guarantee evaluation against a workspace snapshot
//!
//! Evaluation is deterministic and stateless: it reads only the workspace at
//! call time and retains nothing between calls, so re-running after an
//! artifact is fixed passes without any reset. A single bad or unsupported
//! guarantee resolves to a failing result with a reason, never an error that
//! would stop the other guarantees from being scored.

use serde_json::Value;

use crate::domain::gate::Gate;
use crate::domain::guarantee::{Guarantee, GuaranteeKind, GuaranteeResult};
use crate::evaluation::specs::{ContentSpec, DeliverableSpec, QualitySpec, StepProofSpec};
use crate::workspace::Workspace;

/// Aggregated outcome of evaluating every guarantee on a gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateEvaluation {
    /// Which gate was evaluated
    pub gate_id: String,
    /// True iff every required guarantee passed
    pub passed: bool,
    /// Every result, optional guarantees included, for audit
    pub results: Vec<GuaranteeResult>,
}

impl GateEvaluation {
    /// Results of required guarantees that failed
    pub fn failed_required(&self, guarantees: &[Guarantee]) -> Vec<GuaranteeResult> {
        self.results
            .iter()
            .filter(|r| {
                !r.passed
                    && guarantees
                        .iter()
                        .any(|g| g.id == r.guarantee_id && g.required)
            })
            .cloned()
            .collect()
    }
}

/// Evaluate a single guarantee against the workspace
pub fn evaluate(guarantee: &Guarantee, workspace: &dyn Workspace) -> GuaranteeResult {
    match guarantee.kind {
        GuaranteeKind::Deliverable => evaluate_deliverable(guarantee, workspace),
        GuaranteeKind::Content => evaluate_content(guarantee, workspace),
        GuaranteeKind::Quality => evaluate_quality(guarantee, workspace),
        GuaranteeKind::StepProof => evaluate_step_proof(guarantee, workspace),
        GuaranteeKind::Unknown => GuaranteeResult::fail(
            &guarantee.id,
            "UnsupportedGuaranteeType: unknown guarantee kind fails closed",
        ),
    }
}

/// Evaluate every guarantee on a gate; passed iff all required ones pass.
/// Optional guarantees are scored for audit but never block.
pub fn evaluate_gate(gate: &Gate, workspace: &dyn Workspace) -> GateEvaluation {
    let results: Vec<GuaranteeResult> = gate
        .guarantees
        .iter()
        .map(|g| evaluate(g, workspace))
        .collect();
    let passed = aggregate_for_gate(&gate.guarantees, &results);
    GateEvaluation {
        gate_id: gate.id.clone(),
        passed,
        results,
    }
}

/// True iff every required guarantee has a passing result
pub fn aggregate_for_gate(guarantees: &[Guarantee], results: &[GuaranteeResult]) -> bool {
    guarantees.iter().filter(|g| g.required).all(|g| {
        results
            .iter()
            .any(|r| r.guarantee_id == g.id && r.passed)
    })
}

fn parse_spec<T: serde::de::DeserializeOwned>(
    guarantee: &Guarantee,
) -> std::result::Result<T, GuaranteeResult> {
    serde_json::from_value(guarantee.spec.clone()).map_err(|e| {
        GuaranteeResult::fail(
            &guarantee.id,
            format!("malformed {} spec: {}", kind_name(guarantee.kind), e),
        )
    })
}

fn kind_name(kind: GuaranteeKind) -> &'static str {
    match kind {
        GuaranteeKind::Deliverable => "deliverable",
        GuaranteeKind::Content => "content",
        GuaranteeKind::Quality => "quality",
        GuaranteeKind::StepProof => "step_proof",
        GuaranteeKind::Unknown => "unknown",
    }
}

fn evaluate_deliverable(guarantee: &Guarantee, workspace: &dyn Workspace) -> GuaranteeResult {
    let spec: DeliverableSpec = match parse_spec(guarantee) {
        Ok(spec) => spec,
        Err(fail) => return fail,
    };

    let matches = match workspace.matching(&spec.pattern) {
        Ok(matches) => matches,
        Err(e) => {
            return GuaranteeResult::fail(
                &guarantee.id,
                format!("workspace read failed for pattern {}: {}", spec.pattern, e),
            );
        }
    };

    if matches.len() >= spec.min_count {
        GuaranteeResult::pass(
            &guarantee.id,
            format!(
                "found {} artifact(s) matching {} (needed {}): {}",
                matches.len(),
                spec.pattern,
                spec.min_count,
                matches.join(", ")
            ),
        )
    } else {
        GuaranteeResult::fail(
            &guarantee.id,
            format!(
                "found {} artifact(s) matching {}, needed {}",
                matches.len(),
                spec.pattern,
                spec.min_count
            ),
        )
    }
}

fn evaluate_content(guarantee: &Guarantee, workspace: &dyn Workspace) -> GuaranteeResult {
    let spec: ContentSpec = match parse_spec(guarantee) {
        Ok(spec) => spec,
        Err(fail) => return fail,
    };

    let text = match workspace.read_text(&spec.path) {
        Ok(Some(text)) => text,
        Ok(None) => {
            return GuaranteeResult::fail(
                &guarantee.id,
                format!("artifact {} does not exist", spec.path),
            );
        }
        Err(e) => {
            return GuaranteeResult::fail(
                &guarantee.id,
                format!("workspace read failed for {}: {}", spec.path, e),
            );
        }
    };

    let mut problems = Vec::new();

    if let Some(min_bytes) = spec.min_bytes {
        if text.len() < min_bytes {
            problems.push(format!(
                "{} is {} bytes, needed at least {}",
                spec.path,
                text.len(),
                min_bytes
            ));
        }
    }

    for section in &spec.required_sections {
        if !text.lines().any(|line| line.trim() == section.trim()) {
            problems.push(format!("missing section {} in {}", section, spec.path));
        }
    }

    if !spec.required_keys.is_empty() {
        match workspace.read_structured(&spec.path) {
            Ok(Some(value)) => {
                for key in &spec.required_keys {
                    if value.get(key).is_none() {
                        problems.push(format!("missing key {} in {}", key, spec.path));
                    }
                }
            }
            Ok(None) | Err(_) => {
                problems.push(format!("{} is not structured, cannot check keys", spec.path));
            }
        }
    }

    if problems.is_empty() {
        GuaranteeResult::pass(
            &guarantee.id,
            format!("{} satisfies all content checks", spec.path),
        )
    } else {
        GuaranteeResult::fail(&guarantee.id, problems.join("; "))
    }
}

fn evaluate_quality(guarantee: &Guarantee, workspace: &dyn Workspace) -> GuaranteeResult {
    let spec: QualitySpec = match parse_spec(guarantee) {
        Ok(spec) => spec,
        Err(fail) => return fail,
    };

    let value = match workspace.read_structured(&spec.path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            return GuaranteeResult::fail(
                &guarantee.id,
                format!("artifact {} does not exist", spec.path),
            );
        }
        Err(e) => {
            return GuaranteeResult::fail(
                &guarantee.id,
                format!("could not parse {}: {}", spec.path, e),
            );
        }
    };

    let metric = match value.pointer(&spec.metric).and_then(Value::as_f64) {
        Some(metric) => metric,
        None => {
            return GuaranteeResult::fail(
                &guarantee.id,
                format!("metric {} not found in {} or not numeric", spec.metric, spec.path),
            );
        }
    };

    if spec.op.holds(metric, spec.threshold) {
        GuaranteeResult::pass(
            &guarantee.id,
            format!(
                "{}{} = {} satisfies {} {}",
                spec.path,
                spec.metric,
                metric,
                spec.op.symbol(),
                spec.threshold
            ),
        )
    } else {
        GuaranteeResult::fail(
            &guarantee.id,
            format!(
                "{}{} = {} violates {} {}",
                spec.path,
                spec.metric,
                metric,
                spec.op.symbol(),
                spec.threshold
            ),
        )
    }
}

fn evaluate_step_proof(guarantee: &Guarantee, workspace: &dyn Workspace) -> GuaranteeResult {
    let spec: StepProofSpec = match parse_spec(guarantee) {
        Ok(spec) => spec,
        Err(fail) => return fail,
    };

    match workspace.read_text(&spec.marker) {
        Ok(Some(_)) => GuaranteeResult::pass(
            &guarantee.id,
            format!("marker {} exists", spec.marker),
        ),
        Ok(None) => GuaranteeResult::fail(
            &guarantee.id,
            format!("marker {} does not exist", spec.marker),
        ),
        Err(e) => GuaranteeResult::fail(
            &guarantee.id,
            format!("workspace read failed for {}: {}", spec.marker, e),
        ),
    }
}
