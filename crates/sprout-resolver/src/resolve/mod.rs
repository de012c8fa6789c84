//! Conflict resolution
//!
//! Turns a detection result into an ordered list of steps. Each conflict gets
//! at most one strategy; the strategy is planned into a concrete action and,
//! unless the policy asks for a plan only, applied to a private copy of the
//! graph. Detection then runs again so anything the steps did not fix is
//! reported as remaining.

mod actions;
mod policy;
mod strategy;

pub use actions::{ConstraintRewrite, ResolutionAction};
pub use policy::ResolutionPolicy;
pub use strategy::{select_strategy, ResolutionStrategy};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sprout_core::error::SproutError;
use sprout_core::types::DependencyType;

use crate::detect::{
    detect_conflicts, CircularDependency, ConflictDetail, ConflictDetectionResult, ConflictType,
    DetectionOptions,
};
use crate::graph::ToolGraph;
use crate::order::{resolve_installation_order_with, InstallationOrder, OrderingOptions};
use crate::ResolverResult;

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum StepOutcome {
    Success,
    Failure { reason: String },
    /// Planned but not applied
    Planned,
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failure { .. })
    }
}

/// One step taken (or planned) for one conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedResolutionStep {
    pub conflict_id: String,
    pub strategy: ResolutionStrategy,
    /// Missing when the action could not be planned
    pub action: Option<ResolutionAction>,
    pub description: String,
    pub result: StepOutcome,
    pub reversible: bool,
    pub side_effects: Vec<String>,
}

/// How far the resolution moves away from what the descriptors declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub description: String,
    pub impact: ImpactLevel,
    /// Whether every applied or planned step can be undone
    pub reversible: bool,
}

/// Result of a resolution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionExecutionResult {
    pub success: bool,
    /// The resolved graph, or an unmodified copy for a plan
    pub graph: ToolGraph,
    pub installation_order: InstallationOrder,
    pub steps: Vec<ExecutedResolutionStep>,
    pub remaining_conflicts: Vec<ConflictDetail>,
    pub summary: ResolutionSummary,
    /// Targets after substitutions
    pub targets: Vec<String>,
    pub options: DetectionOptions,
    /// False for a plan that has not been committed
    pub applied: bool,
}

impl ResolutionExecutionResult {
    /// Steps waiting for confirmation
    pub fn planned_steps(&self) -> impl Iterator<Item = &ExecutedResolutionStep> {
        self.steps.iter().filter(|step| step.result == StepOutcome::Planned)
    }
}

/// Resolve the conflicts in `detection` against a copy of `graph`
pub fn resolve_conflicts(
    detection: &ConflictDetectionResult,
    graph: &ToolGraph,
    policy: &ResolutionPolicy,
) -> ResolverResult<ResolutionExecutionResult> {
    let plans_only = policy.plans_only();
    let mut working = graph.clone();
    let mut targets = detection.targets.clone();
    let mut steps = Vec::new();
    let mut unhandled = Vec::new();

    let mut conflicts: Vec<&ConflictDetail> = detection.conflicts.iter().collect();
    conflicts.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.id.cmp(&b.id)));

    info!(conflicts = conflicts.len(), plans_only, "resolving conflicts");

    for conflict in conflicts {
        if !plans_only && is_cycle_broken(conflict, &working) {
            debug!(id = %conflict.id, "cycle already broken by an earlier step");
            continue;
        }

        let Some(strategy) = select_strategy(conflict, detection, &working, &targets, policy) else {
            debug!(id = %conflict.id, "no applicable strategy");
            unhandled.push(conflict.clone());
            continue;
        };
        debug!(id = %conflict.id, strategy = ?strategy.kind(), "strategy selected");

        let step = if plans_only {
            plan_step(conflict, strategy, &working)
        } else {
            apply_step(conflict, strategy, &mut working, &mut targets)
        };
        if step.result.is_failure() {
            unhandled.push(conflict.clone());
        }
        steps.push(step);
    }

    if plans_only {
        finish(working, targets, detection.options.clone(), steps, unhandled, false)
    } else {
        let redetected = detect_conflicts(&working, &targets, &detection.options)?;
        finish(
            working,
            redetected.targets,
            detection.options.clone(),
            steps,
            redetected.conflicts,
            true,
        )
    }
}

/// Apply the planned steps of `plan` to a copy of `graph`
pub fn commit_plan(plan: &ResolutionExecutionResult, graph: &ToolGraph) -> ResolverResult<ResolutionExecutionResult> {
    let mut working = graph.clone();
    let mut targets = plan.targets.clone();
    let mut steps = Vec::with_capacity(plan.steps.len());

    for planned in plan.planned_steps() {
        let Some(action) = &planned.action else {
            continue;
        };
        let mut step = planned.clone();
        match action.apply(&mut working, &mut targets) {
            Ok(effects) => {
                step.result = StepOutcome::Success;
                step.side_effects = effects;
            }
            Err(err) => {
                warn!(id = %planned.conflict_id, error = %err, "planned step failed");
                step.result = StepOutcome::Failure {
                    reason: err.to_string(),
                };
            }
        }
        steps.push(step);
    }

    let redetected = detect_conflicts(&working, &targets, &plan.options)?;
    info!(steps = steps.len(), remaining = redetected.conflicts.len(), "plan committed");
    finish(
        working,
        redetected.targets,
        plan.options.clone(),
        steps,
        redetected.conflicts,
        true,
    )
}

/// Undo a successful step. Returns false when there was nothing to undo.
pub fn revert_step(step: &ExecutedResolutionStep, graph: &mut ToolGraph) -> ResolverResult<bool> {
    let Some(action) = &step.action else {
        return Ok(false);
    };
    if step.result != StepOutcome::Success {
        return Ok(false);
    }
    if !step.reversible {
        return Err(SproutError::resolution_step(
            step.strategy.kind().as_str(),
            "the step is irreversible",
        ));
    }

    action.revert(graph)?;
    debug!(id = %step.conflict_id, "step reverted");
    Ok(true)
}

fn plan_step(conflict: &ConflictDetail, strategy: ResolutionStrategy, graph: &ToolGraph) -> ExecutedResolutionStep {
    match ResolutionAction::plan(&strategy, graph) {
        Ok(action) => ExecutedResolutionStep {
            conflict_id: conflict.id.clone(),
            description: action.describe(),
            reversible: action.is_reversible(),
            strategy,
            action: Some(action),
            result: StepOutcome::Planned,
            side_effects: Vec::new(),
        },
        Err(err) => failed_step(conflict, strategy, None, &err),
    }
}

fn apply_step(
    conflict: &ConflictDetail,
    strategy: ResolutionStrategy,
    graph: &mut ToolGraph,
    targets: &mut Vec<String>,
) -> ExecutedResolutionStep {
    let action = match ResolutionAction::plan(&strategy, graph) {
        Ok(action) => action,
        Err(err) => return failed_step(conflict, strategy, None, &err),
    };

    // Work on a scratch copy so a half-applied action leaves no trace
    let mut scratch = graph.clone();
    let mut scratch_targets = targets.clone();
    match action.apply(&mut scratch, &mut scratch_targets) {
        Ok(side_effects) => {
            *graph = scratch;
            *targets = scratch_targets;
            info!(id = %conflict.id, action = %action.describe(), "step applied");
            ExecutedResolutionStep {
                conflict_id: conflict.id.clone(),
                description: action.describe(),
                reversible: action.is_reversible(),
                strategy,
                action: Some(action),
                result: StepOutcome::Success,
                side_effects,
            }
        }
        Err(err) => failed_step(conflict, strategy, Some(action), &err),
    }
}

fn failed_step(
    conflict: &ConflictDetail,
    strategy: ResolutionStrategy,
    action: Option<ResolutionAction>,
    err: &SproutError,
) -> ExecutedResolutionStep {
    warn!(id = %conflict.id, error = %err, "resolution step failed");
    ExecutedResolutionStep {
        conflict_id: conflict.id.clone(),
        description: format!("{} for {} failed", strategy.kind().as_str(), conflict.id),
        reversible: false,
        strategy,
        action,
        result: StepOutcome::Failure {
            reason: err.to_string(),
        },
        side_effects: Vec::new(),
    }
}

/// An earlier relaxation may already have removed one of the cycle's edges
fn is_cycle_broken(conflict: &ConflictDetail, graph: &ToolGraph) -> bool {
    if conflict.conflict_type != ConflictType::CircularDependency {
        return false;
    }
    let cycle = CircularDependency {
        cycle: conflict.tools.clone(),
    };
    cycle.edges().iter().any(|(from, to)| {
        graph
            .edge(from, to)
            .map_or(true, |edge| edge.dependency_type == DependencyType::Conflicts)
    })
}

fn finish(
    graph: ToolGraph,
    targets: Vec<String>,
    options: DetectionOptions,
    steps: Vec<ExecutedResolutionStep>,
    remaining_conflicts: Vec<ConflictDetail>,
    applied: bool,
) -> ResolverResult<ResolutionExecutionResult> {
    let ordering = OrderingOptions {
        include_optional: options.include_optional,
    };
    let installation_order = resolve_installation_order_with(&graph, &targets, &ordering)?;

    let success = remaining_conflicts.is_empty() && !steps.iter().any(|step| step.result.is_failure());
    let summary = summarize(&steps, &remaining_conflicts, applied);

    info!(
        success,
        steps = steps.len(),
        remaining = remaining_conflicts.len(),
        impact = ?summary.impact,
        "conflict resolution finished"
    );

    Ok(ResolutionExecutionResult {
        success,
        graph,
        installation_order,
        steps,
        remaining_conflicts,
        summary,
        targets,
        options,
        applied,
    })
}

fn summarize(steps: &[ExecutedResolutionStep], remaining: &[ConflictDetail], applied: bool) -> ResolutionSummary {
    let effective: Vec<&ExecutedResolutionStep> = steps.iter().filter(|step| !step.result.is_failure()).collect();

    let impact = if effective.iter().any(|step| !step.reversible) {
        ImpactLevel::High
    } else if effective
        .iter()
        .any(|step| matches!(step.strategy, ResolutionStrategy::EdgeRelaxation { .. }))
    {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };

    let failed = steps.len() - effective.len();
    let verb = if applied { "applied" } else { "planned" };
    let mut description = format!("{} step(s) {}", effective.len(), verb);
    if failed > 0 {
        description.push_str(&format!(", {} failed", failed));
    }
    if remaining.is_empty() {
        description.push_str(", no conflicts remain");
    } else {
        description.push_str(&format!(", {} conflict(s) remain", remaining.len()));
    }

    ResolutionSummary {
        description,
        impact,
        reversible: effective.iter().all(|step| step.reversible),
    }
}
