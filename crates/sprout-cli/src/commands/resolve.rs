//! `sprout resolve`: repair conflicts, then order the result

use anyhow::Result;

use sprout_resolver::{detect_conflicts, resolve_conflicts, ResolutionExecutionResult, StepOutcome};

use super::{order, prepare, CommandContext};
use crate::PipelineArgs;

pub fn execute(args: &PipelineArgs, dry_run: bool, ctx: &CommandContext) -> Result<bool> {
    let prepared = prepare(args, ctx)?;
    let detection = detect_conflicts(&prepared.graph, &prepared.targets, &prepared.config.detection)?;

    let mut policy = prepared.config.resolution.clone();
    if dry_run {
        policy.require_user_confirmation = true;
    }
    let result = resolve_conflicts(&detection, &prepared.graph, &policy)?;

    if ctx.json {
        ctx.output.json(&result)?;
    } else {
        report(&result, ctx);
    }

    Ok(result.success)
}

fn report(result: &ResolutionExecutionResult, ctx: &CommandContext) {
    let out = &ctx.output;

    if result.steps.is_empty() && result.remaining_conflicts.is_empty() {
        out.success("Nothing to resolve");
    } else {
        out.heading(&format!("{} resolution step(s)", result.steps.len()));
    }

    for step in &result.steps {
        let status = match &step.result {
            StepOutcome::Success => "applied".to_string(),
            StepOutcome::Planned => "planned".to_string(),
            StepOutcome::Failure { reason } => format!("failed: {}", reason),
        };
        out.item(&format!("{} [{}] {}", step.conflict_id, status, step.description));
        for effect in &step.side_effects {
            out.item(&format!("    {}", effect));
        }
    }

    for conflict in &result.remaining_conflicts {
        out.warn(&format!(
            "unresolved [{}] {}",
            out.severity(conflict.severity),
            conflict.description
        ));
    }

    out.info(&format!(
        "{} (impact: {:?}, reversible: {})",
        result.summary.description, result.summary.impact, result.summary.reversible
    ));

    if result.applied {
        order::report(&result.installation_order, ctx);
    } else if result.success {
        out.info("Dry run: no changes applied");
    }
}
