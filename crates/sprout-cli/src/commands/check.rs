//! `sprout check`: conflict report

use anyhow::Result;

use sprout_resolver::{detect_conflicts, ConflictDetectionResult};

use super::{prepare, CommandContext};
use crate::PipelineArgs;

pub fn execute(args: &PipelineArgs, ctx: &CommandContext) -> Result<bool> {
    let prepared = prepare(args, ctx)?;
    let detection = detect_conflicts(&prepared.graph, &prepared.targets, &prepared.config.detection)?;

    if ctx.json {
        ctx.output.json(&detection)?;
    } else {
        report(&detection, ctx);
    }

    Ok(detection.can_proceed)
}

/// Print a detection result for humans
pub fn report(detection: &ConflictDetectionResult, ctx: &CommandContext) {
    let out = &ctx.output;

    if !detection.has_conflicts {
        out.success(&format!(
            "No conflicts among {} tool(s)",
            detection.statistics.nodes_analyzed
        ));
        return;
    }

    out.heading(&format!("{} conflict(s) found", detection.conflicts.len()));
    for conflict in &detection.conflicts {
        out.item(&format!(
            "[{}] {}: {}",
            out.severity(conflict.severity),
            conflict.id,
            conflict.description
        ));
        for strategy in &conflict.suggested_strategies {
            out.item(&format!(
                "    try {} ({:.0}%): {}",
                strategy.strategy.as_str(),
                strategy.confidence * 100.0,
                strategy.rationale
            ));
        }
    }

    if detection.can_proceed {
        out.warn("Installation can proceed, but the conflicts above should be reviewed");
    } else {
        out.error("Critical conflicts block installation; run 'sprout resolve' to fix them");
    }
}
