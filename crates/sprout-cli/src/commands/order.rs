//! `sprout order`: installation order for conflict-free targets

use anyhow::Result;

use sprout_resolver::{detect_conflicts, plan_installation_with, InstallationOrder};

use super::{prepare, CommandContext};
use crate::PipelineArgs;

pub fn execute(args: &PipelineArgs, ctx: &CommandContext) -> Result<bool> {
    let prepared = prepare(args, ctx)?;
    let detection = detect_conflicts(&prepared.graph, &prepared.targets, &prepared.config.detection)?;
    let order = plan_installation_with(&prepared.graph, &detection, &prepared.config.ordering)?;

    if ctx.json {
        ctx.output.json(&order)?;
    } else {
        report(&order, ctx);
    }

    Ok(order.is_complete())
}

/// Print an installation order for humans
pub fn report(order: &InstallationOrder, ctx: &CommandContext) {
    let out = &ctx.output;

    out.heading(&format!(
        "Installation order: {} tool(s) in {} batch(es)",
        order.order.len(),
        order.batches.len()
    ));
    for (index, batch) in order.batches.iter().enumerate() {
        out.item(&format!("{}. {}", index + 1, batch.join(", ")));
    }

    for deferred in &order.deferred {
        out.info(&format!(
            "  deferred: {} -> {} ({})",
            deferred.from, deferred.to, deferred.dependency_type
        ));
    }
    for cycle in &order.circular_dependencies {
        out.warn(&format!("not ordered, circular: {}", cycle.join(", ")));
    }
    if !order.blocked.is_empty() {
        out.warn(&format!("not ordered, waiting on a cycle: {}", order.blocked.join(", ")));
    }
}
