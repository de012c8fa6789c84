//! `sprout stats`: structural metrics of the graph

use anyhow::Result;

use super::{prepare, CommandContext};
use crate::PipelineArgs;

pub fn execute(args: &PipelineArgs, ctx: &CommandContext) -> Result<bool> {
    let prepared = prepare(args, ctx)?;
    let stats = prepared.graph.statistics();

    if ctx.json {
        ctx.output.json(&stats)?;
        return Ok(true);
    }

    let out = &ctx.output;
    out.heading(&format!("Dependency graph for {}", prepared.platform));
    out.item(&format!("tools:                 {}", stats.node_count));
    out.item(&format!(
        "edges:                 {} ({} required, {} optional, {} suggested, {} conflicts)",
        stats.edge_count, stats.required_edges, stats.optional_edges, stats.suggested_edges, stats.conflict_edges
    ));
    out.item(&format!("connected components:  {}", stats.connected_components));
    out.item(&format!("cyclomatic complexity: {}", stats.cyclomatic_complexity));
    out.item(&format!("average out-degree:    {:.2}", stats.average_out_degree));
    out.item(&format!("density:               {:.4}", stats.density));

    Ok(true)
}
