//! Inspect command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use forge_graph::{Canonicalizer, GraphRecord, RefinementCanonicalizer, stats};
use forge_index::{LookupTable, expected_count, persist};

use super::common::{load_table, read_graph};
use crate::config::Config;

/// Execute the inspect command.
pub fn execute(
    config: &Config,
    table: Option<&Path>,
    order: Option<usize>,
    graph: Option<&Path>,
    verify: bool,
) -> Result<()> {
    if table.is_none() && order.is_none() && graph.is_none() {
        bail!("Nothing to inspect: pass --table, --order or --graph");
    }

    let canonicalizer = RefinementCanonicalizer::new();

    let loaded = match (table, order) {
        (Some(path), _) => Some(
            persist::load(path)
                .with_context(|| format!("Failed to load table: {}", path.display()))?,
        ),
        (None, Some(order)) => Some(load_table(config, order)?.with_context(|| {
            format!(
                "No table for order {order} in {}",
                config.data.lookup_dir_path().display()
            )
        })?),
        (None, None) => None,
    };

    if let Some(table) = &loaded {
        print_table(table, verify, &canonicalizer)?;
    }

    if let Some(path) = graph {
        let input = read_graph(path)?;
        // Fall back to the configured table for the graph's order.
        let table = match loaded {
            Some(t) if t.vertex_order() == input.graph.order() => Some(t),
            _ => load_table(config, input.graph.order())?,
        };
        print_graph(&input.graph, table.as_ref(), &canonicalizer)?;
    }

    Ok(())
}

fn print_table(
    table: &LookupTable,
    verify: bool,
    canonicalizer: &dyn Canonicalizer,
) -> Result<()> {
    let order = table.vertex_order();
    println!(
        "{} Lookup table for order {}",
        style("→").cyan().bold(),
        style(order).yellow()
    );
    println!("  Entries:  {}", table.len());
    if let Some(expected) = expected_count(order) {
        println!("  Expected: {expected}");
    }

    if verify {
        table.verify()?;
        table
            .verify_certificates(canonicalizer)
            .context("Certificate check failed")?;
        println!(
            "{} All {} certificates verified",
            style("✓").green().bold(),
            table.len()
        );
    }
    Ok(())
}

fn print_graph(
    graph: &GraphRecord,
    table: Option<&LookupTable>,
    canonicalizer: &dyn Canonicalizer,
) -> Result<()> {
    let s = stats::extract(graph)?;

    println!(
        "{} Graph on {} vertices",
        style("→").cyan().bold(),
        style(graph.order()).yellow()
    );
    println!("  Edges:           {}", graph.edge_count());
    println!("  Weighted:        {}", !graph.is_unweighted());
    println!("  Mean degree:     {:.4}", s.mean_degree);
    println!("  Mean |weight|:   {:.4}", s.mean_abs_weight);

    // Certificates are only comparable against catalogue orders.
    if expected_count(graph.order()).is_none() {
        println!(
            "  Certificate:     {}",
            style(format!("skipped, no catalogue for order {}", graph.order())).dim()
        );
        return Ok(());
    }

    let certificate = canonicalizer.certificate(graph);
    println!("  Certificate:     {}", style(&certificate).dim());

    match table.map(|t| t.id_of(&certificate)) {
        Some(Some(id)) => println!("  Catalogue id:    {}", style(id).green()),
        Some(None) => println!("  Catalogue id:    {}", style("not in table").red()),
        None => println!("  Catalogue id:    {}", style("no table loaded").dim()),
    }
    Ok(())
}
