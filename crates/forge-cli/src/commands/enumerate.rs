//! Enumerate command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use forge_graph::RefinementCanonicalizer;
use forge_index::enumerate::{MAX_ENUMERATION_ORDER, connected_graphs};
use forge_index::{catalogue, expected_count};

/// Execute the enumerate command.
///
/// The catalogue goes to `output`, or to stdout with the summary on stderr.
pub fn execute(order: usize, output: Option<&Path>) -> Result<()> {
    if order == 0 || order > MAX_ENUMERATION_ORDER {
        bail!("Order must be between 1 and {MAX_ENUMERATION_ORDER}, got {order}");
    }

    eprintln!(
        "{} Enumerating connected graphs on {} vertices",
        style("→").cyan().bold(),
        style(order).yellow()
    );

    let graphs = connected_graphs(order, &RefinementCanonicalizer::new());
    if let Some(expected) = expected_count(order) {
        if graphs.len() != expected {
            bail!(
                "Enumeration produced {} graphs, expected {expected}",
                graphs.len()
            );
        }
    }
    let text = catalogue::render_catalogue(&graphs);

    match output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write catalogue: {}", path.display()))?;
            eprintln!(
                "{} {} graphs written to {}",
                style("✓").green().bold(),
                graphs.len(),
                style(path.display()).green()
            );
        }
        None => {
            print!("{text}");
            eprintln!("{} {} graphs", style("✓").green().bold(), graphs.len());
        }
    }

    Ok(())
}
