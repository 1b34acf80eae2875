//! Index command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use forge_index::{CanonicalFormIndexer, expected_count, persist};

use crate::config::Config;

/// Execute the index command.
pub fn execute(
    config: &Config,
    catalogue: &Path,
    order: usize,
    output: Option<&Path>,
) -> Result<()> {
    let expected = expected_count(order)
        .with_context(|| format!("No catalogue size known for order {order}"))?;

    println!(
        "{} Indexing {} (order {}, {} graphs expected)",
        style("→").cyan().bold(),
        style(catalogue.display()).green(),
        style(order).yellow(),
        expected
    );

    let bar = ProgressBar::new(expected as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress template")?,
    );
    bar.set_message("certifying");

    let indexer = CanonicalFormIndexer::new();
    let table = indexer.build_with_progress(catalogue, order, |done| bar.set_position(done as u64));
    bar.finish_and_clear();
    let table = table.with_context(|| format!("Failed to index {}", catalogue.display()))?;

    let [ids, _, certs, _] = table.mapping_sizes();
    println!(
        "{} Indexed {} graphs ({} certificates)",
        style("✓").green().bold(),
        ids,
        certs
    );

    let path: PathBuf = match output {
        Some(path) => path.to_path_buf(),
        None => persist::table_path(config.data.lookup_dir_path(), order),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    persist::save(&path, &table)
        .with_context(|| format!("Failed to write table: {}", path.display()))?;
    println!("  Output: {}", style(path.display()).green());

    Ok(())
}
