//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - graph lookup tables and QAOA angle initialisation",
        style("QAOA Forge").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  forge-graph  Problem graphs, statistics and canonical certificates");
    println!("  forge-index  Catalogue indexing and lookup table persistence");
    println!("  forge-init   Initialisation strategies and request dispatch");
    println!("  forge-cli    Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style(env!("CARGO_PKG_REPOSITORY")).underlined()
    );
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
