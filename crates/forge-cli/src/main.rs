//! QAOA Forge Command-Line Interface
//!
//! Builds graph lookup tables offline and serves initial QAOA angles.
//!
//! ```text
//! qaoa-forge enumerate --order 7 --output graph7c.txt
//! qaoa-forge index --catalogue graph7c.txt --order 7
//! qaoa-forge init --graph square.json --strategy tqa -p 3 --t-max 1.0
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{enumerate, index, init, inspect, version};
use config::Config;

/// QAOA Forge - graph lookup tables and QAOA angle initialisation
#[derive(Parser)]
#[command(name = "qaoa-forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "QFORGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a graph catalogue into a lookup table
    Index {
        /// Catalogue file
        #[arg(short = 'i', long)]
        catalogue: PathBuf,

        /// Vertex order of the catalogue
        #[arg(short = 'n', long)]
        order: usize,

        /// Output file (defaults to the configured lookup directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate the catalogue of all connected graphs of an order
    Enumerate {
        /// Vertex order
        #[arg(short = 'n', long)]
        order: usize,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute initial angles for a graph
    Init {
        /// Graph file: a JSON adjacency matrix, or an object with
        /// `adjacency_matrix` and optional request fields
        #[arg(short, long)]
        graph: PathBuf,

        /// Strategy (random, fixed, tqa, interp, qibpi, kde, lookup)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Circuit depth
        #[arg(short)]
        p: Option<usize>,

        /// Total annealing time (tqa)
        #[arg(long)]
        t_max: Option<f64>,

        /// Constant mixer angle (fixed)
        #[arg(long, allow_hyphen_values = true)]
        beta: Option<f64>,

        /// Constant cost angle (fixed)
        #[arg(long, allow_hyphen_values = true)]
        gamma: Option<f64>,

        /// Instance class (qibpi)
        #[arg(long)]
        category: Option<String>,

        /// Weight type: weighted or unweighted (qibpi)
        #[arg(long)]
        weight_type: Option<String>,

        /// Comma-separated mixer angles at depth p-1 (interp)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        previous_beta: Option<Vec<f64>>,

        /// Comma-separated cost angles at depth p-1 (interp)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        previous_gamma: Option<Vec<f64>>,

        /// Seed for the random strategy
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show a lookup table or a graph's statistics and certificate
    Inspect {
        /// Lookup table file
        #[arg(short, long)]
        table: Option<PathBuf>,

        /// Vertex order of a table in the configured lookup directory
        #[arg(short = 'n', long)]
        order: Option<usize>,

        /// Graph file to describe
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Recompute every stored certificate
        #[arg(long)]
        verify: bool,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Setup logging
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // Execute command
    let result = match cli.command {
        Commands::Index {
            catalogue,
            order,
            output,
        } => index::execute(&config, &catalogue, order, output.as_deref()),

        Commands::Enumerate { order, output } => enumerate::execute(order, output.as_deref()),

        Commands::Init {
            graph,
            strategy,
            p,
            t_max,
            beta,
            gamma,
            category,
            weight_type,
            previous_beta,
            previous_gamma,
            seed,
        } => {
            let overrides = init::RequestOverrides {
                strategy,
                p,
                t_max,
                beta,
                gamma,
                category,
                weight_type,
                previous_beta,
                previous_gamma,
            };
            init::execute(&config, &graph, overrides, seed)
        }

        Commands::Inspect {
            table,
            order,
            graph,
            verify,
        } => inspect::execute(&config, table.as_deref(), order, graph.as_deref(), verify),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
