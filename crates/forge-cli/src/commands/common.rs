//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use forge_graph::GraphRecord;
use forge_index::{LookupTable, persist};
use forge_init::{
    CategoryParameterTable, DensityModelRegistry, Dispatcher, GraphAngleTable, LookupStore,
    StrategyKind,
};

use crate::config::Config;

/// Contents of a graph file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GraphDocument {
    /// A bare adjacency matrix.
    Matrix(Vec<Vec<f64>>),
    /// A request body: the matrix plus strategy parameters.
    Request {
        adjacency_matrix: Vec<Vec<f64>>,
        #[serde(flatten)]
        params: Map<String, Value>,
    },
}

/// A validated graph and any request fields stored next to it.
pub struct GraphInput {
    pub graph: GraphRecord,
    pub params: Map<String, Value>,
}

/// Read and validate a graph file.
pub fn read_graph(path: &Path) -> Result<GraphInput> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let document: GraphDocument = serde_json::from_str(&source).with_context(|| {
        format!(
            "{} is neither an adjacency matrix nor an object with 'adjacency_matrix'",
            path.display()
        )
    })?;
    let (matrix, params) = match document {
        GraphDocument::Matrix(m) => (m, Map::new()),
        GraphDocument::Request {
            adjacency_matrix,
            params,
        } => (adjacency_matrix, params),
    };
    let graph = GraphRecord::from_adjacency(&matrix)
        .with_context(|| format!("Invalid graph in {}", path.display()))?;
    Ok(GraphInput { graph, params })
}

/// File holding the per-graph optima of one catalogue order.
pub fn angle_table_path(dir: &Path, order: usize) -> PathBuf {
    dir.join(format!("angles_n{order}.json"))
}

/// Load the resources `kind` needs and build a dispatcher over them.
///
/// Missing data files are not an error here; the strategy reports
/// `NoDataAvailable` for lookups they would have served.
pub fn load_dispatcher(
    config: &Config,
    kind: StrategyKind,
    graph_order: usize,
    seed: Option<u64>,
) -> Result<Dispatcher> {
    let depths = config.serving.min_depth..=config.serving.max_depth;

    let categories = if kind == StrategyKind::Category {
        load_optional(&config.data.category_table_path(), |p| {
            CategoryParameterTable::load(p)
        })?
        .unwrap_or_default()
    } else {
        CategoryParameterTable::default()
    };

    let mut store = LookupStore::new(categories).with_category_depths(depths);

    if kind == StrategyKind::Lookup {
        let dir = config.data.lookup_dir_path();
        let table = load_optional(&persist::table_path(&dir, graph_order), |p| persist::load(p))?;
        let angles = load_optional(&angle_table_path(&dir, graph_order), |p| {
            GraphAngleTable::load(p)
        })?;
        if let (Some(table), Some(angles)) = (table, angles) {
            store = store.with_graph_table(table, angles)?;
        }
    }

    let models = if kind == StrategyKind::Density {
        load_optional(&config.data.density_models_path(), |p| {
            DensityModelRegistry::load(p)
        })?
        .unwrap_or_default()
    } else {
        DensityModelRegistry::default()
    };

    let dispatcher = Dispatcher::new(Arc::new(store), Arc::new(models));
    Ok(match seed.or(config.serving.seed) {
        Some(seed) => dispatcher.with_seed(seed),
        None => dispatcher,
    })
}

/// Load the lookup table of `order` from the configured directory.
pub fn load_table(config: &Config, order: usize) -> Result<Option<LookupTable>> {
    let path = persist::table_path(config.data.lookup_dir_path(), order);
    load_optional(&path, |p| persist::load(p))
}

fn load_optional<T, E>(path: &Path, load: impl FnOnce(&Path) -> Result<T, E>) -> Result<Option<T>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    if !path.exists() {
        debug!(path = %path.display(), "data file not present");
        return Ok(None);
    }
    let value = load(path).with_context(|| format!("Failed to load {}", path.display()))?;
    info!(path = %path.display(), "data file loaded");
    Ok(Some(value))
}
