//! Precomputed angle tables.
//!
//! [`LookupStore`] answers two kinds of query:
//!
//! - by instance class, weight type and depth, from a
//!   [`CategoryParameterTable`] of median optimised angles;
//! - by graph structure, resolving the graph's certificate through a
//!   catalogue [`LookupTable`] and reading that catalogue graph's optimum
//!   from a [`GraphAngleTable`].
//!
//! Both tables are loaded once and never mutated, so a store can be shared
//! behind an `Arc` by any number of readers.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use forge_graph::{CanonicalCertificate, Canonicalizer, GraphRecord, RefinementCanonicalizer};
use forge_index::LookupTable;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::angles::{AngleVector, SourceTag};
use crate::error::{InitError, InitResult};
use crate::strategy::{Initializer, check_depth};

/// Depths served from the category table unless configured otherwise.
pub const DEFAULT_CATEGORY_DEPTHS: RangeInclusive<usize> = 1..=20;

/// Depths for which per-graph optima are tabulated.
pub const GRAPH_LOOKUP_DEPTHS: RangeInclusive<usize> = 1..=3;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Graph-generation family used as a coarse lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceClass {
    /// Erdős–Rényi random graphs.
    #[serde(alias = "erdos_renyi")]
    UniformRandom,
    /// Watts–Strogatz small-world graphs.
    WattsStrogatzSmallWorld,
    /// Random geometric graphs.
    Geometric,
    /// Power-law trees.
    PowerLawTree,
    /// Random 3-regular graphs.
    ThreeRegularGraph,
    /// Random 4-regular graphs.
    FourRegularGraph,
    /// Complete bipartite graphs with a few edges removed.
    NearlyCompleteBiPartite,
}

impl InstanceClass {
    /// Every class, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::UniformRandom,
        Self::WattsStrogatzSmallWorld,
        Self::Geometric,
        Self::PowerLawTree,
        Self::ThreeRegularGraph,
        Self::FourRegularGraph,
        Self::NearlyCompleteBiPartite,
    ];

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UniformRandom => "uniform_random",
            Self::WattsStrogatzSmallWorld => "watts_strogatz_small_world",
            Self::Geometric => "geometric",
            Self::PowerLawTree => "power_law_tree",
            Self::ThreeRegularGraph => "three_regular_graph",
            Self::FourRegularGraph => "four_regular_graph",
            Self::NearlyCompleteBiPartite => "nearly_complete_bi_partite",
        }
    }
}

impl FromStr for InstanceClass {
    type Err = InitError;

    fn from_str(s: &str) -> InitResult<Self> {
        let s = s.trim();
        if s == "erdos_renyi" {
            return Ok(Self::UniformRandom);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| InitError::InvalidCategory(s.to_string()))
    }
}

impl fmt::Display for InstanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the tabulated instances carried edge weights.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WeightType {
    /// Weighted instances.
    Weighted,
    /// Unit-weight instances.
    #[default]
    Unweighted,
}

impl WeightType {
    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weighted => "weighted",
            Self::Unweighted => "unweighted",
        }
    }
}

impl FromStr for WeightType {
    type Err = InitError;

    fn from_str(s: &str) -> InitResult<Self> {
        match s.trim() {
            "weighted" => Ok(Self::Weighted),
            "unweighted" => Ok(Self::Unweighted),
            other => Err(InitError::InvalidParameter(format!(
                "weight type must be 'weighted' or 'unweighted', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for WeightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category table
// ---------------------------------------------------------------------------

type CategoryKey = (InstanceClass, WeightType, usize);

/// Median optimised angles per `(class, weight type, depth)`.
#[derive(Debug, Clone, Default)]
pub struct CategoryParameterTable {
    rows: FxHashMap<CategoryKey, AngleVector>,
}

impl CategoryParameterTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row; a key may only be added once.
    pub fn insert(
        &mut self,
        class: InstanceClass,
        weight_type: WeightType,
        angles: AngleVector,
    ) -> InitResult<()> {
        let key = (class, weight_type, angles.depth());
        if self.rows.contains_key(&key) {
            return Err(InitError::TableFormat(format!(
                "duplicate row for {class}/{weight_type} at depth {}",
                angles.depth()
            )));
        }
        self.rows.insert(key, angles);
        Ok(())
    }

    /// Exact-match lookup.
    pub fn get(
        &self,
        class: InstanceClass,
        weight_type: WeightType,
        depth: usize,
    ) -> Option<&AngleVector> {
        self.rows.get(&(class, weight_type, depth))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse a JSON array of records.
    ///
    /// Each record carries `Source` (an instance class), an optional
    /// `weight_type` (default `unweighted`), the depth as `params.n_layers`,
    /// and `median_beta_i` / `median_gamma_i` for `i = 1..=depth`. Extra
    /// fields are ignored.
    pub fn from_records_str(text: &str) -> InitResult<Self> {
        let records: Vec<Map<String, Value>> = serde_json::from_str(text)?;
        let mut table = Self::new();
        for (index, record) in records.iter().enumerate() {
            let (class, weight_type, angles) = parse_record(record)
                .map_err(|reason| InitError::TableFormat(format!("record {index}: {reason}")))?;
            table.insert(class, weight_type, angles)?;
        }
        Ok(table)
    }

    /// Parse the same records as a CSV export with one header row.
    ///
    /// Empty cells are treated as absent, so rows of a shallow depth may
    /// leave the deeper `median_*` columns blank. Numeric cells are read as
    /// numbers and everything else as text.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> InitResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| InitError::TableFormat(format!("csv header: {e}")))?
            .clone();

        let mut table = Self::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(|e| InitError::TableFormat(format!("row {}: {e}", index + 1)))?;
            let record: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(name, cell)| (name.to_string(), csv_cell(cell)))
                .collect();
            let (class, weight_type, angles) = parse_record(&record)
                .map_err(|reason| InitError::TableFormat(format!("row {}: {reason}", index + 1)))?;
            table.insert(class, weight_type, angles)?;
        }
        Ok(table)
    }

    /// Parse a CSV export held in memory.
    pub fn from_csv_str(text: &str) -> InitResult<Self> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Load a records file from disk: CSV for a `.csv` extension, JSON
    /// otherwise.
    pub fn load(path: impl AsRef<Path>) -> InitResult<Self> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let table = if is_csv {
            let file = File::open(path).map_err(|e| InitError::io(path, e))?;
            Self::from_csv_reader(file)?
        } else {
            let text = fs::read_to_string(path).map_err(|e| InitError::io(path, e))?;
            Self::from_records_str(&text)?
        };
        info!(path = %path.display(), rows = table.len(), "category parameter table loaded");
        Ok(table)
    }
}

fn csv_cell(cell: &str) -> Value {
    cell.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::String(cell.to_string()), Value::Number)
}

fn parse_record(
    record: &Map<String, Value>,
) -> Result<(InstanceClass, WeightType, AngleVector), String> {
    let source = record
        .get("Source")
        .and_then(Value::as_str)
        .ok_or("missing 'Source'")?;
    let class: InstanceClass = source.parse().map_err(|e: InitError| e.to_string())?;

    let weight_type = match record.get("weight_type") {
        None | Some(Value::Null) => WeightType::default(),
        Some(v) => v
            .as_str()
            .ok_or("'weight_type' is not a string")?
            .parse()
            .map_err(|e: InitError| e.to_string())?,
    };

    let depth = record
        .get("params.n_layers")
        .and_then(as_depth)
        .ok_or("missing or invalid 'params.n_layers'")?;

    let column = |name: String| -> Result<f64, String> {
        record
            .get(&name)
            .and_then(Value::as_f64)
            .ok_or_else(|| format!("missing or non-numeric '{name}'"))
    };
    let beta = (1..=depth)
        .map(|i| column(format!("median_beta_{i}")))
        .collect::<Result<Vec<_>, _>>()?;
    let gamma = (1..=depth)
        .map(|i| column(format!("median_gamma_{i}")))
        .collect::<Result<Vec<_>, _>>()?;

    let angles = AngleVector::new(beta, gamma).map_err(|e| e.to_string())?;
    Ok((class, weight_type, angles))
}

/// Depth from a JSON number; exports may write integers as `3.0`.
fn as_depth(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok().filter(|&d| d > 0);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f >= 1.0 && f <= u32::MAX as f64).then_some(f as usize)
}

// ---------------------------------------------------------------------------
// Per-graph table
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct GraphAngleDocument {
    vertex_order: usize,
    entries: Vec<GraphAngleEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphAngleEntry {
    id: u64,
    depth: usize,
    beta: Vec<f64>,
    gamma: Vec<f64>,
}

/// Precomputed optimal angles per catalogue graph and depth.
///
/// How the optima were found is outside this crate; the table is an opaque
/// artifact keyed by the catalogue id of one vertex order.
#[derive(Debug, Clone, Default)]
pub struct GraphAngleTable {
    vertex_order: usize,
    angles: FxHashMap<(u64, usize), AngleVector>,
}

impl GraphAngleTable {
    /// Empty table for catalogue graphs of `vertex_order` vertices.
    pub fn new(vertex_order: usize) -> Self {
        Self {
            vertex_order,
            angles: FxHashMap::default(),
        }
    }

    /// Record the optimum of graph `id` at the angles' depth.
    pub fn insert(&mut self, id: u64, angles: AngleVector) -> InitResult<()> {
        let depth = angles.depth();
        if !GRAPH_LOOKUP_DEPTHS.contains(&depth) {
            return Err(InitError::TableFormat(format!(
                "graph {id}: per-graph optima are tabulated for depths {}..={}, got {depth}",
                GRAPH_LOOKUP_DEPTHS.start(),
                GRAPH_LOOKUP_DEPTHS.end()
            )));
        }
        if self.angles.insert((id, depth), angles).is_some() {
            return Err(InitError::TableFormat(format!(
                "graph {id}: duplicate optimum for depth {depth}"
            )));
        }
        Ok(())
    }

    /// Optimum of graph `id` at `depth`.
    pub fn get(&self, id: u64, depth: usize) -> Option<&AngleVector> {
        self.angles.get(&(id, depth))
    }

    /// Vertex order of the catalogue the ids refer to.
    pub fn vertex_order(&self) -> usize {
        self.vertex_order
    }

    /// Number of `(id, depth)` entries.
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// Parse `{ "vertex_order": n, "entries": [{id, depth, beta, gamma}] }`.
    pub fn from_json_str(text: &str) -> InitResult<Self> {
        let doc: GraphAngleDocument = serde_json::from_str(text)?;
        let mut table = Self::new(doc.vertex_order);
        for entry in doc.entries {
            let angles = AngleVector::new(entry.beta, entry.gamma)?;
            if angles.depth() != entry.depth {
                return Err(InitError::TableFormat(format!(
                    "graph {}: declared depth {} but {} angles",
                    entry.id,
                    entry.depth,
                    angles.depth()
                )));
            }
            table.insert(entry.id, angles)?;
        }
        Ok(table)
    }

    /// Load a per-graph table from disk.
    pub fn load(path: impl AsRef<Path>) -> InitResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| InitError::io(path, e))?;
        let table = Self::from_json_str(&text)?;
        info!(
            path = %path.display(),
            vertex_order = table.vertex_order(),
            entries = table.len(),
            "per-graph angle table loaded"
        );
        Ok(table)
    }
}

/// A catalogue bijection paired with the optima of its graphs.
#[derive(Debug, Clone)]
struct GraphIndex {
    table: LookupTable,
    angles: GraphAngleTable,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Read-only angle tables shared across requests.
pub struct LookupStore {
    categories: CategoryParameterTable,
    category_depths: RangeInclusive<usize>,
    graphs: FxHashMap<usize, GraphIndex>,
    canonicalizer: Arc<dyn Canonicalizer>,
}

impl fmt::Debug for LookupStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut orders: Vec<usize> = self.graphs.keys().copied().collect();
        orders.sort_unstable();
        f.debug_struct("LookupStore")
            .field("category_rows", &self.categories.len())
            .field("category_depths", &self.category_depths)
            .field("graph_orders", &orders)
            .finish_non_exhaustive()
    }
}

impl Default for LookupStore {
    fn default() -> Self {
        Self::new(CategoryParameterTable::default())
    }
}

impl LookupStore {
    /// Store serving `categories` at the default depth range.
    pub fn new(categories: CategoryParameterTable) -> Self {
        Self {
            categories,
            category_depths: DEFAULT_CATEGORY_DEPTHS,
            graphs: FxHashMap::default(),
            canonicalizer: Arc::new(RefinementCanonicalizer::new()),
        }
    }

    /// Restrict category lookups to `depths`.
    #[must_use]
    pub fn with_category_depths(mut self, depths: RangeInclusive<usize>) -> Self {
        self.category_depths = depths;
        self
    }

    /// Use a different canonicalisation backend for [`lookup_by_graph`].
    ///
    /// It must be the backend the catalogue tables were built with.
    ///
    /// [`lookup_by_graph`]: Self::lookup_by_graph
    #[must_use]
    pub fn with_canonicalizer(mut self, canonicalizer: Arc<dyn Canonicalizer>) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    /// Add per-graph optima for one catalogue order.
    pub fn with_graph_table(mut self, table: LookupTable, angles: GraphAngleTable) -> InitResult<Self> {
        let order = table.vertex_order();
        if angles.vertex_order() != order {
            return Err(InitError::TableFormat(format!(
                "angle table is for order {}, lookup table for order {order}",
                angles.vertex_order()
            )));
        }
        if let Some(&(id, _)) = angles.angles.keys().find(|(id, _)| table.certificate_of(*id).is_none()) {
            return Err(InitError::TableFormat(format!(
                "angle table references graph {id}, which is not in the order-{order} catalogue"
            )));
        }
        if self.graphs.insert(order, GraphIndex { table, angles }).is_some() {
            return Err(InitError::TableFormat(format!(
                "more than one per-graph table for order {order}"
            )));
        }
        Ok(self)
    }

    /// Depths the category table serves.
    pub fn category_depths(&self) -> &RangeInclusive<usize> {
        &self.category_depths
    }

    /// Vertex orders with per-graph tables, ascending.
    pub fn graph_orders(&self) -> Vec<usize> {
        let mut orders: Vec<usize> = self.graphs.keys().copied().collect();
        orders.sort_unstable();
        orders
    }

    /// Median angles for an instance class.
    ///
    /// An unknown `category` is `InvalidCategory`; a known category with no
    /// row for the weight type and depth is `NoDataAvailable`.
    pub fn lookup_by_category(
        &self,
        category: &str,
        weight_type: WeightType,
        depth: usize,
    ) -> InitResult<AngleVector> {
        let class: InstanceClass = category.parse()?;
        check_depth(depth)?;
        if !self.category_depths.contains(&depth) {
            return Err(InitError::NoDataAvailable(format!(
                "{class}/{weight_type} at depth {depth} (served depths {}..={})",
                self.category_depths.start(),
                self.category_depths.end()
            )));
        }
        self.categories
            .get(class, weight_type, depth)
            .cloned()
            .ok_or_else(|| {
                InitError::NoDataAvailable(format!("{class}/{weight_type} at depth {depth}"))
            })
    }

    /// Precomputed optimum for the catalogue graph with this certificate.
    pub fn lookup_by_certificate(
        &self,
        certificate: &CanonicalCertificate,
        depth: usize,
    ) -> InitResult<AngleVector> {
        check_depth(depth)?;
        if !GRAPH_LOOKUP_DEPTHS.contains(&depth) {
            return Err(InitError::NoDataAvailable(format!(
                "per-graph optima at depth {depth} (tabulated for {}..={})",
                GRAPH_LOOKUP_DEPTHS.start(),
                GRAPH_LOOKUP_DEPTHS.end()
            )));
        }
        let (order, id) = self
            .graphs
            .iter()
            .find_map(|(&order, index)| index.table.id_of(certificate).map(|id| (order, id)))
            .ok_or_else(|| {
                InitError::NoDataAvailable(format!("graph with certificate {certificate}"))
            })?;
        debug!(order, id, depth, "certificate resolved to catalogue graph");
        self.graphs
            .get(&order)
            .and_then(|index| index.angles.get(id, depth))
            .cloned()
            .ok_or_else(|| {
                InitError::NoDataAvailable(format!("optimum of graph {id} (order {order}) at depth {depth}"))
            })
    }

    /// Precomputed optimum for any graph isomorphic to `graph`.
    pub fn lookup_by_graph(&self, graph: &GraphRecord, depth: usize) -> InitResult<AngleVector> {
        check_depth(depth)?;
        if !self.graphs.contains_key(&graph.order()) {
            return Err(InitError::NoDataAvailable(format!(
                "per-graph optima for {}-vertex graphs",
                graph.order()
            )));
        }
        let certificate = self.canonicalizer.certificate(graph);
        self.lookup_by_certificate(&certificate, depth)
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Serves median angles for a fixed instance class and weight type.
#[derive(Debug, Clone)]
pub struct CategoryLookup {
    store: Arc<LookupStore>,
    category: String,
    weight_type: WeightType,
}

impl CategoryLookup {
    /// Strategy over `store` for one class.
    pub fn new(store: Arc<LookupStore>, category: impl Into<String>, weight_type: WeightType) -> Self {
        Self {
            store,
            category: category.into(),
            weight_type,
        }
    }
}

impl Initializer for CategoryLookup {
    fn source(&self) -> SourceTag {
        SourceTag::Qibpi
    }

    fn initialize(&self, depth: usize, _graph: &GraphRecord) -> InitResult<AngleVector> {
        self.store
            .lookup_by_category(&self.category, self.weight_type, depth)
    }
}

/// Serves the precomputed optimum of the served graph's isomorphism class.
#[derive(Debug, Clone)]
pub struct GraphLookup {
    store: Arc<LookupStore>,
}

impl GraphLookup {
    /// Strategy over `store`.
    pub fn new(store: Arc<LookupStore>) -> Self {
        Self { store }
    }
}

impl Initializer for GraphLookup {
    fn source(&self) -> SourceTag {
        SourceTag::Lookup
    }

    fn initialize(&self, depth: usize, graph: &GraphRecord) -> InitResult<AngleVector> {
        self.store.lookup_by_graph(graph, depth)
    }

    fn optimal_angles(&self) -> bool {
        true
    }
}
