//! The problem graph handed to every initialization strategy.
//!
//! A [`GraphRecord`] is a simple undirected graph on vertices `0..n` with an
//! `f64` weight on every edge. It is immutable once built: construct one with
//! [`GraphBuilder`], or convert a caller-supplied adjacency matrix with
//! [`GraphRecord::from_adjacency`], which enforces the boundary contract
//! (square, finite, symmetric, zero diagonal, connected).
//!
//! # Example
//!
//! ```rust
//! use forge_graph::GraphRecord;
//!
//! // Triangle with one heavy edge.
//! let graph = GraphRecord::from_adjacency(&[
//!     vec![0.0, 1.0, 2.0],
//!     vec![1.0, 0.0, 1.0],
//!     vec![2.0, 1.0, 0.0],
//! ])
//! .unwrap();
//!
//! assert_eq!(graph.order(), 3);
//! assert_eq!(graph.edge_count(), 3);
//! assert_eq!(graph.weight(0, 2), Some(2.0));
//! ```

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, GraphResult};

/// Tolerance used when checking `A[i][j] == A[j][i]`.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// A simple undirected, optionally weighted graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "GraphData", try_from = "GraphData")]
pub struct GraphRecord {
    graph: UnGraph<(), f64>,
}

/// Serialized shape of a [`GraphRecord`]: the order plus an edge list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphData {
    order: usize,
    edges: Vec<(usize, usize, f64)>,
}

impl From<GraphRecord> for GraphData {
    fn from(record: GraphRecord) -> Self {
        Self {
            order: record.order(),
            edges: record.edges().collect(),
        }
    }
}

impl TryFrom<GraphData> for GraphRecord {
    type Error = GraphError;

    fn try_from(data: GraphData) -> GraphResult<Self> {
        let mut builder = GraphBuilder::new(data.order);
        for (u, v, w) in data.edges {
            builder.weighted_edge(u, v, w)?;
        }
        Ok(builder.build())
    }
}

impl GraphRecord {
    /// Convert an adjacency matrix into a validated, connected graph.
    ///
    /// Every non-zero off-diagonal entry becomes an edge carrying that value
    /// as its weight.
    pub fn from_adjacency(matrix: &[Vec<f64>]) -> GraphResult<Self> {
        let n = matrix.len();
        if n == 0 {
            return Err(GraphError::Empty);
        }

        for (row, entries) in matrix.iter().enumerate() {
            if entries.len() != n {
                return Err(GraphError::NotSquare {
                    row,
                    len: entries.len(),
                    expected: n,
                });
            }
            if let Some(col) = entries.iter().position(|x| !x.is_finite()) {
                return Err(GraphError::NonFinite { row, col });
            }
        }

        let mut builder = GraphBuilder::new(n);
        for i in 0..n {
            if matrix[i][i] != 0.0 {
                return Err(GraphError::SelfLoop(i));
            }
            for j in (i + 1)..n {
                if (matrix[i][j] - matrix[j][i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(GraphError::Asymmetric { row: i, col: j });
                }
                if matrix[i][j] != 0.0 {
                    builder.weighted_edge(i, j, matrix[i][j])?;
                }
            }
        }

        let graph = builder.build();
        let components = graph.component_count();
        if components != 1 {
            return Err(GraphError::Disconnected { components });
        }

        debug!(
            order = graph.order(),
            edges = graph.edge_count(),
            "validated adjacency matrix"
        );
        Ok(graph)
    }

    /// Number of vertices.
    #[inline]
    pub fn order(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of undirected edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate over edges as `(u, v, weight)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.graph.edge_references().map(|e| {
            let (a, b) = (e.source().index(), e.target().index());
            (a.min(b), a.max(b), *e.weight())
        })
    }

    /// Weight of the edge `{u, v}`, if present.
    pub fn weight(&self, u: usize, v: usize) -> Option<f64> {
        if u >= self.order() || v >= self.order() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(u), NodeIndex::new(v))
            .and_then(|e| self.graph.edge_weight(e).copied())
    }

    /// Check whether `{u, v}` is an edge.
    #[inline]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.weight(u, v).is_some()
    }

    /// Degree of vertex `v` (0 for out-of-range ids).
    pub fn degree(&self, v: usize) -> usize {
        if v >= self.order() {
            return 0;
        }
        self.graph.neighbors(NodeIndex::new(v)).count()
    }

    /// Neighbours of `v` in no particular order.
    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        (v < self.order())
            .then(|| self.graph.neighbors(NodeIndex::new(v)))
            .into_iter()
            .flatten()
            .map(NodeIndex::index)
    }

    /// Sorted neighbour lists for every vertex.
    pub fn adjacency_lists(&self) -> Vec<Vec<usize>> {
        (0..self.order())
            .map(|v| {
                let mut list: Vec<usize> = self.neighbors(v).collect();
                list.sort_unstable();
                list
            })
            .collect()
    }

    /// Number of connected components (0 for the empty graph).
    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Whether the graph forms a single component.
    pub fn is_connected(&self) -> bool {
        self.component_count() == 1
    }

    /// Whether every edge carries weight 1.
    pub fn is_unweighted(&self) -> bool {
        self.edges().all(|(_, _, w)| w == 1.0)
    }

    /// Dense weighted adjacency matrix (0.0 where no edge exists).
    pub fn to_adjacency(&self) -> Vec<Vec<f64>> {
        let n = self.order();
        let mut matrix = vec![vec![0.0; n]; n];
        for (u, v, w) in self.edges() {
            matrix[u][v] = w;
            matrix[v][u] = w;
        }
        matrix
    }

    /// Return a copy with vertex `v` renamed to `perm[v]`.
    pub fn relabel(&self, perm: &[usize]) -> GraphResult<Self> {
        let n = self.order();
        if perm.len() != n {
            return Err(GraphError::InvalidPermutation(format!(
                "expected {n} entries, got {}",
                perm.len()
            )));
        }
        let mut seen = vec![false; n];
        for &p in perm {
            if p >= n || seen[p] {
                return Err(GraphError::InvalidPermutation(format!(
                    "{perm:?} is not a permutation of 0..{n}"
                )));
            }
            seen[p] = true;
        }

        let mut builder = GraphBuilder::new(n);
        for (u, v, w) in self.edges() {
            builder.weighted_edge(perm[u], perm[v], w)?;
        }
        Ok(builder.build())
    }

    /// Borrow the underlying petgraph graph.
    pub fn as_petgraph(&self) -> &UnGraph<(), f64> {
        &self.graph
    }
}

impl PartialEq for GraphRecord {
    /// Labelled equality: same order and the same weighted edge set.
    fn eq(&self, other: &Self) -> bool {
        if self.order() != other.order() || self.edge_count() != other.edge_count() {
            return false;
        }
        self.edges()
            .all(|(u, v, w)| other.weight(u, v) == Some(w))
    }
}

/// Incremental constructor for [`GraphRecord`].
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    graph: UnGraph<(), f64>,
}

impl GraphBuilder {
    /// Start a graph with `order` isolated vertices.
    pub fn new(order: usize) -> Self {
        let mut graph = UnGraph::with_capacity(order, order.saturating_sub(1));
        for _ in 0..order {
            graph.add_node(());
        }
        Self { graph }
    }

    /// Add an unweighted (weight 1.0) edge.
    pub fn edge(&mut self, u: usize, v: usize) -> GraphResult<&mut Self> {
        self.weighted_edge(u, v, 1.0)
    }

    /// Add an edge with an explicit weight.
    pub fn weighted_edge(&mut self, u: usize, v: usize, weight: f64) -> GraphResult<&mut Self> {
        let order = self.graph.node_count();
        for vertex in [u, v] {
            if vertex >= order {
                return Err(GraphError::VertexOutOfRange { vertex, order });
            }
        }
        if u == v {
            return Err(GraphError::SelfLoop(u));
        }
        if !weight.is_finite() {
            return Err(GraphError::NonFiniteWeight(u, v));
        }
        let (a, b) = (NodeIndex::new(u), NodeIndex::new(v));
        if self.graph.find_edge(a, b).is_some() {
            return Err(GraphError::DuplicateEdge(u.min(v), u.max(v)));
        }
        self.graph.add_edge(a, b, weight);
        Ok(self)
    }

    /// Freeze the graph.
    pub fn build(self) -> GraphRecord {
        GraphRecord { graph: self.graph }
    }
}
