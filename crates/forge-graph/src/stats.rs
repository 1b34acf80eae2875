//! Normalisation statistics used to rescale transferred angles.

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::graph::GraphRecord;

/// Per-request scale of a problem graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Sum of vertex degrees divided by the vertex count.
    pub mean_degree: f64,
    /// Sum of absolute edge weights divided by the edge count.
    pub mean_abs_weight: f64,
}

/// Compute [`GraphStats`] for a graph.
///
/// A graph without edges is rejected: its mean edge weight is undefined, and
/// a connected graph on two or more vertices always has an edge.
pub fn extract(graph: &GraphRecord) -> GraphResult<GraphStats> {
    let edges = graph.edge_count();
    if edges == 0 {
        return Err(GraphError::NoEdges);
    }

    let degree_sum: usize = (0..graph.order()).map(|v| graph.degree(v)).sum();
    let weight_sum: f64 = graph.edges().map(|(_, _, w)| w.abs()).sum();

    Ok(GraphStats {
        mean_degree: degree_sum as f64 / graph.order() as f64,
        mean_abs_weight: weight_sum / edges as f64,
    })
}
