//! Error types for the graph crate.

use thiserror::Error;

/// Errors produced while building or validating a problem graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// The adjacency matrix has no rows.
    #[error("Adjacency matrix is empty")]
    Empty,

    /// A row of the adjacency matrix has the wrong length.
    #[error("Adjacency matrix is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare {
        /// Offending row.
        row: usize,
        /// Length of that row.
        len: usize,
        /// Number of rows in the matrix.
        expected: usize,
    },

    /// An entry is NaN or infinite.
    #[error("Adjacency entry ({row}, {col}) is not finite")]
    NonFinite {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// `A[row][col] != A[col][row]`.
    #[error("Adjacency matrix is not symmetric at ({row}, {col})")]
    Asymmetric {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// Non-zero diagonal entry.
    #[error("Vertex {0} has a self-loop")]
    SelfLoop(usize),

    /// The graph splits into more than one component.
    #[error("Graph is not connected ({components} components)")]
    Disconnected {
        /// Number of connected components found.
        components: usize,
    },

    /// An edge endpoint is outside `0..order`.
    #[error("Vertex {vertex} out of range for a graph of order {order}")]
    VertexOutOfRange {
        /// The offending vertex id.
        vertex: usize,
        /// Order of the graph being built.
        order: usize,
    },

    /// The same undirected edge was added twice.
    #[error("Edge ({0}, {1}) added twice")]
    DuplicateEdge(usize, usize),

    /// Edge weight is NaN or infinite.
    #[error("Edge ({0}, {1}) has a non-finite weight")]
    NonFiniteWeight(usize, usize),

    /// A relabelling is not a permutation of `0..order`.
    #[error("Invalid relabelling: {0}")]
    InvalidPermutation(String),

    /// Statistics requested for a graph without edges.
    #[error("Graph has no edges; mean edge weight is undefined")]
    NoEdges,

    /// A certificate string is not valid hex.
    #[error("Invalid certificate encoding: {0}")]
    InvalidCertificate(String),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
