//! Error types for the indexing pipeline.
//!
//! Every variant is fatal for a build: the indexer never drops entries or
//! publishes a partial table.

use std::path::PathBuf;

use forge_graph::GraphError;
use thiserror::Error;

/// Errors that can occur while parsing, indexing or persisting a catalogue.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IndexError {
    /// The catalogue text does not follow the entry format.
    #[error("Catalogue format error at line {line}: {reason}")]
    CatalogueFormat {
        /// 1-based line number of the offending line.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A graph id occurs twice.
    #[error("Graph id {0} occurs more than once")]
    DuplicateId(u64),

    /// Two ids describe isomorphic graphs.
    #[error("Graph {id} is isomorphic to graph {existing} (same certificate)")]
    DuplicateCertificate {
        /// The id being inserted.
        id: u64,
        /// The id already holding the certificate.
        existing: u64,
    },

    /// The catalogue does not enumerate every graph of its order.
    #[error("Catalogue for order {order} has {found} graphs, expected {expected}")]
    CatalogueIntegrity {
        /// Vertex order of the catalogue.
        order: usize,
        /// Known number of connected graphs of that order.
        expected: usize,
        /// Number of entries actually indexed.
        found: usize,
    },

    /// No expected enumeration count is known for the order.
    #[error("No known graph count for vertex order {0}")]
    UnsupportedOrder(usize),

    /// A graph of the wrong order was inserted into a table.
    #[error("Graph {id} has order {found}, table order is {expected}")]
    OrderMismatch {
        /// Graph id.
        id: u64,
        /// Table vertex order.
        expected: usize,
        /// Order of the inserted graph.
        found: usize,
    },

    /// A persisted table failed validation on load.
    #[error("Corrupt lookup table: {0}")]
    CorruptTable(String),

    /// Graph construction failed.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Filesystem error.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexError {
    pub(crate) fn format(line: usize, reason: impl Into<String>) -> Self {
        Self::CatalogueFormat {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for indexing operations.
pub type IndexResult<T> = Result<T, IndexError>;
