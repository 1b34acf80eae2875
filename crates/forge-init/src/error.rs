//! Error types for angle initialisation.

use std::path::PathBuf;

use forge_graph::GraphError;
use forge_index::IndexError;
use thiserror::Error;

/// Errors produced while loading initialisation resources or serving a
/// request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InitError {
    /// The category string names no known instance class.
    #[error("Invalid category '{0}'")]
    InvalidCategory(String),

    /// The lookup key is valid but no precomputed angles exist for it.
    #[error("No data available for {0}")]
    NoDataAvailable(String),

    /// The graph's statistics make the rescaling undefined.
    #[error("Degenerate graph: {0}")]
    DegenerateGraph(String),

    /// A strategy parameter is missing or out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested strategy name is not recognised.
    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),

    /// A parameter table or density model document is malformed.
    #[error("Table format error: {0}")]
    TableFormat(String),

    /// The input graph failed validation.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Loading the per-graph lookup table failed.
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Filesystem error.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was caused by the request rather than by the
    /// service's own resources.
    ///
    /// `NoDataAvailable` counts as a client fault: the request is well formed
    /// but asks for something the tables do not hold, and retrying it will
    /// not help.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidCategory(_)
                | Self::NoDataAvailable(_)
                | Self::DegenerateGraph(_)
                | Self::InvalidParameter(_)
                | Self::UnknownStrategy(_)
                | Self::Graph(_)
        )
    }
}

/// Result type for initialisation operations.
pub type InitResult<T> = Result<T, InitError>;
