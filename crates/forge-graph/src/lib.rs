//! QAOA Forge Graph Primitives
//!
//! This crate holds the leaf data types shared by the indexing pipeline and
//! the initialisation engine:
//!
//! - [`GraphRecord`]: an immutable simple graph with `f64` edge weights,
//!   validated at construction (square, symmetric, zero diagonal, connected).
//! - [`GraphStats`]: mean degree and mean absolute edge weight, used to
//!   rescale transferred angles.
//! - [`CanonicalCertificate`] and the [`Canonicalizer`] trait: an
//!   isomorphism-invariant fingerprint, with [`RefinementCanonicalizer`] as
//!   the default backend.
//!
//! # Quick start
//!
//! ```rust
//! use forge_graph::{Canonicalizer, GraphRecord, RefinementCanonicalizer, stats};
//!
//! let square = GraphRecord::from_adjacency(&[
//!     vec![0.0, 1.0, 0.0, 1.0],
//!     vec![1.0, 0.0, 1.0, 0.0],
//!     vec![0.0, 1.0, 0.0, 1.0],
//!     vec![1.0, 0.0, 1.0, 0.0],
//! ])
//! .unwrap();
//!
//! let s = stats::extract(&square).unwrap();
//! assert_eq!(s.mean_degree, 2.0);
//!
//! // Relabelling never changes the certificate.
//! let shuffled = square.relabel(&[2, 0, 3, 1]).unwrap();
//! let canon = RefinementCanonicalizer::new();
//! assert_eq!(canon.certificate(&square), canon.certificate(&shuffled));
//! ```

pub mod canonical;
pub mod error;
pub mod graph;
pub mod stats;

pub use canonical::{CanonicalCertificate, Canonicalizer, RefinementCanonicalizer};
pub use error::{GraphError, GraphResult};
pub use graph::{GraphBuilder, GraphRecord};
pub use stats::GraphStats;
