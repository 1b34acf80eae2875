//! QAOA Forge Catalogue Indexing
//!
//! A catalogue enumerates every connected graph of one vertex order. This
//! crate turns it into a [`LookupTable`]: a validated bijection between
//! catalogue id, [`CanonicalCertificate`](forge_graph::CanonicalCertificate)
//! and graph structure, which the serving side uses to recognise an incoming
//! graph regardless of how its vertices are labelled.
//!
//! Pipeline:
//!
//! 1. [`catalogue`] parses the fixed-width text format.
//! 2. [`CanonicalFormIndexer`] certifies each graph and assembles the table,
//!    failing on duplicates or an incomplete catalogue.
//! 3. [`persist`] publishes the table atomically and loads it back.
//!
//! [`enumerate`] regenerates a catalogue from scratch for small orders.
//!
//! # Example
//!
//! ```rust
//! use forge_index::{CanonicalFormIndexer, catalogue, enumerate};
//!
//! let indexer = CanonicalFormIndexer::new();
//! let graphs = enumerate::connected_graphs(4, indexer.canonicalizer());
//! let text = catalogue::render_catalogue(&graphs);
//!
//! let table = indexer.build_from_str(&text, 4).unwrap();
//! assert_eq!(table.len(), 6);
//!
//! let cert = table.certificate_of(1).unwrap();
//! assert_eq!(table.id_of(cert), Some(1));
//! ```

pub mod catalogue;
pub mod enumerate;
pub mod error;
pub mod indexer;
pub mod persist;
pub mod table;

pub use catalogue::{CatalogueEntry, CatalogueReader};
pub use error::{IndexError, IndexResult};
pub use indexer::{CanonicalFormIndexer, expected_count};
pub use table::LookupTable;
