//! Offline catalogue indexing.
//!
//! [`CanonicalFormIndexer`] reads a catalogue of every connected graph of one
//! order, certifies each graph, and assembles a [`LookupTable`]. The build is
//! all-or-nothing: any format error, duplicate, or a final count that differs
//! from the known number of connected graphs of that order aborts it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use forge_graph::{Canonicalizer, RefinementCanonicalizer};
use tracing::{debug, info};

use crate::catalogue::CatalogueReader;
use crate::error::{IndexError, IndexResult};
use crate::table::LookupTable;

/// Number of connected graphs (up to isomorphism) per vertex order.
///
/// OEIS A001349.
const EXPECTED_COUNTS: [(usize, usize); 9] = [
    (1, 1),
    (2, 1),
    (3, 2),
    (4, 6),
    (5, 21),
    (6, 112),
    (7, 853),
    (8, 11_117),
    (9, 261_080),
];

/// Known catalogue size for a vertex order.
pub fn expected_count(order: usize) -> Option<usize> {
    EXPECTED_COUNTS
        .iter()
        .find(|&&(n, _)| n == order)
        .map(|&(_, count)| count)
}

/// Builds [`LookupTable`]s from catalogue files.
#[derive(Debug, Clone, Default)]
pub struct CanonicalFormIndexer<C = RefinementCanonicalizer> {
    canonicalizer: C,
}

impl CanonicalFormIndexer<RefinementCanonicalizer> {
    /// Indexer using the default canonicaliser.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Canonicalizer> CanonicalFormIndexer<C> {
    /// Indexer using a custom canonicalisation backend.
    pub fn with_canonicalizer(canonicalizer: C) -> Self {
        Self { canonicalizer }
    }

    /// The canonicaliser used for certificates.
    pub fn canonicalizer(&self) -> &C {
        &self.canonicalizer
    }

    /// Index the catalogue file at `path`.
    pub fn build(&self, path: impl AsRef<Path>, vertex_order: usize) -> IndexResult<LookupTable> {
        self.build_with_progress(path, vertex_order, |_| {})
    }

    /// Index the catalogue file at `path`, calling `progress` with the number
    /// of graphs indexed so far after each entry.
    pub fn build_with_progress(
        &self,
        path: impl AsRef<Path>,
        vertex_order: usize,
        progress: impl FnMut(usize),
    ) -> IndexResult<LookupTable> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
        info!(path = %path.display(), vertex_order, "indexing catalogue");
        let reader = CatalogueReader::new(BufReader::new(file), vertex_order).with_source(path);
        self.index_entries(reader, vertex_order, progress)
    }

    /// Index a catalogue held in memory.
    pub fn build_from_str(&self, text: &str, vertex_order: usize) -> IndexResult<LookupTable> {
        let reader = CatalogueReader::new(text.as_bytes(), vertex_order);
        self.index_entries(reader, vertex_order, |_| {})
    }

    fn index_entries<R: BufRead>(
        &self,
        reader: CatalogueReader<R>,
        vertex_order: usize,
        mut progress: impl FnMut(usize),
    ) -> IndexResult<LookupTable> {
        let expected =
            expected_count(vertex_order).ok_or(IndexError::UnsupportedOrder(vertex_order))?;

        let mut table = LookupTable::new(vertex_order);
        for entry in reader {
            let entry = entry?;
            let certificate = self.canonicalizer.certificate(&entry.graph);
            debug!(id = entry.id, certificate = %certificate, "indexed graph");
            table.insert(entry.id, certificate, entry.graph)?;
            progress(table.len());
        }

        if table.len() != expected {
            return Err(IndexError::CatalogueIntegrity {
                order: vertex_order,
                expected,
                found: table.len(),
            });
        }
        table.verify()?;

        info!(vertex_order, graphs = table.len(), "catalogue indexed");
        Ok(table)
    }
}
