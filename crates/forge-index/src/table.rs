//! The id ↔ certificate ↔ graph bijection.
//!
//! [`LookupTable`] owns all four mappings
//!
//! - `id → certificate`
//! - `id → graph`
//! - `certificate → id`
//! - `certificate → graph`
//!
//! and only mutates them through [`LookupTable::insert`], which either
//! updates all four or none. Graphs are shared between the two graph-valued
//! maps, so both always return the same record.

use std::sync::Arc;

use forge_graph::{CanonicalCertificate, Canonicalizer, GraphRecord};
use rustc_hash::FxHashMap;

use crate::error::{IndexError, IndexResult};

/// Bijective index over one catalogue order.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    vertex_order: usize,
    id_to_certificate: FxHashMap<u64, CanonicalCertificate>,
    id_to_graph: FxHashMap<u64, Arc<GraphRecord>>,
    certificate_to_id: FxHashMap<CanonicalCertificate, u64>,
    certificate_to_graph: FxHashMap<CanonicalCertificate, Arc<GraphRecord>>,
}

impl LookupTable {
    /// Create an empty table for graphs of `vertex_order` vertices.
    pub fn new(vertex_order: usize) -> Self {
        Self {
            vertex_order,
            ..Self::default()
        }
    }

    /// Insert one catalogue graph.
    ///
    /// Fails without modifying the table if the id or the certificate is
    /// already present, or if the graph has the wrong order.
    pub fn insert(
        &mut self,
        id: u64,
        certificate: CanonicalCertificate,
        graph: GraphRecord,
    ) -> IndexResult<()> {
        if graph.order() != self.vertex_order {
            return Err(IndexError::OrderMismatch {
                id,
                expected: self.vertex_order,
                found: graph.order(),
            });
        }
        if self.id_to_certificate.contains_key(&id) {
            return Err(IndexError::DuplicateId(id));
        }
        if let Some(&existing) = self.certificate_to_id.get(&certificate) {
            return Err(IndexError::DuplicateCertificate { id, existing });
        }

        let graph = Arc::new(graph);
        self.id_to_certificate.insert(id, certificate.clone());
        self.id_to_graph.insert(id, Arc::clone(&graph));
        self.certificate_to_id.insert(certificate.clone(), id);
        self.certificate_to_graph.insert(certificate, graph);
        Ok(())
    }

    /// Vertex order shared by every graph in the table.
    #[inline]
    pub fn vertex_order(&self) -> usize {
        self.vertex_order
    }

    /// Number of indexed graphs.
    #[inline]
    pub fn len(&self) -> usize {
        self.id_to_certificate.len()
    }

    /// Whether the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id_to_certificate.is_empty()
    }

    /// Certificate of graph `id`.
    pub fn certificate_of(&self, id: u64) -> Option<&CanonicalCertificate> {
        self.id_to_certificate.get(&id)
    }

    /// Graph with id `id`.
    pub fn graph_of(&self, id: u64) -> Option<&GraphRecord> {
        self.id_to_graph.get(&id).map(AsRef::as_ref)
    }

    /// Id of the catalogue graph with this certificate.
    pub fn id_of(&self, certificate: &CanonicalCertificate) -> Option<u64> {
        self.certificate_to_id.get(certificate).copied()
    }

    /// Catalogue graph with this certificate.
    pub fn graph_for(&self, certificate: &CanonicalCertificate) -> Option<&GraphRecord> {
        self.certificate_to_graph.get(certificate).map(AsRef::as_ref)
    }

    /// Sizes of the four mappings, in the order listed in the module docs.
    pub fn mapping_sizes(&self) -> [usize; 4] {
        [
            self.id_to_certificate.len(),
            self.id_to_graph.len(),
            self.certificate_to_id.len(),
            self.certificate_to_graph.len(),
        ]
    }

    /// Entries sorted by id.
    pub fn entries(&self) -> Vec<(u64, &CanonicalCertificate, &GraphRecord)> {
        let mut entries: Vec<_> = self
            .id_to_certificate
            .iter()
            .filter_map(|(&id, cert)| self.graph_of(id).map(|g| (id, cert, g)))
            .collect();
        entries.sort_unstable_by_key(|&(id, _, _)| id);
        entries
    }

    /// Check that the four mappings agree with one another.
    pub fn verify(&self) -> IndexResult<()> {
        let sizes = self.mapping_sizes();
        if sizes.iter().any(|&s| s != sizes[0]) {
            return Err(IndexError::CorruptTable(format!(
                "mapping sizes differ: {sizes:?}"
            )));
        }
        for (&id, cert) in &self.id_to_certificate {
            if self.certificate_to_id.get(cert) != Some(&id) {
                return Err(IndexError::CorruptTable(format!(
                    "certificate of graph {id} does not map back to it"
                )));
            }
            let (Some(by_id), Some(by_cert)) =
                (self.id_to_graph.get(&id), self.certificate_to_graph.get(cert))
            else {
                return Err(IndexError::CorruptTable(format!(
                    "graph {id} is missing from a graph mapping"
                )));
            };
            if by_id != by_cert {
                return Err(IndexError::CorruptTable(format!(
                    "graph mappings disagree for graph {id}"
                )));
            }
        }
        Ok(())
    }

    /// Recompute every certificate and compare with the stored one.
    pub fn verify_certificates(&self, canonicalizer: &dyn Canonicalizer) -> IndexResult<()> {
        for (id, cert, graph) in self.entries() {
            if canonicalizer.certificate(graph) != *cert {
                return Err(IndexError::CorruptTable(format!(
                    "stored certificate of graph {id} does not match its structure"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_graph::{GraphBuilder, RefinementCanonicalizer};

    fn path3() -> GraphRecord {
        let mut b = GraphBuilder::new(3);
        b.edge(0, 1).unwrap().edge(1, 2).unwrap();
        b.build()
    }

    fn triangle() -> GraphRecord {
        let mut b = GraphBuilder::new(3);
        b.edge(0, 1).unwrap().edge(1, 2).unwrap().edge(0, 2).unwrap();
        b.build()
    }

    #[test]
    fn test_insert_and_lookup() {
        let canon = RefinementCanonicalizer::new();
        let mut table = LookupTable::new(3);
        let cert = canon.certificate(&path3());
        table.insert(1, cert.clone(), path3()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.id_of(&cert), Some(1));
        assert_eq!(table.certificate_of(1), Some(&cert));
        assert_eq!(table.graph_of(1), Some(&path3()));
        assert_eq!(table.graph_for(&cert), Some(&path3()));
        table.verify().unwrap();
    }

    #[test]
    fn test_duplicate_id_leaves_table_unchanged() {
        let canon = RefinementCanonicalizer::new();
        let mut table = LookupTable::new(3);
        table.insert(1, canon.certificate(&path3()), path3()).unwrap();
        let err = table
            .insert(1, canon.certificate(&triangle()), triangle())
            .unwrap_err();
        assert!(matches!(err, IndexError::DuplicateId(1)));
        assert_eq!(table.mapping_sizes(), [1, 1, 1, 1]);
    }

    #[test]
    fn test_duplicate_certificate_rejected() {
        let canon = RefinementCanonicalizer::new();
        let mut table = LookupTable::new(3);
        table.insert(1, canon.certificate(&path3()), path3()).unwrap();
        let relabelled = path3().relabel(&[1, 0, 2]).unwrap();
        let err = table
            .insert(2, canon.certificate(&relabelled), relabelled)
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DuplicateCertificate { id: 2, existing: 1 }
        ));
    }

    #[test]
    fn test_order_mismatch_rejected() {
        let canon = RefinementCanonicalizer::new();
        let mut table = LookupTable::new(4);
        let err = table
            .insert(1, canon.certificate(&path3()), path3())
            .unwrap_err();
        assert!(matches!(err, IndexError::OrderMismatch { .. }));
    }

    #[test]
    fn test_verify_certificates_detects_tampering() {
        let canon = RefinementCanonicalizer::new();
        let mut table = LookupTable::new(3);
        // Store the triangle under the path's certificate.
        table.insert(1, canon.certificate(&path3()), triangle()).unwrap();
        assert!(table.verify().is_ok());
        assert!(matches!(
            table.verify_certificates(&canon),
            Err(IndexError::CorruptTable(_))
        ));
    }

    #[test]
    fn test_entries_sorted_by_id() {
        let canon = RefinementCanonicalizer::new();
        let mut table = LookupTable::new(3);
        table.insert(7, canon.certificate(&triangle()), triangle()).unwrap();
        table.insert(2, canon.certificate(&path3()), path3()).unwrap();
        let ids: Vec<u64> = table.entries().iter().map(|(id, _, _)| *id).collect();
        assert_eq!(ids, vec![2, 7]);
    }
}
