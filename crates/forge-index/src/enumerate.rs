//! Enumeration of connected graphs up to isomorphism.
//!
//! Every connected graph on `n ≥ 2` vertices has a vertex whose removal
//! leaves it connected (any leaf of a spanning tree). So all connected graphs
//! of order `n` arise by taking each connected graph of order `n - 1` and
//! joining a new vertex to a non-empty subset of its vertices. Candidates are
//! deduplicated by certificate.
//!
//! This regenerates a catalogue without the external dataset; the result is
//! sorted by edge count, then certificate, so ids are stable across runs.

use forge_graph::{CanonicalCertificate, Canonicalizer, GraphBuilder, GraphRecord};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Largest order the subset enumeration handles (2^(n-1) subsets per graph).
pub const MAX_ENUMERATION_ORDER: usize = 10;

/// One representative of every connected graph of `order` vertices.
///
/// Returns an empty list for order 0 or orders above
/// [`MAX_ENUMERATION_ORDER`].
pub fn connected_graphs(order: usize, canonicalizer: &dyn Canonicalizer) -> Vec<GraphRecord> {
    if order == 0 || order > MAX_ENUMERATION_ORDER {
        return Vec::new();
    }

    let mut level = vec![GraphBuilder::new(1).build()];
    for n in 2..=order {
        let mut classes: FxHashMap<CanonicalCertificate, GraphRecord> = FxHashMap::default();
        for parent in &level {
            for mask in 1u32..(1 << (n - 1)) {
                let child = extend(parent, mask);
                classes
                    .entry(canonicalizer.certificate(&child))
                    .or_insert(child);
            }
        }

        let mut next: Vec<(CanonicalCertificate, GraphRecord)> = classes.into_iter().collect();
        next.sort_by(|(ca, ga), (cb, gb)| {
            ga.edge_count()
                .cmp(&gb.edge_count())
                .then_with(|| ca.cmp(cb))
        });
        debug!(order = n, classes = next.len(), "enumerated connected graphs");
        level = next.into_iter().map(|(_, g)| g).collect();
    }
    level
}

/// `parent` plus a new last vertex joined to the vertices set in `mask`.
fn extend(parent: &GraphRecord, mask: u32) -> GraphRecord {
    let n = parent.order();
    let mut builder = GraphBuilder::new(n + 1);
    for (u, v, w) in parent.edges() {
        // Edges of a valid graph re-insert without error.
        let _ = builder.weighted_edge(u, v, w);
    }
    for u in (0..n).filter(|&u| mask & (1 << u) != 0) {
        let _ = builder.edge(u, n);
    }
    builder.build()
}
