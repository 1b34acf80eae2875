//! Isomorphism-invariant canonical certificates.
//!
//! A [`CanonicalCertificate`] is an opaque byte string with the property
//!
//!   certificate(G) == certificate(H)  ⟺  G ≅ H
//!
//! for the unweighted structure of two graphs. Certificates are produced by a
//! [`Canonicalizer`]; the indexer and the per-graph lookup only depend on the
//! trait, so any canonical-labelling backend can be plugged in.
//!
//! # Default backend
//!
//! [`RefinementCanonicalizer`] runs individualisation-refinement:
//!
//! 1. Refine an ordered vertex partition to equitability: split every cell by
//!    how many neighbours each vertex has in every other cell, ordering the
//!    new cells by that count signature.
//! 2. If the partition is discrete it defines a labelling; encode the
//!    relabelled upper triangle as a bit string.
//! 3. Otherwise individualise each vertex of the first non-singleton cell in
//!    turn and recurse.
//!
//! Every step commutes with vertex relabelling, so the minimum code over all
//! leaves is a canonical form.
//!
//! Two leaves with equal codes expose an automorphism of the graph. The
//! search keeps every automorphism it finds and uses them twice:
//!
//! - at a node, a target-cell vertex in the same orbit as an explored one
//!   (under automorphisms fixing the node's individualised vertices) is
//!   skipped, since its subtree is an image of one already searched;
//! - when the automorphism maps the earlier leaf's path onto the current
//!   path, the search unwinds to the node where the two paths split.
//!
//! Highly symmetric graphs such as `K_n` then need O(n²) leaves instead of n!.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use crate::error::{GraphError, GraphResult};
use crate::graph::GraphRecord;

/// Opaque isomorphism-invariant fingerprint of a graph.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalCertificate(Vec<u8>);

impl CanonicalCertificate {
    /// Wrap raw certificate bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw certificate bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 2);
        for byte in &self.0 {
            out.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            out.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
        }
        out
    }

    /// Parse a hex encoding produced by [`to_hex`](Self::to_hex).
    pub fn from_hex(s: &str) -> GraphResult<Self> {
        if s.len() % 2 != 0 {
            return Err(GraphError::InvalidCertificate(format!(
                "odd number of hex digits ({})",
                s.len()
            )));
        }
        let digits = s.as_bytes();
        let mut bytes = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks_exact(2) {
            let hi = hex_value(pair[0])?;
            let lo = hex_value(pair[1])?;
            bytes.push((hi << 4) | lo);
        }
        Ok(Self(bytes))
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

fn hex_value(digit: u8) -> GraphResult<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(GraphError::InvalidCertificate(format!(
            "unexpected character {:?}",
            char::from(other)
        ))),
    }
}

impl fmt::Display for CanonicalCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CanonicalCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalCertificate({})", self.to_hex())
    }
}

impl Serialize for CanonicalCertificate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CanonicalCertificate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A canonical-labelling capability.
///
/// Implementations must guarantee that two graphs receive equal certificates
/// exactly when their unweighted structures are isomorphic.
pub trait Canonicalizer: Send + Sync {
    /// Compute the certificate of `graph`.
    fn certificate(&self, graph: &GraphRecord) -> CanonicalCertificate;
}

/// Individualisation-refinement canonicaliser (see module docs).
#[derive(Debug, Clone, Copy, Default)]
pub struct RefinementCanonicalizer;

impl RefinementCanonicalizer {
    /// Create the canonicaliser.
    pub fn new() -> Self {
        Self
    }

    /// Compute the certificate together with the canonical labelling.
    ///
    /// `labeling[v]` is the canonical position of vertex `v`; relabelling the
    /// graph with it yields the same structure for every member of an
    /// isomorphism class.
    pub fn canonical_form(&self, graph: &GraphRecord) -> (CanonicalCertificate, Vec<usize>) {
        let n = graph.order();
        let search = Search::run(graph);
        trace!(
            order = n,
            leaves = search.leaves,
            automorphisms = search.automorphisms.len(),
            "canonical form computed"
        );
        let (code, labeling) = search
            .best
            .map(|leaf| (leaf.code, leaf.labeling))
            .unwrap_or_default();

        let order_bytes = u32::try_from(n).unwrap_or(u32::MAX).to_le_bytes();
        let mut bytes = Vec::with_capacity(order_bytes.len() + code.len());
        bytes.extend_from_slice(&order_bytes);
        bytes.extend_from_slice(&code);
        (CanonicalCertificate(bytes), labeling)
    }
}

impl Canonicalizer for RefinementCanonicalizer {
    fn certificate(&self, graph: &GraphRecord) -> CanonicalCertificate {
        self.canonical_form(graph).0
    }
}

// ---------------------------------------------------------------------------
// Search internals
// ---------------------------------------------------------------------------

/// Ordered partition of the vertex set.
type Partition = Vec<Vec<usize>>;

#[derive(Clone)]
struct Leaf {
    code: Vec<u8>,
    labeling: Vec<usize>,
    /// Individualised vertices, root first.
    path: Vec<usize>,
}

struct Search {
    neighbors: Vec<Vec<usize>>,
    /// Individualised vertices of the current node.
    path: Vec<usize>,
    first: Option<Leaf>,
    /// Leaf with the smallest code seen so far.
    best: Option<Leaf>,
    /// Automorphisms as vertex maps.
    automorphisms: Vec<Vec<usize>>,
    leaves: usize,
}

impl Search {
    fn run(graph: &GraphRecord) -> Self {
        let n = graph.order();
        let mut search = Search {
            neighbors: graph.adjacency_lists(),
            path: Vec::new(),
            first: None,
            best: None,
            automorphisms: Vec::new(),
            leaves: 0,
        };
        if n > 0 {
            search.descend(vec![(0..n).collect()]);
        }
        search
    }

    /// Search the subtree below `cells`.
    ///
    /// `Some(depth)` asks every node deeper than `depth` to return at once.
    fn descend(&mut self, cells: Partition) -> Option<usize> {
        let cells = refine(&self.neighbors, cells);

        let Some(target) = cells.iter().position(|c| c.len() > 1) else {
            return self.leaf(&cells);
        };

        let depth = self.path.len();
        let mut explored: Vec<usize> = Vec::new();
        for &v in &cells[target] {
            if self.in_explored_orbit(v, &explored) {
                continue;
            }
            explored.push(v);

            let mut branch = Vec::with_capacity(cells.len() + 1);
            branch.extend_from_slice(&cells[..target]);
            branch.push(vec![v]);
            branch.push(cells[target].iter().copied().filter(|&u| u != v).collect());
            branch.extend_from_slice(&cells[target + 1..]);

            self.path.push(v);
            let unwind = self.descend(branch);
            self.path.pop();
            if let Some(level) = unwind {
                if level < depth {
                    return Some(level);
                }
            }
        }
        None
    }

    fn leaf(&mut self, cells: &Partition) -> Option<usize> {
        self.leaves += 1;
        let labeling = labeling_of(cells, self.neighbors.len());
        let code = encode(&self.neighbors, &labeling);

        if self.first.is_none() {
            let leaf = Leaf {
                code,
                labeling,
                path: self.path.clone(),
            };
            self.best = Some(leaf.clone());
            self.first = Some(leaf);
            return None;
        }

        let equal = [self.first.as_ref(), self.best.as_ref()]
            .into_iter()
            .flatten()
            .find(|leaf| leaf.code == code);
        if let Some(leaf) = equal {
            let gamma = automorphism(&leaf.labeling, &labeling);
            // The whole subtree since the split is an image of the searched one.
            let unwind = maps_path(&gamma, &leaf.path, &self.path)
                .then(|| common_prefix(&leaf.path, &self.path));
            if gamma.iter().enumerate().any(|(v, &u)| v != u) {
                self.automorphisms.push(gamma);
            }
            return unwind;
        }

        if self.best.as_ref().is_none_or(|best| code < best.code) {
            self.best = Some(Leaf {
                code,
                labeling,
                path: self.path.clone(),
            });
        }
        None
    }

    /// Whether `v` shares an orbit with an explored sibling under the
    /// automorphisms that fix the current path pointwise.
    fn in_explored_orbit(&self, v: usize, explored: &[usize]) -> bool {
        if explored.is_empty() || self.automorphisms.is_empty() {
            return false;
        }
        let mut orbits = Orbits::new(self.neighbors.len());
        for gamma in &self.automorphisms {
            if self.path.iter().all(|&p| gamma[p] == p) {
                for (u, &image) in gamma.iter().enumerate() {
                    orbits.union(u, image);
                }
            }
        }
        let root = orbits.find(v);
        explored.iter().any(|&w| orbits.find(w) == root)
    }
}

/// Automorphism sending each vertex of `reference` to the vertex holding the
/// same position in `labeling`.
fn automorphism(reference: &[usize], labeling: &[usize]) -> Vec<usize> {
    let mut at_position = vec![0usize; labeling.len()];
    for (v, &position) in labeling.iter().enumerate() {
        at_position[position] = v;
    }
    reference.iter().map(|&position| at_position[position]).collect()
}

fn maps_path(gamma: &[usize], from: &[usize], to: &[usize]) -> bool {
    from.len() == to.len() && from.iter().zip(to).all(|(&a, &b)| gamma[a] == b)
}

fn common_prefix(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Union-find over vertices.
struct Orbits {
    parent: Vec<usize>,
}

impl Orbits {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut v: usize) -> usize {
        while self.parent[v] != v {
            self.parent[v] = self.parent[self.parent[v]];
            v = self.parent[v];
        }
        v
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Refine `cells` until every vertex in a cell has the same number of
/// neighbours in each cell.
fn refine(neighbors: &[Vec<usize>], mut cells: Partition) -> Partition {
    let n = neighbors.len();
    let mut cell_of = vec![0usize; n];

    loop {
        for (index, cell) in cells.iter().enumerate() {
            for &v in cell {
                cell_of[v] = index;
            }
        }

        let mut next: Partition = Vec::with_capacity(cells.len());
        for cell in &cells {
            if cell.len() == 1 {
                next.push(cell.clone());
                continue;
            }
            let mut keyed: Vec<(Vec<usize>, usize)> = cell
                .iter()
                .map(|&v| {
                    let mut counts = vec![0usize; cells.len()];
                    for &u in &neighbors[v] {
                        counts[cell_of[u]] += 1;
                    }
                    (counts, v)
                })
                .collect();
            keyed.sort_unstable();

            let mut start = 0;
            for i in 1..=keyed.len() {
                if i == keyed.len() || keyed[i].0 != keyed[start].0 {
                    next.push(keyed[start..i].iter().map(|(_, v)| *v).collect());
                    start = i;
                }
            }
        }

        // Refinement only splits cells, so an unchanged cell count is a fixpoint.
        if next.len() == cells.len() {
            return next;
        }
        cells = next;
    }
}

/// Map each vertex to the index of its (singleton) cell.
fn labeling_of(cells: &Partition, n: usize) -> Vec<usize> {
    let mut labeling = vec![0usize; n];
    for (position, cell) in cells.iter().enumerate() {
        labeling[cell[0]] = position;
    }
    labeling
}

/// Pack the relabelled upper triangle, row-major, most significant bit first.
fn encode(neighbors: &[Vec<usize>], labeling: &[usize]) -> Vec<u8> {
    let n = neighbors.len();
    let mut upper = vec![false; n * n];
    for (v, list) in neighbors.iter().enumerate() {
        for &u in list {
            let (a, b) = (labeling[v], labeling[u]);
            upper[a.min(b) * n + a.max(b)] = true;
        }
    }

    let mut bytes = Vec::with_capacity(n * n.saturating_sub(1) / 16 + 1);
    let mut current = 0u8;
    let mut filled = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            current = (current << 1) | u8::from(upper[i * n + j]);
            filled += 1;
            if filled == 8 {
                bytes.push(current);
                current = 0;
                filled = 0;
            }
        }
    }
    if filled > 0 {
        bytes.push(current << (8 - filled));
    }
    bytes
}
