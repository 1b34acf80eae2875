//! Reader and writer for the graph catalogue text format.
//!
//! ## Format
//!
//! A catalogue lists every connected graph of one vertex order `n`. Each
//! entry is:
//!
//! - a blank line,
//! - an identifier line holding the graph id and the order as its only two
//!   integers,
//! - `n - 1` rows of the adjacency upper triangle: row `k` has `n - 1 - k`
//!   characters of `0`/`1`, giving the edges from vertex `k` to vertices
//!   `k + 1 .. n`.
//!
//! ```text
//!
//! Graph 1, order 4.
//! 111
//! 00
//! 0
//! ```
//!
//! Parsing is strict: a missing or doubled separator line, like any other
//! malformed line, aborts the whole read.

use std::fmt::Write as _;
use std::io::{BufRead, Lines};
use std::iter::Enumerate;
use std::path::PathBuf;

use forge_graph::{GraphBuilder, GraphRecord};
use tracing::trace;

use crate::error::{IndexError, IndexResult};

/// One parsed catalogue entry.
#[derive(Debug, Clone)]
pub struct CatalogueEntry {
    /// Numeric graph id from the identifier line.
    pub id: u64,
    /// The graph described by the upper-triangle rows.
    pub graph: GraphRecord,
}

/// Streaming catalogue parser.
///
/// Yields entries in file order; after the first error the iterator is
/// exhausted.
pub struct CatalogueReader<R> {
    lines: Enumerate<Lines<R>>,
    order: usize,
    source: PathBuf,
    failed: bool,
}

impl<R: BufRead> CatalogueReader<R> {
    /// Parse entries of the given vertex order from `reader`.
    pub fn new(reader: R, order: usize) -> Self {
        Self {
            lines: reader.lines().enumerate(),
            order,
            source: PathBuf::from("<catalogue>"),
            failed: false,
        }
    }

    /// Name the input in I/O error messages.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Next line with its 1-based number.
    fn next_line(&mut self) -> IndexResult<Option<(usize, String)>> {
        match self.lines.next() {
            None => Ok(None),
            Some((index, Ok(line))) => Ok(Some((index + 1, line))),
            Some((_, Err(e))) => Err(IndexError::io(self.source.clone(), e)),
        }
    }

    fn read_entry(&mut self) -> IndexResult<Option<CatalogueEntry>> {
        // Exactly one blank line separates entries; trailing blank lines at
        // the end of the file are allowed.
        let mut blank = 0;
        let (line_no, header) = loop {
            match self.next_line()? {
                None => return Ok(None),
                Some((_, line)) if line.trim().is_empty() => blank += 1,
                Some(found) => break found,
            }
        };
        if blank != 1 {
            return Err(IndexError::format(
                line_no,
                format!("expected one blank line before the identifier line, found {blank}"),
            ));
        }

        let (id, order) = parse_identifier(line_no, &header)?;
        if order != self.order {
            return Err(IndexError::format(
                line_no,
                format!("graph {id} declares order {order}, catalogue order is {}", self.order),
            ));
        }

        let n = self.order;
        let mut builder = GraphBuilder::new(n);
        for k in 0..n.saturating_sub(1) {
            let Some((row_no, row)) = self.next_line()? else {
                return Err(IndexError::format(
                    line_no,
                    format!("truncated entry for graph {id}: found {k} of {} rows", n - 1),
                ));
            };
            let row = row.trim_end();
            let expected = n - 1 - k;
            let width = row.chars().count();
            if width != expected {
                return Err(IndexError::format(
                    row_no,
                    format!("row {k} of graph {id} has {width} characters, expected {expected}"),
                ));
            }
            for (m, ch) in row.chars().enumerate() {
                match ch {
                    '0' => {}
                    '1' => {
                        builder.edge(k, k + 1 + m)?;
                    }
                    other => {
                        return Err(IndexError::format(
                            row_no,
                            format!("row {k} of graph {id} contains non-binary character {other:?}"),
                        ));
                    }
                }
            }
        }

        let graph = builder.build();
        trace!(id, edges = graph.edge_count(), "parsed catalogue entry");
        Ok(Some(CatalogueEntry { id, graph }))
    }
}

impl<R: BufRead> Iterator for CatalogueReader<R> {
    type Item = IndexResult<CatalogueEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_entry().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

/// Parse a whole catalogue held in memory.
pub fn parse_str(text: &str, order: usize) -> IndexResult<Vec<CatalogueEntry>> {
    CatalogueReader::new(text.as_bytes(), order).collect()
}

/// Extract `(id, order)` from an identifier line such as `Graph 12, order 7.`
fn parse_identifier(line_no: usize, line: &str) -> IndexResult<(u64, usize)> {
    let numbers: Vec<&str> = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .collect();
    let [id, order] = numbers.as_slice() else {
        return Err(IndexError::format(
            line_no,
            format!("expected an identifier line with graph id and order, got {line:?}"),
        ));
    };
    let id = id
        .parse::<u64>()
        .map_err(|e| IndexError::format(line_no, format!("invalid graph id: {e}")))?;
    let order = order
        .parse::<usize>()
        .map_err(|e| IndexError::format(line_no, format!("invalid order: {e}")))?;
    Ok((id, order))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Render one entry in catalogue format (leading blank line included).
pub fn render_entry(id: u64, graph: &GraphRecord) -> String {
    let n = graph.order();
    let mut out = String::with_capacity(32 + n * n / 2);
    // Writing to a String cannot fail.
    let _ = writeln!(out);
    let _ = writeln!(out, "Graph {id}, order {n}.");
    for k in 0..n.saturating_sub(1) {
        for m in (k + 1)..n {
            out.push(if graph.has_edge(k, m) { '1' } else { '0' });
        }
        out.push('\n');
    }
    out
}

/// Render graphs as a catalogue, numbering them from 1.
pub fn render_catalogue<'a>(graphs: impl IntoIterator<Item = &'a GraphRecord>) -> String {
    graphs
        .into_iter()
        .zip(1u64..)
        .map(|(graph, id)| render_entry(id, graph))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER4: &str = "\nGraph 1, order 4.\n111\n00\n0\n\nGraph 2, order 4.\n100\n10\n1\n";

    #[test]
    fn test_parse_two_entries() {
        let entries = parse_str(ORDER4, 4).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, 1);
        // Star centred on vertex 0.
        assert_eq!(entries[0].graph.degree(0), 3);
        assert_eq!(entries[0].graph.edge_count(), 3);
        // Path 0-1-2-3.
        assert!(entries[1].graph.has_edge(0, 1));
        assert!(entries[1].graph.has_edge(1, 2));
        assert!(entries[1].graph.has_edge(2, 3));
        assert_eq!(entries[1].graph.edge_count(), 3);
    }

    #[test]
    fn test_identifier_variants() {
        assert_eq!(parse_identifier(1, "Graph 12, order 7.").unwrap(), (12, 7));
        assert_eq!(parse_identifier(1, "12 7").unwrap(), (12, 7));
        assert!(parse_identifier(1, "0101").is_err());
        assert!(parse_identifier(1, "Graph 1, order 7, extra 3").is_err());
    }

    #[test]
    fn test_short_row_rejected() {
        let text = "\nGraph 1, order 4.\n11\n00\n0\n";
        let err = parse_str(text, 4).unwrap_err();
        assert!(matches!(err, IndexError::CatalogueFormat { line: 3, .. }));
    }

    #[test]
    fn test_non_binary_rejected() {
        let text = "\nGraph 1, order 3.\n1x\n1\n";
        let err = parse_str(text, 3).unwrap_err();
        assert!(err.to_string().contains("non-binary"));
    }

    #[test]
    fn test_order_mismatch_rejected() {
        let text = "\nGraph 1, order 5.\n111\n00\n0\n";
        let err = parse_str(text, 4).unwrap_err();
        assert!(matches!(err, IndexError::CatalogueFormat { line: 2, .. }));
    }

    #[test]
    fn test_truncated_entry_rejected() {
        let text = "\nGraph 1, order 4.\n111\n00\n";
        let err = parse_str(text, 4).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_missing_separator_rejected() {
        let text = "\nGraph 1, order 3.\n11\n0\nGraph 2, order 3.\n10\n1\n";
        let err = parse_str(text, 3).unwrap_err();
        assert!(matches!(err, IndexError::CatalogueFormat { line: 5, .. }));
        assert!(err.to_string().contains("found 0"));

        let first = "Graph 1, order 3.\n11\n0\n";
        assert!(matches!(
            parse_str(first, 3),
            Err(IndexError::CatalogueFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_doubled_separator_rejected() {
        let text = "\nGraph 1, order 3.\n11\n0\n\n\nGraph 2, order 3.\n10\n1\n";
        let err = parse_str(text, 3).unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_trailing_blank_lines_allowed() {
        let text = "\nGraph 1, order 3.\n11\n0\n\n\n";
        assert_eq!(parse_str(text, 3).unwrap().len(), 1);
    }

    #[test]
    fn test_windows_line_endings() {
        let text = "\r\nGraph 1, order 3.\r\n11\r\n0\r\n";
        let entries = parse_str(text, 3).unwrap();
        assert_eq!(entries[0].graph.edge_count(), 2);
    }

    #[test]
    fn test_reader_stops_after_error() {
        let text = "\nGraph 1, order 3.\n1\n";
        let mut reader = CatalogueReader::new(text.as_bytes(), 3);
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_render_matches_input() {
        let entries = parse_str(ORDER4, 4).unwrap();
        let rendered: String = entries
            .iter()
            .map(|e| render_entry(e.id, &e.graph))
            .collect();
        assert_eq!(rendered, ORDER4);
    }
}
