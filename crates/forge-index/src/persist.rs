//! Persisted form of a [`LookupTable`].
//!
//! Tables are stored as JSON, one file per vertex order. [`save`] writes to a
//! hidden sibling file and renames it over the destination, so a reader never
//! sees a partially written table. [`load`] rebuilds the bijection through
//! [`LookupTable::insert`], requires the full catalogue count for the order
//! and recomputes every stored certificate.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use forge_graph::{CanonicalCertificate, Canonicalizer, GraphRecord, RefinementCanonicalizer};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{IndexError, IndexResult};
use crate::indexer::expected_count;
use crate::table::LookupTable;

/// Version of the on-disk layout.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedTable {
    format_version: u32,
    vertex_order: usize,
    built_at: DateTime<Utc>,
    entries: Vec<PersistedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    id: u64,
    certificate: CanonicalCertificate,
    graph: GraphRecord,
}

/// Conventional file name for the table of a vertex order.
pub fn table_file_name(vertex_order: usize) -> String {
    format!("graph2cert_n{vertex_order}.json")
}

/// Conventional location of the table of a vertex order inside `dir`.
pub fn table_path(dir: impl AsRef<Path>, vertex_order: usize) -> PathBuf {
    dir.as_ref().join(table_file_name(vertex_order))
}

/// Write `table` to `path`, atomically replacing any existing file.
pub fn save(path: impl AsRef<Path>, table: &LookupTable) -> IndexResult<()> {
    let path = path.as_ref();
    let document = PersistedTable {
        format_version: FORMAT_VERSION,
        vertex_order: table.vertex_order(),
        built_at: Utc::now(),
        entries: table
            .entries()
            .into_iter()
            .map(|(id, certificate, graph)| PersistedEntry {
                id,
                certificate: certificate.clone(),
                graph: graph.clone(),
            })
            .collect(),
    };

    let tmp = temp_path(path);
    if let Err(e) = write_document(&tmp, &document) {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary table");
        }
        return Err(e);
    }
    fs::rename(&tmp, path).map_err(|e| IndexError::io(path, e))?;

    info!(
        path = %path.display(),
        vertex_order = table.vertex_order(),
        graphs = table.len(),
        "lookup table published"
    );
    Ok(())
}

/// Load and validate a table written by [`save`].
///
/// Certificates are recomputed with the default [`RefinementCanonicalizer`].
pub fn load(path: impl AsRef<Path>) -> IndexResult<LookupTable> {
    load_with(path, &RefinementCanonicalizer::new())
}

/// Load and validate a table, recomputing certificates with `canonicalizer`.
///
/// Fails with [`IndexError::CatalogueIntegrity`] unless the table holds
/// every graph of its order, and with [`IndexError::CorruptTable`] when a
/// stored certificate does not match its graph.
pub fn load_with(
    path: impl AsRef<Path>,
    canonicalizer: &dyn Canonicalizer,
) -> IndexResult<LookupTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
    let document: PersistedTable = serde_json::from_reader(BufReader::new(file))?;

    if document.format_version != FORMAT_VERSION {
        return Err(IndexError::CorruptTable(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            document.format_version
        )));
    }

    let mut table = LookupTable::new(document.vertex_order);
    for entry in document.entries {
        table
            .insert(entry.id, entry.certificate, entry.graph)
            .map_err(|e| IndexError::CorruptTable(e.to_string()))?;
    }
    table.verify()?;

    let order = table.vertex_order();
    let expected = expected_count(order).ok_or(IndexError::UnsupportedOrder(order))?;
    if table.len() != expected {
        return Err(IndexError::CatalogueIntegrity {
            order,
            expected,
            found: table.len(),
        });
    }
    table.verify_certificates(canonicalizer)?;

    info!(
        path = %path.display(),
        vertex_order = table.vertex_order(),
        graphs = table.len(),
        built_at = %document.built_at,
        "lookup table loaded"
    );
    Ok(table)
}

fn write_document(path: &Path, document: &PersistedTable) -> IndexResult<()> {
    let file = File::create(path).map_err(|e| IndexError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, document)?;
    writer.flush().map_err(|e| IndexError::io(path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| IndexError::io(path, e.into_error()))?;
    file.sync_all().map_err(|e| IndexError::io(path, e))
}

/// Hidden sibling of `path` used while writing.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "table".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_path_convention() {
        let p = table_path("/data/lookup_tables", 7);
        assert_eq!(p, PathBuf::from("/data/lookup_tables/graph2cert_n7.json"));
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let p = temp_path(Path::new("/data/graph2cert_n7.json"));
        assert_eq!(p, PathBuf::from("/data/.graph2cert_n7.json.tmp"));
    }
}
