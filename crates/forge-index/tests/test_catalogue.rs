//! End-to-end tests for catalogue indexing and table persistence.

use std::fs;
use std::sync::OnceLock;

use forge_graph::{Canonicalizer, GraphRecord, RefinementCanonicalizer};
use forge_index::{CanonicalFormIndexer, IndexError, LookupTable, catalogue, enumerate, persist};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// The full order-7 catalogue text, generated once per test binary.
fn order7_catalogue() -> &'static str {
    static TEXT: OnceLock<String> = OnceLock::new();
    TEXT.get_or_init(|| {
        let graphs = enumerate::connected_graphs(7, &RefinementCanonicalizer::new());
        catalogue::render_catalogue(&graphs)
    })
}

fn order7_table() -> &'static LookupTable {
    static TABLE: OnceLock<LookupTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        CanonicalFormIndexer::new()
            .build_from_str(order7_catalogue(), 7)
            .expect("order-7 catalogue should index")
    })
}

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

#[test]
fn order7_catalogue_has_853_entries_in_every_mapping() {
    let table = order7_table();
    assert_eq!(table.len(), 853);
    assert_eq!(table.mapping_sizes(), [853, 853, 853, 853]);
}

#[test]
fn order7_entries_round_trip() {
    let canon = RefinementCanonicalizer::new();
    let table = order7_table();
    for (id, cert, graph) in table.entries() {
        // id → certificate → id
        assert_eq!(table.id_of(cert), Some(id));
        // certificate → graph → certificate
        let stored = table.graph_for(cert).unwrap();
        assert_eq!(&canon.certificate(stored), cert);
        assert_eq!(stored, graph);
    }
}

#[test]
fn relabelled_catalogue_graphs_resolve_to_their_id() {
    let canon = RefinementCanonicalizer::new();
    let table = order7_table();
    let perm = [3, 6, 0, 5, 1, 4, 2];
    for (id, _, graph) in table.entries().into_iter().step_by(37) {
        let relabelled = graph.relabel(&perm).unwrap();
        assert_eq!(table.id_of(&canon.certificate(&relabelled)), Some(id));
    }
}

#[test]
fn build_from_file_matches_build_from_str() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph5c.txt");
    let graphs = enumerate::connected_graphs(5, &RefinementCanonicalizer::new());
    fs::write(&path, catalogue::render_catalogue(&graphs)).unwrap();

    let mut seen = 0;
    let table = CanonicalFormIndexer::new()
        .build_with_progress(&path, 5, |done| seen = done)
        .unwrap();
    assert_eq!(table.len(), 21);
    assert_eq!(seen, 21);
}

#[test]
fn duplicate_id_aborts_build() {
    let graphs = enumerate::connected_graphs(3, &RefinementCanonicalizer::new());
    let text = format!(
        "{}{}",
        catalogue::render_entry(1, &graphs[0]),
        catalogue::render_entry(1, &graphs[1])
    );
    let err = CanonicalFormIndexer::new()
        .build_from_str(&text, 3)
        .unwrap_err();
    assert!(matches!(err, IndexError::DuplicateId(1)));
}

#[test]
fn malformed_row_aborts_whole_build() {
    let mut text = order7_catalogue().to_string();
    // Corrupt the last row of the last entry.
    let cut = text.trim_end().rfind('\n').unwrap();
    text.truncate(cut + 1);
    text.push_str("2\n");
    let err = CanonicalFormIndexer::new()
        .build_from_str(&text, 7)
        .unwrap_err();
    assert!(matches!(err, IndexError::CatalogueFormat { .. }));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn save_and_load_preserves_bijection() {
    let graphs = enumerate::connected_graphs(6, &RefinementCanonicalizer::new());
    let table = CanonicalFormIndexer::new()
        .build_from_str(&catalogue::render_catalogue(&graphs), 6)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = persist::table_path(dir.path(), 6);
    persist::save(&path, &table).unwrap();

    let loaded = persist::load(&path).unwrap();
    assert_eq!(loaded.vertex_order(), 6);
    assert_eq!(loaded.len(), 112);
    for (id, cert, graph) in table.entries() {
        assert_eq!(loaded.certificate_of(id), Some(cert));
        assert_eq!(loaded.graph_of(id), Some(graph));
    }
    loaded
        .verify_certificates(&RefinementCanonicalizer::new())
        .unwrap();

    // Only the published file remains.
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![persist::table_file_name(6)]);
}

#[test]
fn save_replaces_existing_table() {
    let canon = RefinementCanonicalizer::new();
    let dir = tempfile::tempdir().unwrap();
    let path = persist::table_path(dir.path(), 3);
    fs::write(&path, "stale").unwrap();

    let mut table = LookupTable::new(3);
    for (id, g) in (1u64..).zip(enumerate::connected_graphs(3, &canon)) {
        table.insert(id, canon.certificate(&g), g).unwrap();
    }
    persist::save(&path, &table).unwrap();
    assert_eq!(persist::load(&path).unwrap().len(), 2);
}

#[test]
fn load_rejects_inconsistent_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    let edge = GraphRecord::from_adjacency(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
    let g = serde_json::to_value(edge).unwrap();
    let doc = serde_json::json!({
        "format_version": 1,
        "vertex_order": 2,
        "built_at": "2024-05-01T00:00:00Z",
        "entries": [
            { "id": 1, "certificate": "0200000080", "graph": g },
            { "id": 1, "certificate": "0200000080", "graph": g },
        ]
    });
    fs::write(&path, doc.to_string()).unwrap();
    assert!(matches!(
        persist::load(&path),
        Err(IndexError::CorruptTable(_))
    ));
}

#[test]
fn load_rejects_unknown_format_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.json");
    let doc = serde_json::json!({
        "format_version": 99,
        "vertex_order": 2,
        "built_at": "2024-05-01T00:00:00Z",
        "entries": []
    });
    fs::write(&path, doc.to_string()).unwrap();
    assert!(matches!(
        persist::load(&path),
        Err(IndexError::CorruptTable(_))
    ));
}

#[test]
fn load_rejects_partial_table() {
    let full = order7_table();
    let mut partial = LookupTable::new(7);
    for (id, cert, graph) in full.entries().into_iter().take(10) {
        partial.insert(id, cert.clone(), graph.clone()).unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = persist::table_path(dir.path(), 7);
    persist::save(&path, &partial).unwrap();
    assert!(matches!(
        persist::load(&path),
        Err(IndexError::CatalogueIntegrity {
            order: 7,
            expected: 853,
            found: 10
        })
    ));
}

#[test]
fn load_rejects_swapped_certificates() {
    let canon = RefinementCanonicalizer::new();
    let graphs = enumerate::connected_graphs(3, &canon);
    let (path3, triangle) = (&graphs[0], &graphs[1]);

    // Internally consistent bijection, but each certificate names the other graph.
    let mut table = LookupTable::new(3);
    table.insert(1, canon.certificate(triangle), path3.clone()).unwrap();
    table.insert(2, canon.certificate(path3), triangle.clone()).unwrap();
    table.verify().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = persist::table_path(dir.path(), 3);
    persist::save(&path, &table).unwrap();
    assert!(matches!(
        persist::load(&path),
        Err(IndexError::CorruptTable(_))
    ));
}
