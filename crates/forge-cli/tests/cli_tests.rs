//! End-to-end tests for the `qaoa-forge` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;

const SQUARE: &str = "[[0,1,0,1],[1,0,1,0],[0,1,0,1],[1,0,1,0]]";

/// Run the binary with an isolated data directory.
fn run(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qaoa-forge"))
        .args(args)
        .env("QFORGE_DATA_DIR", data_dir)
        .env_remove("QFORGE_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run qaoa-forge")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn init_json(dir: &TempDir, args: &[&str]) -> Value {
    let output = run(dir.path(), args);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Enumerate and index order 4 into the data directory's lookup tables.
fn index_order4(dir: &TempDir) {
    let catalogue = dir.path().join("graph4c.txt");
    let catalogue = catalogue.to_str().unwrap();
    assert!(run(dir.path(), &["enumerate", "-n", "4", "-o", catalogue]).status.success());
    let output = run(dir.path(), &["index", "-i", catalogue, "-n", "4"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

// ---------------------------------------------------------------------------
// Offline tools
// ---------------------------------------------------------------------------

#[test]
fn version_lists_components() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["version"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("QAOA Forge"));
    assert!(text.contains("forge-index"));
}

#[test]
fn enumerate_to_stdout() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["enumerate", "--order", "4"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Graph 6, order 4."));
    assert!(!text.contains("Graph 7,"));
}

#[test]
fn enumerate_rejects_large_order() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["enumerate", "--order", "11"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error:"));
}

#[test]
fn index_then_inspect_with_verification() {
    let dir = TempDir::new().unwrap();
    let catalogue = dir.path().join("graph5c.txt");
    let table = dir.path().join("out").join("n5.json");
    let (catalogue, table) = (catalogue.to_str().unwrap(), table.to_str().unwrap());

    assert!(run(dir.path(), &["enumerate", "-n", "5", "-o", catalogue]).status.success());
    let output = run(dir.path(), &["index", "-i", catalogue, "-n", "5", "-o", table]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(Path::new(table).exists());

    let output = run(dir.path(), &["inspect", "--table", table, "--verify"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Entries:  21"));
    assert!(text.contains("certificates verified"));
}

#[test]
fn index_defaults_to_lookup_dir() {
    let dir = TempDir::new().unwrap();
    index_order4(&dir);
    assert!(
        dir.path()
            .join("lookup_tables")
            .join("graph2cert_n4.json")
            .exists()
    );
}

#[test]
fn index_rejects_truncated_catalogue() {
    let dir = TempDir::new().unwrap();
    let catalogue = write(dir.path(), "short.txt", "\nGraph 1, order 4.\n111\n00\n0\n");
    let output = run(dir.path(), &["index", "-i", &catalogue, "-n", "4"]);
    assert!(!output.status.success());
}

#[test]
fn inspect_graph_finds_catalogue_id() {
    let dir = TempDir::new().unwrap();
    index_order4(&dir);
    let graph = write(dir.path(), "square.json", SQUARE);
    let output = run(dir.path(), &["inspect", "--graph", &graph]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Mean degree:     2.0000"));
    assert!(text.contains("Catalogue id:"));
    assert!(!text.contains("not in table"));
}

#[test]
fn inspect_graph_beyond_catalogue_orders_skips_certificate() {
    let dir = TempDir::new().unwrap();
    let k12: Vec<Vec<u8>> = (0..12)
        .map(|i| (0..12).map(|j| u8::from(i != j)).collect())
        .collect();
    let graph = write(dir.path(), "k12.json", &json!(k12).to_string());
    let output = run(dir.path(), &["inspect", "--graph", &graph]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("skipped, no catalogue for order 12"));
    assert!(!text.contains("Catalogue id:"));
}

#[test]
fn inspect_needs_a_target() {
    let dir = TempDir::new().unwrap();
    assert!(!run(dir.path(), &["inspect"]).status.success());
}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

#[test]
fn init_fixed_from_matrix() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "square.json", SQUARE);
    let json = init_json(&dir, &["init", "-g", &graph, "-s", "fixed", "-p", "2"]);
    assert_eq!(json["beta"], json!([0.1, 0.1]));
    assert_eq!(json["gamma"], json!([0.2, 0.2]));
    assert_eq!(json["source"], "Fixed");
    assert_eq!(json["optimal_angles"], false);
}

#[test]
fn init_tqa_from_request_file() {
    let dir = TempDir::new().unwrap();
    let request = format!(r#"{{"adjacency_matrix": {SQUARE}, "strategy": "tqa", "p": 2, "t_max": 1.0}}"#);
    let graph = write(dir.path(), "request.json", &request);
    let json = init_json(&dir, &["init", "-g", &graph]);
    assert_eq!(json["source"], "TQA");
    assert_eq!(json["gamma"], json!([0.125, 0.375]));
    assert_eq!(json["beta"], json!([0.375, 0.125]));
}

#[test]
fn init_random_with_seed_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "square.json", SQUARE);
    let args = ["init", "-g", graph.as_str(), "-s", "random", "-p", "3", "--seed", "42"];
    let a = init_json(&dir, &args);
    let b = init_json(&dir, &args);
    assert_eq!(a, b);
    assert_eq!(a["source"], "Random");
}

#[test]
fn init_interp_from_previous_angles() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "square.json", SQUARE);
    let json = init_json(
        &dir,
        &[
            "init", "-g", &graph, "-s", "interp", "-p", "2",
            "--previous-beta", "0.4", "--previous-gamma", "0.6",
        ],
    );
    assert_eq!(json["source"], "INTERP");
    assert_eq!(json["beta"], json!([0.4, 0.4]));
}

#[test]
fn init_category_from_data_dir() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "optimal-parameters.json",
        r#"[{"Source": "three_regular_graph", "weight_type": "unweighted",
             "params.n_layers": 1, "median_beta_1": 0.39, "median_gamma_1": 0.61}]"#,
    );
    let graph = write(dir.path(), "square.json", SQUARE);
    let json = init_json(
        &dir,
        &["init", "-g", &graph, "-s", "qibpi", "-p", "1", "--category", "three_regular_graph"],
    );
    assert_eq!(json["source"], "QIBPI");
    assert_eq!(json["beta"], json!([0.39]));
}

#[test]
fn init_lookup_returns_optimal_angles() {
    let dir = TempDir::new().unwrap();
    index_order4(&dir);
    let entries: Vec<Value> = (1..=6)
        .map(|id| json!({"id": id, "depth": 1, "beta": [0.25], "gamma": [0.5]}))
        .collect();
    let angles = json!({"vertex_order": 4, "entries": entries});
    write(
        &dir.path().join("lookup_tables"),
        "angles_n4.json",
        &angles.to_string(),
    );

    let graph = write(dir.path(), "square.json", SQUARE);
    let json = init_json(&dir, &["init", "-g", &graph, "-s", "lookup", "-p", "1"]);
    assert_eq!(json["source"], "QAOAKit_Lookup");
    assert_eq!(json["optimal_angles"], true);
    assert_eq!(json["gamma"], json!([0.5]));
}

#[test]
fn init_lookup_without_tables_fails() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "square.json", SQUARE);
    let output = run(dir.path(), &["init", "-g", &graph, "-s", "lookup", "-p", "1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No data"));
}

#[test]
fn init_unknown_strategy_fails() {
    let dir = TempDir::new().unwrap();
    let graph = write(dir.path(), "square.json", SQUARE);
    let output = run(dir.path(), &["init", "-g", &graph, "-s", "warm_start"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error:"));
    assert!(output.stdout.is_empty());
}

#[test]
fn init_rejects_disconnected_graph() {
    let dir = TempDir::new().unwrap();
    let graph = write(
        dir.path(),
        "split.json",
        "[[0,1,0,0],[1,0,0,0],[0,0,0,1],[0,0,1,0]]",
    );
    let output = run(dir.path(), &["init", "-g", &graph, "-s", "fixed"]);
    assert!(!output.status.success());
}
