//! Init command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::debug;

use forge_init::{StrategyKind, StrategyRequest};

use super::common::{load_dispatcher, read_graph};
use crate::config::Config;

/// Request fields given on the command line.
///
/// Each one replaces the same field read from the graph file.
#[derive(Debug, Default)]
pub struct RequestOverrides {
    pub strategy: Option<String>,
    pub p: Option<usize>,
    pub t_max: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub category: Option<String>,
    pub weight_type: Option<String>,
    pub previous_beta: Option<Vec<f64>>,
    pub previous_gamma: Option<Vec<f64>>,
}

impl RequestOverrides {
    fn apply(self, fields: &mut Map<String, Value>) {
        fn set(fields: &mut Map<String, Value>, key: &str, value: Option<Value>) {
            if let Some(value) = value {
                fields.insert(key.to_string(), value);
            }
        }

        set(fields, "strategy", self.strategy.map(Value::from));
        set(fields, "p", self.p.map(Value::from));
        set(fields, "t_max", self.t_max.map(Value::from));
        set(fields, "beta", self.beta.map(Value::from));
        set(fields, "gamma", self.gamma.map(Value::from));
        if let Some(category) = self.category {
            fields.remove("graph_type");
            fields.insert("category".to_string(), Value::from(category));
        }
        set(fields, "weight_type", self.weight_type.map(Value::from));
        set(fields, "previous_beta", self.previous_beta.map(Value::from));
        set(fields, "previous_gamma", self.previous_gamma.map(Value::from));
    }
}

/// Execute the init command.
///
/// The response is printed to stdout as JSON.
pub fn execute(
    config: &Config,
    graph_path: &Path,
    overrides: RequestOverrides,
    seed: Option<u64>,
) -> Result<()> {
    let input = read_graph(graph_path)?;
    let request = build_request(input.params, overrides)?;
    let kind: StrategyKind = request.strategy.parse()?;
    debug!(strategy = %kind, p = request.p, order = input.graph.order(), "serving request");

    let dispatcher = load_dispatcher(config, kind, input.graph.order(), seed)?;
    let response = dispatcher
        .dispatch_graph(&request, &input.graph)
        .with_context(|| format!("Strategy '{kind}' failed at depth {}", request.p))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Merge the file's request fields with the command line.
fn build_request(
    mut fields: Map<String, Value>,
    overrides: RequestOverrides,
) -> Result<StrategyRequest> {
    overrides.apply(&mut fields);
    if !fields.contains_key("strategy") {
        anyhow::bail!("No strategy given: pass --strategy or set 'strategy' in the graph file");
    }
    move_previous_angles(&mut fields);
    serde_json::from_value(Value::Object(fields)).context("Invalid request parameters")
}

/// Interpolation requests may carry the previous angles as `beta`/`gamma`
/// arrays; move them to the `previous_*` fields.
fn move_previous_angles(fields: &mut Map<String, Value>) {
    let is_interp = fields
        .get("strategy")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("interp"));
    if !is_interp {
        return;
    }
    for (from, to) in [("beta", "previous_beta"), ("gamma", "previous_gamma")] {
        if fields.get(from).is_some_and(Value::is_array) && !fields.contains_key(to) {
            if let Some(angles) = fields.remove(from) {
                fields.insert(to.to_string(), angles);
            }
        }
    }
}
