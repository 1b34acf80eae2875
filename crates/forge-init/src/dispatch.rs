//! Routing of flat requests to strategies.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use forge_graph::GraphRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::angles::{AngleVector, InitResponse};
use crate::closed_form::{FixedAngles, InterpSchedule, RandomUniform, TqaSchedule};
use crate::density::{DensityEstimationInitializer, DensityModelRegistry};
use crate::error::{InitError, InitResult};
use crate::lookup::{CategoryLookup, GraphLookup, LookupStore, WeightType};
use crate::strategy::Initializer;

/// Strategy names accepted in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// `random`
    Random,
    /// `fixed`
    Fixed,
    /// `tqa`
    Tqa,
    /// `interp`
    Interp,
    /// `qibpi`, also `category`
    Category,
    /// `kde`, also `density`
    Density,
    /// `lookup`
    Lookup,
}

impl StrategyKind {
    /// Every strategy.
    pub const ALL: [Self; 7] = [
        Self::Random,
        Self::Fixed,
        Self::Tqa,
        Self::Interp,
        Self::Category,
        Self::Density,
        Self::Lookup,
    ];

    /// Primary name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Fixed => "fixed",
            Self::Tqa => "tqa",
            Self::Interp => "interp",
            Self::Category => "qibpi",
            Self::Density => "kde",
            Self::Lookup => "lookup",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = InitError;

    fn from_str(s: &str) -> InitResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "fixed" | "fixed_angles" => Ok(Self::Fixed),
            "tqa" => Ok(Self::Tqa),
            "interp" => Ok(Self::Interp),
            "qibpi" | "category" => Ok(Self::Category),
            "kde" | "density" => Ok(Self::Density),
            "lookup" => Ok(Self::Lookup),
            _ => Err(InitError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy name plus its flat parameter set.
///
/// Parameters a strategy does not use are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRequest {
    /// Strategy name, see [`StrategyKind`].
    pub strategy: String,
    /// Circuit depth.
    #[serde(default = "default_depth")]
    pub p: usize,
    /// Total annealing time (`tqa`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_max: Option<f64>,
    /// Constant mixer angle (`fixed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// Constant cost angle (`fixed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    /// Instance class (`qibpi`).
    #[serde(default, alias = "graph_type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `weighted` or `unweighted` (`qibpi`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_type: Option<String>,
    /// Optimised mixer angles at depth `p - 1` (`interp`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_beta: Option<Vec<f64>>,
    /// Optimised cost angles at depth `p - 1` (`interp`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_gamma: Option<Vec<f64>>,
}

fn default_depth() -> usize {
    1
}

impl StrategyRequest {
    /// Request for `strategy` at depth `p` with no other parameters.
    pub fn new(strategy: impl Into<String>, p: usize) -> Self {
        Self {
            strategy: strategy.into(),
            p,
            t_max: None,
            beta: None,
            gamma: None,
            category: None,
            weight_type: None,
            previous_beta: None,
            previous_gamma: None,
        }
    }
}

/// Holds the shared resources and builds strategies per request.
///
/// A seeded dispatcher owns one random generator for its whole lifetime, so
/// successive `random` requests continue a single reproducible stream.
/// Clones share that stream.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    store: Arc<LookupStore>,
    models: Arc<DensityModelRegistry>,
    random: Option<Arc<RandomUniform>>,
}

impl Dispatcher {
    /// Dispatcher over loaded tables and models.
    pub fn new(store: Arc<LookupStore>, models: Arc<DensityModelRegistry>) -> Self {
        Self {
            store,
            models,
            random: None,
        }
    }

    /// Seed the random strategy so its output is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random = Some(Arc::new(RandomUniform::seeded(seed)));
        self
    }

    /// The shared lookup store.
    pub fn store(&self) -> &Arc<LookupStore> {
        &self.store
    }

    /// The shared density models.
    pub fn models(&self) -> &Arc<DensityModelRegistry> {
        &self.models
    }

    /// Build the strategy a request names.
    pub fn initializer(&self, request: &StrategyRequest) -> InitResult<Box<dyn Initializer>> {
        let kind: StrategyKind = request.strategy.parse()?;
        debug!(strategy = %kind, p = request.p, "building initializer");
        let initializer: Box<dyn Initializer> = match kind {
            StrategyKind::Random => match &self.random {
                Some(random) => Box::new(Arc::clone(random)),
                None => Box::new(RandomUniform::from_entropy()),
            },
            StrategyKind::Fixed => Box::new(FixedAngles::new(
                request.beta.unwrap_or(FixedAngles::DEFAULT_BETA),
                request.gamma.unwrap_or(FixedAngles::DEFAULT_GAMMA),
            )?),
            StrategyKind::Tqa => Box::new(TqaSchedule::new(require(request.t_max, "t_max")?)?),
            StrategyKind::Interp => {
                let beta = require(request.previous_beta.clone(), "previous_beta")?;
                let gamma = require(request.previous_gamma.clone(), "previous_gamma")?;
                Box::new(InterpSchedule::new(AngleVector::new(beta, gamma)?))
            }
            StrategyKind::Category => {
                let category = require(request.category.clone(), "category")?;
                let weight_type = match &request.weight_type {
                    Some(w) => w.parse()?,
                    None => WeightType::default(),
                };
                Box::new(CategoryLookup::new(
                    Arc::clone(&self.store),
                    category,
                    weight_type,
                ))
            }
            StrategyKind::Density => {
                Box::new(DensityEstimationInitializer::new(Arc::clone(&self.models)))
            }
            StrategyKind::Lookup => Box::new(GraphLookup::new(Arc::clone(&self.store))),
        };
        Ok(initializer)
    }

    /// Serve a request for an already validated graph.
    pub fn dispatch_graph(
        &self,
        request: &StrategyRequest,
        graph: &GraphRecord,
    ) -> InitResult<InitResponse> {
        let result = self
            .initializer(request)
            .and_then(|init| init.respond(request.p, graph));
        if let Err(e) = &result {
            if !e.is_client_fault() {
                warn!(strategy = %request.strategy, error = %e, "initialisation failed");
            }
        }
        result
    }

    /// Validate an adjacency matrix and serve a request for it.
    pub fn dispatch(
        &self,
        request: &StrategyRequest,
        adjacency: &[Vec<f64>],
    ) -> InitResult<InitResponse> {
        let graph = GraphRecord::from_adjacency(adjacency)?;
        self.dispatch_graph(request, &graph)
    }
}

fn require<T>(value: Option<T>, name: &str) -> InitResult<T> {
    value.ok_or_else(|| InitError::InvalidParameter(format!("missing parameter '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
        assert_eq!("density".parse::<StrategyKind>().unwrap(), StrategyKind::Density);
        assert_eq!("TQA".parse::<StrategyKind>().unwrap(), StrategyKind::Tqa);
        assert!(matches!(
            "annealing".parse::<StrategyKind>(),
            Err(InitError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_request_defaults() {
        let r: StrategyRequest = serde_json::from_str(r#"{"strategy": "fixed"}"#).unwrap();
        assert_eq!(r.p, 1);
        assert!(r.beta.is_none());
    }

    #[test]
    fn test_request_accepts_graph_type_alias() {
        let r: StrategyRequest =
            serde_json::from_str(r#"{"strategy": "qibpi", "p": 2, "graph_type": "geometric"}"#)
                .unwrap();
        assert_eq!(r.category.as_deref(), Some("geometric"));
    }

    #[test]
    fn test_missing_parameter() {
        let d = Dispatcher::default();
        let err = d.initializer(&StrategyRequest::new("tqa", 2)).err().unwrap();
        assert!(matches!(err, InitError::InvalidParameter(ref m) if m.contains("t_max")));
    }
}
