//! Density-model initialisation.
//!
//! A [`DensityModel`] summarises optimised angles observed at one depth on a
//! reference distribution of graphs. Its median is transplanted onto a new
//! graph by rescaling the cost angles with the graph's mean degree `d` and
//! mean absolute edge weight `w`:
//!
//! ```text
//! gamma_i = median_gamma_i · atan(1 / √(d − 1)) / w
//! beta_i  = median_beta_i
//! ```
//!
//! Models are trained elsewhere and loaded read-only from JSON:
//!
//! ```json
//! { "models": [ { "depth": 1, "layout": "gamma_first",
//!                 "median": [0.62, 0.39], "bandwidth": 0.1,
//!                 "samples": [[0.6, 0.4], [0.64, 0.38]] } ] }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use forge_graph::{GraphError, GraphRecord, GraphStats, stats};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::angles::{AngleVector, SourceTag};
use crate::error::{InitError, InitResult};
use crate::strategy::{Initializer, check_depth};

/// Order of the two halves of a model's median vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedianLayout {
    /// `[gamma_1..gamma_p, beta_1..beta_p]`, the layout of the published
    /// pretrained models.
    #[default]
    GammaFirst,
    /// `[beta_1..beta_p, gamma_1..gamma_p]`.
    BetaFirst,
}

/// Pretrained summary of optimal angles at one depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityModel {
    /// Circuit depth the model was trained for.
    pub depth: usize,
    /// Layout of `median` and of every sample.
    #[serde(default)]
    pub layout: MedianLayout,
    /// Median of the fitted density, `2 · depth` components.
    pub median: Vec<f64>,
    /// Gaussian kernel bandwidth, required for density queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<f64>,
    /// Kernel centres, each `2 · depth` components.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<Vec<f64>>,
}

impl DensityModel {
    /// Model holding only a median.
    pub fn from_median(depth: usize, layout: MedianLayout, median: Vec<f64>) -> InitResult<Self> {
        let model = Self {
            depth,
            layout,
            median,
            bandwidth: None,
            samples: Vec::new(),
        };
        model.validate()?;
        Ok(model)
    }

    /// Check dimensions and values.
    pub fn validate(&self) -> InitResult<()> {
        if self.depth == 0 {
            return Err(InitError::TableFormat("density model depth must be at least 1".into()));
        }
        let width = 2 * self.depth;
        if self.median.len() != width {
            return Err(InitError::TableFormat(format!(
                "depth-{} model median has {} components, expected {width}",
                self.depth,
                self.median.len()
            )));
        }
        if self.median.iter().any(|x| !x.is_finite()) {
            return Err(InitError::TableFormat(format!(
                "depth-{} model median is not finite",
                self.depth
            )));
        }
        if let Some(h) = self.bandwidth {
            if !h.is_finite() || h <= 0.0 {
                return Err(InitError::TableFormat(format!(
                    "depth-{} model bandwidth must be positive, got {h}",
                    self.depth
                )));
            }
        }
        if let Some(bad) = self.samples.iter().position(|s| s.len() != width) {
            return Err(InitError::TableFormat(format!(
                "depth-{} model sample {bad} has {} components, expected {width}",
                self.depth,
                self.samples[bad].len()
            )));
        }
        Ok(())
    }

    /// The median split into `(beta, gamma)` per the model's layout.
    pub fn median_parts(&self) -> (&[f64], &[f64]) {
        let (first, second) = self.median.split_at(self.depth);
        match self.layout {
            MedianLayout::GammaFirst => (second, first),
            MedianLayout::BetaFirst => (first, second),
        }
    }

    /// Log of the Gaussian kernel density estimate at `point`.
    ///
    /// `point` uses the model's layout. Fails with `NoDataAvailable` if the
    /// model carries no samples or bandwidth.
    pub fn log_density(&self, point: &[f64]) -> InitResult<f64> {
        let width = 2 * self.depth;
        if point.len() != width {
            return Err(InitError::InvalidParameter(format!(
                "query point has {} components, expected {width}",
                point.len()
            )));
        }
        let (Some(h), false) = (self.bandwidth, self.samples.is_empty()) else {
            return Err(InitError::NoDataAvailable(format!(
                "density samples for depth {}",
                self.depth
            )));
        };

        // log N(x; s, h²I) = -|x - s|² / 2h² - (d/2) log(2π h²)
        let exponents: Vec<f64> = self
            .samples
            .iter()
            .map(|s| {
                let sq: f64 = s.iter().zip(point).map(|(a, b)| (a - b).powi(2)).sum();
                -sq / (2.0 * h * h)
            })
            .collect();
        let max = exponents.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = exponents.iter().map(|e| (e - max).exp()).sum();
        let norm = 0.5 * width as f64 * (2.0 * std::f64::consts::PI * h * h).ln();
        Ok(max + sum.ln() - (self.samples.len() as f64).ln() - norm)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RegistryDocument {
    models: Vec<DensityModel>,
}

/// Density models keyed by depth. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct DensityModelRegistry {
    models: FxHashMap<usize, DensityModel>,
}

impl DensityModelRegistry {
    /// Registry of the given models; depths must be distinct.
    pub fn from_models(models: impl IntoIterator<Item = DensityModel>) -> InitResult<Self> {
        let mut map = FxHashMap::default();
        for model in models {
            model.validate()?;
            let depth = model.depth;
            if map.insert(depth, model).is_some() {
                return Err(InitError::TableFormat(format!(
                    "more than one density model for depth {depth}"
                )));
            }
        }
        Ok(Self { models: map })
    }

    /// Parse a registry document.
    pub fn from_json_str(text: &str) -> InitResult<Self> {
        let doc: RegistryDocument = serde_json::from_str(text)?;
        Self::from_models(doc.models)
    }

    /// Load a registry document from disk.
    pub fn load(path: impl AsRef<Path>) -> InitResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| InitError::io(path, e))?;
        let registry = Self::from_json_str(&text)?;
        info!(path = %path.display(), depths = ?registry.depths(), "density models loaded");
        Ok(registry)
    }

    /// Model for `depth`.
    pub fn get(&self, depth: usize) -> Option<&DensityModel> {
        self.models.get(&depth)
    }

    /// Depths with a model, ascending.
    pub fn depths(&self) -> Vec<usize> {
        let mut depths: Vec<usize> = self.models.keys().copied().collect();
        depths.sort_unstable();
        depths
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the registry holds no models.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Initializer
// ---------------------------------------------------------------------------

/// Rescales the depth's model median to the served graph.
#[derive(Debug, Clone)]
pub struct DensityEstimationInitializer {
    registry: Arc<DensityModelRegistry>,
}

impl DensityEstimationInitializer {
    /// Initializer over a shared registry.
    pub fn new(registry: Arc<DensityModelRegistry>) -> Self {
        Self { registry }
    }
}

impl Initializer for DensityEstimationInitializer {
    fn source(&self) -> SourceTag {
        SourceTag::Kde
    }

    fn initialize(&self, depth: usize, graph: &GraphRecord) -> InitResult<AngleVector> {
        check_depth(depth)?;
        let model = self
            .registry
            .get(depth)
            .ok_or_else(|| InitError::NoDataAvailable(format!("density model for depth {depth}")))?;

        let stats = match stats::extract(graph) {
            Ok(s) => s,
            Err(GraphError::NoEdges) => {
                return Err(InitError::DegenerateGraph("graph has no edges".into()));
            }
            Err(e) => return Err(e.into()),
        };
        let scale = gamma_scale(&stats)?;

        let (beta, gamma) = model.median_parts();
        let angles = AngleVector::new(beta.to_vec(), gamma.iter().map(|g| g * scale).collect())?;
        if !angles.is_finite() {
            return Err(InitError::DegenerateGraph(
                "rescaled angles are not finite".into(),
            ));
        }
        debug!(
            depth,
            mean_degree = stats.mean_degree,
            mean_abs_weight = stats.mean_abs_weight,
            scale,
            "rescaled density median"
        );
        Ok(angles)
    }
}

/// `atan(1 / √(d − 1)) / w`, defined only for `d > 1` and `w > 0`.
fn gamma_scale(stats: &GraphStats) -> InitResult<f64> {
    if stats.mean_degree <= 1.0 {
        return Err(InitError::DegenerateGraph(format!(
            "mean degree {} must exceed 1",
            stats.mean_degree
        )));
    }
    if stats.mean_abs_weight == 0.0 {
        return Err(InitError::DegenerateGraph(
            "mean absolute edge weight is zero".into(),
        ));
    }
    Ok((1.0 / (stats.mean_degree - 1.0).sqrt()).atan() / stats.mean_abs_weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_parts_follow_layout() {
        let m = DensityModel::from_median(2, MedianLayout::GammaFirst, vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        assert_eq!(m.median_parts(), (&[3.0, 4.0][..], &[1.0, 2.0][..]));

        let m = DensityModel::from_median(2, MedianLayout::BetaFirst, vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        assert_eq!(m.median_parts(), (&[1.0, 2.0][..], &[3.0, 4.0][..]));
    }

    #[test]
    fn test_wrong_median_width_rejected() {
        assert!(matches!(
            DensityModel::from_median(2, MedianLayout::GammaFirst, vec![1.0, 2.0, 3.0]),
            Err(InitError::TableFormat(_))
        ));
    }

    #[test]
    fn test_duplicate_depth_rejected() {
        let m = DensityModel::from_median(1, MedianLayout::GammaFirst, vec![0.5, 0.3]).unwrap();
        assert!(DensityModelRegistry::from_models([m.clone(), m]).is_err());
    }

    #[test]
    fn test_registry_document() {
        let json = r#"{"models": [
            {"depth": 1, "median": [0.6, 0.4]},
            {"depth": 2, "layout": "beta_first", "median": [0.5, 0.3, 0.4, 0.7]}
        ]}"#;
        let r = DensityModelRegistry::from_json_str(json).unwrap();
        assert_eq!(r.depths(), vec![1, 2]);
        assert_eq!(r.get(1).unwrap().layout, MedianLayout::GammaFirst);
        assert_eq!(r.get(2).unwrap().layout, MedianLayout::BetaFirst);
    }

    #[test]
    fn test_gamma_scale_three_regular() {
        let s = GraphStats {
            mean_degree: 3.0,
            mean_abs_weight: 1.0,
        };
        let expected = (1.0 / 2.0f64.sqrt()).atan();
        assert!((gamma_scale(&s).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_scale_degenerate() {
        let s = GraphStats {
            mean_degree: 1.0,
            mean_abs_weight: 1.0,
        };
        assert!(matches!(gamma_scale(&s), Err(InitError::DegenerateGraph(_))));
        let s = GraphStats {
            mean_degree: 2.0,
            mean_abs_weight: 0.0,
        };
        assert!(matches!(gamma_scale(&s), Err(InitError::DegenerateGraph(_))));
    }

    #[test]
    fn test_log_density_single_sample() {
        let m = DensityModel {
            depth: 1,
            layout: MedianLayout::GammaFirst,
            median: vec![0.0, 0.0],
            bandwidth: Some(1.0),
            samples: vec![vec![0.0, 0.0]],
        };
        // Standard bivariate normal at its mean: -ln(2π).
        let ld = m.log_density(&[0.0, 0.0]).unwrap();
        assert!((ld + (2.0 * std::f64::consts::PI).ln()).abs() < 1e-12);
        assert!(m.log_density(&[1.0, 0.0]).unwrap() < ld);
    }

    #[test]
    fn test_log_density_without_samples() {
        let m = DensityModel::from_median(1, MedianLayout::GammaFirst, vec![0.6, 0.4]).unwrap();
        assert!(matches!(
            m.log_density(&[0.6, 0.4]),
            Err(InitError::NoDataAvailable(_))
        ));
    }
}
