//! Angle vectors and the uniform response shape.

use std::f64::consts::{FRAC_PI_4, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{InitError, InitResult};

/// Range of mixer angles produced by the fixed and random schedules.
pub const BETA_RANGE: (f64, f64) = (-FRAC_PI_4, FRAC_PI_4);

/// Range of cost angles produced by the fixed and random schedules.
pub const GAMMA_RANGE: (f64, f64) = (-PI, PI);

/// `p` mixer angles and `p` cost angles for a depth-`p` circuit.
///
/// Both sequences always have the same, non-zero length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAngles")]
pub struct AngleVector {
    beta: Vec<f64>,
    gamma: Vec<f64>,
}

#[derive(Deserialize)]
struct RawAngles {
    beta: Vec<f64>,
    gamma: Vec<f64>,
}

impl TryFrom<RawAngles> for AngleVector {
    type Error = InitError;

    fn try_from(raw: RawAngles) -> InitResult<Self> {
        Self::new(raw.beta, raw.gamma)
    }
}

impl AngleVector {
    /// Pair up beta and gamma sequences.
    pub fn new(beta: Vec<f64>, gamma: Vec<f64>) -> InitResult<Self> {
        if beta.len() != gamma.len() {
            return Err(InitError::InvalidParameter(format!(
                "beta has {} angles but gamma has {}",
                beta.len(),
                gamma.len()
            )));
        }
        if beta.is_empty() {
            return Err(InitError::InvalidParameter(
                "angle vectors must hold at least one layer".into(),
            ));
        }
        Ok(Self { beta, gamma })
    }

    /// `p` copies of the same `(beta, gamma)` pair.
    pub fn constant(depth: usize, beta: f64, gamma: f64) -> InitResult<Self> {
        Self::new(vec![beta; depth], vec![gamma; depth])
    }

    /// Circuit depth `p`.
    #[inline]
    pub fn depth(&self) -> usize {
        self.beta.len()
    }

    /// Mixer angles.
    #[inline]
    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    /// Cost angles.
    #[inline]
    pub fn gamma(&self) -> &[f64] {
        &self.gamma
    }

    /// Whether every angle is finite.
    pub fn is_finite(&self) -> bool {
        self.beta.iter().chain(&self.gamma).all(|x| x.is_finite())
    }

    /// Split into `(beta, gamma)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.beta, self.gamma)
    }
}

/// Which strategy produced a response.
///
/// Serialised with the tags clients of the angle service already know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// Uniform random sampling.
    #[serde(rename = "Random")]
    Random,
    /// Constant angles.
    #[serde(rename = "Fixed")]
    Fixed,
    /// Trotterised quantum annealing schedule.
    #[serde(rename = "TQA")]
    Tqa,
    /// Interpolation from the previous depth.
    #[serde(rename = "INTERP")]
    Interp,
    /// Median angles per instance class.
    #[serde(rename = "QIBPI")]
    Qibpi,
    /// Rescaled density-model median.
    #[serde(rename = "QAOAKit_KDE")]
    Kde,
    /// Precomputed optimum for an isomorphic catalogue graph.
    #[serde(rename = "QAOAKit_Lookup")]
    Lookup,
}

impl SourceTag {
    /// Wire name of the tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Fixed => "Fixed",
            Self::Tqa => "TQA",
            Self::Interp => "INTERP",
            Self::Qibpi => "QIBPI",
            Self::Kde => "QAOAKit_KDE",
            Self::Lookup => "QAOAKit_Lookup",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result shape shared by every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    /// Mixer angles, one per layer.
    pub beta: Vec<f64>,
    /// Cost angles, one per layer.
    pub gamma: Vec<f64>,
    /// True only when the angles are a known optimum for this exact graph.
    pub optimal_angles: bool,
    /// Strategy that produced the angles.
    pub source: SourceTag,
}

impl InitResponse {
    /// Wrap an angle vector.
    pub fn new(angles: AngleVector, source: SourceTag, optimal_angles: bool) -> Self {
        let (beta, gamma) = angles.into_parts();
        Self {
            beta,
            gamma,
            optimal_angles,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_rejected() {
        let err = AngleVector::new(vec![0.1, 0.2], vec![0.3]).unwrap_err();
        assert!(matches!(err, InitError::InvalidParameter(_)));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(AngleVector::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: AngleVector = serde_json::from_str(r#"{"beta":[0.1],"gamma":[0.2]}"#).unwrap();
        assert_eq!(ok.depth(), 1);
        assert!(serde_json::from_str::<AngleVector>(r#"{"beta":[0.1],"gamma":[]}"#).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let angles = AngleVector::constant(2, 0.1, 0.2).unwrap();
        let response = InitResponse::new(angles, SourceTag::Kde, false);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["source"], "QAOAKit_KDE");
        assert_eq!(json["optimal_angles"], false);
        assert_eq!(json["beta"], serde_json::json!([0.1, 0.1]));
    }

    #[test]
    fn test_source_tag_display_matches_serde() {
        for tag in [
            SourceTag::Random,
            SourceTag::Fixed,
            SourceTag::Tqa,
            SourceTag::Interp,
            SourceTag::Qibpi,
            SourceTag::Kde,
            SourceTag::Lookup,
        ] {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{tag}\""));
        }
    }
}
