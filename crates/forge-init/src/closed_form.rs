//! Closed-form schedules that need no graph statistics.
//!
//! - [`FixedAngles`]: the same `(beta, gamma)` pair at every layer.
//! - [`RandomUniform`]: independent uniform draws from the schedule ranges.
//! - [`TqaSchedule`]: a discretised linear annealing ramp.
//! - [`InterpSchedule`]: lifts optimised depth `p - 1` angles to depth `p`.
//!
//! The graph argument of [`Initializer::initialize`] is ignored by these
//! strategies; it has already been validated at the boundary.

use std::sync::{Mutex, PoisonError};

use forge_graph::GraphRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::angles::{AngleVector, BETA_RANGE, GAMMA_RANGE, SourceTag};
use crate::error::{InitError, InitResult};
use crate::strategy::{Initializer, check_depth};

// ---------------------------------------------------------------------------
// Fixed angles
// ---------------------------------------------------------------------------

/// Constant schedule `beta = [b; p]`, `gamma = [g; p]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAngles {
    beta: f64,
    gamma: f64,
}

impl FixedAngles {
    /// Mixer angle served when none is supplied.
    pub const DEFAULT_BETA: f64 = 0.1;
    /// Cost angle served when none is supplied.
    pub const DEFAULT_GAMMA: f64 = 0.2;

    /// Constant schedule with `beta ∈ [-π/4, π/4]` and `gamma ∈ [-π, π]`.
    pub fn new(beta: f64, gamma: f64) -> InitResult<Self> {
        check_range("beta", beta, BETA_RANGE)?;
        check_range("gamma", gamma, GAMMA_RANGE)?;
        Ok(Self { beta, gamma })
    }
}

impl Default for FixedAngles {
    fn default() -> Self {
        Self {
            beta: Self::DEFAULT_BETA,
            gamma: Self::DEFAULT_GAMMA,
        }
    }
}

impl Initializer for FixedAngles {
    fn source(&self) -> SourceTag {
        SourceTag::Fixed
    }

    fn initialize(&self, depth: usize, _graph: &GraphRecord) -> InitResult<AngleVector> {
        check_depth(depth)?;
        AngleVector::constant(depth, self.beta, self.gamma)
    }
}

fn check_range(name: &str, value: f64, (lo, hi): (f64, f64)) -> InitResult<()> {
    if !(lo..=hi).contains(&value) {
        return Err(InitError::InvalidParameter(format!(
            "{name} = {value} is outside [{lo:.6}, {hi:.6}]"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Uniform random
// ---------------------------------------------------------------------------

/// Independent uniform draws: `beta_i ~ U[-π/4, π/4]`, `gamma_i ~ U[-π, π]`.
///
/// The random source is injected, so a seeded generator gives reproducible
/// angles:
///
/// ```rust
/// use forge_graph::GraphBuilder;
/// use forge_init::{Initializer, RandomUniform};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut b = GraphBuilder::new(2);
/// b.edge(0, 1).unwrap();
/// let g = b.build();
///
/// let a = RandomUniform::new(StdRng::seed_from_u64(7)).initialize(3, &g).unwrap();
/// let b = RandomUniform::new(StdRng::seed_from_u64(7)).initialize(3, &g).unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug)]
pub struct RandomUniform<R = StdRng> {
    rng: Mutex<R>,
}

impl<R: Rng> RandomUniform<R> {
    /// Sample with the given generator.
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl RandomUniform<StdRng> {
    /// Sample with a generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Sample with a deterministic generator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Initializer for RandomUniform<R> {
    fn source(&self) -> SourceTag {
        SourceTag::Random
    }

    fn initialize(&self, depth: usize, _graph: &GraphRecord) -> InitResult<AngleVector> {
        check_depth(depth)?;
        // Sampling never panics, so a poisoned lock still holds a usable RNG.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        sample_uniform(depth, &mut *rng)
    }
}

/// Draw one uniform angle vector from `rng`.
pub fn sample_uniform<R: Rng>(depth: usize, rng: &mut R) -> InitResult<AngleVector> {
    check_depth(depth)?;
    let beta = (0..depth)
        .map(|_| rng.gen_range(BETA_RANGE.0..=BETA_RANGE.1))
        .collect();
    let gamma = (0..depth)
        .map(|_| rng.gen_range(GAMMA_RANGE.0..=GAMMA_RANGE.1))
        .collect();
    AngleVector::new(beta, gamma)
}

// ---------------------------------------------------------------------------
// TQA
// ---------------------------------------------------------------------------

/// Trotterised quantum annealing schedule with total time `t_max`.
///
/// With `dt = t_max / p` and midpoints `t_i = dt (i - 1/2)` for `i = 1..=p`:
///
/// ```text
/// gamma_i = (t_i / t_max) dt
/// beta_i  = (1 - t_i / t_max) dt
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TqaSchedule {
    t_max: f64,
}

impl TqaSchedule {
    /// Schedule over total annealing time `t_max > 0`.
    pub fn new(t_max: f64) -> InitResult<Self> {
        if !t_max.is_finite() || t_max <= 0.0 {
            return Err(InitError::InvalidParameter(format!(
                "t_max must be a positive finite time, got {t_max}"
            )));
        }
        Ok(Self { t_max })
    }

    /// Total annealing time.
    pub fn t_max(&self) -> f64 {
        self.t_max
    }
}

impl Initializer for TqaSchedule {
    fn source(&self) -> SourceTag {
        SourceTag::Tqa
    }

    fn initialize(&self, depth: usize, _graph: &GraphRecord) -> InitResult<AngleVector> {
        check_depth(depth)?;
        let dt = self.t_max / depth as f64;
        let fractions: Vec<f64> = (1..=depth)
            .map(|i| dt * (i as f64 - 0.5) / self.t_max)
            .collect();

        let gamma = fractions.iter().map(|f| f * dt).collect();
        let beta = fractions.iter().map(|f| (1.0 - f) * dt).collect();
        debug!(depth, t_max = self.t_max, dt, "TQA schedule");
        AngleVector::new(beta, gamma)
    }
}

// ---------------------------------------------------------------------------
// INTERP
// ---------------------------------------------------------------------------

/// Interpolation from optimised angles at the previous depth.
///
/// For `old` of length `p - 1`, the new sequence keeps both endpoints and
/// blends neighbours in between:
///
/// ```text
/// new[0]   = old[0]
/// new[i]   = (i / (p-1)) old[i-1] + (1 - i / (p-1)) old[i],   0 < i < p-1
/// new[p-1] = old[p-2]
/// ```
///
/// Beta and gamma are interpolated independently.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpSchedule {
    previous: AngleVector,
}

impl InterpSchedule {
    /// Schedule seeded with the optimised angles of the previous depth.
    pub fn new(previous: AngleVector) -> Self {
        Self { previous }
    }

    /// The angles being interpolated.
    pub fn previous(&self) -> &AngleVector {
        &self.previous
    }
}

impl Initializer for InterpSchedule {
    fn source(&self) -> SourceTag {
        SourceTag::Interp
    }

    fn initialize(&self, depth: usize, _graph: &GraphRecord) -> InitResult<AngleVector> {
        check_depth(depth)?;
        if depth < 2 {
            return Err(InitError::InvalidParameter(
                "interpolation needs a target depth of at least 2".into(),
            ));
        }
        if self.previous.depth() != depth - 1 {
            return Err(InitError::InvalidParameter(format!(
                "interpolating to depth {depth} needs {} previous angles, got {}",
                depth - 1,
                self.previous.depth()
            )));
        }
        AngleVector::new(
            interpolate(self.previous.beta()),
            interpolate(self.previous.gamma()),
        )
    }
}

/// Lift a length `p - 1` sequence to length `p`. `old` must be non-empty.
fn interpolate(old: &[f64]) -> Vec<f64> {
    let prev = old.len();
    let mut new = Vec::with_capacity(prev + 1);
    new.push(old[0]);
    for i in 1..prev {
        let w = i as f64 / prev as f64;
        new.push(w * old[i - 1] + (1.0 - w) * old[i]);
    }
    new.push(old[prev - 1]);
    new
}
