//! QAOA Forge Angle Initialisation
//!
//! Every strategy implements [`Initializer`] and returns an [`AngleVector`]
//! of exactly `p` beta and `p` gamma angles:
//!
//! | Strategy | Type | Source tag |
//! |----------|------|------------|
//! | constant angles | [`FixedAngles`] | `Fixed` |
//! | uniform random | [`RandomUniform`] | `Random` |
//! | annealing ramp | [`TqaSchedule`] | `TQA` |
//! | previous-depth interpolation | [`InterpSchedule`] | `INTERP` |
//! | instance-class medians | [`CategoryLookup`] | `QIBPI` |
//! | rescaled density median | [`DensityEstimationInitializer`] | `QAOAKit_KDE` |
//! | isomorphic catalogue optimum | [`GraphLookup`] | `QAOAKit_Lookup` |
//!
//! Tables and models are loaded once and shared read-only through `Arc`;
//! [`Dispatcher`] turns a flat [`StrategyRequest`] into the right strategy.
//!
//! # Example
//!
//! ```rust
//! use forge_init::{Dispatcher, StrategyRequest};
//!
//! let dispatcher = Dispatcher::default();
//! let mut request = StrategyRequest::new("tqa", 2);
//! request.t_max = Some(1.0);
//!
//! let triangle = vec![
//!     vec![0.0, 1.0, 1.0],
//!     vec![1.0, 0.0, 1.0],
//!     vec![1.0, 1.0, 0.0],
//! ];
//! let response = dispatcher.dispatch(&request, &triangle).unwrap();
//! assert_eq!(response.gamma.len(), 2);
//! assert!(!response.optimal_angles);
//! ```

pub mod angles;
pub mod closed_form;
pub mod density;
pub mod dispatch;
pub mod error;
pub mod lookup;
pub mod strategy;

pub use angles::{AngleVector, InitResponse, SourceTag};
pub use closed_form::{FixedAngles, InterpSchedule, RandomUniform, TqaSchedule, sample_uniform};
pub use density::{DensityEstimationInitializer, DensityModel, DensityModelRegistry, MedianLayout};
pub use dispatch::{Dispatcher, StrategyKind, StrategyRequest};
pub use error::{InitError, InitResult};
pub use lookup::{
    CategoryLookup, CategoryParameterTable, GraphAngleTable, GraphLookup, InstanceClass,
    LookupStore, WeightType,
};
pub use strategy::Initializer;
