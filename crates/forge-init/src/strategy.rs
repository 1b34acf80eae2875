//! The contract every initialisation strategy satisfies.

use std::sync::Arc;

use forge_graph::GraphRecord;
use tracing::debug;

use crate::angles::{AngleVector, InitResponse, SourceTag};
use crate::error::{InitError, InitResult};

/// An angle initialisation strategy.
///
/// Strategies are pure functions of a validated graph and a depth, except
/// [`RandomUniform`](crate::RandomUniform). Every successful result holds
/// exactly `depth` beta and `depth` gamma angles.
pub trait Initializer {
    /// Tag reported alongside the angles.
    fn source(&self) -> SourceTag;

    /// Produce `depth` angle pairs for `graph`.
    fn initialize(&self, depth: usize, graph: &GraphRecord) -> InitResult<AngleVector>;

    /// Whether results are known optima for the graph.
    fn optimal_angles(&self) -> bool {
        false
    }

    /// Run the strategy and wrap the result in the uniform response shape.
    fn respond(&self, depth: usize, graph: &GraphRecord) -> InitResult<InitResponse> {
        let angles = self.initialize(depth, graph)?;
        if angles.depth() != depth {
            return Err(InitError::InvalidParameter(format!(
                "{} produced {} layers for depth {depth}",
                self.source(),
                angles.depth()
            )));
        }
        debug!(source = %self.source(), depth, "angles initialised");
        Ok(InitResponse::new(angles, self.source(), self.optimal_angles()))
    }
}

impl<T: Initializer + ?Sized> Initializer for Arc<T> {
    fn source(&self) -> SourceTag {
        (**self).source()
    }

    fn initialize(&self, depth: usize, graph: &GraphRecord) -> InitResult<AngleVector> {
        (**self).initialize(depth, graph)
    }

    fn optimal_angles(&self) -> bool {
        (**self).optimal_angles()
    }
}

/// Reject depth 0, which no strategy can serve.
pub(crate) fn check_depth(depth: usize) -> InitResult<()> {
    if depth == 0 {
        return Err(InitError::InvalidParameter(
            "depth p must be at least 1".into(),
        ));
    }
    Ok(())
}
