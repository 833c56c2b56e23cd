//! Offline provider backed by great-circle estimates

use async_trait::async_trait;

use super::{DistanceMatrix, DistanceProvider, MatrixCell, ProviderError};
use crate::geo;
use crate::models::{Coordinates, TransportMode};

/// Estimate travel costs from straight-line distance and a per-mode speed.
///
/// Never fails and never reports a pair as unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateProvider;

impl EstimateProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Synchronous matrix used as the fallback when a real provider fails
    #[must_use]
    pub fn matrix(points: &[Coordinates], mode: TransportMode) -> DistanceMatrix {
        DistanceMatrix::from_fn(points.len(), |i, j| {
            if i == j || points[i].same_place(&points[j]) {
                MatrixCell::Reachable(super::TravelCost::ZERO)
            } else {
                MatrixCell::Reachable(geo::estimate_cost(&points[i], &points[j], mode))
            }
        })
    }
}

#[async_trait]
impl DistanceProvider for EstimateProvider {
    fn name(&self) -> &'static str {
        "estimate"
    }

    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        Ok(Self::matrix(points, mode))
    }
}
