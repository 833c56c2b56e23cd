//! Distance providers
//!
//! A [`DistanceProvider`] answers pairwise travel cost queries for a transport
//! mode. The planner only ever talks to the network through this trait; the
//! concrete provider is picked from configuration by [`provider_from_config`].

pub mod cached;
pub mod error;
pub mod estimate;
pub mod google;
pub mod http;
pub mod matrix;
pub mod osrm;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

pub use cached::CachedDistanceProvider;
pub use error::ProviderError;
pub use estimate::EstimateProvider;
pub use google::GoogleDistanceProvider;
pub use matrix::{DistanceMatrix, MatrixCell, TravelCost};
pub use osrm::OsrmProvider;

use crate::cache::PersistentCache;
use crate::config::{PlannerConfig, ProviderKind};
use crate::models::{Coordinates, TransportMode};
use crate::PlannerError;

/// Source of travel costs between coordinates
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Square matrix of travel costs for `points` under `mode`.
    ///
    /// `points` may contain duplicates; cells between identical coordinates
    /// cost nothing. Pairs without a route are [`MatrixCell::Unreachable`].
    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError>;
}

/// Force cells between identical coordinates to zero cost
pub fn zero_duplicate_cells(points: &[Coordinates], matrix: &mut DistanceMatrix) {
    for (i, a) in points.iter().enumerate() {
        for (j, b) in points.iter().enumerate() {
            if i == j || a.same_place(b) {
                matrix.set(i, j, MatrixCell::Reachable(TravelCost::ZERO));
            }
        }
    }
}

/// Build the configured provider wrapped in the distance cache
pub fn provider_from_config(config: &PlannerConfig) -> crate::Result<Arc<dyn DistanceProvider>> {
    let routing = &config.routing;
    let timeout = Duration::from_secs(u64::from(routing.timeout_seconds));

    let inner: Arc<dyn DistanceProvider> = match routing.provider {
        ProviderKind::Osrm => Arc::new(OsrmProvider::new(
            routing.effective_base_url(),
            timeout,
            routing.max_retries,
        )?),
        ProviderKind::Google => {
            let api_key = routing.api_key.clone().ok_or_else(|| {
                PlannerError::config("The google distance provider requires routing.api_key")
            })?;
            Arc::new(GoogleDistanceProvider::new(
                routing.effective_base_url(),
                api_key,
                timeout,
                routing.max_retries,
            )?)
        }
        ProviderKind::Estimate => Arc::new(EstimateProvider::new()),
    };

    let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
    let mut cached = CachedDistanceProvider::new(inner, ttl);
    if config.cache.persistent {
        let location = config.cache.resolved_location();
        let store = PersistentCache::open(&location)
            .map_err(|e| PlannerError::cache(format!("{e:#}")))?;
        cached = cached.with_persistent(Arc::new(store));
        info!("Persistent distance cache at {}", location.display());
    }

    info!("Using {} distance provider", routing.provider);
    Ok(Arc::new(cached))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_duplicate_cells() {
        let a = Coordinates { lat: 1.0, lng: 1.0 };
        let b = Coordinates { lat: 2.0, lng: 2.0 };
        let mut matrix = DistanceMatrix::from_fn(3, |_, _| {
            MatrixCell::Reachable(TravelCost::new(500, 60))
        });
        zero_duplicate_cells(&[a, b, a], &mut matrix);

        assert_eq!(matrix.cost(0, 0), Some(TravelCost::ZERO));
        assert_eq!(matrix.cost(0, 2), Some(TravelCost::ZERO));
        assert_eq!(matrix.cost(2, 0), Some(TravelCost::ZERO));
        assert_eq!(matrix.cost(0, 1), Some(TravelCost::new(500, 60)));
    }

    #[test]
    fn test_provider_selection() {
        let mut config = PlannerConfig::default();
        config.routing.provider = ProviderKind::Estimate;
        assert_eq!(provider_from_config(&config).unwrap().name(), "estimate");

        config.routing.provider = ProviderKind::Osrm;
        assert_eq!(provider_from_config(&config).unwrap().name(), "osrm");
    }

    #[test]
    fn test_google_requires_api_key() {
        let mut config = PlannerConfig::default();
        config.routing.provider = ProviderKind::Google;
        config.routing.api_key = None;
        let err = provider_from_config(&config).err().unwrap();
        assert!(matches!(err, PlannerError::Config { .. }));

        config.routing.api_key = Some("test_api_key_123".to_string());
        assert_eq!(provider_from_config(&config).unwrap().name(), "google");
    }

    #[test]
    fn test_persistent_tier_opens_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PlannerConfig::default();
        config.routing.provider = ProviderKind::Estimate;
        config.cache.persistent = true;
        config.cache.location = dir.path().join("store").to_string_lossy().into_owned();
        assert!(provider_from_config(&config).is_ok());
    }
}
