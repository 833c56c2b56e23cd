//! Stub distance providers and fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use city_walker::config::PlannerSettings;
use city_walker::{
    Coordinates, DistanceMatrix, DistanceProvider, EstimateProvider, ItineraryAssembler,
    MatrixCell, PlanRequest, Poi, ProviderError, TimeConstraint, TransportMode, TravelCost,
};

/// Deterministic estimates that count calls
#[derive(Default)]
pub struct CountingProvider {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DistanceProvider for CountingProvider {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EstimateProvider.get_matrix(points, mode).await
    }
}

/// Answers the first `allowed` calls, then reports quota exhaustion
pub struct QuotaProvider {
    pub allowed: usize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl DistanceProvider for QuotaProvider {
    fn name(&self) -> &'static str {
        "quota"
    }

    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.allowed {
            return Err(ProviderError::QuotaExceeded("daily element limit".into()));
        }
        EstimateProvider.get_matrix(points, mode).await
    }
}

/// Fails every call with a generic API error
pub struct DownProvider;

#[async_trait]
impl DistanceProvider for DownProvider {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn get_matrix(
        &self,
        _points: &[Coordinates],
        _mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        Err(ProviderError::Api("503 service unavailable".into()))
    }
}

/// Answers the first call immediately and sleeps `delay` on every later one
pub struct SlowProvider {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

#[async_trait]
impl DistanceProvider for SlowProvider {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            tokio::time::sleep(self.delay).await;
        }
        EstimateProvider.get_matrix(points, mode).await
    }
}

/// Transit has no route between `a` and `b`; everything else is estimated
pub struct TransitGapProvider {
    pub a: Coordinates,
    pub b: Coordinates,
}

#[async_trait]
impl DistanceProvider for TransitGapProvider {
    fn name(&self) -> &'static str {
        "transit-gap"
    }

    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        let mut matrix = EstimateProvider::matrix(points, mode);
        if mode == TransportMode::Transit {
            for (i, from) in points.iter().enumerate() {
                for (j, to) in points.iter().enumerate() {
                    let gap = (from.same_place(&self.a) && to.same_place(&self.b))
                        || (from.same_place(&self.b) && to.same_place(&self.a));
                    if gap {
                        matrix.set(i, j, MatrixCell::Unreachable);
                    }
                }
            }
        }
        Ok(matrix)
    }
}

/// Corners of a square: sides cost 1000, diagonals 1414 (meters and seconds)
pub struct SquareProvider;

#[async_trait]
impl DistanceProvider for SquareProvider {
    fn name(&self) -> &'static str {
        "square"
    }

    async fn get_matrix(
        &self,
        points: &[Coordinates],
        _mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        Ok(DistanceMatrix::from_fn(points.len(), |i, j| {
            MatrixCell::Reachable(square_cost(&points[i], &points[j]))
        }))
    }
}

pub fn square_cost(a: &Coordinates, b: &Coordinates) -> TravelCost {
    if a.same_place(b) {
        TravelCost::ZERO
    } else if a.lat == b.lat || a.lng == b.lng {
        TravelCost::new(1000, 1000)
    } else {
        TravelCost::new(1414, 1414)
    }
}

pub fn poi(id: &str, lat: f64, lng: f64) -> Poi {
    Poi::new(id, format!("Place {id}"), Coordinates { lat, lng })
}

/// `count` POIs a hundred meters apart around `(lat, lng)`
pub fn neighbourhood(prefix: &str, lat: f64, lng: f64, count: usize) -> Vec<Poi> {
    (0..count)
        .map(|i| poi(&format!("{prefix}{i}"), lat + 0.001 * i as f64, lng))
        .collect()
}

/// Three neighbourhoods of five POIs, several kilometers apart
pub fn three_neighbourhoods() -> Vec<Poi> {
    let mut pois = neighbourhood("left", 48.8600, 2.3400, 5);
    pois.extend(neighbourhood("north", 48.8900, 2.3000, 5));
    pois.extend(neighbourhood("south", 48.8300, 2.3800, 5));
    pois
}

pub fn request(pois: Vec<Poi>, mode: TransportMode, constraint: TimeConstraint) -> PlanRequest {
    PlanRequest {
        pois_ranked: pois,
        transport_mode: mode,
        time_constraint: constraint,
        // a Monday
        start_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        day_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    }
}

pub fn settings(max_concurrent_days: usize) -> PlannerSettings {
    PlannerSettings {
        cluster_radius_km: 1.0,
        max_concurrent_days,
        request_timeout_seconds: 60,
    }
}

pub fn assembler(provider: Arc<dyn DistanceProvider>, max_concurrent_days: usize) -> ItineraryAssembler {
    ItineraryAssembler::new(provider, settings(max_concurrent_days))
}
