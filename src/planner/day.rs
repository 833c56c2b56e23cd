//! Planning of a single day: matrix lookup, sequencing, legs and schedule

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::budget::DayBudget;
use super::outcome::Outcome;
use super::schedule::schedule;
use super::sequencer::sequence_indices;
use crate::geo;
use crate::models::{DayPlan, Poi, Route, RouteLeg, TransportMode, Warning, WarningCode};
use crate::routing::{DistanceMatrix, DistanceProvider, EstimateProvider, ProviderError, TravelCost};
use crate::PlannerError;

/// Shared state for the days of one request
#[derive(Clone)]
pub struct DayContext {
    pub provider: Arc<dyn DistanceProvider>,
    pub mode: TransportMode,
    pub budget: DayBudget,
    /// Set once the provider reports quota exhaustion; later days skip the provider
    pub quota_hit: Arc<AtomicBool>,
}

impl DayContext {
    pub fn new(provider: Arc<dyn DistanceProvider>, mode: TransportMode, budget: DayBudget) -> Self {
        Self {
            provider,
            mode,
            budget,
            quota_hit: Arc::new(AtomicBool::new(false)),
        }
    }

    fn quota_error(&self, err: ProviderError) -> PlannerError {
        self.quota_hit.store(true, Ordering::SeqCst);
        err.into()
    }
}

/// Estimate used when a cell is missing. Transit pairs without a route are walked.
fn fallback_cost(from: &Poi, to: &Poi, mode: TransportMode) -> TravelCost {
    let estimate_mode = match mode {
        TransportMode::Transit => TransportMode::Walking,
        other => other,
    };
    geo::estimate_cost(&from.coordinates, &to.coordinates, estimate_mode)
}

fn partial_data(message: String, from: &Poi, to: &Poi) -> Warning {
    Warning::new(WarningCode::PartialData, message)
        .with_pois([from.place_id.clone(), to.place_id.clone()])
}

/// Plan one day. Only quota exhaustion is fatal; every other provider problem
/// degrades to estimates with a warning.
#[tracing::instrument(name = "plan_day", skip(ctx, pois), fields(pois = pois.len()))]
pub async fn plan_day(
    ctx: &DayContext,
    day_index: usize,
    pois: Vec<Poi>,
    day_start: NaiveDateTime,
) -> Outcome<DayPlan> {
    if ctx.quota_hit.load(Ordering::SeqCst) {
        return Outcome::Fatal(PlannerError::quota_exceeded(
            "distance provider quota exhausted earlier in this request",
        ));
    }

    let mode = ctx.mode;
    let points: Vec<_> = pois.iter().map(|poi| poi.coordinates).collect();
    let mut warnings = Vec::new();

    let matrix = if pois.len() <= 1 {
        DistanceMatrix::unreachable(pois.len())
    } else {
        match ctx.provider.get_matrix(&points, mode).await {
            Ok(matrix) if matrix.size() == pois.len() => matrix,
            Ok(matrix) => {
                warn!("Provider returned a {}x{} matrix for {} points", matrix.size(), matrix.size(), pois.len());
                warnings.push(Warning::new(
                    WarningCode::PartialData,
                    format!("Day {}: travel times are estimates (malformed provider response)", day_index + 1),
                ));
                EstimateProvider::matrix(&points, mode)
            }
            Err(err) if err.is_quota() => return Outcome::Fatal(ctx.quota_error(err)),
            Err(err) => {
                warn!("Distance provider failed, falling back to estimates: {}", err);
                warnings.push(Warning::new(
                    WarningCode::PartialData,
                    format!("Day {}: travel times are estimates ({err})", day_index + 1),
                ));
                EstimateProvider::matrix(&points, mode)
            }
        }
    };

    let duration = |i: usize, j: usize| match matrix.cost(i, j) {
        Some(cost) => cost.duration_seconds,
        None => fallback_cost(&pois[i], &pois[j], mode).duration_seconds,
    };
    let order = sequence_indices(pois.len(), &duration);
    debug!("Visit order {:?}", order);

    let mut legs = Vec::with_capacity(order.len().saturating_sub(1));
    for pair in order.windows(2) {
        let (from, to) = (&pois[pair[0]], &pois[pair[1]]);
        let leg = |cost: TravelCost, transport_mode: TransportMode| RouteLeg {
            from_place_id: from.place_id.clone(),
            to_place_id: to.place_id.clone(),
            distance_meters: cost.distance_meters,
            duration_seconds: cost.duration_seconds,
            transport_mode,
        };

        if let Some(cost) = matrix.cost(pair[0], pair[1]) {
            legs.push(leg(cost, mode));
            continue;
        }

        if mode != TransportMode::Transit {
            warnings.push(partial_data(
                format!("No {mode} route from {} to {}; using an estimate", from.name, to.name),
                from,
                to,
            ));
            legs.push(leg(fallback_cost(from, to, mode), mode));
            continue;
        }

        warnings.push(
            Warning::new(
                WarningCode::NoTransitRoute,
                format!("No transit route from {} to {}; walking instead", from.name, to.name),
            )
            .with_pois([from.place_id.clone(), to.place_id.clone()]),
        );
        let walking = ctx
            .provider
            .get_matrix(&[from.coordinates, to.coordinates], TransportMode::Walking)
            .await;
        let cost = match walking {
            Ok(matrix) if matrix.size() == 2 && matrix.cost(0, 1).is_some() => matrix.cost(0, 1),
            Err(err) if err.is_quota() => return Outcome::Fatal(ctx.quota_error(err)),
            Ok(_) | Err(_) => None,
        };
        let cost = cost.unwrap_or_else(|| {
            warnings.push(partial_data(
                format!("Walking time from {} to {} is an estimate", from.name, to.name),
                from,
                to,
            ));
            fallback_cost(from, to, mode)
        });
        legs.push(leg(cost, TransportMode::Walking));
    }

    let ordered: Vec<Poi> = order.iter().map(|&i| pois[i].clone()).collect();
    let route = match Route::new(ordered, legs, mode) {
        Ok(route) => route,
        Err(err) => return Outcome::Fatal(err),
    };

    let simulated = schedule(&route, day_start, &ctx.budget);
    warnings.extend(simulated.warnings);

    let plan = DayPlan {
        day_index,
        route,
        start_time: day_start,
        estimated_end_time: simulated.end_time,
        visits: simulated.visits,
        warnings: warnings.clone(),
    };
    Outcome::with_warnings(plan, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, TimeConstraint};
    use crate::routing::MatrixCell;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;

    struct FailingProvider {
        error: ProviderError,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DistanceProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn get_matrix(
            &self,
            _points: &[Coordinates],
            _mode: TransportMode,
        ) -> Result<DistanceMatrix, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    /// Every non-diagonal cell is unreachable
    struct NoRouteProvider;

    #[async_trait]
    impl DistanceProvider for NoRouteProvider {
        fn name(&self) -> &'static str {
            "no-route"
        }

        async fn get_matrix(
            &self,
            points: &[Coordinates],
            _mode: TransportMode,
        ) -> Result<DistanceMatrix, ProviderError> {
            Ok(DistanceMatrix::unreachable(points.len()))
        }
    }

    fn pois() -> Vec<Poi> {
        vec![
            Poi::new("louvre", "Louvre", Coordinates { lat: 48.8606, lng: 2.3376 }),
            Poi::new("notre-dame", "Notre-Dame", Coordinates { lat: 48.8530, lng: 2.3499 }),
            Poi::new("pantheon", "Pantheon", Coordinates { lat: 48.8462, lng: 2.3464 }),
        ]
    }

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn context(provider: Arc<dyn DistanceProvider>, mode: TransportMode) -> DayContext {
        DayContext::new(provider, mode, DayBudget::new(TimeConstraint::OneDay, mode))
    }

    #[tokio::test]
    async fn test_plans_with_estimate_provider() {
        let ctx = context(Arc::new(EstimateProvider), TransportMode::Walking);
        let outcome = plan_day(&ctx, 0, pois(), start()).await;
        let Outcome::Ok(plan) = outcome else {
            panic!("expected a clean plan");
        };
        assert_eq!(plan.route.ordered_pois.len(), 3);
        assert_eq!(plan.route.legs.len(), 2);
        assert_eq!(plan.route.ordered_pois[0].place_id, "louvre");
        assert_eq!(plan.visits.len(), 3);
        assert!(plan.estimated_end_time > plan.start_time);
    }

    #[tokio::test]
    async fn test_single_poi_skips_provider() {
        let provider = Arc::new(FailingProvider {
            error: ProviderError::Api("down".into()),
            calls: AtomicUsize::new(0),
        });
        let ctx = context(provider.clone(), TransportMode::Walking);
        let outcome = plan_day(&ctx, 0, pois()[..1].to_vec(), start()).await;

        let (plan, warnings) = outcome.into_result().unwrap();
        assert!(warnings.is_empty());
        assert!(plan.route.legs.is_empty());
        assert_eq!(plan.route.total_distance, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_error_degrades_to_estimates() {
        let provider = Arc::new(FailingProvider {
            error: ProviderError::Api("502 bad gateway".into()),
            calls: AtomicUsize::new(0),
        });
        let ctx = context(provider, TransportMode::Driving);
        let outcome = plan_day(&ctx, 0, pois(), start()).await;

        let Outcome::Degraded(plan, warnings) = outcome else {
            panic!("expected a degraded plan");
        };
        assert_eq!(warnings[0].code, WarningCode::PartialData);
        assert_eq!(plan.warnings, warnings);
        assert!(plan.route.total_distance > 0);
        assert!(plan.route.legs.iter().all(|leg| leg.transport_mode == TransportMode::Driving));
    }

    #[tokio::test]
    async fn test_quota_is_fatal_and_sticky() {
        let provider = Arc::new(FailingProvider {
            error: ProviderError::QuotaExceeded("daily limit".into()),
            calls: AtomicUsize::new(0),
        });
        let ctx = context(provider.clone(), TransportMode::Walking);

        let first = plan_day(&ctx, 0, pois(), start()).await;
        assert!(matches!(first, Outcome::Fatal(PlannerError::QuotaExceeded { .. })));
        assert!(ctx.quota_hit.load(Ordering::SeqCst));

        let second = plan_day(&ctx, 1, pois(), start()).await;
        assert!(second.is_fatal());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transit_without_route_walks_with_estimate() {
        let ctx = context(Arc::new(NoRouteProvider), TransportMode::Transit);
        let outcome = plan_day(&ctx, 0, pois()[..2].to_vec(), start()).await;

        let (plan, warnings) = outcome.into_result().unwrap();
        let leg = &plan.route.legs[0];
        assert_eq!(leg.transport_mode, TransportMode::Walking);
        let expected = geo::estimate_cost(
            &pois()[0].coordinates,
            &pois()[1].coordinates,
            TransportMode::Walking,
        );
        assert_eq!(leg.duration_seconds, expected.duration_seconds);

        let codes: Vec<_> = warnings.iter().map(|w| w.code).collect();
        assert_eq!(codes, vec![WarningCode::NoTransitRoute, WarningCode::PartialData]);
        assert!(warnings[0].mentions("louvre") && warnings[0].mentions("notre-dame"));
    }

    #[tokio::test]
    async fn test_unreachable_driving_leg_is_estimated() {
        let ctx = context(Arc::new(NoRouteProvider), TransportMode::Driving);
        let (plan, warnings) = plan_day(&ctx, 0, pois(), start()).await.into_result().unwrap();

        assert_eq!(plan.route.legs.len(), 2);
        assert!(warnings.iter().all(|w| w.code == WarningCode::PartialData));
        assert_eq!(warnings.len(), 2);
        assert!(plan.route.legs.iter().all(|leg| leg.transport_mode == TransportMode::Driving));
    }

    #[test]
    fn test_fallback_cost_walks_transit_pairs() {
        let all = pois();
        let transit = fallback_cost(&all[0], &all[1], TransportMode::Transit);
        let walking = fallback_cost(&all[0], &all[1], TransportMode::Walking);
        assert_eq!(transit, walking);
        assert!(MatrixCell::Reachable(transit).is_reachable());
    }
}
