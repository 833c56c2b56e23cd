//! Orchestration of a full planning request

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use super::budget::{DayBudget, allocate};
use super::cluster::cluster;
use super::day::{DayContext, plan_day};
use super::outcome::Outcome;
use crate::config::{PlannerConfig, PlannerSettings};
use crate::models::{DayPlan, Itinerary, PlanRequest, Poi, Warning, WarningCode};
use crate::routing::{DistanceProvider, provider_from_config};
use crate::PlannerError;

/// Plans itineraries against one distance provider
pub struct ItineraryAssembler {
    provider: Arc<dyn DistanceProvider>,
    settings: PlannerSettings,
}

/// Keep valid POIs, warning about the rest
fn validate_pois(pois: &[Poi]) -> (Vec<Poi>, Vec<Warning>) {
    let mut valid = Vec::with_capacity(pois.len());
    let mut warnings = Vec::new();
    for poi in pois {
        let result = poi.validate();
        if result.is_valid {
            valid.push(poi.clone());
        } else {
            let label = if poi.name.trim().is_empty() { &poi.place_id } else { &poi.name };
            warnings.push(
                Warning::new(
                    WarningCode::InvalidPoi,
                    format!("Skipped '{label}': invalid {}", result.missing_fields.join(", ")),
                )
                .with_pois([poi.place_id.clone()]),
            );
        }
    }
    (valid, warnings)
}

/// Drop later occurrences of a place id; days are visited in order, ranks within a day
fn dedup_days(days: Vec<(usize, Vec<Poi>)>) -> (Vec<(usize, Vec<Poi>)>, Vec<Warning>) {
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    let mut kept = Vec::with_capacity(days.len());

    for (day_index, pois) in days {
        let mut unique = Vec::with_capacity(pois.len());
        for poi in pois {
            if seen.insert(poi.place_id.clone()) {
                unique.push(poi);
            } else {
                warnings.push(
                    Warning::new(
                        WarningCode::DuplicatePoi,
                        format!("{} was selected more than once; keeping its first visit", poi.name),
                    )
                    .with_pois([poi.place_id.clone()]),
                );
            }
        }
        if !unique.is_empty() {
            kept.push((day_index, unique));
        }
    }
    (kept, warnings)
}

impl ItineraryAssembler {
    pub fn new(provider: Arc<dyn DistanceProvider>, settings: PlannerSettings) -> Self {
        Self { provider, settings }
    }

    /// Assembler backed by the configured (and cached) provider
    pub fn from_config(config: &PlannerConfig) -> crate::Result<Self> {
        Ok(Self::new(provider_from_config(config)?, config.planner.clone()))
    }

    /// Build an itinerary for `request`.
    ///
    /// Fails only when no POI survives validation and allocation. Provider
    /// quota exhaustion and the request deadline stop outstanding days and
    /// return the days finished so far with a `PARTIAL_RESULT` warning.
    #[tracing::instrument(
        name = "plan_itinerary",
        skip(self, request),
        fields(
            pois = request.pois_ranked.len(),
            mode = %request.transport_mode,
            constraint = ?request.time_constraint,
        )
    )]
    pub async fn plan(&self, request: &PlanRequest) -> crate::Result<Itinerary> {
        let timeout = self.settings.request_timeout();
        let deadline = Instant::now()
            .checked_add(timeout)
            .ok_or_else(|| PlannerError::config("request timeout is out of range"))?;

        let (valid, mut itinerary_warnings) = validate_pois(&request.pois_ranked);
        if valid.is_empty() {
            return Err(PlannerError::invalid_input("none of the selected places are valid"));
        }

        let budget = DayBudget::new(request.time_constraint, request.transport_mode);
        let clusters = cluster(&valid, self.settings.cluster_radius_km);
        let allocated = allocate(
            request.time_constraint,
            request.transport_mode,
            &clusters,
            &valid,
        );
        let (days, duplicate_warnings) = dedup_days(allocated);
        itinerary_warnings.extend(duplicate_warnings);

        if days.is_empty() {
            return Err(PlannerError::invalid_input("no places survived allocation"));
        }
        info!(
            "Planning {} POIs in {} clusters over {} days",
            days.iter().map(|(_, pois)| pois.len()).sum::<usize>(),
            clusters.len(),
            days.len()
        );

        let mut scheduled = Vec::with_capacity(days.len());
        for (day_index, pois) in days {
            scheduled.push((day_index, request.day_start(day_index)?, pois));
        }

        let ctx = DayContext::new(Arc::clone(&self.provider), request.transport_mode, budget);
        let expected_days = scheduled.len();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_days.max(1)));
        let mut tasks = JoinSet::new();

        for (day_index, day_start, pois) in scheduled {
            let ctx = ctx.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Outcome::Fatal(PlannerError::api("day scheduler shut down"));
                };
                plan_day(&ctx, day_index, pois, day_start).await
            });
        }

        let mut plans: Vec<DayPlan> = Vec::with_capacity(expected_days);
        let mut stop_reason: Option<String> = None;

        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Err(_) => {
                    warn!("Planning deadline reached with {} days outstanding", tasks.len());
                    tasks.abort_all();
                    stop_reason.get_or_insert_with(|| {
                        format!("Planning timed out after {}s", timeout.as_secs())
                    });
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(join_error))) => {
                    if !join_error.is_cancelled() {
                        warn!("Day planning task failed: {}", join_error);
                        stop_reason.get_or_insert_with(|| "A day could not be planned".to_string());
                    }
                }
                Ok(Some(Ok(outcome))) => match outcome {
                    Outcome::Ok(plan) | Outcome::Degraded(plan, _) => plans.push(plan),
                    Outcome::Fatal(PlannerError::QuotaExceeded { message }) => {
                        warn!("Distance provider quota exceeded, cancelling remaining days: {}", message);
                        tasks.abort_all();
                        stop_reason.get_or_insert_with(|| {
                            "The routing service quota was reached".to_string()
                        });
                    }
                    Outcome::Fatal(err) => {
                        warn!("Day planning failed: {}", err);
                        stop_reason.get_or_insert_with(|| format!("A day could not be planned: {err}"));
                    }
                },
            }
        }

        if let Some(reason) = stop_reason.filter(|_| plans.len() < expected_days) {
            itinerary_warnings.push(Warning::new(
                WarningCode::PartialResult,
                format!("{reason}; {} of {expected_days} days were planned", plans.len()),
            ));
        }

        let itinerary = Itinerary::new(plans, itinerary_warnings);
        info!(
            "Planned {} days, {} POIs, {}m, {} warnings",
            itinerary.days.len(),
            itinerary.poi_count(),
            itinerary.total_distance,
            itinerary.warnings.len()
        );
        Ok(itinerary)
    }
}
