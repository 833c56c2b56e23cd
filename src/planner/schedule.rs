//! Arrival simulation against opening hours

use chrono::{NaiveDateTime, TimeDelta};
use tracing::debug;

use super::budget::DayBudget;
use crate::models::{Route, ScheduledVisit, Warning, WarningCode};

/// Longest leg the clock will advance by
const MAX_LEG_SECONDS: u64 = 7 * 24 * 3600;

fn leg_duration(seconds: u64) -> TimeDelta {
    TimeDelta::seconds(seconds.min(MAX_LEG_SECONDS) as i64)
}

/// `at + delta`, saturating at the end of the representable calendar
fn advance(at: NaiveDateTime, delta: TimeDelta) -> NaiveDateTime {
    at.checked_add_signed(delta).unwrap_or(NaiveDateTime::MAX)
}

/// Simulated timeline of one day
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub visits: Vec<ScheduledVisit>,
    pub end_time: NaiveDateTime,
    pub warnings: Vec<Warning>,
}

/// Walk the route from `day_start`, waiting for closed places when the day allows it.
///
/// Places that stay closed are kept and reported with `CLOSED_AT_VISIT`.
/// The day gets `OVER_BUDGET` when it runs past its hours or, for walking,
/// past its distance ceiling.
#[must_use]
pub fn schedule(route: &Route, day_start: NaiveDateTime, budget: &DayBudget) -> Schedule {
    let day_end = advance(day_start, budget.day_length());
    let mut clock = day_start;
    let mut visits = Vec::with_capacity(route.ordered_pois.len());
    let mut warnings = Vec::new();

    for (k, poi) in route.ordered_pois.iter().enumerate() {
        if let Some(leg) = k.checked_sub(1).and_then(|prev| route.legs.get(prev)) {
            clock = advance(clock, leg_duration(leg.duration_seconds));
        }

        let arrival = clock;
        let mut waited_seconds = 0;

        if let Some(hours) = &poi.opening_hours
            && !hours.is_open_at(clock)
        {
            match hours.next_opening_same_day(clock) {
                Some(open) if advance(open, poi.visit_duration()) <= day_end => {
                    waited_seconds = u64::try_from((open - clock).num_seconds()).unwrap_or(0);
                    debug!("Waiting {}s for {} to open", waited_seconds, poi.name);
                    clock = open;
                }
                _ => {
                    warnings.push(
                        Warning::new(
                            WarningCode::ClosedAtVisit,
                            format!(
                                "{} is closed at the planned arrival ({})",
                                poi.name,
                                arrival.format("%a %H:%M")
                            ),
                        )
                        .with_pois([poi.place_id.clone()]),
                    );
                }
            }
        }

        clock = advance(clock, poi.visit_duration());
        visits.push(ScheduledVisit {
            place_id: poi.place_id.clone(),
            arrival,
            departure: clock,
            waited_seconds,
        });
    }

    if clock > day_end {
        let over = (clock - day_end).num_minutes();
        warnings.push(Warning::new(
            WarningCode::OverBudget,
            format!(
                "Day runs {over} min past its {}h budget",
                budget.hours_per_day
            ),
        ));
    }

    if let Some(limit_km) = budget.max_daily_distance_km {
        let km = route.total_distance as f64 / 1000.0;
        if km > limit_km {
            warnings.push(Warning::new(
                WarningCode::OverBudget,
                format!("Day covers {km:.1}km, above the {limit_km:.0}km daily limit"),
            ));
        }
    }

    Schedule {
        visits,
        end_time: clock,
        warnings,
    }
}
