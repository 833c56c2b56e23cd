//! Day plans, itineraries and the planning request

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{Poi, Route, TransportMode, Warning};
use crate::PlannerError;

/// Trip length / pace selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeConstraint {
    #[serde(alias = "6h")]
    HalfDay,
    #[serde(alias = "day")]
    OneDay,
    #[serde(alias = "2days")]
    TwoDays,
    #[serde(alias = "3days")]
    ThreeDays,
    #[serde(alias = "5days")]
    FiveDays,
    Flexible,
}

/// Input contract of the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Candidate places, most relevant first
    pub pois_ranked: Vec<Poi>,
    pub transport_mode: TransportMode,
    pub time_constraint: TimeConstraint,
    /// Calendar date of the first day
    pub start_date: NaiveDate,
    /// Wall-clock time each day starts at
    pub day_start_time: NaiveTime,
}

impl PlanRequest {
    /// Start instant of day `day_index`; fails past the end of the calendar
    pub fn day_start(&self, day_index: usize) -> crate::Result<NaiveDateTime> {
        let offset = chrono::Days::new(day_index as u64);
        self.start_date
            .checked_add_days(offset)
            .map(|date| date.and_time(self.day_start_time))
            .ok_or_else(|| {
                PlannerError::invalid_input(format!(
                    "day {} after {} is out of the calendar range",
                    day_index + 1,
                    self.start_date
                ))
            })
    }
}

/// Simulated arrival and departure at one stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledVisit {
    pub place_id: String,
    pub arrival: NaiveDateTime,
    pub departure: NaiveDateTime,
    /// Time spent waiting for the place to open
    pub waited_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day_index: usize,
    pub route: Route,
    pub start_time: NaiveDateTime,
    pub estimated_end_time: NaiveDateTime,
    pub visits: Vec<ScheduledVisit>,
    pub warnings: Vec<Warning>,
}

/// The planner's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub days: Vec<DayPlan>,
    /// Meters travelled across all days
    pub total_distance: u64,
    /// Seconds travelling across all days
    pub total_duration: u64,
    /// Itinerary-level warnings followed by every day's warnings
    pub warnings: Vec<Warning>,
}

impl Itinerary {
    /// Assemble an itinerary from finished days, ordering them by index and
    /// recomputing totals.
    #[must_use]
    pub fn new(mut days: Vec<DayPlan>, itinerary_warnings: Vec<Warning>) -> Self {
        days.sort_by_key(|day| day.day_index);

        let total_distance = days.iter().map(|day| day.route.total_distance).sum();
        let total_duration = days.iter().map(|day| day.route.total_duration).sum();

        let mut warnings = itinerary_warnings;
        warnings.extend(days.iter().flat_map(|day| day.warnings.iter().cloned()));

        Self {
            days,
            total_distance,
            total_duration,
            warnings,
        }
    }

    #[must_use]
    pub fn poi_count(&self) -> usize {
        self.days.iter().map(|day| day.route.ordered_pois.len()).sum()
    }

    /// Index of the day visiting `place_id`
    #[must_use]
    pub fn day_of(&self, place_id: &str) -> Option<usize> {
        self.days
            .iter()
            .find(|day| day.route.ordered_pois.iter().any(|poi| poi.place_id == place_id))
            .map(|day| day.day_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, RouteLeg, WarningCode};

    fn day(day_index: usize, ids: &[&str], leg_meters: u64) -> DayPlan {
        let pois: Vec<Poi> = ids
            .iter()
            .map(|id| Poi::new(*id, *id, Coordinates { lat: 0.0, lng: 0.0 }))
            .collect();
        let legs = pois
            .windows(2)
            .map(|pair| RouteLeg {
                from_place_id: pair[0].place_id.clone(),
                to_place_id: pair[1].place_id.clone(),
                distance_meters: leg_meters,
                duration_seconds: leg_meters,
                transport_mode: TransportMode::Walking,
            })
            .collect();
        let start = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        DayPlan {
            day_index,
            route: Route::new(pois, legs, TransportMode::Walking).unwrap(),
            start_time: start,
            estimated_end_time: start,
            visits: Vec::new(),
            warnings: vec![Warning::new(WarningCode::OverBudget, format!("day {day_index}"))],
        }
    }

    #[test]
    fn test_itinerary_orders_days_and_sums_totals() {
        let itinerary = Itinerary::new(
            vec![day(1, &["c", "d"], 300), day(0, &["a", "b", "e"], 100)],
            vec![Warning::new(WarningCode::DuplicatePoi, "dropped")],
        );
        assert_eq!(itinerary.days[0].day_index, 0);
        assert_eq!(itinerary.total_distance, 500);
        assert_eq!(itinerary.total_duration, 500);
        assert_eq!(itinerary.poi_count(), 5);
        assert_eq!(itinerary.day_of("d"), Some(1));
        assert_eq!(itinerary.day_of("zzz"), None);

        let messages: Vec<_> = itinerary.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(messages, vec!["dropped", "day 0", "day 1"]);
    }

    #[test]
    fn test_time_constraint_aliases() {
        let parsed: TimeConstraint = serde_json::from_str("\"6h\"").unwrap();
        assert_eq!(parsed, TimeConstraint::HalfDay);
        let parsed: TimeConstraint = serde_json::from_str("\"three_days\"").unwrap();
        assert_eq!(parsed, TimeConstraint::ThreeDays);
    }

    #[test]
    fn test_day_start() {
        let request = PlanRequest {
            pois_ranked: Vec::new(),
            transport_mode: TransportMode::Walking,
            time_constraint: TimeConstraint::TwoDays,
            start_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            day_start_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        };
        assert_eq!(
            request.day_start(1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_day_start_past_calendar_end_is_an_error() {
        let request = PlanRequest {
            pois_ranked: Vec::new(),
            transport_mode: TransportMode::Walking,
            time_constraint: TimeConstraint::TwoDays,
            start_date: NaiveDate::MAX,
            day_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        assert_eq!(request.day_start(0).unwrap().date(), NaiveDate::MAX);
        assert!(matches!(request.day_start(1), Err(PlannerError::InvalidInput { .. })));
    }
}
