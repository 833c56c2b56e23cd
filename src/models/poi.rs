//! Points of interest and their opening hours

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Longest accepted visit
pub const MAX_VISIT_HOURS: f64 = 24.0;

fn default_visit_duration() -> f64 {
    1.0
}

fn default_confidence() -> f64 {
    1.0
}

/// Provider price level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceLevel {
    Free,
    Inexpensive,
    Moderate,
    Expensive,
    VeryExpensive,
}

/// A single opening interval
///
/// `day_of_week` runs from 0 (Sunday) to 6 (Saturday). A `close_time` that is
/// not after `open_time` closes on the following day; equal times mean the
/// place is open around the clock from that day on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningPeriod {
    pub day_of_week: u8,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

impl OpeningPeriod {
    #[must_use]
    pub fn new(day_of_week: u8, open_time: NaiveTime, close_time: NaiveTime) -> Self {
        Self {
            day_of_week,
            open_time,
            close_time,
        }
    }

    /// Closes after midnight
    #[must_use]
    pub fn wraps_midnight(&self) -> bool {
        self.close_time <= self.open_time
    }
}

/// Opening hours as reported by the place provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub is_open_now: Option<bool>,
    #[serde(default)]
    pub periods: Vec<OpeningPeriod>,
    /// Display text only, never parsed
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

/// Day index used by [`OpeningPeriod::day_of_week`]
#[must_use]
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

impl OpeningHours {
    #[must_use]
    pub fn from_periods(periods: Vec<OpeningPeriod>) -> Self {
        Self {
            is_open_now: None,
            periods,
            weekday_text: Vec::new(),
        }
    }

    /// Whether the place is open at `at`. No periods means no known restriction.
    #[must_use]
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        if self.periods.is_empty() {
            return true;
        }

        let today = day_of_week(at.date());
        let yesterday = (today + 6) % 7;
        let time = at.time();

        self.periods.iter().any(|period| {
            if period.day_of_week == today {
                if period.wraps_midnight() {
                    time >= period.open_time
                } else {
                    time >= period.open_time && time < period.close_time
                }
            } else {
                period.day_of_week == yesterday && period.wraps_midnight() && time < period.close_time
            }
        })
    }

    /// Next opening instant later on the same calendar day as `at`
    #[must_use]
    pub fn next_opening_same_day(&self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = day_of_week(at.date());
        self.periods
            .iter()
            .filter(|period| period.day_of_week == today && period.open_time > at.time())
            .map(|period| period.open_time)
            .min()
            .map(|open| at.date().and_time(open))
    }
}

/// A validated point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    /// Provider-issued unique id
    pub place_id: String,
    pub name: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub types: BTreeSet<String>,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default = "default_visit_duration")]
    pub visit_duration_hours: f64,
    #[serde(default)]
    pub price_level: Option<PriceLevel>,
    #[serde(default)]
    pub maps_url: Option<String>,
    /// Resolver confidence in `[0, 1]`
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

/// Outcome of [`Poi::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub missing_fields: Vec<String>,
}

impl Poi {
    /// Create a POI with default visit duration and no optional metadata
    pub fn new(place_id: impl Into<String>, name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            place_id: place_id.into(),
            name: name.into(),
            coordinates,
            types: BTreeSet::new(),
            opening_hours: None,
            visit_duration_hours: default_visit_duration(),
            price_level: None,
            maps_url: None,
            confidence: default_confidence(),
        }
    }

    #[must_use]
    pub fn with_opening_hours(mut self, opening_hours: OpeningHours) -> Self {
        self.opening_hours = Some(opening_hours);
        self
    }

    #[must_use]
    pub fn with_visit_duration(mut self, hours: f64) -> Self {
        self.visit_duration_hours = hours;
        self
    }

    #[must_use]
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_price_level(mut self, price_level: PriceLevel) -> Self {
        self.price_level = Some(price_level);
        self
    }

    /// Time spent on site, capped at [`MAX_VISIT_HOURS`]
    #[must_use]
    pub fn visit_duration(&self) -> TimeDelta {
        let hours = self.visit_duration_hours.clamp(0.0, MAX_VISIT_HOURS);
        TimeDelta::seconds((hours * 3600.0).round() as i64)
    }

    /// Check the fields the planner depends on
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut missing_fields = Vec::new();

        if self.place_id.trim().is_empty() {
            missing_fields.push("place_id".to_string());
        }
        if self.name.trim().is_empty() {
            missing_fields.push("name".to_string());
        }
        if !self.coordinates.lat_in_range() {
            missing_fields.push("lat".to_string());
        }
        if !self.coordinates.lng_in_range() {
            missing_fields.push("lng".to_string());
        }
        if !(self.visit_duration_hours > 0.0 && self.visit_duration_hours <= MAX_VISIT_HOURS) {
            missing_fields.push("visit_duration_hours".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            missing_fields.push("confidence".to_string());
        }

        ValidationResult {
            is_valid: missing_fields.is_empty(),
            missing_fields,
        }
    }
}
