//! Routes, legs and transport modes

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::Poi;
use crate::PlannerError;

/// How the traveller moves between places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walking,
    Transit,
    Driving,
}

impl TransportMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Transit => "transit",
            TransportMode::Driving => "driving",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directed travel segment between consecutive stops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub from_place_id: String,
    pub to_place_id: String,
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub transport_mode: TransportMode,
}

/// An ordered visit sequence with its travel legs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub ordered_pois: Vec<Poi>,
    pub legs: Vec<RouteLeg>,
    /// Sum of leg distances in meters
    pub total_distance: u64,
    /// Sum of leg durations in seconds
    pub total_duration: u64,
    pub transport_mode: TransportMode,
}

impl Route {
    /// Build a route, checking that the legs chain through the stops in order
    pub fn new(
        ordered_pois: Vec<Poi>,
        legs: Vec<RouteLeg>,
        transport_mode: TransportMode,
    ) -> crate::Result<Self> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = ordered_pois
            .iter()
            .find(|poi| !seen.insert(poi.place_id.as_str()))
        {
            return Err(PlannerError::invalid_input(format!(
                "place {} appears twice in one route",
                duplicate.place_id
            )));
        }

        let expected_legs = ordered_pois.len().saturating_sub(1);
        if legs.len() != expected_legs {
            return Err(PlannerError::invalid_input(format!(
                "route with {} stops needs {expected_legs} legs, got {}",
                ordered_pois.len(),
                legs.len()
            )));
        }

        for (leg, stops) in legs.iter().zip(ordered_pois.windows(2)) {
            if leg.from_place_id != stops[0].place_id || leg.to_place_id != stops[1].place_id {
                return Err(PlannerError::invalid_input(format!(
                    "leg {} -> {} does not connect {} -> {}",
                    leg.from_place_id, leg.to_place_id, stops[0].place_id, stops[1].place_id
                )));
            }
        }

        let total_distance = legs.iter().map(|leg| leg.distance_meters).sum();
        let total_duration = legs.iter().map(|leg| leg.duration_seconds).sum();

        Ok(Self {
            ordered_pois,
            legs,
            total_distance,
            total_duration,
            transport_mode,
        })
    }

    /// A route with a single stop or none at all
    #[must_use]
    pub fn without_legs(poi: Option<Poi>, transport_mode: TransportMode) -> Self {
        Self {
            ordered_pois: poi.into_iter().collect(),
            legs: Vec::new(),
            total_distance: 0,
            total_duration: 0,
            transport_mode,
        }
    }

    #[must_use]
    pub fn place_ids(&self) -> Vec<&str> {
        self.ordered_pois.iter().map(|poi| poi.place_id.as_str()).collect()
    }

    /// Short plain-text description of the route
    #[must_use]
    pub fn summary(&self) -> String {
        if self.ordered_pois.is_empty() {
            return "No places in this route.".to_string();
        }
        let distance_km = self.total_distance as f64 / 1000.0;
        let duration_mins = self.total_duration / 60;
        format!(
            "This {} route covers {} stops over {distance_km:.1}km (~{duration_mins} min).",
            self.transport_mode,
            self.ordered_pois.len()
        )
    }
}
