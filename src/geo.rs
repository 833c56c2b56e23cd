//! Great-circle distance math and straight-line travel estimates.
//!
//! These are estimators only. Once a distance provider answers for a pair,
//! its numbers win.

use haversine::{Location as HaversineLocation, Units, distance};

use crate::models::{Coordinates, TransportMode};
use crate::routing::TravelCost;

/// Assumed average speed per mode when no provider data exists
#[must_use]
pub fn estimated_speed_kmh(mode: TransportMode) -> f64 {
    match mode {
        TransportMode::Walking => 5.0,
        TransportMode::Transit => 20.0,
        TransportMode::Driving => 30.0,
    }
}

/// Haversine distance in kilometers (Earth radius 6371 km)
#[must_use]
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let from = HaversineLocation {
        latitude: a.lat,
        longitude: a.lng,
    };
    let to = HaversineLocation {
        latitude: b.lat,
        longitude: b.lng,
    };
    distance(from, to, Units::Kilometers)
}

/// Straight-line travel cost between two points at the mode's assumed speed
#[must_use]
pub fn estimate_cost(a: &Coordinates, b: &Coordinates, mode: TransportMode) -> TravelCost {
    let km = distance_km(a, b);
    let hours = km / estimated_speed_kmh(mode);
    TravelCost {
        distance_meters: (km * 1000.0).round() as u64,
        duration_seconds: (hours * 3600.0).round() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let point = Coordinates { lat: 36.1, lng: -115.1 };
        assert!(distance_km(&point, &point) < 0.001);
        assert_eq!(estimate_cost(&point, &point, TransportMode::Walking), TravelCost::ZERO);
    }

    #[test]
    fn test_known_distance() {
        // Paris to London, ~343.5 km
        let paris = Coordinates { lat: 48.8566, lng: 2.3522 };
        let london = Coordinates { lat: 51.5074, lng: -0.1278 };
        let km = distance_km(&paris, &london);
        assert!(km > 340.0 && km < 347.0, "Paris to London should be ~343km, got {km}");
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinates { lat: 41.8902, lng: 12.4922 };
        let b = Coordinates { lat: 41.9029, lng: 12.4534 };
        assert!((distance_km(&a, &b) - distance_km(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn test_walking_estimate() {
        // one degree of latitude is ~111.19 km; 0.009 deg ~ 1 km
        let a = Coordinates { lat: 0.0, lng: 0.0 };
        let b = Coordinates { lat: 0.009, lng: 0.0 };
        let cost = estimate_cost(&a, &b, TransportMode::Walking);
        assert_eq!(cost.distance_meters, 1001);
        // 1.0007 km at 5 km/h
        assert_eq!(cost.duration_seconds, 721);
    }

    #[test]
    fn test_faster_modes_take_less_time() {
        let a = Coordinates { lat: 48.85, lng: 2.35 };
        let b = Coordinates { lat: 48.87, lng: 2.30 };
        let walking = estimate_cost(&a, &b, TransportMode::Walking);
        let transit = estimate_cost(&a, &b, TransportMode::Transit);
        let driving = estimate_cost(&a, &b, TransportMode::Driving);
        assert_eq!(walking.distance_meters, driving.distance_meters);
        assert!(walking.duration_seconds > transit.duration_seconds);
        assert!(transit.duration_seconds > driving.duration_seconds);
    }
}
