//! Geographic coordinates

use serde::{Deserialize, Serialize};

use crate::PlannerError;

/// Decimal places kept in cache keys (~1.1 m at the equator)
pub const CACHE_KEY_PRECISION: u32 = 5;

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees, `[-90, 90]`
    pub lat: f64,
    /// Longitude in decimal degrees, `[-180, 180]`
    pub lng: f64,
}

impl Coordinates {
    /// Create validated coordinates
    pub fn new(lat: f64, lng: f64) -> crate::Result<Self> {
        let coordinates = Self { lat, lng };
        if !coordinates.lat_in_range() {
            return Err(PlannerError::invalid_input(format!(
                "latitude {lat} is outside [-90, 90]"
            )));
        }
        if !coordinates.lng_in_range() {
            return Err(PlannerError::invalid_input(format!(
                "longitude {lng} is outside [-180, 180]"
            )));
        }
        Ok(coordinates)
    }

    #[must_use]
    pub fn lat_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat)
    }

    #[must_use]
    pub fn lng_in_range(&self) -> bool {
        (-180.0..=180.0).contains(&self.lng)
    }

    /// Format coordinates for display
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(5));
        let lat = (self.lat * multiplier).round() / multiplier;
        let lng = (self.lng * multiplier).round() / multiplier;
        (lat, lng)
    }

    /// Stable key fragment used by the distance cache
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lng) = self.rounded_coordinates(CACHE_KEY_PRECISION);
        // normalise -0.0 so that it hashes like 0.0
        format!("{:.5},{:.5}", lat + 0.0, lng + 0.0)
    }

    /// Two points share a cache identity
    #[must_use]
    pub fn same_place(&self, other: &Coordinates) -> bool {
        self.cache_key() == other.cache_key()
    }
}
