//! Data models for the City Walker planner
//!
//! All values are built fresh per planning request and never mutated once
//! handed back to the caller:
//! - Coordinates: validated latitude/longitude
//! - Poi: a point of interest with opening hours
//! - Route: ordered stops with travel legs
//! - Itinerary: day plans plus warnings

pub mod coordinates;
pub mod itinerary;
pub mod poi;
pub mod route;
pub mod warning;

// Re-export all public types for convenient access
pub use coordinates::Coordinates;
pub use itinerary::{DayPlan, Itinerary, PlanRequest, ScheduledVisit, TimeConstraint};
pub use poi::{OpeningHours, OpeningPeriod, Poi, PriceLevel, ValidationResult};
pub use route::{Route, RouteLeg, TransportMode};
pub use warning::{Warning, WarningCode};
