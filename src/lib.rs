//! `City Walker` - multi-day itinerary planning
//!
//! This library turns a ranked list of validated points of interest into a
//! day-by-day itinerary: proximity clustering, day allocation, route
//! sequencing and opening-hours scheduling on top of a pluggable distance
//! provider.

pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod planner;
pub mod routing;
pub mod telemetry;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::PlannerConfig;
pub use error::{AppError, ErrorCode, PlannerError, RecoveryOption};
pub use models::{
    Coordinates, DayPlan, Itinerary, OpeningHours, OpeningPeriod, PlanRequest, Poi, Route,
    RouteLeg, TimeConstraint, TransportMode, Warning, WarningCode,
};
pub use planner::{DayBudget, ItineraryAssembler, Outcome};
pub use routing::{
    CachedDistanceProvider, DistanceMatrix, DistanceProvider, EstimateProvider, MatrixCell,
    ProviderError, TravelCost,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
