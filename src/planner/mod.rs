//! Itinerary planning engine
//!
//! Flow per request: validate → cluster → allocate to days → dedup, then for
//! every day concurrently: distance matrix → sequence → legs → schedule.

pub mod assembler;
pub mod budget;
pub mod cluster;
pub mod day;
pub mod outcome;
pub mod schedule;
pub mod sequencer;

pub use assembler::ItineraryAssembler;
pub use budget::{DayBudget, allocate};
pub use cluster::cluster;
pub use outcome::Outcome;
pub use schedule::{Schedule, schedule};
pub use sequencer::sequence;
