//! Non-fatal planning warnings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// Travel costs were estimated instead of coming from the provider
    PartialData,
    /// A transit leg fell back to walking
    NoTransitRoute,
    /// Place is closed when the traveller gets there
    ClosedAtVisit,
    /// Day runs past its time or distance budget
    OverBudget,
    /// Some days are missing from the itinerary
    PartialResult,
    /// A place selected for more than one slot was dropped
    DuplicatePoi,
    /// An input place failed validation and was skipped
    InvalidPoi,
}

impl WarningCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WarningCode::PartialData => "PARTIAL_DATA",
            WarningCode::NoTransitRoute => "NO_TRANSIT_ROUTE",
            WarningCode::ClosedAtVisit => "CLOSED_AT_VISIT",
            WarningCode::OverBudget => "OVER_BUDGET",
            WarningCode::PartialResult => "PARTIAL_RESULT",
            WarningCode::DuplicatePoi => "DUPLICATE_POI",
            WarningCode::InvalidPoi => "INVALID_POI",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caveat attached to an otherwise usable result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
    /// Place ids this warning is about
    #[serde(default)]
    pub affected_pois: Vec<String>,
}

impl Warning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            affected_pois: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pois<I, S>(mut self, place_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_pois = place_ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn mentions(&self, place_id: &str) -> bool {
        self.affected_pois.iter().any(|id| id == place_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_serialization() {
        let warning = Warning::new(WarningCode::ClosedAtVisit, "Louvre is closed on Tuesdays")
            .with_pois(["louvre"]);
        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["code"], "CLOSED_AT_VISIT");
        assert_eq!(value["affected_pois"][0], "louvre");
        assert!(warning.mentions("louvre"));
    }

    #[test]
    fn test_code_display_matches_wire_format() {
        let value = serde_json::to_value(WarningCode::NoTransitRoute).unwrap();
        assert_eq!(value, WarningCode::NoTransitRoute.to_string());
    }
}
