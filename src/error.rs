//! Error types and handling for the City Walker planner

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Error codes shared with the request layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Distance provider quota reached
    QuotaExceeded,
    /// Free-text input matched several places (raised by the place resolver)
    AmbiguousLocation,
    /// No public transit route between two places
    NoTransitRoute,
    /// Some data had to be estimated or was missing
    PartialData,
    /// Malformed or empty input
    InvalidInput,
    /// External API failure
    ApiError,
    /// Request schema validation failed (raised by the request layer)
    ValidationError,
}

impl ErrorCode {
    /// Wire representation of the code
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::AmbiguousLocation => "AMBIGUOUS_LOCATION",
            ErrorCode::NoTransitRoute => "NO_TRANSIT_ROUTE",
            ErrorCode::PartialData => "PARTIAL_DATA",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::ApiError => "API_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action the user can take to recover from an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryOption {
    /// Human-readable label, e.g. "Try walking instead"
    pub label: String,
    /// Action identifier the client uses to trigger the recovery
    pub action: String,
    /// Optional action parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// Structured fatal error returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppError {
    pub code: ErrorCode,
    /// Technical message for logs
    pub message: String,
    /// Message safe to show to end users
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_options: Option<Vec<RecoveryOption>>,
}

/// Main error type for the planner
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Nothing left to plan, or malformed request
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Distance provider quota exhausted
    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// No transit route between two places
    #[error("No transit route from {from} to {to}")]
    NoTransitRoute { from: String, to: String },

    /// Result was produced from incomplete data
    #[error("Partial data: {message}")]
    PartialData { message: String },

    /// External API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl PlannerError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new quota error
    pub fn quota_exceeded<S: Into<String>>(message: S) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
        }
    }

    /// Create a new partial data error
    pub fn partial_data<S: Into<String>>(message: S) -> Self {
        Self::PartialData {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Wire code for this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            PlannerError::InvalidInput { .. } | PlannerError::Config { .. } => {
                ErrorCode::InvalidInput
            }
            PlannerError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            PlannerError::NoTransitRoute { .. } => ErrorCode::NoTransitRoute,
            PlannerError::PartialData { .. } => ErrorCode::PartialData,
            PlannerError::Api { .. } | PlannerError::Cache { .. } | PlannerError::Io { .. } => {
                ErrorCode::ApiError
            }
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::InvalidInput { message } => {
                format!("We couldn't plan this trip: {message}")
            }
            PlannerError::QuotaExceeded { .. } => {
                "Our routing service is busy right now. Please try again in a few minutes."
                    .to_string()
            }
            PlannerError::NoTransitRoute { from, to } => {
                format!("There is no public transit connection between {from} and {to}.")
            }
            PlannerError::PartialData { .. } => {
                "Some travel times are estimates and may be inaccurate.".to_string()
            }
            PlannerError::Api { .. } => {
                "Unable to reach the routing service. Please check your connection and try again."
                    .to_string()
            }
            PlannerError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            PlannerError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            PlannerError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// Suggested recovery actions, if any
    #[must_use]
    pub fn recovery_options(&self) -> Option<Vec<RecoveryOption>> {
        match self {
            PlannerError::NoTransitRoute { .. } => Some(vec![RecoveryOption {
                label: "Try walking instead".to_string(),
                action: "switch_transport_mode".to_string(),
                params: Some(json!({ "transport_mode": "walking" })),
            }]),
            PlannerError::QuotaExceeded { .. } => Some(vec![RecoveryOption {
                label: "Try again later".to_string(),
                action: "retry".to_string(),
                params: None,
            }]),
            PlannerError::InvalidInput { .. } => Some(vec![RecoveryOption {
                label: "Choose more places".to_string(),
                action: "edit_selection".to_string(),
                params: None,
            }]),
            _ => None,
        }
    }

    /// Convert into the structured error returned to callers
    #[must_use]
    pub fn to_app_error(&self) -> AppError {
        AppError {
            code: self.code(),
            message: self.to_string(),
            user_message: self.user_message(),
            recovery_options: self.recovery_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let input_err = PlannerError::invalid_input("no places");
        assert!(matches!(input_err, PlannerError::InvalidInput { .. }));

        let api_err = PlannerError::api("connection failed");
        assert!(matches!(api_err, PlannerError::Api { .. }));

        let quota_err = PlannerError::quota_exceeded("daily limit");
        assert!(matches!(quota_err, PlannerError::QuotaExceeded { .. }));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PlannerError::invalid_input("x").code(), ErrorCode::InvalidInput);
        assert_eq!(PlannerError::quota_exceeded("x").code(), ErrorCode::QuotaExceeded);
        assert_eq!(PlannerError::api("x").code(), ErrorCode::ApiError);
        assert_eq!(PlannerError::partial_data("x").code(), ErrorCode::PartialData);
        let transit = PlannerError::NoTransitRoute {
            from: "a".into(),
            to: "b".into(),
        };
        assert_eq!(transit.code(), ErrorCode::NoTransitRoute);
    }

    #[test]
    fn test_user_messages() {
        let api_err = PlannerError::api("test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let input_err = PlannerError::invalid_input("no places survived allocation");
        assert!(input_err.user_message().contains("no places survived allocation"));
    }

    #[test]
    fn test_transit_error_suggests_walking() {
        let err = PlannerError::NoTransitRoute {
            from: "Louvre".into(),
            to: "Sacre-Coeur".into(),
        };
        let app = err.to_app_error();
        assert_eq!(app.code, ErrorCode::NoTransitRoute);
        let options = app.recovery_options.expect("transit errors carry a recovery option");
        assert_eq!(options[0].action, "switch_transport_mode");
        assert_eq!(
            options[0].params,
            Some(json!({ "transport_mode": "walking" }))
        );
    }

    #[test]
    fn test_app_error_serialization() {
        let app = PlannerError::invalid_input("empty").to_app_error();
        let value = serde_json::to_value(&app).unwrap();
        assert_eq!(value["code"], "INVALID_INPUT");
        assert!(value["user_message"].as_str().unwrap().contains("empty"));
    }

    #[test]
    fn test_api_error_has_no_recovery_options() {
        let app = PlannerError::api("boom").to_app_error();
        assert!(app.recovery_options.is_none());
        let value = serde_json::to_value(&app).unwrap();
        assert!(value.get("recovery_options").is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let planner_err: PlannerError = io_err.into();
        assert!(matches!(planner_err, PlannerError::Io { .. }));
    }
}
