//! Distance provider failures

use thiserror::Error;

use crate::PlannerError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider quota or rate limit exhausted; retrying within this request is pointless
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Network, auth or server failure
    #[error("provider request failed: {0}")]
    Api(String),

    #[error("provider request timed out: {0}")]
    Timeout(String),

    /// Response could not be interpreted
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self, ProviderError::QuotaExceeded(_))
    }
}

impl From<ProviderError> for PlannerError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::QuotaExceeded(message) => PlannerError::quota_exceeded(message),
            other => PlannerError::api(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Api(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for ProviderError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(inner) => inner.into(),
            reqwest_middleware::Error::Middleware(inner) => ProviderError::Api(inner.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[test]
    fn test_quota_maps_to_quota_code() {
        let err: PlannerError = ProviderError::QuotaExceeded("daily".into()).into();
        assert_eq!(err.code(), ErrorCode::QuotaExceeded);
    }

    #[test]
    fn test_other_failures_map_to_api_error() {
        for err in [
            ProviderError::Api("502".into()),
            ProviderError::Timeout("30s".into()),
            ProviderError::InvalidResponse("bad json".into()),
        ] {
            let planner: PlannerError = err.into();
            assert_eq!(planner.code(), ErrorCode::ApiError);
        }
    }
}
