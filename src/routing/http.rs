//! Shared HTTP client construction for the remote providers

use std::time::Duration;

use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    RetryTransientMiddleware, Retryable, RetryableStrategy, default_on_request_failure,
    default_on_request_success, policies::ExponentialBackoff,
};

use super::ProviderError;

const USER_AGENT: &str = concat!("city-walker/", env!("CARGO_PKG_VERSION"));

/// Default transient classification, except that 429 is final: a quota
/// response has to reach the provider at once
struct QuotaIsFatal;

impl RetryableStrategy for QuotaIsFatal {
    fn handle(&self, res: &reqwest_middleware::Result<reqwest::Response>) -> Option<Retryable> {
        match res {
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                Some(Retryable::Fatal)
            }
            Ok(response) => default_on_request_success(response),
            Err(error) => default_on_request_failure(error),
        }
    }
}

/// Build a client that retries transient failures with exponential backoff
pub fn retrying_client(
    timeout: Duration,
    max_retries: u32,
) -> Result<ClientWithMiddleware, ProviderError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::Api(format!("failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy_and_strategy(
            retry_policy,
            QuotaIsFatal,
        ))
        .build())
}

/// Join points as `lng,lat;lng,lat` for OSRM style paths
pub fn lng_lat_path(points: &[crate::models::Coordinates]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lng, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// Join points as `lat,lng|lat,lng` for Google style query parameters
pub fn lat_lng_pipe(points: &[crate::models::Coordinates]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lat, p.lng))
        .collect::<Vec<_>>()
        .join("|")
}
