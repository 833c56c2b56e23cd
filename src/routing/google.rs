//! Google Distance Matrix API provider

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::http::{lat_lng_pipe, retrying_client};
use super::{DistanceMatrix, DistanceProvider, MatrixCell, ProviderError, TravelCost};
use crate::models::{Coordinates, TransportMode};

pub const DEFAULT_GOOGLE_URL: &str = "https://maps.googleapis.com/maps/api";

pub struct GoogleDistanceProvider {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct MatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixRow {
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    #[serde(default)]
    pub distance: Option<ValueField>,
    #[serde(default)]
    pub duration: Option<ValueField>,
}

#[derive(Debug, Deserialize)]
pub struct ValueField {
    pub value: u64,
}

impl GoogleDistanceProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: retrying_client(timeout, max_retries)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn matrix_url(&self, points: &[Coordinates], mode: TransportMode) -> String {
        let encoded = urlencoding::encode(&lat_lng_pipe(points)).into_owned();
        format!(
            "{}/distancematrix/json?origins={encoded}&destinations={encoded}&mode={}&key={}",
            self.base_url,
            mode.as_str(),
            urlencoding::encode(&self.api_key)
        )
    }
}

/// Convert an API response into a matrix of `size` points
pub fn parse_matrix(response: MatrixResponse, size: usize) -> Result<DistanceMatrix, ProviderError> {
    let detail = response.error_message.clone().unwrap_or_default();
    match response.status.as_str() {
        "OK" => {}
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => {
            return Err(ProviderError::QuotaExceeded(format!(
                "{}: {detail}",
                response.status
            )));
        }
        "REQUEST_DENIED" | "UNKNOWN_ERROR" => {
            return Err(ProviderError::Api(format!("{}: {detail}", response.status)));
        }
        other => {
            return Err(ProviderError::InvalidResponse(format!("{other}: {detail}")));
        }
    }

    if response.rows.len() != size || response.rows.iter().any(|row| row.elements.len() != size) {
        return Err(ProviderError::InvalidResponse(format!(
            "expected a {size}x{size} matrix"
        )));
    }

    let mut unknown = None;
    let matrix = DistanceMatrix::from_fn(size, |i, j| {
        let element = &response.rows[i].elements[j];
        match (element.status.as_str(), &element.distance, &element.duration) {
            ("OK", Some(distance), Some(duration)) => {
                MatrixCell::Reachable(TravelCost::new(distance.value, duration.value))
            }
            ("OK" | "ZERO_RESULTS" | "NOT_FOUND", _, _) => MatrixCell::Unreachable,
            (other, _, _) => {
                unknown.get_or_insert_with(|| other.to_string());
                MatrixCell::Unreachable
            }
        }
    });

    if let Some(status) = unknown {
        warn!("Unexpected element status {} treated as unreachable", status);
    }
    Ok(matrix)
}

#[async_trait]
impl DistanceProvider for GoogleDistanceProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    #[tracing::instrument(name = "google_distance_matrix", level = "debug", skip(self, points), fields(points = points.len()))]
    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        if points.len() < 2 {
            return Ok(DistanceMatrix::unreachable(points.len()));
        }

        debug!("Requesting Google distance matrix for {} points", points.len());
        let response = self.client.get(self.matrix_url(points, mode)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::QuotaExceeded(
                    "Google Distance Matrix rate limit exceeded".to_string(),
                )),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Api(
                    "Invalid or missing Google Maps API key".to_string(),
                )),
                _ => Err(ProviderError::Api(format!(
                    "Google Distance Matrix error {status}: {error_text}"
                ))),
            };
        }

        let body: MatrixResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Google response: {e}"))
        })?;

        let mut matrix = parse_matrix(body, points.len())?;
        super::zero_duplicate_cells(points, &mut matrix);
        info!(
            "Google matrix for {} points ({} unreachable pairs)",
            points.len(),
            matrix.unreachable_pairs().len()
        );
        Ok(matrix)
    }
}
