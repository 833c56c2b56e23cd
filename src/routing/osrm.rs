//! OSRM Table API provider

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info};

use super::http::{lng_lat_path, retrying_client};
use super::{DistanceMatrix, DistanceProvider, MatrixCell, ProviderError, TravelCost};
use crate::models::{Coordinates, TransportMode};

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// Client for an OSRM routing engine
pub struct OsrmProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Table service response; `null` cells have no route
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub durations: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
}

/// OSRM profile for a transport mode. OSRM has no transit graph, so transit uses the car profile.
#[must_use]
pub fn profile(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Walking => "foot",
        TransportMode::Transit | TransportMode::Driving => "car",
    }
}

impl OsrmProvider {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: retrying_client(timeout, max_retries)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, points: &[Coordinates], mode: TransportMode) -> String {
        format!(
            "{}/table/v1/{}/{}?annotations=duration,distance",
            self.base_url,
            profile(mode),
            lng_lat_path(points)
        )
    }
}

/// Convert a table response into a matrix of `size` points
pub fn parse_table(response: TableResponse, size: usize) -> Result<DistanceMatrix, ProviderError> {
    if response.code != "Ok" {
        return Err(ProviderError::InvalidResponse(format!(
            "OSRM returned {}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let durations = response
        .durations
        .ok_or_else(|| ProviderError::InvalidResponse("missing durations".to_string()))?;
    let distances = response
        .distances
        .ok_or_else(|| ProviderError::InvalidResponse("missing distances".to_string()))?;

    let square = |rows: &Vec<Vec<Option<f64>>>| {
        rows.len() == size && rows.iter().all(|row| row.len() == size)
    };
    if !square(&durations) || !square(&distances) {
        return Err(ProviderError::InvalidResponse(format!(
            "expected a {size}x{size} table"
        )));
    }

    Ok(DistanceMatrix::from_fn(size, |i, j| {
        match (distances[i][j], durations[i][j]) {
            (Some(distance), Some(duration)) => MatrixCell::Reachable(TravelCost::new(
                distance.max(0.0).round() as u64,
                duration.max(0.0).round() as u64,
            )),
            _ => MatrixCell::Unreachable,
        }
    }))
}

#[async_trait]
impl DistanceProvider for OsrmProvider {
    fn name(&self) -> &'static str {
        "osrm"
    }

    #[tracing::instrument(name = "osrm_table", level = "debug", skip(self, points), fields(points = points.len()))]
    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        if points.len() < 2 {
            return Ok(DistanceMatrix::unreachable(points.len()));
        }

        let url = self.table_url(points, mode);
        debug!("Requesting OSRM table: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return match status {
                StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::QuotaExceeded(
                    "OSRM rate limit exceeded".to_string(),
                )),
                _ => Err(ProviderError::Api(format!(
                    "OSRM error {status}: {error_text}"
                ))),
            };
        }

        let table: TableResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse OSRM response: {e}")))?;

        let mut matrix = parse_table(table, points.len())?;
        super::zero_duplicate_cells(points, &mut matrix);
        info!(
            "OSRM table for {} points ({} unreachable pairs)",
            points.len(),
            matrix.unreachable_pairs().len()
        );
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TransportMode::Walking, "foot")]
    #[case(TransportMode::Driving, "car")]
    #[case(TransportMode::Transit, "car")]
    fn test_profiles(#[case] mode: TransportMode, #[case] expected: &str) {
        assert_eq!(profile(mode), expected);
    }

    #[test]
    fn test_table_url() {
        let provider =
            OsrmProvider::new("http://localhost:5000/", Duration::from_secs(5), 0).unwrap();
        let url = provider.table_url(
            &[
                Coordinates { lat: 1.0, lng: 2.0 },
                Coordinates { lat: 3.0, lng: 4.0 },
            ],
            TransportMode::Walking,
        );
        assert_eq!(
            url,
            "http://localhost:5000/table/v1/foot/2.000000,1.000000;4.000000,3.000000?annotations=duration,distance"
        );
    }

    #[test]
    fn test_parse_table_with_null_cells() {
        let response: TableResponse = serde_json::from_str(
            r#"{
                "code": "Ok",
                "durations": [[0, 120.4], [null, 0]],
                "distances": [[0, 950.6], [null, 0]]
            }"#,
        )
        .unwrap();
        let matrix = parse_table(response, 2).unwrap();
        assert_eq!(matrix.cost(0, 1), Some(TravelCost::new(951, 120)));
        assert_eq!(matrix.cell(1, 0), MatrixCell::Unreachable);
    }

    #[test]
    fn test_parse_table_rejects_error_code() {
        let response: TableResponse =
            serde_json::from_str(r#"{"code": "InvalidQuery", "message": "bad coords"}"#).unwrap();
        let err = parse_table(response, 2).unwrap_err();
        assert!(err.to_string().contains("bad coords"));
    }

    #[test]
    fn test_parse_table_rejects_wrong_shape() {
        let response: TableResponse = serde_json::from_str(
            r#"{"code": "Ok", "durations": [[0]], "distances": [[0]]}"#,
        )
        .unwrap();
        assert!(matches!(
            parse_table(response, 2),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_quota_without_retry() {
        let (addr, hits) = crate::routing::http::status_server::spawn("429 Too Many Requests").await;
        let provider = OsrmProvider::new(format!("http://{addr}"), Duration::from_secs(5), 3)
        .unwrap();
        let points = [
            Coordinates { lat: 48.8584, lng: 2.2945 },
            Coordinates { lat: 48.8606, lng: 2.3376 },
        ];

        let err = provider
            .get_matrix(&points, TransportMode::Walking)
            .await
            .unwrap_err();

        assert!(err.is_quota());
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
