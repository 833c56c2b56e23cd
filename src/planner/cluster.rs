//! Leader-based proximity clustering
//!
//! Membership depends only on the distance to the cluster's seed, so two
//! members of one cluster can be up to twice the radius apart.

use crate::geo::distance_km;
use crate::models::Poi;

/// Default clustering radius in kilometers
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

/// Group POIs around seeds taken in input order.
///
/// Returns index lists into `pois`; the first index of each cluster is its seed.
#[must_use]
pub fn cluster_indices(pois: &[Poi], radius_km: f64) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; pois.len()];
    let mut clusters = Vec::new();

    for seed in 0..pois.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut members = vec![seed];

        for candidate in seed + 1..pois.len() {
            if !assigned[candidate]
                && distance_km(&pois[seed].coordinates, &pois[candidate].coordinates) <= radius_km
            {
                assigned[candidate] = true;
                members.push(candidate);
            }
        }
        clusters.push(members);
    }

    clusters
}

/// Group POIs into clusters of cloned values.
///
/// Zero or one POI comes back unchanged as a single cluster.
#[must_use]
pub fn cluster(pois: &[Poi], radius_km: f64) -> Vec<Vec<Poi>> {
    if pois.len() <= 1 {
        return vec![pois.to_vec()];
    }
    cluster_indices(pois, radius_km)
        .into_iter()
        .map(|members| members.into_iter().map(|i| pois[i].clone()).collect())
        .collect()
}
