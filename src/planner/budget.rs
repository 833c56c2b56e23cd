//! Day budgets and assignment of ranked POIs to days

use std::collections::HashMap;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::models::{Poi, TimeConstraint, TransportMode};

/// Daily walking distance above which a day is flagged as over budget
pub const WALKING_DAILY_LIMIT_KM: f64 = 10.0;

/// Day count, time budget and POI targets for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBudget {
    pub days: usize,
    pub hours_per_day: u32,
    /// Lower bound of the total POI target
    pub min_pois: usize,
    /// Upper bound of the total POI target
    pub max_pois: usize,
    pub max_daily_distance_km: Option<f64>,
}

impl DayBudget {
    #[must_use]
    pub fn new(constraint: TimeConstraint, mode: TransportMode) -> Self {
        let (days, hours_per_day, min_pois, max_pois) = match constraint {
            TimeConstraint::HalfDay => (1, 6, 4, 5),
            TimeConstraint::OneDay => (1, 10, 6, 8),
            TimeConstraint::TwoDays => (2, 10, 10, 12),
            TimeConstraint::ThreeDays => (3, 10, 12, 15),
            TimeConstraint::FiveDays => (5, 10, 18, 22),
            TimeConstraint::Flexible => (1, 8, 8, 10),
        };
        let max_daily_distance_km = match mode {
            TransportMode::Walking => Some(WALKING_DAILY_LIMIT_KM),
            TransportMode::Transit | TransportMode::Driving => None,
        };
        Self {
            days,
            hours_per_day,
            min_pois,
            max_pois,
            max_daily_distance_km,
        }
    }

    /// Length of one day
    #[must_use]
    pub fn day_length(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.hours_per_day))
    }

    /// Per-day POI caps; the target is split evenly and earlier days take the remainder
    #[must_use]
    pub fn day_capacities(&self) -> Vec<usize> {
        let base = self.max_pois / self.days;
        let extra = self.max_pois % self.days;
        (0..self.days)
            .map(|day| base + usize::from(day < extra))
            .collect()
    }
}

/// Assign ranked POI indices to days.
///
/// `clusters` hold indices into the ranked list. Walking the ranked list, the
/// first unassigned member of a cluster pulls in the rest of its unassigned
/// members, in rank order, spilling into the next day when the current one is
/// full. Indices missing from every cluster are placed on their own.
#[must_use]
pub fn allocate_indices(budget: &DayBudget, ranked_len: usize, clusters: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let capacities = budget.day_capacities();
    let mut days: Vec<Vec<usize>> = vec![Vec::new(); capacities.len()];

    let mut cluster_of = vec![None; ranked_len];
    let mut members: Vec<Vec<usize>> = Vec::with_capacity(clusters.len());
    for (k, cluster) in clusters.iter().enumerate() {
        let mut sorted: Vec<usize> = cluster.iter().copied().filter(|&i| i < ranked_len).collect();
        sorted.sort_unstable();
        sorted.dedup();
        for &i in &sorted {
            cluster_of[i].get_or_insert(k);
        }
        members.push(sorted);
    }

    let mut assigned = vec![false; ranked_len];
    let mut day = 0;

    'ranked: for i in 0..ranked_len {
        if assigned[i] {
            continue;
        }
        let group = match cluster_of[i] {
            Some(k) => members[k].clone(),
            None => vec![i],
        };
        for m in group {
            if assigned[m] {
                continue;
            }
            while day < days.len() && days[day].len() >= capacities[day] {
                day += 1;
            }
            if day >= days.len() {
                break 'ranked;
            }
            days[day].push(m);
            assigned[m] = true;
        }
    }

    days
}

/// Assign ranked POIs to days, keeping clusters together where capacity allows.
///
/// Returns only days that received at least one POI. POIs beyond the target
/// are left out.
#[must_use]
pub fn allocate(
    constraint: TimeConstraint,
    mode: TransportMode,
    clusters: &[Vec<Poi>],
    pois_ranked: &[Poi],
) -> Vec<(usize, Vec<Poi>)> {
    let budget = DayBudget::new(constraint, mode);

    let mut cluster_by_id: HashMap<&str, usize> = HashMap::new();
    for (k, cluster) in clusters.iter().enumerate() {
        for poi in cluster {
            cluster_by_id.entry(poi.place_id.as_str()).or_insert(k);
        }
    }
    let mut index_clusters: Vec<Vec<usize>> = vec![Vec::new(); clusters.len()];
    for (i, poi) in pois_ranked.iter().enumerate() {
        if let Some(&k) = cluster_by_id.get(poi.place_id.as_str()) {
            index_clusters[k].push(i);
        }
    }

    allocate_indices(&budget, pois_ranked.len(), &index_clusters)
        .into_iter()
        .enumerate()
        .filter(|(_, indices)| !indices.is_empty())
        .map(|(day, indices)| {
            (day, indices.into_iter().map(|i| pois_ranked[i].clone()).collect())
        })
        .collect()
}
