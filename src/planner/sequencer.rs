//! Visit ordering within one day
//!
//! Nearest-neighbour construction from the top-ranked POI followed by a
//! bounded first-improvement 2-opt. Routes are open paths with a fixed
//! start; costs may be asymmetric, so every candidate move is priced on
//! the whole path rather than with a four-edge delta.

use crate::models::Poi;

/// Total duration of an open path
pub fn path_duration<F>(order: &[usize], duration: &F) -> u64
where
    F: Fn(usize, usize) -> u64,
{
    order.windows(2).map(|w| duration(w[0], w[1])).sum()
}

/// Greedy tour starting at index 0. Ties go to the lower index.
pub fn nearest_neighbor<F>(n: usize, duration: &F) -> Vec<usize>
where
    F: Fn(usize, usize) -> u64,
{
    if n == 0 {
        return Vec::new();
    }

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    order.push(0);

    while order.len() < n {
        let mut best: Option<(usize, u64)> = None;
        for candidate in 0..n {
            if visited[candidate] {
                continue;
            }
            let cost = duration(current, candidate);
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((candidate, cost));
            }
        }
        let Some((next, _)) = best else { break };
        visited[next] = true;
        order.push(next);
        current = next;
    }

    order
}

/// Improve `order` by segment reversals that strictly shorten the path.
///
/// Position 0 never moves. Stops after a pass without improvement or after
/// `n²` passes.
pub fn two_opt<F>(mut order: Vec<usize>, duration: &F) -> Vec<usize>
where
    F: Fn(usize, usize) -> u64,
{
    let n = order.len();
    if n < 3 {
        return order;
    }

    let max_passes = n * n;
    let mut best = path_duration(&order, duration);

    for _ in 0..max_passes {
        let mut improved = false;
        for i in 1..n - 1 {
            for j in i + 1..n {
                order[i..=j].reverse();
                let candidate = path_duration(&order, duration);
                if candidate < best {
                    best = candidate;
                    improved = true;
                } else {
                    order[i..=j].reverse();
                }
            }
        }
        if !improved {
            break;
        }
    }

    order
}

/// Visit order for `n` stops as indices
pub fn sequence_indices<F>(n: usize, duration: &F) -> Vec<usize>
where
    F: Fn(usize, usize) -> u64,
{
    if n <= 1 {
        return (0..n).collect();
    }
    two_opt(nearest_neighbor(n, duration), duration)
}

/// Order a day's POIs; `duration(i, j)` is the travel time from `pois[i]` to `pois[j]`
pub fn sequence<F>(pois: &[Poi], duration: F) -> Vec<Poi>
where
    F: Fn(usize, usize) -> u64,
{
    sequence_indices(pois.len(), &duration)
        .into_iter()
        .map(|i| pois[i].clone())
        .collect()
}
