//! Caching decorator for distance providers
//!
//! Cells are cached per ordered point pair and mode, so a matrix for a subset
//! of already-seen points is served without touching the network. Concurrent
//! requests for the same point list are coalesced: the second caller waits on
//! the first one's lock and then reads the cells it stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::RngExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{DistanceMatrix, DistanceProvider, MatrixCell, ProviderError, TravelCost};
use crate::cache::PersistentCache;
use crate::models::{Coordinates, TransportMode};

struct CachedCell {
    cell: MatrixCell,
    expires_at: Instant,
}

pub struct CachedDistanceProvider {
    inner: Arc<dyn DistanceProvider>,
    ttl: Duration,
    cells: Mutex<HashMap<String, CachedCell>>,
    /// Expired cells are purged on the first insert after this instant
    next_sweep: Mutex<Instant>,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    persistent: Option<Arc<PersistentCache>>,
}

/// Key of one directed pair
#[must_use]
pub fn pair_key(from: &Coordinates, to: &Coordinates, mode: TransportMode) -> String {
    format!("matrix:{mode}:{}->{}", from.cache_key(), to.cache_key())
}

fn request_key(points: &[Coordinates], mode: TransportMode) -> String {
    let joined = points
        .iter()
        .map(Coordinates::cache_key)
        .collect::<Vec<_>>()
        .join(";");
    format!("{mode}|{joined}")
}

/// TTL scaled by a random factor in `[0.9, 1.1)`
fn jittered(ttl: Duration) -> Duration {
    let jitter: f64 = rand::rng().random_range(0.9..1.1);
    ttl.mul_f64(jitter)
}

impl CachedDistanceProvider {
    pub fn new(inner: Arc<dyn DistanceProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cells: Mutex::new(HashMap::new()),
            next_sweep: Mutex::new(Instant::now() + ttl),
            in_flight: Mutex::new(HashMap::new()),
            persistent: None,
        }
    }

    /// Also read and write cells through a persistent store
    #[must_use]
    pub fn with_persistent(mut self, cache: Arc<PersistentCache>) -> Self {
        self.persistent = Some(cache);
        self
    }

    /// Number of live in-memory cells
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(key.to_string()).or_default())
    }

    fn release(&self, key: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if in_flight
            .get(key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            in_flight.remove(key);
        }
    }

    fn memory_get(&self, key: &str) -> Option<MatrixCell> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        match cells.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.cell),
            Some(_) => {
                cells.remove(key);
                None
            }
            None => None,
        }
    }

    fn memory_put(&self, key: String, cell: MatrixCell) {
        let now = Instant::now();
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next_sweep = self.next_sweep.lock().unwrap_or_else(PoisonError::into_inner);
        if now >= *next_sweep {
            let before = cells.len();
            cells.retain(|_, entry| entry.expires_at > now);
            debug!("Swept {} expired distance cells", before - cells.len());
            *next_sweep = now + self.ttl;
        }
        cells.insert(key, CachedCell { cell, expires_at: now + self.ttl });
    }

    async fn lookup(&self, key: &str) -> Option<MatrixCell> {
        if let Some(cell) = self.memory_get(key) {
            return Some(cell);
        }
        let persistent = self.persistent.as_ref()?;
        match persistent.get::<MatrixCell>(key).await {
            Ok(Some(cell)) => {
                self.memory_put(key.to_string(), cell);
                Some(cell)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Persistent cache read failed for {}: {:#}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: String, cell: MatrixCell) {
        if let Some(persistent) = &self.persistent
            && let Err(e) = persistent.put(&key, cell, jittered(self.ttl)).await
        {
            warn!("Persistent cache write failed for {}: {:#}", key, e);
        }
        self.memory_put(key, cell);
    }

    /// Matrix assembled from cached cells, or `None` if any pair is missing
    async fn cached_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Option<DistanceMatrix> {
        let mut rows = Vec::with_capacity(points.len());
        for from in points {
            let mut row = Vec::with_capacity(points.len());
            for to in points {
                if from.same_place(to) {
                    row.push(MatrixCell::Reachable(TravelCost::ZERO));
                } else {
                    row.push(self.lookup(&pair_key(from, to, mode)).await?);
                }
            }
            rows.push(row);
        }
        DistanceMatrix::from_rows(rows)
    }

    async fn fetch(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        if let Some(matrix) = self.cached_matrix(points, mode).await {
            debug!("Distance matrix served from cache ({} points)", points.len());
            return Ok(matrix);
        }

        let mut matrix = self.inner.get_matrix(points, mode).await?;
        if matrix.size() != points.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "{} returned a {}x{} matrix for {} points",
                self.inner.name(),
                matrix.size(),
                matrix.size(),
                points.len()
            )));
        }
        super::zero_duplicate_cells(points, &mut matrix);

        for (i, from) in points.iter().enumerate() {
            for (j, to) in points.iter().enumerate() {
                if !from.same_place(to) {
                    self.store(pair_key(from, to, mode), matrix.cell(i, j)).await;
                }
            }
        }
        Ok(matrix)
    }
}

#[async_trait]
impl DistanceProvider for CachedDistanceProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn get_matrix(
        &self,
        points: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DistanceMatrix, ProviderError> {
        if points.len() < 2 {
            return Ok(DistanceMatrix::unreachable(points.len()));
        }

        let key = request_key(points, mode);
        let lock = self.lock_for(&key);
        let result = {
            let _guard = lock.lock().await;
            self.fetch(points, mode).await
        };
        self.release(&key, lock);
        result
    }
}
