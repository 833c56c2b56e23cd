//! Pairwise travel cost matrices

use serde::{Deserialize, Serialize};

/// Travel cost between two points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TravelCost {
    pub distance_meters: u64,
    pub duration_seconds: u64,
}

impl TravelCost {
    pub const ZERO: TravelCost = TravelCost {
        distance_meters: 0,
        duration_seconds: 0,
    };

    #[must_use]
    pub fn new(distance_meters: u64, duration_seconds: u64) -> Self {
        Self {
            distance_meters,
            duration_seconds,
        }
    }
}

/// One cell of a [`DistanceMatrix`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatrixCell {
    Reachable(TravelCost),
    /// No route exists for the requested mode
    Unreachable,
}

impl MatrixCell {
    #[must_use]
    pub fn cost(&self) -> Option<TravelCost> {
        match self {
            MatrixCell::Reachable(cost) => Some(*cost),
            MatrixCell::Unreachable => None,
        }
    }

    #[must_use]
    pub fn is_reachable(&self) -> bool {
        matches!(self, MatrixCell::Reachable(_))
    }
}

/// Square matrix where `cell(i, j)` is the cost of travelling from point `i` to point `j`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<MatrixCell>,
}

impl DistanceMatrix {
    /// Matrix of `size` points with every off-diagonal cell unreachable
    #[must_use]
    pub fn unreachable(size: usize) -> Self {
        let mut matrix = Self {
            size,
            cells: vec![MatrixCell::Unreachable; size * size],
        };
        for i in 0..size {
            matrix.set(i, i, MatrixCell::Reachable(TravelCost::ZERO));
        }
        matrix
    }

    /// Build a matrix from `f(i, j)`
    pub fn from_fn<F>(size: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> MatrixCell,
    {
        let mut cells = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                cells.push(f(i, j));
            }
        }
        Self { size, cells }
    }

    /// Build a matrix from nested rows, returning `None` unless the rows form a square
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<MatrixCell>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// # Panics
    /// Panics if `from` or `to` is out of bounds.
    #[must_use]
    pub fn cell(&self, from: usize, to: usize) -> MatrixCell {
        assert!(from < self.size && to < self.size, "matrix index out of bounds");
        self.cells[from * self.size + to]
    }

    /// # Panics
    /// Panics if `from` or `to` is out of bounds.
    pub fn set(&mut self, from: usize, to: usize, cell: MatrixCell) {
        assert!(from < self.size && to < self.size, "matrix index out of bounds");
        self.cells[from * self.size + to] = cell;
    }

    #[must_use]
    pub fn cost(&self, from: usize, to: usize) -> Option<TravelCost> {
        self.cell(from, to).cost()
    }

    /// Pairs `(i, j)` with `i != j` whose cell is unreachable, row-major
    #[must_use]
    pub fn unreachable_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..self.size {
            for j in 0..self.size {
                if i != j && !self.cell(i, j).is_reachable() {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}
