//! Flat L2 index — contiguous storage, incremental adds, parallel bulk search

use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::distance::nearest_k;
use crate::error::{KnnError, Result};

use super::SlotIndex;

/// An exact L2 index over row-major contiguous storage.
///
/// Points keep their insertion order and search results are indices into that
/// order; equal distances resolve toward the earlier-added point. Bulk search
/// parallelizes over query rows on whatever rayon pool the caller runs in.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Create an empty index for `dim`-dimensional points.
    pub fn new(dim: usize) -> Self {
        debug_assert!(dim > 0);
        Self {
            dim,
            data: Vec::new(),
        }
    }
}

impl SlotIndex for FlatL2Index {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    fn reset(&mut self) {
        self.data.clear();
    }

    fn add(&mut self, points: ArrayView2<'_, f32>) -> Result<()> {
        if points.ncols() != self.dim {
            return Err(KnnError::Shape {
                expected: format!("(n x {})", self.dim),
                actual: format!("(n x {})", points.ncols()),
            });
        }
        self.data.reserve(points.len());
        for row in points.outer_iter() {
            self.data.extend(row.iter().copied());
        }
        Ok(())
    }

    fn search(&self, queries: ArrayView2<'_, f32>, k: usize) -> Result<Array2<i64>> {
        if queries.ncols() != self.dim {
            return Err(KnnError::Shape {
                expected: format!("(t x {})", self.dim),
                actual: format!("(t x {})", queries.ncols()),
            });
        }
        if k == 0 || k > self.len() {
            return Err(KnnError::KOutOfRange {
                k,
                max: self.len(),
            });
        }

        let rows: Vec<ArrayView1<'_, f32>> = queries.outer_iter().collect();
        let hits: Vec<Vec<usize>> = rows
            .par_iter()
            .map(|q| nearest_k(&self.data, self.dim, *q, k))
            .collect();

        let mut out = Array2::zeros((queries.nrows(), k));
        for (r, hit) in hits.iter().enumerate() {
            for (c, &idx) in hit.iter().enumerate() {
                out[[r, c]] = idx as i64;
            }
        }
        Ok(out)
    }
}
