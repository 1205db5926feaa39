//! Unified linear-scan fallback — fit once, query many

use ndarray::{Array2, ArrayView2};

use crate::distance::nearest_k;
use crate::error::{KnnError, Result};

/// Fallback search structure: one linear scan over the whole training set.
///
/// Unlike [`FlatL2Index`](super::FlatL2Index) this is fit-oriented: `fit`
/// captures the stored points wholesale and there is no incremental add,
/// which is why the sequential construction mode rejects this backend.
#[derive(Debug, Clone)]
pub struct UnifiedLinearIndex {
    dim: usize,
    data: Vec<f32>,
}

impl UnifiedLinearIndex {
    /// Build a structure over the rows of `points` (shape `(n, dim)`).
    pub fn fit(points: ArrayView2<'_, f32>) -> Self {
        let dim = points.ncols();
        let mut data = Vec::with_capacity(points.len());
        for row in points.outer_iter() {
            data.extend(row.iter().copied());
        }
        Self { dim, data }
    }

    /// Number of fitted points.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    /// Whether the structure holds no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-`k` nearest fitted points for each row of `queries`, as 0-based
    /// indices of shape `(t, k)`, nearest first. Same tie-breaking as the
    /// flat backend: equal distances resolve toward the lower index.
    pub fn kneighbors(&self, queries: ArrayView2<'_, f32>, k: usize) -> Result<Array2<i64>> {
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

        let mut out = Array2::zeros((queries.nrows(), k));
        for (r, q) in queries.outer_iter().enumerate() {
            for (c, idx) in nearest_k(&self.data, self.dim, q, k).into_iter().enumerate() {
                out[[r, c]] = idx as i64;
            }
        }
        Ok(out)
    }
}
