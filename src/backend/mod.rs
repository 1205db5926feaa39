//! Pluggable search backends

pub mod flat;
pub mod linear;

pub use flat::FlatL2Index;
pub use linear::UnifiedLinearIndex;

use ndarray::{Array2, ArrayView2};
use tracing::warn;

use crate::error::Result;

/// Capability interface for one slot's search structure: clear, append
/// points, and top-k search by L2 distance.
pub trait SlotIndex {
    /// Point dimensionality the structure was sized for.
    fn dim(&self) -> usize;

    /// Number of points currently indexed.
    fn len(&self) -> usize;

    /// Whether the structure holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all indexed points, keeping the configured dimensionality.
    fn reset(&mut self);

    /// Append the rows of `points` (shape `(n, dim)`) in order.
    fn add(&mut self, points: ArrayView2<'_, f32>) -> Result<()>;

    /// Top-`k` nearest indexed points for each row of `queries`, as 0-based
    /// insertion-order indices of shape `(t, k)`, nearest first.
    fn search(&self, queries: ArrayView2<'_, f32>, k: usize) -> Result<Array2<i64>>;
}

/// Search backend powering a [`NeighborIndexSet`](crate::NeighborIndexSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Per-slot flat L2 indices with incremental adds.
    Flat,
    /// One unified fit-then-query scan over the flattened point set.
    Linear,
}

impl Backend {
    /// Whether the optimized flat backend was compiled in.
    pub fn flat_available() -> bool {
        cfg!(feature = "flat")
    }

    /// Resolve a preference against what is compiled in. A `Flat` preference
    /// degrades to `Linear` with a warning when the flat backend is absent;
    /// an explicit `Linear` preference is always honored.
    pub fn resolve(preference: Backend) -> Backend {
        match preference {
            Backend::Flat if Self::flat_available() => Backend::Flat,
            Backend::Flat => {
                warn!("flat backend unavailable; falling back to unified linear search");
                Backend::Linear
            }
            Backend::Linear => Backend::Linear,
        }
    }
}
