//! Sequential (causal) neighbor construction

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::backend::SlotIndex;
use crate::error::Result;

/// Per-slot state machine behind
/// [`build_sequential_neighbors`](crate::NeighborIndexSet::build_sequential_neighbors).
///
/// Holds the growing structure and the position of the next point to insert.
/// After `seed(points[..k])`, each `step(points[i])` queries against exactly
/// the points `0..i` and only then inserts point `i`, so no neighbor row can
/// reference the queried point or anything after it.
pub(crate) struct SequentialBuilder<I: SlotIndex> {
    index: I,
    next: usize,
}

impl<I: SlotIndex> SequentialBuilder<I> {
    /// Wrap an empty structure.
    pub fn new(index: I) -> Self {
        debug_assert!(index.is_empty());
        Self { index, next: 0 }
    }

    /// Number of points inserted so far; the next `step` queries against
    /// exactly this prefix.
    pub fn len(&self) -> usize {
        self.next
    }

    /// Insert the initial prefix without querying.
    pub fn seed(&mut self, points: ArrayView2<'_, f32>) -> Result<()> {
        self.index.add(points)?;
        self.next += points.nrows();
        Ok(())
    }

    /// Query the `k` nearest already-inserted points for `point`, then insert
    /// `point` itself. The loop-carried dependency lives here: each call sees
    /// one more point than the last.
    pub fn step(&mut self, point: ArrayView1<'_, f32>, k: usize) -> Result<Array1<i64>> {
        let row = point.insert_axis(Axis(0));
        let neighbors = self.index.search(row, k)?;
        self.index.add(row)?;
        self.next += 1;
        Ok(neighbors.index_axis(Axis(0), 0).to_owned())
    }
}
