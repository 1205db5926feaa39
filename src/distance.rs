//! Squared-L2 kernel and deterministic top-k selection

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::ArrayView1;

/// Squared Euclidean distance between a stored row and a query.
///
/// Squared distance preserves the nearest-neighbor ordering, so the sqrt is
/// skipped.
#[inline]
pub(crate) fn squared_l2(row: &[f32], query: ArrayView1<'_, f32>) -> f32 {
    row.iter()
        .zip(query.iter())
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    dist: f32,
    idx: usize,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // total_cmp keeps the ordering total; equal distances order by point
        // index so ties resolve toward the earlier-added point.
        self.dist
            .total_cmp(&other.dist)
            .then(self.idx.cmp(&other.idx))
    }
}

/// Indices of the `k` nearest rows of `data` (row-major, `dim` wide) to
/// `query`, sorted by ascending distance. Ties break toward the lower row
/// index. Callers must ensure `k <= data.len() / dim`.
pub(crate) fn nearest_k(
    data: &[f32],
    dim: usize,
    query: ArrayView1<'_, f32>,
    k: usize,
) -> Vec<usize> {
    // Bounded max-heap: the worst retained candidate sits on top.
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
    for (idx, row) in data.chunks_exact(dim).enumerate() {
        let cand = Candidate {
            dist: squared_l2(row, query),
            idx,
        };
        if heap.len() < k {
            heap.push(cand);
        } else if let Some(&worst) = heap.peek() {
            if cand < worst {
                heap.pop();
                heap.push(cand);
            }
        }
    }
    heap.into_sorted_vec().into_iter().map(|c| c.idx).collect()
}
