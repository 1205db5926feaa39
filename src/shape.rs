//! Input shape validation and normalization.
//!
//! Every public entry point funnels its point array through [`to_slots`]:
//! rank-1 promotion, batch/dim checks, then a flatten to `(M, n, dim)` so the
//! per-slot loops never re-validate.

use ndarray::{Array3, ArrayD, ArrayViewD, Axis, IxDyn};

use crate::error::{KnnError, Result};

/// Number of slot structures implied by a batch shape (empty product is 1).
pub(crate) fn num_slots(batch_shape: &[usize]) -> usize {
    batch_shape.iter().product()
}

/// Validate `points` against `(*batch_shape, n, dim)` and flatten to an owned
/// `(M, n, dim)` array. Rank-1 input is promoted by appending a trailing axis
/// of size 1, so it only passes the dim check when `dim == 1`.
pub(crate) fn to_slots(
    points: ArrayViewD<'_, f32>,
    batch_shape: &[usize],
    dim: usize,
) -> Result<Array3<f32>> {
    let points = if points.ndim() == 1 {
        points.insert_axis(Axis(1))
    } else {
        points
    };

    let shape = points.shape();
    if shape.len() < 2 {
        return Err(shape_error(batch_shape, dim, shape));
    }
    let (lead, tail) = shape.split_at(shape.len() - 2);
    if lead != batch_shape || tail[1] != dim {
        return Err(shape_error(batch_shape, dim, shape));
    }

    let m = num_slots(batch_shape);
    let n = tail[0];
    points
        .to_owned()
        .into_shape((m, n, dim))
        .map_err(|_| shape_error(batch_shape, dim, shape))
}

/// Unflatten per-slot results `(M, t, k)` back to `(*batch_shape, t, k)`.
pub(crate) fn from_slots(out: Array3<i64>, batch_shape: &[usize]) -> Result<ArrayD<i64>> {
    let (_, t, k) = out.dim();
    let mut full = batch_shape.to_vec();
    full.extend([t, k]);
    let shape = out.shape().to_vec();
    out.into_shape(IxDyn(&full))
        .map_err(|_| shape_error(batch_shape, k, &shape))
}

fn shape_error(batch_shape: &[usize], dim: usize, got: &[usize]) -> KnnError {
    KnnError::Shape {
        expected: format!("({batch_shape:?} x n x {dim})"),
        actual: format!("{got:?}"),
    }
}
