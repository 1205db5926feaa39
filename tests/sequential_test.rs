//! Sequential construction cross-checked against direct distance computation

use batch_knn::{Backend, Device, KnnError, NeighborIndexSet};
use ndarray::{array, Array2, Array3, ArrayD, Axis};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The k nearest points among `points[0..i]` to `points[i]`, with the same
/// tie rule as the index (equal distances take the lower index).
fn brute_force_prefix_knn(points: &Array2<f32>, i: usize, k: usize) -> Vec<i64> {
    let q = points.row(i);
    let mut cands: Vec<(usize, f32)> = (0..i)
        .map(|j| {
            let d = points
                .row(j)
                .iter()
                .zip(q.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f32>();
            (j, d)
        })
        .collect();
    cands.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    cands.truncate(k);
    cands.into_iter().map(|(j, _)| j as i64).collect()
}

fn assert_causal(seq: &ArrayD<i64>, k: usize) {
    // row r holds point (r + k)'s neighbors; every entry must come earlier
    for (r, row) in seq.rows().into_iter().enumerate() {
        let i = (r % seq.shape()[seq.ndim() - 2]) + k;
        for &idx in row.iter() {
            assert!(
                (0..i as i64).contains(&idx),
                "row {r} references {idx}, outside 0..{i}"
            );
        }
    }
}

#[test]
fn test_points_on_a_line() {
    let nn = NeighborIndexSet::new(2, 1, &[], Backend::Flat, Device::Cpu).unwrap();
    let points = array![[0.0_f32], [1.0], [2.0], [3.0], [4.0]];

    let seq = nn.build_sequential_neighbors(&points).unwrap();
    assert_eq!(seq.shape(), &[3, 2]);

    // point 2 sees {0, 1}; both are its nearest-2
    assert_eq!(seq[[0, 0]], 1);
    assert_eq!(seq[[0, 1]], 0);
    // point 3 sees {0, 1, 2}
    assert_eq!(seq[[1, 0]], 2);
    assert_eq!(seq[[1, 1]], 1);
    // point 4 sees {0, 1, 2, 3}; nearest two are {3, 2}
    assert_eq!(seq[[2, 0]], 3);
    assert_eq!(seq[[2, 1]], 2);
}

#[test]
fn test_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(97);
    let n = 30;
    let k = 4;
    let points = Array2::from_shape_fn((n, 3), |_| rng.gen_range(-1.0_f32..1.0));

    let nn = NeighborIndexSet::new(k, 3, &[], Backend::Flat, Device::Cpu).unwrap();
    let seq = nn.build_sequential_neighbors(&points).unwrap();
    assert_eq!(seq.shape(), &[n - k, k]);

    for i in k..n {
        let expected = brute_force_prefix_knn(&points, i, k);
        let got: Vec<i64> = seq
            .index_axis(Axis(0), i - k)
            .iter()
            .copied()
            .collect();
        assert_eq!(got, expected, "mismatch for point {i}");
    }
}

#[test]
fn test_batched_slots_stay_separate() {
    let mut rng = StdRng::seed_from_u64(131);
    let n = 12;
    let k = 3;
    let points = Array3::from_shape_fn((2, n, 2), |_| rng.gen_range(-1.0_f32..1.0));

    let nn = NeighborIndexSet::new(k, 2, &[2], Backend::Flat, Device::Cpu).unwrap();
    let seq = nn.build_sequential_neighbors(&points).unwrap();
    assert_eq!(seq.shape(), &[2, n - k, k]);

    for bi in 0..2 {
        let slot_points = points.index_axis(Axis(0), bi).to_owned();
        for i in k..n {
            let expected = brute_force_prefix_knn(&slot_points, i, k);
            let got: Vec<i64> = (0..k).map(|c| seq[[bi, i - k, c]]).collect();
            assert_eq!(got, expected, "mismatch for slot {bi}, point {i}");
        }
    }
}

#[test]
fn test_does_not_disturb_main_index() {
    // sequential construction uses fresh scratch structures; the indexed
    // training set must survive it
    let mut nn = NeighborIndexSet::new(1, 1, &[], Backend::Flat, Device::Cpu).unwrap();
    nn.set_index(&array![[0.0_f32], [10.0]]).unwrap();

    nn.build_sequential_neighbors(&array![[5.0_f32], [6.0], [7.0]])
        .unwrap();

    let idx = nn.query(&array![[1.0_f32]], None).unwrap();
    assert_eq!(idx[[0, 0]], 0);
    assert_eq!(nn.train_n(), Some(2));
}

#[test]
fn test_requires_k_smaller_than_n() {
    let nn = NeighborIndexSet::new(3, 1, &[], Backend::Flat, Device::Cpu).unwrap();
    assert!(matches!(
        nn.build_sequential_neighbors(&array![[0.0_f32], [1.0], [2.0]]),
        Err(KnnError::KOutOfRange { k: 3, max: 2 })
    ));
}

#[test]
fn test_linear_backend_is_rejected() {
    let nn = NeighborIndexSet::new(1, 1, &[], Backend::Linear, Device::Cpu).unwrap();
    assert!(matches!(
        nn.build_sequential_neighbors(&array![[0.0_f32], [1.0], [2.0]]),
        Err(KnnError::Unsupported(_))
    ));
}

#[test]
fn test_runs_on_accelerator_device() {
    let points = array![[0.0_f32], [1.0], [2.0], [3.0], [4.0]];

    let cpu = NeighborIndexSet::new(2, 1, &[], Backend::Flat, Device::Cpu).unwrap();
    let accel = NeighborIndexSet::new(2, 1, &[], Backend::Flat, Device::Accelerator(0)).unwrap();

    assert_eq!(
        cpu.build_sequential_neighbors(&points).unwrap(),
        accel.build_sequential_neighbors(&points).unwrap()
    );
}

proptest! {
    /// Causality: no output row may reference the queried point or anything
    /// after it, for arbitrary point sets.
    #[test]
    fn prop_causality_holds(values in prop::collection::vec(-100.0_f32..100.0, 10..80)) {
        let k = 3;
        let n = values.len() / 2;
        prop_assume!(n > k);
        let points = Array2::from_shape_vec((n, 2), values[..n * 2].to_vec()).unwrap();

        let nn = NeighborIndexSet::new(k, 2, &[], Backend::Flat, Device::Cpu).unwrap();
        let seq = nn.build_sequential_neighbors(&points).unwrap();

        assert_causal(&seq, k);
        for i in k..n {
            prop_assert_eq!(
                seq.index_axis(Axis(0), i - k).iter().copied().collect::<Vec<i64>>(),
                brute_force_prefix_knn(&points, i, k)
            );
        }
    }
}
