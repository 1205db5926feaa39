//! Batched neighbor index sets — one search structure per batch slot

use ndarray::{s, Array3, ArrayBase, ArrayD, Axis, Data, Dimension};
use tracing::debug;

use crate::backend::{Backend, FlatL2Index, SlotIndex, UnifiedLinearIndex};
use crate::device::{Device, DeviceContext};
use crate::error::{KnnError, Result};
use crate::sequential::SequentialBuilder;
use crate::shape;

/// Per-backend slot state. Rebuilt wholesale on every device change; never
/// migrated in place.
#[derive(Debug)]
enum Slots {
    Flat(Vec<FlatL2Index>),
    Linear(Option<UnifiedLinearIndex>),
}

/// A set of `M = product(batch_shape)` independent exact k-NN indices over
/// `dim`-dimensional points, one per batch slot.
///
/// Point arrays carry the batch shape as leading dimensions: `set_index`
/// takes `(*batch_shape, n, dim)` training points, `query` returns neighbor
/// indices of shape `(*batch_shape, t, k)`, and `build_sequential_neighbors`
/// produces the causal structure `(*batch_shape, n - k, k)` where each
/// point's neighbors are restricted to points preceding it. Rank-1 input is
/// promoted by appending a trailing axis of size 1.
///
/// ## Example
///
/// ```rust
/// use batch_knn::{Backend, Device, NeighborIndexSet};
/// use ndarray::array;
///
/// let mut nn = NeighborIndexSet::new(1, 2, &[], Backend::Flat, Device::Cpu).unwrap();
/// nn.set_index(&array![[0.0_f32, 0.0], [10.0, 10.0]]).unwrap();
/// let idx = nn.query(&array![[1.0_f32, 1.0]], None).unwrap();
/// assert_eq!(idx[[0, 0]], 0);
/// ```
#[derive(Debug)]
pub struct NeighborIndexSet {
    k: usize,
    dim: usize,
    batch_shape: Vec<usize>,
    backend: Backend,
    ctx: DeviceContext,
    slots: Slots,
    train_n: Option<usize>,
}

impl NeighborIndexSet {
    /// Create an index set with `k` default neighbors over `dim`-dimensional
    /// points, one slot per element of `batch_shape`'s product.
    ///
    /// `preference` is resolved against the compiled-in backends (a `Flat`
    /// preference degrades to `Linear` with a warning when absent). The
    /// linear backend maintains a single unified structure and therefore
    /// only accepts a single batch slot.
    pub fn new(
        k: usize,
        dim: usize,
        batch_shape: &[usize],
        preference: Backend,
        device: Device,
    ) -> Result<Self> {
        if k == 0 {
            return Err(KnnError::Configuration(
                "k must be greater than 0".to_string(),
            ));
        }
        if dim == 0 {
            return Err(KnnError::Configuration(
                "dim must be greater than 0".to_string(),
            ));
        }

        let backend = Backend::resolve(preference);
        let m = shape::num_slots(batch_shape);
        if backend == Backend::Linear && m != 1 {
            return Err(KnnError::Unsupported(format!(
                "linear backend maintains a single unified structure; got {m} batch slots"
            )));
        }

        let ctx = DeviceContext::new(device)?;
        let slots = Self::fresh_slots(backend, dim, m);
        Ok(Self {
            k,
            dim,
            batch_shape: batch_shape.to_vec(),
            backend,
            ctx,
            slots,
            train_n: None,
        })
    }

    fn fresh_slots(backend: Backend, dim: usize, m: usize) -> Slots {
        match backend {
            Backend::Flat => Slots::Flat((0..m).map(|_| FlatL2Index::new(dim)).collect()),
            Backend::Linear => Slots::Linear(None),
        }
    }

    /// Default neighbor count.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Point dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Leading batch dimensions expected on every point array.
    pub fn batch_shape(&self) -> &[usize] {
        &self.batch_shape
    }

    /// Number of independent slot structures.
    pub fn num_slots(&self) -> usize {
        shape::num_slots(&self.batch_shape)
    }

    /// The resolved backend.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Current device placement.
    pub fn device(&self) -> Device {
        self.ctx.device()
    }

    /// Number of training points most recently indexed, if any.
    pub fn train_n(&self) -> Option<usize> {
        self.train_n
    }

    /// Move the index set to `device`.
    ///
    /// All slot structures are destroyed and recreated empty on the new
    /// device; previously indexed points are discarded and `set_index` must
    /// be called again before querying.
    pub fn set_device(&mut self, device: Device) -> Result<()> {
        let ctx = DeviceContext::new(device)?;
        self.ctx = ctx;
        self.slots = Self::fresh_slots(self.backend, self.dim, self.num_slots());
        self.train_n = None;
        debug!(device = %device, "rebuilt slot structures");
        Ok(())
    }

    /// Index `train_points` of shape `(*batch_shape, n, dim)`, replacing any
    /// previously indexed points. Each slot receives only its own `n` points.
    pub fn set_index<S, D>(&mut self, train_points: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        let per_slot = shape::to_slots(
            train_points.view().into_dyn(),
            &self.batch_shape,
            self.dim,
        )?;
        let n = per_slot.dim().1;

        match &mut self.slots {
            Slots::Flat(indices) => {
                self.ctx.run(|| -> Result<()> {
                    for (i, index) in indices.iter_mut().enumerate() {
                        index.reset();
                        index.add(per_slot.index_axis(Axis(0), i))?;
                    }
                    Ok(())
                })?;
            }
            Slots::Linear(structure) => {
                *structure = Some(UnifiedLinearIndex::fit(per_slot.index_axis(Axis(0), 0)));
            }
        }

        self.train_n = Some(n);
        Ok(())
    }

    /// Find nearest neighbors among the indexed training points for each row
    /// of `test_points` (shape `(*batch_shape, t, dim)`).
    ///
    /// `k` defaults to the configured value and must satisfy
    /// `0 < k <= train_n`. Returns 0-based indices into the most recent
    /// `set_index` array, shaped `(*batch_shape, t, k)` with the nearest
    /// neighbor first. Repeated calls with identical input are
    /// deterministic.
    pub fn query<S, D>(&self, test_points: &ArrayBase<S, D>, k: Option<usize>) -> Result<ArrayD<i64>>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        let train_n = self.train_n.ok_or(KnnError::NotIndexed)?;
        let k = k.unwrap_or(self.k);
        if k == 0 || k > train_n {
            return Err(KnnError::KOutOfRange { k, max: train_n });
        }

        let per_slot = shape::to_slots(
            test_points.view().into_dyn(),
            &self.batch_shape,
            self.dim,
        )?;
        let t = per_slot.dim().1;

        let out: Array3<i64> = match &self.slots {
            Slots::Flat(indices) => {
                let mut out = Array3::zeros((self.num_slots(), t, k));
                self.ctx.run(|| -> Result<()> {
                    for (i, index) in indices.iter().enumerate() {
                        let hits = index.search(per_slot.index_axis(Axis(0), i), k)?;
                        out.index_axis_mut(Axis(0), i).assign(&hits);
                    }
                    Ok(())
                })?;
                out
            }
            Slots::Linear(structure) => {
                let structure = structure.as_ref().ok_or(KnnError::NotIndexed)?;
                let hits = structure.kneighbors(per_slot.index_axis(Axis(0), 0), k)?;
                hits.insert_axis(Axis(0))
            }
        };

        shape::from_slots(out, &self.batch_shape)
    }

    /// Build the causal neighbor structure for one ordering of `n` points
    /// per slot: for each point `i` in `k..n`, its `k` nearest neighbors
    /// among points `0..i` only.
    ///
    /// Each slot runs an O(n) insert-then-query loop on a fresh structure:
    /// seed with points `0..k`, then for each following point query before
    /// inserting. The loop is strictly sequential within a slot. Output row
    /// `i - k` holds point `i`'s neighbors; shape `(*batch_shape, n - k, k)`.
    ///
    /// The linear backend has no incremental add and is rejected with
    /// [`KnnError::Unsupported`]. Requires `k < n`.
    pub fn build_sequential_neighbors<S, D>(&self, points: &ArrayBase<S, D>) -> Result<ArrayD<i64>>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        if self.backend == Backend::Linear {
            return Err(KnnError::Unsupported(
                "sequential construction requires the flat backend".to_string(),
            ));
        }

        let per_slot = shape::to_slots(points.view().into_dyn(), &self.batch_shape, self.dim)?;
        let n = per_slot.dim().1;
        if self.k >= n {
            return Err(KnnError::KOutOfRange {
                k: self.k,
                max: n.saturating_sub(1),
            });
        }

        let k = self.k;
        let mut out = Array3::zeros((self.num_slots(), n - k, k));
        self.ctx.run(|| -> Result<()> {
            for bi in 0..per_slot.dim().0 {
                let pts = per_slot.index_axis(Axis(0), bi);
                let mut builder = SequentialBuilder::new(FlatL2Index::new(self.dim));
                builder.seed(pts.slice(s![..k, ..]))?;
                for i in k..n {
                    let row = builder.step(pts.index_axis(Axis(0), i), k)?;
                    out.slice_mut(s![bi, i - k, ..]).assign(&row);
                }
            }
            Ok(())
        })?;

        shape::from_slots(out, &self.batch_shape)
    }
}
