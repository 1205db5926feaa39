//! # batch-knn
//!
//! Batched exact k-nearest-neighbor index sets for fixed-dimensional point
//! batches, built as the neighbor-search layer for nearest-neighbor Gaussian
//! process approximations.
//!
//! The core type is [`NeighborIndexSet`]: one flat L2 search structure per
//! batch slot, with bulk re-indexing, bulk query, and a sequential (causal)
//! construction mode where each point's neighbors are restricted to points
//! that precede it in the ordering.
//!
//! This library provides:
//! - A pluggable [`SlotIndex`] capability (optimized flat backend vs. a
//!   unified linear fallback)
//! - Batch-shape bookkeeping over an arbitrary number of leading dimensions
//! - Device placement (CPU vs. accelerator worker pool) with wholesale
//!   slot reconstruction on every change
//!
//! ## Example
//!
//! ```rust
//! use batch_knn::{Backend, Device, NeighborIndexSet};
//! use ndarray::array;
//!
//! let mut nn = NeighborIndexSet::new(2, 3, &[], Backend::Flat, Device::Cpu).unwrap();
//!
//! let train = array![[1.0_f32, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
//! nn.set_index(&train).unwrap();
//!
//! let test = array![[1.0_f32, 0.1, 0.0]];
//! let neighbors = nn.query(&test, None).unwrap(); // shape (1, 2)
//! assert_eq!(neighbors[[0, 0]], 0);
//! ```

pub mod backend;
pub mod device;
pub mod error;
pub mod index_set;

mod distance;
mod sequential;
mod shape;

pub use backend::{Backend, FlatL2Index, SlotIndex, UnifiedLinearIndex};
pub use device::Device;
pub use error::{KnnError, Result};
pub use index_set::NeighborIndexSet;
