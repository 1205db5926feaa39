//! Error types for batched k-NN index sets

use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, KnnError>;

/// Error types that can occur in neighbor index operations
#[derive(Error, Debug)]
pub enum KnnError {
    /// Bad constructor or device arguments.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Input array shape does not match `(*batch_shape, n, dim)`.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    /// Operation requires training points; `set_index` has not been called
    /// since construction or the last device change.
    #[error("no training points indexed; call set_index first")]
    NotIndexed,

    /// `k` outside the valid range for the current index population.
    #[error("k = {k} out of range; must be in 1..={max}")]
    KOutOfRange { k: usize, max: usize },

    /// Operation not defined for the active backend/batch configuration.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}
