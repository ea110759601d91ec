use thiserror::Error;

/// Errors returned by batch validation and the clustering pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The batch contains no embeddings.
    #[error("empty batch")]
    EmptyBatch,

    /// An embedding entry has an empty name.
    #[error("embedding at index {index} has an empty name")]
    EmptyName {
        /// Position of the offending entry in the batch.
        index: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Vectors in a batch have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// The batch exceeds the configured size bound for the O(n^2) distance
    /// computations.
    #[error("batch of {size} embeddings exceeds the supported maximum of {max}")]
    BatchTooLarge {
        /// Number of embeddings in the rejected batch.
        size: usize,
        /// Configured maximum batch size.
        max: usize,
    },
}

impl Error {
    /// Whether this error is the caller's fault (malformed input) rather
    /// than a resource bound.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Error::BatchTooLarge { .. })
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
