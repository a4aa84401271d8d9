use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),
    #[error("invalid reply path: {0}")]
    InvalidReplyPath(String),
    #[error("invalid rating: {0}")]
    InvalidRating(String),
    #[error("invalid rating policy: {0}")]
    InvalidRatingPolicy(String),
}

/// Failure of a comment operation. Every variant means nothing was written.
#[derive(Debug, Error)]
pub enum CommentError {
    #[error("validation failed: {0}")]
    Validation(String),
    /// `depth` 0 is the root comment list, `depth` n the n-th path segment.
    #[error("invalid path: index {index} out of range at depth {depth} ({len} entries)")]
    InvalidPath {
        depth: usize,
        index: usize,
        len: usize,
    },
    #[error("document was modified concurrently; re-fetch and retry")]
    ConcurrentModification,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<CoreError> for CommentError {
    fn from(err: CoreError) -> Self {
        CommentError::Validation(err.to_string())
    }
}

impl From<StoreError> for CommentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => CommentError::ConcurrentModification,
            StoreError::Unavailable(_) | StoreError::Unsupported(_) => {
                CommentError::StoreUnavailable(err.to_string())
            }
        }
    }
}
