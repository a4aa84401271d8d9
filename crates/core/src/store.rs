use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::comments::Comment;
use crate::types::document_id::DocumentId;

/// Opaque optimistic-concurrency token handed out by a store on fetch and
/// required back on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(u64);

impl VersionToken {
    /// Version of a document that has never been written.
    pub const INITIAL: VersionToken = VersionToken(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub comments: Vec<Comment>,
    pub version: VersionToken,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            comments: Vec::new(),
            version: VersionToken::INITIAL,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stale version for document {0}")]
    Conflict(DocumentId),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0} is not supported by this store")]
    Unsupported(&'static str),
}

/// Persistence boundary holding one serialized comment tree per document.
///
/// Writes replace the whole tree and must fail with [`StoreError::Conflict`]
/// when `expected` is not the document's current version.
#[async_trait]
pub trait CommentStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn fetch(&self, document_id: &DocumentId) -> Result<Snapshot, StoreError>;

    async fn write(
        &self,
        document_id: &DocumentId,
        comments: &[Comment],
        expected: VersionToken,
    ) -> Result<VersionToken, StoreError>;

    async fn document_ids(&self) -> Result<Vec<DocumentId>, StoreError> {
        Err(StoreError::Unsupported("document listing"))
    }
}
