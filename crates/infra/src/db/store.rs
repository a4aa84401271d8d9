use async_trait::async_trait;
use tracing::warn;

use healthhub_core::domain::comments::Comment;
use healthhub_core::store::{CommentStore, Snapshot, StoreError, VersionToken};
use healthhub_core::types::document_id::DocumentId;

use super::comments_repo::{
    CommentsRepoError, find_document, insert_document, list_document_ids, update_document,
};
use super::DbPool;

impl From<CommentsRepoError> for StoreError {
    fn from(err: CommentsRepoError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// One row per document; the `version` column is the concurrency token.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: DbPool,
}

impl PostgresStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CommentStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn fetch(&self, document_id: &DocumentId) -> Result<Snapshot, StoreError> {
        let record = find_document(&self.pool, document_id.as_str()).await?;
        let Some(record) = record else {
            return Ok(Snapshot::empty());
        };
        Ok(Snapshot {
            version: stored_version(document_id, record.version)?,
            comments: record.comments,
        })
    }

    async fn write(
        &self,
        document_id: &DocumentId,
        comments: &[Comment],
        expected: VersionToken,
    ) -> Result<VersionToken, StoreError> {
        if expected == VersionToken::INITIAL {
            if insert_document(&self.pool, document_id.as_str(), comments).await? {
                return Ok(expected.next());
            }
            warn!(document_id = %document_id, "document created concurrently");
            return Err(StoreError::Conflict(document_id.clone()));
        }
        let expected_version = i64::try_from(expected.get())
            .map_err(|_| StoreError::Conflict(document_id.clone()))?;
        match update_document(&self.pool, document_id.as_str(), comments, expected_version).await? {
            Some(version) => stored_version(document_id, version),
            None => Err(StoreError::Conflict(document_id.clone())),
        }
    }

    async fn document_ids(&self) -> Result<Vec<DocumentId>, StoreError> {
        let ids = list_document_ids(&self.pool).await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| match DocumentId::try_from(id.as_str()) {
                Ok(document_id) => Some(document_id),
                Err(err) => {
                    warn!(document_id = %id, error = %err, "skipping unaddressable document");
                    None
                }
            })
            .collect())
    }
}

fn stored_version(document_id: &DocumentId, version: i64) -> Result<VersionToken, StoreError> {
    u64::try_from(version).map(VersionToken::new).map_err(|_| {
        StoreError::Unavailable(format!(
            "negative version {version} for document {document_id}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_row_version_is_unavailable() {
        let id = DocumentId::try_from("org-1").unwrap();
        assert_eq!(stored_version(&id, 3).unwrap(), VersionToken::new(3));
        assert!(matches!(
            stored_version(&id, -1),
            Err(StoreError::Unavailable(_))
        ));
    }
}
