use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use healthhub_core::domain::comments::Comment;
use healthhub_core::store::{CommentStore, Snapshot, StoreError, VersionToken};
use healthhub_core::types::document_id::DocumentId;

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<DocumentId, Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, document_id: &DocumentId) -> Result<Snapshot, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(document_id)
            .cloned()
            .unwrap_or_else(Snapshot::empty))
    }

    async fn write(
        &self,
        document_id: &DocumentId,
        comments: &[Comment],
        expected: VersionToken,
    ) -> Result<VersionToken, StoreError> {
        let mut documents = self.documents.write().await;
        let current = documents
            .get(document_id)
            .map(|snapshot| snapshot.version)
            .unwrap_or(VersionToken::INITIAL);
        if current != expected {
            return Err(StoreError::Conflict(document_id.clone()));
        }
        let version = current.next();
        documents.insert(
            document_id.clone(),
            Snapshot {
                comments: comments.to_vec(),
                version,
            },
        );
        Ok(version)
    }

    async fn document_ids(&self) -> Result<Vec<DocumentId>, StoreError> {
        let mut ids: Vec<_> = self.documents.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
