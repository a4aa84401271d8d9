use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::comments::{self, Comment, Reply};
use crate::domain::stats::{CommentStats, DocumentSummary, compute_stats};
use crate::error::CommentError;
use crate::store::{CommentStore, Snapshot};
use crate::types::document_id::DocumentId;
use crate::types::path::ReplyPath;
use crate::types::rating::RatingPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub name: String,
    pub content: String,
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReply {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentListing {
    pub comments: Vec<Comment>,
    pub stats: CommentStats,
}

/// Runs every comment operation as fetch, transform in memory, write back.
///
/// Nothing is cached between calls and nothing is retried; a failed call
/// leaves the stored tree as it was.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    rating_policy: RatingPolicy,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>, rating_policy: RatingPolicy) -> Self {
        Self {
            store,
            rating_policy,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn rating_policy(&self) -> RatingPolicy {
        self.rating_policy
    }

    pub async fn fetch(&self, document_id: &DocumentId) -> Result<CommentListing, CommentError> {
        let snapshot = self.store.fetch(document_id).await?;
        let stats = compute_stats(&snapshot.comments);
        Ok(CommentListing {
            comments: snapshot.comments,
            stats,
        })
    }

    pub async fn add_comment(
        &self,
        document_id: &DocumentId,
        input: NewComment,
    ) -> Result<Vec<Comment>, CommentError> {
        let name = required_text("name", &input.name)?;
        let content = required_text("content", &input.content)?;
        let rating = self.rating_policy.check(input.rating)?;
        let comment = Comment::new(name, content, rating, Utc::now());
        self.modify(document_id, move |tree| {
            comments::insert_comment(tree, comment);
            Ok(())
        })
        .await
    }

    pub async fn add_reply(
        &self,
        document_id: &DocumentId,
        comment_index: usize,
        path: &ReplyPath,
        input: NewReply,
    ) -> Result<Vec<Comment>, CommentError> {
        let name = required_text("name", &input.name)?;
        let content = required_text("content", &input.content)?;
        let reply = Reply::new(name, content, Utc::now());
        self.modify(document_id, move |tree| {
            comments::append_reply(tree, comment_index, path, reply)
        })
        .await
    }

    pub async fn toggle_like(
        &self,
        document_id: &DocumentId,
        comment_index: usize,
        path: &ReplyPath,
    ) -> Result<Vec<Comment>, CommentError> {
        self.modify(document_id, |tree| {
            comments::toggle_like(tree, comment_index, path)
        })
        .await
    }

    pub async fn mark_reported(
        &self,
        document_id: &DocumentId,
        comment_index: usize,
        path: &ReplyPath,
    ) -> Result<Vec<Comment>, CommentError> {
        self.modify(document_id, |tree| {
            comments::mark_reported(tree, comment_index, path).map(|_| ())
        })
        .await
    }

    pub async fn document_summaries(&self) -> Result<Vec<DocumentSummary>, CommentError> {
        let ids = self.store.document_ids().await?;
        let mut summaries = Vec::with_capacity(ids.len());
        for document_id in ids {
            let snapshot = self.store.fetch(&document_id).await?;
            summaries.push(DocumentSummary::from_comments(document_id, &snapshot.comments));
        }
        Ok(summaries)
    }

    async fn modify<F>(&self, document_id: &DocumentId, apply: F) -> Result<Vec<Comment>, CommentError>
    where
        F: FnOnce(&mut Vec<Comment>) -> Result<(), CommentError> + Send,
    {
        let Snapshot {
            mut comments,
            version,
        } = self.store.fetch(document_id).await?;
        apply(&mut comments)?;
        self.store.write(document_id, &comments, version).await?;
        Ok(comments)
    }
}

fn required_text(field: &'static str, value: &str) -> Result<String, CommentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CommentError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::store::{StoreError, VersionToken};

    #[derive(Default)]
    struct TestStore {
        documents: Mutex<HashMap<DocumentId, Snapshot>>,
        writes: AtomicUsize,
        reject_next_write: AtomicBool,
        offline: AtomicBool,
    }

    impl TestStore {
        async fn stored(&self, document_id: &DocumentId) -> Snapshot {
            self.documents
                .lock()
                .await
                .get(document_id)
                .cloned()
                .unwrap_or_else(Snapshot::empty)
        }
    }

    #[async_trait]
    impl CommentStore for TestStore {
        fn backend(&self) -> &'static str {
            "test"
        }

        async fn fetch(&self, document_id: &DocumentId) -> Result<Snapshot, StoreError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            Ok(self.stored(document_id).await)
        }

        async fn write(
            &self,
            document_id: &DocumentId,
            comments: &[Comment],
            expected: VersionToken,
        ) -> Result<VersionToken, StoreError> {
            if self.reject_next_write.swap(false, Ordering::SeqCst) {
                return Err(StoreError::Conflict(document_id.clone()));
            }
            let mut documents = self.documents.lock().await;
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
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(version)
        }

        async fn document_ids(&self) -> Result<Vec<DocumentId>, StoreError> {
            let mut ids: Vec<_> = self.documents.lock().await.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        }
    }

    fn service() -> (CommentService, Arc<TestStore>) {
        let store = Arc::new(TestStore::default());
        (CommentService::new(store.clone(), RatingPolicy::Optional), store)
    }

    fn doc(id: &str) -> DocumentId {
        DocumentId::try_from(id).unwrap()
    }

    fn comment(name: &str, content: &str, rating: Option<u8>) -> NewComment {
        NewComment {
            name: name.to_string(),
            content: content.to_string(),
            rating,
        }
    }

    fn reply(name: &str, content: &str) -> NewReply {
        NewReply {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn end_to_end_comment_reply_like() {
        let (service, _store) = service();
        let post = doc("post1");

        let tree = service
            .add_comment(&post, comment("Alice", "Great article!", Some(5)))
            .await
            .unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "Alice");
        assert_eq!(tree[0].content, "Great article!");
        assert_eq!(tree[0].rating, Some(5));
        assert!(tree[0].replies.is_empty());

        let tree = service
            .add_reply(&post, 0, &ReplyPath::root(), reply("Bob", "Thanks!"))
            .await
            .unwrap();
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].name, "Bob");
        assert_eq!(tree[0].replies[0].content, "Thanks!");

        let tree = service
            .toggle_like(&post, 0, &ReplyPath::from(vec![0]))
            .await
            .unwrap();
        assert_eq!(tree[0].replies[0].engagement.like_count, 1);
        assert_eq!(tree[0].engagement.like_count, 0);

        let stats = compute_stats(&tree);
        assert_eq!(stats.total_comments, 1);
        assert_eq!(stats.total_replies, 1);
        assert_eq!(stats.average_rating, 5.0);
        assert_eq!(stats.total_rating_count, 1);

        let listing = service.fetch(&post).await.unwrap();
        assert_eq!(listing.comments, tree);
        assert_eq!(listing.stats, stats);
    }

    #[tokio::test]
    async fn root_comments_are_newest_first() {
        let (service, _store) = service();
        let post = doc("post1");
        for name in ["one", "two", "three"] {
            service.add_comment(&post, comment(name, "text", None)).await.unwrap();
        }
        let tree = service.fetch(&post).await.unwrap().comments;
        let names: Vec<_> = tree.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn inputs_are_trimmed_and_validated() {
        let (service, store) = service();
        let post = doc("post1");
        let tree = service
            .add_comment(&post, comment("  Alice ", "\thello\n", None))
            .await
            .unwrap();
        assert_eq!(tree[0].name, "Alice");
        assert_eq!(tree[0].content, "hello");

        let err = service
            .add_comment(&post, comment("   ", "hello", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));
        let err = service
            .add_reply(&post, 0, &ReplyPath::root(), reply("Bob", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rating_policy_is_enforced() {
        let store = Arc::new(TestStore::default());
        let service = CommentService::new(store.clone(), RatingPolicy::Required);
        let post = doc("org-1");
        let err = service
            .add_comment(&post, comment("A", "b", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));
        let err = service
            .add_comment(&post, comment("A", "b", Some(6)))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::Validation(_)));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_path_leaves_store_unchanged() {
        let (service, store) = service();
        let post = doc("post1");
        service.add_comment(&post, comment("A", "root", None)).await.unwrap();
        for name in ["r1", "r2"] {
            service
                .add_reply(&post, 0, &ReplyPath::root(), reply(name, "hi"))
                .await
                .unwrap();
        }
        let before = store.stored(&post).await;

        let err = service
            .add_reply(&post, 0, &ReplyPath::from(vec![5]), reply("late", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::InvalidPath { index: 5, len: 2, .. }));
        let err = service
            .toggle_like(&post, 1, &ReplyPath::root())
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::InvalidPath { depth: 0, .. }));

        assert_eq!(store.stored(&post).await, before);
    }

    #[tokio::test]
    async fn report_twice_is_a_no_op() {
        let (service, _store) = service();
        let post = doc("post1");
        service.add_comment(&post, comment("A", "root", None)).await.unwrap();
        let first = service
            .mark_reported(&post, 0, &ReplyPath::root())
            .await
            .unwrap();
        let second = service
            .mark_reported(&post, 0, &ReplyPath::root())
            .await
            .unwrap();
        assert!(second[0].engagement.reported);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn stale_write_surfaces_concurrent_modification() {
        let (service, store) = service();
        let post = doc("post1");
        service.add_comment(&post, comment("A", "root", None)).await.unwrap();
        let before = store.stored(&post).await;
        store.reject_next_write.store(true, Ordering::SeqCst);

        let err = service
            .add_reply(&post, 0, &ReplyPath::root(), reply("B", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::ConcurrentModification));
        assert_eq!(store.stored(&post).await, before);

        service
            .add_reply(&post, 0, &ReplyPath::root(), reply("B", "hi"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let (service, store) = service();
        store.offline.store(true, Ordering::SeqCst);
        let err = service.fetch(&doc("post1")).await.unwrap_err();
        assert!(matches!(err, CommentError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn summaries_cover_every_document() {
        let (service, _store) = service();
        service
            .add_comment(&doc("org-a"), comment("A", "good", Some(4)))
            .await
            .unwrap();
        service
            .add_comment(&doc("org-a"), comment("B", "fine", Some(3)))
            .await
            .unwrap();
        service
            .add_comment(&doc("org-b"), comment("C", "meh", None))
            .await
            .unwrap();

        let summaries = service.document_summaries().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].document_id, doc("org-a"));
        assert_eq!(summaries[0].average_rating, 3.5);
        assert_eq!(summaries[0].total_ratings, 2);
        assert_eq!(summaries[1].total_comments, 1);
        assert_eq!(summaries[1].total_ratings, 0);
    }
}
