pub mod comments_repo;
pub mod migrations;
pub mod pool;
pub mod store;

pub use comments_repo::{
    CommentDocumentRecord, CommentsRepoError, find_document, insert_document, list_document_ids,
    update_document,
};
pub use migrations::run_migrations;
pub use pool::{connect_lazy, DbPool, DbPoolError};
pub use store::PostgresStore;
