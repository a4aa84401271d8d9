use std::sync::Arc;

use crate::config::AppConfig;
use healthhub_core::service::CommentService;
use healthhub_infra::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub comments: CommentService,
    pub db: Option<DbPool>,
}
