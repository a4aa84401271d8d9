use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, StoreKind};
use crate::state::AppState;
use healthhub_core::service::CommentService;
use healthhub_core::store::CommentStore;
use healthhub_infra::db::{connect_lazy, DbPoolError};
use healthhub_infra::{ContentfulStore, JsonFileStore, MemoryStore, PostgresStore};

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("db pool error: {0}")]
    Db(#[from] DbPoolError),
    #[error("{0} store is not configured")]
    NotConfigured(&'static str),
}

pub fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    let mut db = None;
    let store: Arc<dyn CommentStore> = match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => Arc::new(JsonFileStore::new(config.data_file.clone())),
        StoreKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(WiringError::NotConfigured("postgres"))?;
            let pool = connect_lazy(url, config.request_timeout)?;
            db = Some(pool.clone());
            Arc::new(PostgresStore::new(pool))
        }
        StoreKind::Contentful => {
            let contentful = config
                .contentful
                .clone()
                .ok_or(WiringError::NotConfigured("contentful"))?;
            let client = Client::builder().timeout(config.request_timeout).build()?;
            Arc::new(ContentfulStore::new(client, contentful))
        }
    };
    info!(
        store = store.backend(),
        rating_policy = config.rating_policy.as_str(),
        "comment store wired"
    );
    Ok(AppState {
        comments: CommentService::new(store, config.rating_policy),
        config: Arc::new(config),
        db,
    })
}
