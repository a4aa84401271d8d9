use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: StoreStatus,
    pub rating_policy: &'static str,
    pub max_reply_depth: usize,
}

#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub backend: &'static str,
    pub database: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store: StoreStatus {
            backend: state.comments.backend(),
            database: state.db.is_some(),
        },
        rating_policy: state.comments.rating_policy().as_str(),
        max_reply_depth: state.config.max_reply_depth,
    })
}
