use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::state::AppState;
use healthhub_core::domain::comments::Comment;
use healthhub_core::domain::display::{project_thread, CommentView};
use healthhub_core::domain::stats::{compute_stats, CommentStats, DocumentSummary};
use healthhub_core::error::CommentError;
use healthhub_core::service::{NewComment, NewReply};
use healthhub_core::types::document_id::DocumentId;
use healthhub_core::types::path::ReplyPath;

#[derive(Debug, Deserialize)]
pub struct CommentsParams {
    pub document_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadParams {
    pub document_id: Option<String>,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct PostCommentBody {
    pub document_id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub rating: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct PostReplyBody {
    pub document_id: String,
    pub comment_index: usize,
    #[serde(default)]
    pub path: ReplyPath,
    pub name: String,
    pub content: String,
}

/// Addresses a root comment (`path` empty) or a reply beneath it.
#[derive(Debug, Deserialize)]
pub struct TargetBody {
    pub document_id: String,
    pub comment_index: usize,
    #[serde(default)]
    pub path: ReplyPath,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub document_id: DocumentId,
    pub comments: Vec<Comment>,
    pub stats: CommentStats,
}

impl CommentsResponse {
    fn new(document_id: DocumentId, comments: Vec<Comment>) -> Self {
        let stats = compute_stats(&comments);
        Self {
            document_id,
            comments,
            stats,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub document_id: DocumentId,
    pub max_reply_depth: usize,
    pub stats: CommentStats,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct SummariesResponse {
    pub documents: Vec<DocumentSummary>,
}

#[derive(Debug, Error)]
pub enum CommentsApiError {
    #[error("document_id is required")]
    MissingDocumentId,
    #[error(transparent)]
    Comment(#[from] CommentError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn get_comments(
    State(state): State<AppState>,
    Query(params): Query<CommentsParams>,
) -> Result<Json<CommentsResponse>, CommentsApiError> {
    let document_id = parse_document_id(params.document_id)?;
    let listing = state.comments.fetch(&document_id).await?;
    Ok(Json(CommentsResponse {
        document_id,
        comments: listing.comments,
        stats: listing.stats,
    }))
}

pub async fn get_thread(
    State(state): State<AppState>,
    Query(params): Query<ThreadParams>,
) -> Result<Json<ThreadResponse>, CommentsApiError> {
    let document_id = parse_document_id(params.document_id)?;
    let now = params.now.unwrap_or_else(Utc::now);
    let max_reply_depth = state.config.max_reply_depth;
    let listing = state.comments.fetch(&document_id).await?;
    Ok(Json(ThreadResponse {
        comments: project_thread(&listing.comments, max_reply_depth, now),
        stats: listing.stats,
        max_reply_depth,
        document_id,
    }))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Json(body): Json<PostCommentBody>,
) -> Result<Json<CommentsResponse>, CommentsApiError> {
    let document_id = parse_document_id(Some(body.document_id))?;
    let input = NewComment {
        name: body.name,
        content: body.content,
        rating: body.rating,
    };
    let comments = state.comments.add_comment(&document_id, input).await?;
    info!(document_id = %document_id, total = comments.len(), "comment added");
    Ok(Json(CommentsResponse::new(document_id, comments)))
}

pub async fn post_reply(
    State(state): State<AppState>,
    Json(body): Json<PostReplyBody>,
) -> Result<Json<CommentsResponse>, CommentsApiError> {
    let document_id = parse_document_id(Some(body.document_id))?;
    let input = NewReply {
        name: body.name,
        content: body.content,
    };
    let comments = state
        .comments
        .add_reply(&document_id, body.comment_index, &body.path, input)
        .await?;
    info!(
        document_id = %document_id,
        comment_index = body.comment_index,
        path = %body.path,
        "reply added"
    );
    Ok(Json(CommentsResponse::new(document_id, comments)))
}

pub async fn post_like(
    State(state): State<AppState>,
    Json(body): Json<TargetBody>,
) -> Result<Json<CommentsResponse>, CommentsApiError> {
    let document_id = parse_document_id(Some(body.document_id))?;
    let comments = state
        .comments
        .toggle_like(&document_id, body.comment_index, &body.path)
        .await?;
    Ok(Json(CommentsResponse::new(document_id, comments)))
}

pub async fn post_report(
    State(state): State<AppState>,
    Json(body): Json<TargetBody>,
) -> Result<Json<CommentsResponse>, CommentsApiError> {
    let document_id = parse_document_id(Some(body.document_id))?;
    let comments = state
        .comments
        .mark_reported(&document_id, body.comment_index, &body.path)
        .await?;
    info!(
        document_id = %document_id,
        comment_index = body.comment_index,
        path = %body.path,
        "comment reported"
    );
    Ok(Json(CommentsResponse::new(document_id, comments)))
}

pub async fn get_summaries(
    State(state): State<AppState>,
) -> Result<Json<SummariesResponse>, CommentsApiError> {
    let documents = state.comments.document_summaries().await?;
    Ok(Json(SummariesResponse { documents }))
}

fn parse_document_id(value: Option<String>) -> Result<DocumentId, CommentsApiError> {
    let raw = value.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(CommentsApiError::MissingDocumentId);
    }
    DocumentId::try_from(raw)
        .map_err(CommentError::from)
        .map_err(CommentsApiError::from)
}

impl CommentsApiError {
    fn status(&self) -> StatusCode {
        match self {
            CommentsApiError::MissingDocumentId => StatusCode::BAD_REQUEST,
            CommentsApiError::Comment(err) => match err {
                CommentError::Validation(_) => StatusCode::BAD_REQUEST,
                CommentError::InvalidPath { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CommentError::ConcurrentModification => StatusCode::CONFLICT,
                CommentError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl IntoResponse for CommentsApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() || status == StatusCode::CONFLICT {
            warn!(status = status.as_u16(), error = %self, "comment request failed");
        }
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
