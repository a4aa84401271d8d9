use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use thiserror::Error;

use healthhub_core::domain::comments::Comment;

#[derive(Debug, Error)]
pub enum CommentsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct CommentDocumentRecord {
    pub document_id: String,
    pub comments: Vec<Comment>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

pub async fn find_document(
    pool: &PgPool,
    document_id: &str,
) -> Result<Option<CommentDocumentRecord>, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        SELECT document_id, comments, version, updated_at
        FROM comment_documents
        WHERE document_id = $1
        "#,
    )
    .bind(document_id)
    .fetch_optional(pool)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let Json(comments): Json<Vec<Comment>> = row.try_get("comments")?;
    Ok(Some(CommentDocumentRecord {
        document_id: row.try_get("document_id")?,
        comments,
        version: row.try_get("version")?,
        updated_at: row.try_get("updated_at")?,
    }))
}

/// First write of a document. Returns `false` when another writer created it
/// first.
pub async fn insert_document(
    pool: &PgPool,
    document_id: &str,
    comments: &[Comment],
) -> Result<bool, CommentsRepoError> {
    let result = sqlx::query(
        r#"
        INSERT INTO comment_documents (document_id, comments, version, updated_at)
        VALUES ($1, $2, 1, NOW())
        ON CONFLICT (document_id) DO NOTHING
        "#,
    )
    .bind(document_id)
    .bind(Json(comments))
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Replaces the tree if the stored version still equals `expected_version`.
/// Returns the new version, or `None` when the version had moved on.
pub async fn update_document(
    pool: &PgPool,
    document_id: &str,
    comments: &[Comment],
    expected_version: i64,
) -> Result<Option<i64>, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        UPDATE comment_documents
        SET comments = $2,
            version = version + 1,
            updated_at = NOW()
        WHERE document_id = $1 AND version = $3
        RETURNING version
        "#,
    )
    .bind(document_id)
    .bind(Json(comments))
    .bind(expected_version)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => Ok(Some(row.try_get("version")?)),
        None => Ok(None),
    }
}

pub async fn list_document_ids(pool: &PgPool) -> Result<Vec<String>, CommentsRepoError> {
    let rows = sqlx::query(
        r#"
        SELECT document_id
        FROM comment_documents
        ORDER BY document_id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        ids.push(row.try_get("document_id")?);
    }
    Ok(ids)
}
