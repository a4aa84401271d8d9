pub mod client;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use healthhub_core::domain::comments::Comment;
use healthhub_core::store::{CommentStore, Snapshot, StoreError, VersionToken};
use healthhub_core::types::document_id::DocumentId;

pub use client::{ContentfulClient, ContentfulConfig, ContentfulError, Entry};

/// Keeps each post's comment tree in one localized field of its Contentful
/// entry. The entry's `sys.version` is the concurrency token.
#[derive(Debug, Clone)]
pub struct ContentfulStore {
    client: ContentfulClient,
}

impl ContentfulStore {
    pub fn new(http: reqwest::Client, config: ContentfulConfig) -> Self {
        Self {
            client: ContentfulClient::new(http, config),
        }
    }
}

#[async_trait]
impl CommentStore for ContentfulStore {
    fn backend(&self) -> &'static str {
        "contentful"
    }

    async fn fetch(&self, document_id: &DocumentId) -> Result<Snapshot, StoreError> {
        let config = self.client.config();
        let entry = self
            .client
            .fetch_entry(document_id.as_str())
            .await
            .map_err(|err| store_error(document_id, err))?;
        let comments = comments_from_fields(&entry.fields, &config.field, &config.locale)
            .map_err(|err| store_error(document_id, err))?;
        Ok(Snapshot {
            comments,
            version: VersionToken::new(entry.sys.version),
        })
    }

    async fn write(
        &self,
        document_id: &DocumentId,
        comments: &[Comment],
        expected: VersionToken,
    ) -> Result<VersionToken, StoreError> {
        let config = self.client.config();
        let entry_id = document_id.as_str();
        let entry = self
            .client
            .fetch_entry(entry_id)
            .await
            .map_err(|err| store_error(document_id, err))?;
        if entry.sys.version != expected.get() {
            return Err(StoreError::Conflict(document_id.clone()));
        }
        let fields = fields_with_comments(entry.fields, &config.field, &config.locale, comments)
            .map_err(|err| store_error(document_id, err))?;
        let updated = self
            .client
            .update_entry(entry_id, &fields, expected.get())
            .await
            .map_err(|err| store_error(document_id, err))?;
        match self.client.publish_entry(entry_id, updated.sys.version).await {
            Ok(published) => {
                info!(document_id = %document_id, version = published.sys.version, "entry published");
                Ok(VersionToken::new(published.sys.version))
            }
            Err(err) => {
                warn!(
                    document_id = %document_id,
                    error = %err,
                    "failed to publish entry; changes saved as draft"
                );
                Ok(VersionToken::new(updated.sys.version))
            }
        }
    }
}

fn store_error(document_id: &DocumentId, err: ContentfulError) -> StoreError {
    match err {
        ContentfulError::VersionMismatch => StoreError::Conflict(document_id.clone()),
        other => StoreError::Unavailable(format!("contentful: {other}")),
    }
}

fn comments_from_fields(
    fields: &Map<String, Value>,
    field: &str,
    locale: &str,
) -> Result<Vec<Comment>, ContentfulError> {
    match fields.get(field).and_then(|localized| localized.get(locale)) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| ContentfulError::InvalidPayload(format!("field {field}: {err}"))),
    }
}

fn fields_with_comments(
    mut fields: Map<String, Value>,
    field: &str,
    locale: &str,
    comments: &[Comment],
) -> Result<Map<String, Value>, ContentfulError> {
    let serialized = serde_json::to_value(comments)
        .map_err(|err| ContentfulError::InvalidPayload(err.to_string()))?;
    let localized = fields
        .entry(field.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !localized.is_object() {
        *localized = Value::Object(Map::new());
    }
    if let Value::Object(locales) = localized {
        locales.insert(locale.to_string(), serialized);
    }
    Ok(fields)
}
