use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

const API_BASE: &str = "https://api.contentful.com";
const MANAGEMENT_CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";
const VERSION_HEADER: &str = "X-Contentful-Version";

#[derive(Debug, Error)]
pub enum ContentfulError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("entry {0} not found")]
    NotFound(String),
    #[error("entry version mismatch")]
    VersionMismatch,
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Connection settings for the Content Management API. Built once at
/// startup and handed to the store.
#[derive(Debug, Clone)]
pub struct ContentfulConfig {
    pub space_id: String,
    pub environment: String,
    pub management_token: String,
    pub locale: String,
    pub field: String,
    pub api_base: String,
}

impl ContentfulConfig {
    pub fn new(space_id: impl Into<String>, management_token: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            environment: "master".to_string(),
            management_token: management_token.into(),
            locale: "en-US".to_string(),
            field: "comment".to_string(),
            api_base: API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntrySys {
    pub id: String,
    pub version: u64,
}

#[derive(Debug, Clone)]
pub struct ContentfulClient {
    http: reqwest::Client,
    config: ContentfulConfig,
}

impl ContentfulClient {
    pub fn new(http: reqwest::Client, config: ContentfulConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ContentfulConfig {
        &self.config
    }

    pub async fn fetch_entry(&self, entry_id: &str) -> Result<Entry, ContentfulError> {
        let response = self
            .http
            .get(self.entry_url(entry_id))
            .bearer_auth(&self.config.management_token)
            .header(reqwest::header::CONTENT_TYPE, MANAGEMENT_CONTENT_TYPE)
            .send()
            .await?;
        read_entry(entry_id, response).await
    }

    /// Replaces every field of the entry. Contentful rejects the request
    /// with 409 when `version` is not the entry's current version.
    pub async fn update_entry(
        &self,
        entry_id: &str,
        fields: &Map<String, Value>,
        version: u64,
    ) -> Result<Entry, ContentfulError> {
        let response = self
            .http
            .put(self.entry_url(entry_id))
            .bearer_auth(&self.config.management_token)
            .header(reqwest::header::CONTENT_TYPE, MANAGEMENT_CONTENT_TYPE)
            .header(VERSION_HEADER, version.to_string())
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;
        read_entry(entry_id, response).await
    }

    pub async fn publish_entry(&self, entry_id: &str, version: u64) -> Result<Entry, ContentfulError> {
        let url = format!("{}/published", self.entry_url(entry_id));
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.config.management_token)
            .header(VERSION_HEADER, version.to_string())
            .send()
            .await?;
        read_entry(entry_id, response).await
    }

    fn entry_url(&self, entry_id: &str) -> String {
        entry_url(&self.config, entry_id)
    }
}

fn entry_url(config: &ContentfulConfig, entry_id: &str) -> String {
    format!(
        "{}/spaces/{}/environments/{}/entries/{}",
        config.api_base.trim_end_matches('/'),
        config.space_id,
        config.environment,
        entry_id
    )
}

async fn read_entry(entry_id: &str, response: Response) -> Result<Entry, ContentfulError> {
    let status = response.status();
    let body = response.text().await?;
    match status {
        StatusCode::CONFLICT => Err(ContentfulError::VersionMismatch),
        StatusCode::NOT_FOUND => Err(ContentfulError::NotFound(entry_id.to_string())),
        status if !status.is_success() => Err(ContentfulError::Status {
            status: status.as_u16(),
            body,
        }),
        _ => serde_json::from_str(&body)
            .map_err(|err| ContentfulError::InvalidPayload(format!("entry {entry_id}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentfulConfig, Entry, entry_url};

    #[test]
    fn config_defaults_match_management_api() {
        let config = ContentfulConfig::new("space1", "token");
        assert_eq!(config.environment, "master");
        assert_eq!(config.locale, "en-US");
        assert_eq!(config.field, "comment");
    }

    #[test]
    fn entry_url_includes_space_and_environment() {
        let mut config = ContentfulConfig::new("space1", "token");
        config.api_base = "http://localhost:9000/".to_string();
        assert_eq!(
            entry_url(&config, "abc"),
            "http://localhost:9000/spaces/space1/environments/master/entries/abc"
        );
    }

    #[test]
    fn entry_payload_parses_sys_and_fields() {
        let entry: Entry = serde_json::from_str(
            r#"{"sys": {"id": "abc", "version": 7, "type": "Entry"}, "fields": {"title": {"en-US": "Hello"}}}"#,
        )
        .unwrap();
        assert_eq!(entry.sys.id, "abc");
        assert_eq!(entry.sys.version, 7);
        assert!(entry.fields.contains_key("title"));
    }
}
