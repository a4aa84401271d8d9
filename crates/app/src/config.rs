use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use healthhub_core::domain::display::DEFAULT_MAX_REPLY_DEPTH;
use healthhub_core::types::rating::RatingPolicy;
use healthhub_infra::ContentfulConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    File,
    Postgres,
    Contentful,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Memory => "memory",
            StoreKind::File => "file",
            StoreKind::Postgres => "postgres",
            StoreKind::Contentful => "contentful",
        }
    }
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "file" => Ok(StoreKind::File),
            "postgres" => Ok(StoreKind::Postgres),
            "contentful" => Ok(StoreKind::Contentful),
            other => Err(ConfigError::InvalidValue("HEALTHHUB_STORE", other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub store: StoreKind,
    pub data_file: PathBuf,
    pub database_url: Option<String>,
    pub contentful: Option<ContentfulConfig>,
    pub request_timeout: Duration,
    pub rating_policy: RatingPolicy,
    pub max_reply_depth: usize,
    pub cors_allow_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("{0} is required for the {1} store")]
    Missing(&'static str, &'static str),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr_raw = read_string("HEALTHHUB_HTTP_ADDR", "127.0.0.1:8080");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;
        let store = read_string("HEALTHHUB_STORE", "file").parse::<StoreKind>()?;
        let data_file = PathBuf::from(read_string("HEALTHHUB_DATA_FILE", "./data/comments.json"));
        let database_url = read_optional_string("HEALTHHUB_DATABASE_URL");
        let contentful = read_contentful()?;
        let request_timeout_secs = read_u64("HEALTHHUB_REQUEST_TIMEOUT_SECS", 15)?;
        let rating_policy_raw = read_string("HEALTHHUB_RATING_POLICY", "required");
        let rating_policy = rating_policy_raw
            .parse::<RatingPolicy>()
            .map_err(|_| ConfigError::InvalidValue("HEALTHHUB_RATING_POLICY", rating_policy_raw))?;
        let max_reply_depth = read_usize("HEALTHHUB_MAX_REPLY_DEPTH", DEFAULT_MAX_REPLY_DEPTH)?;
        let cors_allow_origins = parse_list(&read_string("HEALTHHUB_CORS_ALLOW_ORIGINS", ""));

        let config = Self {
            http_addr,
            store,
            data_file,
            database_url,
            contentful,
            request_timeout: Duration::from_secs(request_timeout_secs),
            rating_policy,
            max_reply_depth,
            cors_allow_origins,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_store(mut self, store: StoreKind) -> Result<Self, ConfigError> {
        self.store = store;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.store {
            StoreKind::Postgres if self.database_url.is_none() => {
                Err(ConfigError::Missing("HEALTHHUB_DATABASE_URL", "postgres"))
            }
            StoreKind::Contentful if self.contentful.is_none() => Err(ConfigError::Missing(
                "HEALTHHUB_CONTENTFUL_SPACE_ID and HEALTHHUB_CONTENTFUL_MANAGEMENT_TOKEN",
                "contentful",
            )),
            _ => Ok(()),
        }
    }
}

fn read_contentful() -> Result<Option<ContentfulConfig>, ConfigError> {
    let space_id = read_optional_string("HEALTHHUB_CONTENTFUL_SPACE_ID");
    let token = read_optional_string("HEALTHHUB_CONTENTFUL_MANAGEMENT_TOKEN");
    let (space_id, token) = match (space_id, token) {
        (Some(space_id), Some(token)) => (space_id, token),
        (None, None) => return Ok(None),
        (Some(_), None) => {
            return Err(ConfigError::Missing(
                "HEALTHHUB_CONTENTFUL_MANAGEMENT_TOKEN",
                "contentful",
            ));
        }
        (None, Some(_)) => {
            return Err(ConfigError::Missing("HEALTHHUB_CONTENTFUL_SPACE_ID", "contentful"));
        }
    };
    let mut config = ContentfulConfig::new(space_id, token);
    if let Some(environment) = read_optional_string("HEALTHHUB_CONTENTFUL_ENVIRONMENT") {
        config.environment = environment;
    }
    if let Some(locale) = read_optional_string("HEALTHHUB_CONTENTFUL_LOCALE") {
        config.locale = locale;
    }
    if let Some(field) = read_optional_string("HEALTHHUB_CONTENTFUL_FIELD") {
        config.field = field;
    }
    Ok(Some(config))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Loads `./.env` without overriding variables already set in the process.
pub fn load_dotenv() -> Result<(), std::io::Error> {
    let contents = match std::fs::read_to_string(Path::new(".env")) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    for (key, value) in parse_dotenv(&contents) {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        // Safety: runs during startup before the HTTP server spawns tasks.
        unsafe {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents.lines().filter_map(parse_dotenv_line).collect()
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let line = line.strip_prefix("export ").unwrap_or(line);
    if line.starts_with('#') {
        return None;
    }
    let (key, raw) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key.to_string(), dotenv_value(raw.trim())))
}

/// Quoted values keep everything up to the closing quote; bare values end at
/// a ` #` comment.
fn dotenv_value(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = chars.as_str();
            let inner = &inner[..inner.rfind(quote).unwrap_or(inner.len())];
            if quote == '"' {
                unescape(inner)
            } else {
                inner.to_string()
            }
        }
        _ => raw.split(" #").next().unwrap_or(raw).trim_end().to_string(),
    }
}

fn unescape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            output.push(match ch {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                other => other,
            });
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            output.push(ch);
        }
    }
    if escaped {
        output.push('\\');
    }
    output
}
