use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use healthhub_core::domain::comments::Comment;
use healthhub_core::store::{CommentStore, Snapshot, StoreError, VersionToken};
use healthhub_core::types::document_id::DocumentId;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt comments file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<FileStoreError> for StoreError {
    fn from(err: FileStoreError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(default)]
    version: VersionToken,
    #[serde(default)]
    comments: Vec<Comment>,
}

/// Entries written by the browser client hold a bare comment array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Bare(Vec<Comment>),
    Versioned(StoredDocument),
}

impl From<StoredEntry> for StoredDocument {
    fn from(entry: StoredEntry) -> Self {
        match entry {
            StoredEntry::Bare(comments) => StoredDocument {
                version: VersionToken::INITIAL,
                comments,
            },
            StoredEntry::Versioned(document) => document,
        }
    }
}

type DocumentMap = BTreeMap<String, StoredDocument>;

/// Keeps every document's tree in one JSON object keyed by document id,
/// rewriting the whole file on each write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<DocumentMap, FileStoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DocumentMap::new());
            }
            Err(source) => {
                return Err(FileStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(DocumentMap::new());
        }
        let entries: BTreeMap<String, StoredEntry> =
            serde_json::from_slice(&raw).map_err(|source| FileStoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(entries
            .into_iter()
            .map(|(key, entry)| (key, StoredDocument::from(entry)))
            .collect())
    }

    async fn persist(&self, documents: &DocumentMap) -> Result<(), FileStoreError> {
        let io_err = |source| FileStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(documents).map_err(|source| FileStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl CommentStore for JsonFileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn fetch(&self, document_id: &DocumentId) -> Result<Snapshot, StoreError> {
        let mut documents = self.load().await?;
        Ok(match documents.remove(document_id.as_str()) {
            Some(stored) => Snapshot {
                comments: stored.comments,
                version: stored.version,
            },
            None => Snapshot::empty(),
        })
    }

    async fn write(
        &self,
        document_id: &DocumentId,
        comments: &[Comment],
        expected: VersionToken,
    ) -> Result<VersionToken, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.load().await?;
        let current = documents
            .get(document_id.as_str())
            .map(|stored| stored.version)
            .unwrap_or(VersionToken::INITIAL);
        if current != expected {
            return Err(StoreError::Conflict(document_id.clone()));
        }
        let version = current.next();
        documents.insert(
            document_id.to_string(),
            StoredDocument {
                version,
                comments: comments.to_vec(),
            },
        );
        self.persist(&documents).await?;
        debug!(
            document_id = %document_id,
            version = version.get(),
            path = %self.path.display(),
            "comments file written"
        );
        Ok(version)
    }

    async fn document_ids(&self) -> Result<Vec<DocumentId>, StoreError> {
        let documents = self.load().await?;
        Ok(documents
            .keys()
            .filter_map(|key| DocumentId::try_from(key.as_str()).ok())
            .collect())
    }
}
